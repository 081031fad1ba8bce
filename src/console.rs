//! Console command input.
//!
//! Stands in for a user operating the accessories: each stdin line is a
//! command for one accessory, dispatched through the registry exactly like a
//! command coming from the host would be.
//!
//! ```text
//! <id> on
//! <id> off
//! <id> <brightness 0-100>
//! ```

use crate::adapter::LocalChange;
use crate::registry::ComponentRegistry;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Parse one console line. Returns `None` for anything that is not a command.
pub fn parse_command(line: &str) -> Option<(String, LocalChange)> {
    let mut parts = line.split_whitespace();
    let id = parts.next()?;
    let change = match parts.next()? {
        "on" => LocalChange::On(true),
        "off" => LocalChange::On(false),
        level => LocalChange::Brightness(level.parse().ok()?),
    };
    if parts.next().is_some() {
        return None;
    }
    Some((id.to_string(), change))
}

/// Spawn a task dispatching commands read from stdin until EOF or `shutdown`.
///
/// Stdin is read on a dedicated thread so a pending read never holds up
/// runtime shutdown.
pub fn run_console(registry: Arc<ComponentRegistry>, shutdown: CancellationToken) -> JoinHandle<()> {
    let (tx, mut rx) = mpsc::channel::<String>(16);
    let spawned = std::thread::Builder::new()
        .name("console-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("[Console] Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("[Console] Failed to start stdin reader: {}", e);
    }

    tokio::spawn(async move {
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = rx.recv() => match line {
                    Some(line) => line,
                    None => break,
                },
            };
            if line.trim().is_empty() {
                continue;
            }

            let Some((id, change)) = parse_command(&line) else {
                warn!("[Console] Expected `<id> on|off|<0-100>`, got {:?}", line);
                continue;
            };
            match registry.dispatch_local(&id, change).await {
                Ok(outcome) => info!("[Console] {} {:?}: {:?}", id, change, outcome),
                Err(e) => warn!("[Console] {} {:?} failed: {}", id, change, e),
            }
        }
    })
}
