//! Single instance lock using Unix socket.
//!
//! Two bridges bound to the same push port would fight over the same
//! accessories, so only one instance per port may run. The lock is a Unix
//! socket, which the OS releases when the process dies.

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstanceLockError {
    #[error("another bridge instance is already running on port {0}")]
    AlreadyRunning(u16),

    #[error("failed to acquire instance lock: {0}")]
    Io(#[from] io::Error),
}

/// Held for as long as the bridge runs. The socket file is removed on drop.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock for the bridge listening on `port`.
    pub fn acquire(port: u16) -> Result<Self, InstanceLockError> {
        let path = Self::socket_path(port);

        // A socket nobody answers on was left behind by a killed process
        if path.exists() {
            if UnixStream::connect(&path).is_ok() {
                return Err(InstanceLockError::AlreadyRunning(port));
            }
            let _ = std::fs::remove_file(&path);
        }

        match UnixListener::bind(&path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path,
            }),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                Err(InstanceLockError::AlreadyRunning(port))
            }
            Err(e) => Err(InstanceLockError::Io(e)),
        }
    }

    /// Socket location, under `XDG_RUNTIME_DIR` when set and `/tmp` otherwise.
    pub fn socket_path(port: u16) -> PathBuf {
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join(format!("elights-bridge-{port}.sock"))
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
