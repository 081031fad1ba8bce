use clap::Parser;
use elights_bridge::config::{Config, load_dotenv};
use elights_bridge::console::run_console;
use elights_bridge::host::CharacteristicEvent;
use elights_bridge::instance_lock::InstanceLock;
use elights_bridge::listener::{ListenerState, run_listener};
use elights_bridge::{ComponentRegistry, DiscoveryEngine, ElightsClient, LocalHost};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "elights-bridge")]
#[command(about = "Expose eLights switches and dimmers as local accessories")]
struct Cli {
    /// Base URL of the eLights REST API
    #[arg(long, env = "ELIGHTS_API_URL")]
    api_url: Option<String>,

    /// Timeout for a single API request, in seconds
    #[arg(long, env = "ELIGHTS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Address the push listener binds to
    #[arg(long, env = "PUSH_LISTENER_ADDR")]
    listen_addr: Option<String>,

    /// Port the eLights server pushes changes to
    #[arg(long, env = "PUSH_LISTENER_PORT")]
    port: Option<u16>,

    /// Accessory cache file
    #[arg(long, env = "ACCESSORY_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// Do not read accessory commands from stdin
    #[arg(long)]
    no_console: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.api_url {
            config.remote.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = self.timeout_secs {
            config.remote.timeout_secs = timeout;
        }
        if let Some(addr) = self.listen_addr {
            config.listener.bind_addr = addr;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(path) = self.cache_path {
            config.host.cache_path = path;
        }
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn log_characteristic_events(mut events: broadcast::Receiver<CharacteristicEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(
                    "[Host] {} {} = {}",
                    event.accessory_id, event.kind, event.value
                ),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("[Host] Event log lagged, {} events dropped", n)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn log_listener_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("[Push] {}", e),
        Err(e) => error!("[Push] Task failed: {}", e),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    load_dotenv();
    init_logger();

    let cli = Cli::parse();
    let no_console = cli.no_console;
    let mut config = Config::from_env();
    cli.apply(&mut config);

    info!("Starting eLights bridge");
    info!("  API: {}", config.remote.base_url);
    info!("  Push listener: {}", config.listen_addr());
    info!("  Accessory cache: {}", config.host.cache_path.display());

    let _lock = match InstanceLock::acquire(config.listener.port) {
        Ok(lock) => lock,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let addr: SocketAddr = match config.listen_addr().parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid push listener address {}: {}", config.listen_addr(), e);
            std::process::exit(1);
        }
    };

    let client = match ElightsClient::new(&config.remote) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let host = Arc::new(LocalHost::new(config.host.cache_path.clone()));
    log_characteristic_events(host.subscribe());
    let registry = Arc::new(ComponentRegistry::new());

    // On failure the registry stays empty until restart; cached accessories
    // remain with the host but pushes for them are unknown
    let discovery = DiscoveryEngine::new(client, host.clone(), registry.clone());
    if let Err(e) = discovery.run_discovery().await {
        error!("[Discovery] Failed to fetch components: {}", e);
    }

    let shutdown = CancellationToken::new();
    let mut listener_task = tokio::spawn(run_listener(
        addr,
        ListenerState::new(registry.clone(), host.clone()),
        shutdown.clone(),
    ));
    let console_task = (!no_console).then(|| run_console(registry.clone(), shutdown.clone()));

    info!("eLights bridge is running, press Ctrl+C to exit");

    let listener_done = tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
            false
        }
        result = &mut listener_task => {
            log_listener_exit(result);
            true
        }
    };

    shutdown.cancel();
    if let Some(task) = console_task {
        task.abort();
    }
    if !listener_done {
        log_listener_exit(listener_task.await);
    }

    if let Err(e) = host.flush() {
        error!("[Host] Failed to save accessory cache: {}", e);
    }
    info!("eLights bridge stopped");
}
