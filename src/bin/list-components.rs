//! Print the components the eLights API reports.
//!
//! Usage:
//!   cargo run --bin list-components
//!   cargo run --bin list-components -- --api-url http://host/api

use clap::Parser;
use elights_bridge::config::{Config, load_dotenv};
use elights_bridge::{ElightsClient, RemoteApi};
use log::error;

#[derive(Parser)]
#[command(name = "list-components")]
#[command(about = "List relay and dimmer outputs known to the eLights API")]
struct Cli {
    /// Base URL of the eLights REST API
    #[arg(long, env = "ELIGHTS_API_URL")]
    api_url: Option<String>,

    /// Timeout for the request, in seconds
    #[arg(long, env = "ELIGHTS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.remote.base_url = url;
    }
    if let Some(timeout) = cli.timeout_secs {
        config.remote.timeout_secs = timeout;
    }

    let components = match ElightsClient::new(&config.remote) {
        Ok(client) => client.list_components().await,
        Err(e) => Err(e),
    };
    let components = match components {
        Ok(components) => components,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    for c in &components {
        println!("{}  {:<12}  {:<6}  {}", c.id, c.kind, c.value, c.label());
    }
    println!("{} components", components.len());
}
