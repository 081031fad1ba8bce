use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default eLights REST endpoint.
pub const DEFAULT_API_URL: &str = "http://elights-int.holmlund.se/api";

/// Port the eLights server pushes value changes to.
pub const DEFAULT_PUSH_PORT: u16 = 18081;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

fn load_dotenv_from(env_path: &Path) {
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let mut value = value.trim();

            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            // Real environment wins over .env
            if std::env::var(key).is_err() {
                // SAFETY: called from main before the runtime starts any threads
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    pub listener: ListenerConfig,
    pub host: HostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the eLights API, without trailing slash.
    pub base_url: String,
    /// Upper bound for a single API request.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Where restored accessories are cached between runs.
    pub cache_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 10,
            },
            listener: ListenerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: DEFAULT_PUSH_PORT,
            },
            host: HostConfig {
                cache_path: default_cache_path(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ELIGHTS_API_URL") {
            config.remote.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(timeout) = std::env::var("ELIGHTS_TIMEOUT_SECS")
            && let Ok(t) = timeout.parse()
        {
            config.remote.timeout_secs = t;
        }
        if let Ok(addr) = std::env::var("PUSH_LISTENER_ADDR") {
            config.listener.bind_addr = addr;
        }
        if let Ok(port) = std::env::var("PUSH_LISTENER_PORT")
            && let Ok(p) = port.parse()
        {
            config.listener.port = p;
        }
        if let Ok(path) = std::env::var("ACCESSORY_CACHE_PATH") {
            config.host.cache_path = PathBuf::from(path);
        }

        config
    }

    /// Socket address string for the push listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listener.bind_addr, self.listener.port)
    }
}

/// `<data_dir>/elights-bridge/accessories.json`, falling back to the working directory.
pub fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("elights-bridge")
        .join("accessories.json")
}
