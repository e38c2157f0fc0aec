use std::{env, time::Duration};

use balcao_common::Secret;
use log::*;
use mpago_tools::MpagoConfig;

const DEFAULT_BPP_HOST: &str = "127.0.0.1";
const DEFAULT_BPP_PORT: u16 = 8360;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often a registered poll loop asks the gateway for a payment's status.
    pub poll_interval: Duration,
    pub messenger: MessengerConfig,
    pub mpago: MpagoConfig,
}

/// The WhatsApp-gateway-style messaging service the customer notifications go to.
#[derive(Clone, Debug, Default)]
pub struct MessengerConfig {
    pub base_url: String,
    pub api_key: Secret,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BPP_HOST.to_string(),
            port: DEFAULT_BPP_PORT,
            database_url: String::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            messenger: MessengerConfig::default(),
            mpago: MpagoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BPP_HOST").ok().unwrap_or_else(|| DEFAULT_BPP_HOST.into());
        let port = env::var("BPP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BPP_PORT. {e} Using the default, {DEFAULT_BPP_PORT}, instead."
                    );
                    DEFAULT_BPP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BPP_PORT);
        let database_url = env::var("BPP_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ BPP_DATABASE_URL is not set. Using the default, sqlite://data/balcao.db");
            "sqlite://data/balcao.db".to_string()
        });
        let poll_interval = env::var("BPP_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let messenger = MessengerConfig::from_env_or_default();
        let mpago = MpagoConfig::new_from_env_or_default();
        Self { host, port, database_url, poll_interval, messenger, mpago }
    }
}

impl MessengerConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("BPP_MESSENGER_URL").unwrap_or_else(|_| {
            warn!("🪛️ BPP_MESSENGER_URL is not set. Customer notifications will fail.");
            "http://localhost:8080".to_string()
        });
        let api_key = Secret::new(env::var("BPP_MESSENGER_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ BPP_MESSENGER_API_KEY is not set, using (probably useless) default");
            String::default()
        }));
        Self { base_url, api_key }
    }
}
