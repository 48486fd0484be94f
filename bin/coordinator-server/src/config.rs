//! Configuration management for the multisig coordinator server.
//!
//! This module provides configuration loading from both base configuration file
//! and environment variables. Environment variables override the base configuration
//! and use the prefix `ALPHMULTISIG_`.

use core::time::Duration;
use std::path::PathBuf;

use alephium_multisig_coordinator_domain::network::NetworkId;
use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Loads the application configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys.
/// For example, `ALPHMULTISIG_APP__LISTEN` corresponds to `app.listen`.
///
/// # Errors
///
/// If the configuration could not be loaded or parsed
pub fn get_configuration() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(
            Environment::with_prefix(Config::CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all application settings.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Application-specific configuration
    pub app: AppConfig,

    /// Local descriptor storage configuration
    pub store: StoreConfig,

    /// Node and explorer configuration
    pub network: NetworkConfig,
}

/// Application-specific configuration settings.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// The address to listen on (e.g., "0.0.0.0:59060")
    pub listen: String,

    /// CORS allowed origins (e.g., ["http://localhost:3000", "https://example.com"])
    /// Use ["*"] to allow all origins
    pub cors_allowed_origins: Vec<String>,
}

/// Local descriptor storage settings.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per stored key
    pub data_dir: PathBuf,
}

/// Node and explorer settings.
#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    /// The network to operate on
    pub network_id: NetworkId,

    /// Full node REST endpoint, defaults to the network's public node
    #[serde(default)]
    pub node_url: Option<String>,

    /// Explorer backend endpoint, defaults to the network's public explorer
    #[serde(default)]
    pub explorer_url: Option<String>,

    /// Value of the `X-API-KEY` header sent to the node
    #[serde(default)]
    pub node_api_key: Option<String>,

    /// Request timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Explorer lookups after submission before reporting the tx as unconfirmed
    pub poll_attempts: u32,

    /// Delay between explorer lookups
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl NetworkConfig {
    /// Returns the configured node URL or the network default.
    pub fn node_url(&self) -> &str {
        self.node_url.as_deref().unwrap_or(self.network_id.default_node_url())
    }

    /// Returns the configured explorer URL or the network default.
    pub fn explorer_url(&self) -> &str {
        self.explorer_url.as_deref().unwrap_or(self.network_id.default_explorer_url())
    }
}

impl Config {
    const CONFIG_ENV_PREFIX: &str = "ALPHMULTISIG";
}
