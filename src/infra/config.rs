//! For reading application configuration.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Gateway configuration.
    pub gateway: GatewayConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
}

/// Server tier configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Server address.
    pub http_address: String,
    /// Server http port.
    pub http_port: u16,
    /// How long a single request may take.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

/// Gateway tier configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayConfig {
    /// Gateway address.
    pub http_address: String,
    /// Gateway http port.
    pub http_port: u16,
    /// Base URL of the server tier, e.g. `http://localhost:9090`.
    pub server_url: String,
    /// How long a single request may take, including the forwarded call.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

/// Database configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// The database username.
    pub username: String,
    /// The database password.
    pub password: String,
    /// The database port.
    pub port: u16,
    /// The database name.
    pub database_name: String,
    /// The database host.
    pub host: String,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Retrieve [`Config`] from the default configuration file.
#[tracing::instrument]
pub fn load_config() -> color_eyre::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("config"))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?
        .try_deserialize()?;
    Ok(config)
}
