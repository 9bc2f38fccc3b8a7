//! Global application state.
//!
//! Used for access to common resources such as a
//! database pool or a preconfigured http client.

use super::{config::Config, database::DbPool};
use crate::gateway::client::ServerClient;
use axum::extract::FromRef;

/// State of the server tier.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    db: DbPool,
    config: Config,
}

impl AppState {
    /// Constructs a new [`AppState`].
    pub fn new(db: DbPool, config: Config) -> Self {
        Self { db, config }
    }

    /// Returns the database pool.
    pub fn db(&self) -> &DbPool {
        &self.db
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// State of the gateway tier.
#[derive(Clone, Debug, FromRef)]
pub struct GatewayState {
    client: ServerClient,
}

impl GatewayState {
    /// Constructs a new [`GatewayState`] forwarding to `server_url`.
    pub fn new(server_url: &str) -> Self {
        let client = ServerClient::new(reqwest::Client::new(), server_url);
        Self { client }
    }

    /// Returns the client for the server tier.
    pub fn client(&self) -> &ServerClient {
        &self.client
    }
}
