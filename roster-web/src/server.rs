//! Roster Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use roster_core::RosterConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main roster web server
pub struct RosterServer {
    config: RosterConfig,
    state: AppState,
}

impl RosterServer {
    /// Create a new server, opening the record store
    pub async fn new(config: RosterConfig) -> WebResult<Self> {
        let state = AppState::new(&config).await?;

        Ok(Self { config, state })
    }

    /// Start the web server and run until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.server.address();

        info!("Starting roster web server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.server.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        // Never resolve, the server keeps running
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for RosterServer
pub struct RosterServerBuilder {
    config: RosterConfig,
}

impl RosterServerBuilder {
    /// Create a builder over an already loaded configuration
    pub fn new(config: RosterConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database.url = Some(database_url.into());
        self
    }

    /// Validate the configuration and build the server
    pub async fn build(self) -> WebResult<RosterServer> {
        self.config.validate()?;
        RosterServer::new(self.config).await
    }
}

impl Default for RosterServerBuilder {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}
