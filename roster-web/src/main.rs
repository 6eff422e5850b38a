//! Roster Web Server
//!
//! Student records service with login-gated, role-restricted access.

use anyhow::Context;
use clap::Parser;
use roster_core::RosterConfig;
use roster_web::{init_logging, RosterServer};
use std::path::PathBuf;
use tracing::{error, info};

/// Roster Web Server - student records behind bearer-token authentication
#[derive(Parser)]
#[command(name = "roster-web")]
#[command(about = "Student records web service")]
#[command(version)]
struct Args {
    /// TOML configuration file (defaults to roster.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL; the in-memory store is used when unset
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

impl Args {
    /// Command-line flags win over every other configuration source
    fn apply(self, config: &mut RosterConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = Some(url);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.dev {
            config.server.dev_mode = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = Args::parse();
    let config_path = args.config.take();

    let mut config = RosterConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config.logging)?;

    if let Err(e) = config.validate() {
        e.log();
        return Err(e).context("Invalid configuration");
    }

    info!(
        address = %config.server.address(),
        database = config.database.url.as_deref().unwrap_or("in-memory"),
        dev_mode = config.server.dev_mode,
        "Configuration loaded"
    );

    let server = RosterServer::new(config)
        .await
        .context("Failed to build server")?;

    if let Err(e) = server.start().await {
        error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
