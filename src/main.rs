//! rolecheck: Redis replication role health checks over HTTP.
//!
//! This is the application entry point. It parses flags, loads the optional
//! configuration file, initializes tracing, builds the Redis role client,
//! sets up the Axum router and runs the HTTP server until a shutdown signal.

use std::path::Path;

use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rolecheck::config::{AppConfig, CliOverrides, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use rolecheck::http::start_server;
use rolecheck::store::RedisRoleClient;
use rolecheck::{create_router, AppState};

/// rolecheck: report a Redis server's replication role over HTTP
#[derive(Parser, Debug)]
#[command(name = "rolecheck", version, about, disable_help_flag = true)]
struct Args {
    /// Redis-server auth password
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Redis-server listening IP
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// Redis-server listening port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Redis-server listening unix socket (takes precedence over host/port)
    #[arg(short = 's', long)]
    socket: Option<String>,

    /// Path to a configuration file (default: /etc/rolecheck.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Address the health endpoints listen on
    #[arg(long)]
    listen_host: Option<String>,

    /// Port the health endpoints listen on
    #[arg(long)]
    listen_port: Option<u16>,

    /// Log level filter (e.g., "rolecheck=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            redis_host: self.host.clone(),
            redis_port: self.port,
            redis_socket: self.socket.clone(),
            redis_password: self.password.clone(),
            listen_host: self.listen_host.clone(),
            listen_port: self.listen_port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration: defaults < config file < command-line flags
    let config_path = args.config.clone().or_else(|| {
        Path::new(DEFAULT_CONFIG_PATH)
            .exists()
            .then(|| DEFAULT_CONFIG_PATH.to_string())
    });
    let config = match &config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .apply_overrides(args.overrides())?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(config = ?config_path, "Loaded configuration");

    let store = RedisRoleClient::new(&config.redis)?;
    tracing::info!(
        redis = %store.target(),
        has_auth = config.redis.has_password(),
        timeout_seconds = config.redis.timeout_seconds,
        "Redis server configured"
    );

    let state = AppState::new(store);
    let app = create_router(state);

    start_server(app, &config).await?;

    Ok(())
}
