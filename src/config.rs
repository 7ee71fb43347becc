//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file, applies
//! command-line overrides, and defines defaults for the HTTP listener, the
//! Redis connection target and logging. `AppConfig` is the root configuration
//! struct; it is built once at startup and never mutated afterwards.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// HTTP Listener Defaults
// =============================================================================

/// Default listen address for the health endpoints
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default listen port for the health endpoints
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Seconds to wait for in-flight probes when shutting down
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

/// Health verdicts must never be served from an intermediary cache
pub const CACHE_CONTROL_STATUS: &str = "no-store";

// =============================================================================
// Redis Connection Defaults
// =============================================================================

/// Default Redis host
pub const DEFAULT_REDIS_HOST: &str = "localhost";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Upper bound for connecting to Redis and for the ROLE query (each)
pub const DEFAULT_REDIS_TIMEOUT_SECS: u64 = 3;

// =============================================================================
// Logging and Paths
// =============================================================================

/// Crate name used as the log target prefix
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=info,tower_http=info", CRATE_NAME);

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Configuration file shipped with packages
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rolecheck.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Redis server whose role is reported
    #[serde(default)]
    pub redis: RedisConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HTTP_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_HTTP_PORT
    }
}

/// Connection parameters for the monitored Redis server
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis hostname or IP
    #[serde(default = "RedisConfig::default_host")]
    pub host: String,
    /// Redis TCP port
    #[serde(default = "RedisConfig::default_port")]
    pub port: u16,
    /// Unix socket path (takes precedence over host/port when non-empty)
    pub socket: Option<String>,
    /// AUTH password
    pub password: Option<String>,
    /// Connect and query timeout in seconds
    #[serde(default = "RedisConfig::default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            socket: None,
            password: None,
            timeout_seconds: Self::default_timeout(),
        }
    }
}

/// Where the Redis server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Tcp { host: String, port: u16 },
    Unix(String),
}

impl std::fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreTarget::Tcp { host, port } => write!(f, "{}:{}", host, port),
            StoreTarget::Unix(path) => write!(f, "unix:{}", path),
        }
    }
}

impl RedisConfig {
    fn default_host() -> String {
        DEFAULT_REDIS_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_REDIS_PORT
    }

    fn default_timeout() -> u64 {
        DEFAULT_REDIS_TIMEOUT_SECS
    }

    /// Resolve the connection target. A non-empty socket path wins.
    pub fn target(&self) -> StoreTarget {
        match self.socket.as_deref() {
            Some(path) if !path.is_empty() => StoreTarget::Unix(path.to_string()),
            _ => StoreTarget::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    /// Check if a non-empty password is configured
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Build the connection URL understood by the redis client.
    pub fn connection_url(&self) -> String {
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| urlencoding::encode(p).into_owned());

        match self.target() {
            StoreTarget::Tcp { host, port } => {
                let host = url_host(&host);
                match password {
                    Some(pass) => format!("redis://:{}@{}:{}/", pass, host, port),
                    None => format!("redis://{}:{}/", host, port),
                }
            }
            StoreTarget::Unix(path) => match password {
                Some(pass) => format!("redis+unix://{}?pass={}", path, pass),
                None => format!("redis+unix://{}", path),
            },
        }
    }
}

/// IPv6 literals need brackets inside a URL authority.
fn url_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Values supplied on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub redis_host: Option<String>,
    pub redis_port: Option<u16>,
    pub redis_socket: Option<String>,
    pub redis_password: Option<String>,
    pub listen_host: Option<String>,
    pub listen_port: Option<u16>,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line values on top of the loaded configuration.
    pub fn apply_overrides(mut self, overrides: CliOverrides) -> Result<Self, ConfigError> {
        if let Some(host) = overrides.redis_host {
            self.redis.host = host;
        }
        if let Some(port) = overrides.redis_port {
            self.redis.port = port;
        }
        if let Some(socket) = overrides.redis_socket {
            self.redis.socket = Some(socket);
        }
        if let Some(password) = overrides.redis_password {
            self.redis.password = Some(password);
        }
        if let Some(host) = overrides.listen_host {
            self.http.host = host;
        }
        if let Some(port) = overrides.listen_port {
            self.http.port = port;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.redis.port == 0 && matches!(self.redis.target(), StoreTarget::Tcp { .. }) {
            return Err(ConfigError::Validation(
                "redis.port must be non-zero".to_string(),
            ));
        }
        if self.redis.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "redis.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
