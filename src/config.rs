//! Layered runtime settings.
//!
//! Sources, later ones winning: built-in defaults, the optional file named
//! by `ATELIER_CONFIG`, then `ATELIER__*` environment variables
//! (`ATELIER__SERVER__PORT=8080`).

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::net::SocketAddr;

/// Environment variable naming an optional settings file.
pub const CONFIG_FILE_VAR: &str = "ATELIER_CONFIG";

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Persistence backend.
    pub database: DatabaseSettings,
    /// Local identity directory.
    #[serde(default)]
    pub directory: DirectorySettings,
    /// Event fan-out.
    pub notifications: NotificationSettings,
    /// Invitation expiry sweep.
    pub sweep: SweepSettings,
    /// Logging.
    pub telemetry: TelemetrySettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl ServerSettings {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`std::net::AddrParseError`] when host and port do not form a
    /// socket address.
    pub fn bind_address(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Persistence settings. Without a URL the in-memory adapters are used.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: Option<SecretString>,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

/// Local identity directory settings.
///
/// Profiles normally come from the identity provider; the seed file lets a
/// standalone deployment serve a fixed set of users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySettings {
    /// JSON array of user profiles loaded at startup.
    pub seed_file: Option<String>,
}

/// Event fan-out settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// Buffered events per subscriber before the oldest are dropped.
    pub channel_capacity: usize,
}

/// Expiry sweep settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSettings {
    /// Seconds between sweeps.
    pub interval_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Settings {
    /// Loads settings from defaults, the optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source cannot be read or the merged
    /// values do not deserialize.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_VAR).ok();
        Self::from_sources(file.as_deref(), Environment::with_prefix("ATELIER").separator("__"))
    }

    /// Builds settings from an optional file path and an environment source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source cannot be read or the merged
    /// values do not deserialize.
    pub fn from_sources(file: Option<&str>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("database.pool_size", 8)?
            .set_default("notifications.channel_capacity", 256)?
            .set_default("sweep.interval_secs", 3600)?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.json", false)?;
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path));
        }
        builder.add_source(environment).build()?.try_deserialize()
    }
}
