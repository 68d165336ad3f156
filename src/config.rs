//! # Configuration
//!
//! Process-wide settings: listener address, race deadline, the sources to
//! race, and logging.
//!
//! Settings are layered: built-in defaults, then an optional file (any
//! format the `config` crate understands), then `CEP_RACE__*` environment
//! variables, e.g. `CEP_RACE__RACE__TIMEOUT_MS=500`.
//!
//! # Examples
//!
//! ```
//! use cep_race::config::AppConfig;
//!
//! let config = AppConfig::default();
//! assert_eq!(config.race.timeout_ms, 1000);
//! assert_eq!(config.registry().unwrap().len(), 3);
//! ```

use crate::application::services::race_executor::RaceConfig;
use crate::infrastructure::sources::registry::{RegistryError, SourceDescriptor, SourceRegistry};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// Prefix of environment variables read by [`AppConfig::load`].
pub const ENV_PREFIX: &str = "CEP_RACE";

/// Separator between nested keys in environment variables.
pub const ENV_SEPARATOR: &str = "__";

/// Default listener address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default tracing filter directives.
pub const DEFAULT_LOG_FILTER: &str = "cep_race=info,tower_http=debug";

/// Error raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be read or deserialized.
    #[error("configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    /// The configured sources are inconsistent.
    #[error("invalid sources: {0}")]
    Registry(#[from] RegistryError),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind_addr {}: {}", self.bind_addr, e)))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Race deadline.
    pub race: RaceConfig,
    /// Sources to race; the built-in services when absent.
    pub sources: Option<Vec<SourceDescriptor>>,
    /// Logging.
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads configuration from an optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed, or a
    /// value is invalid.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = path.map(|p| config::File::with_name(p).required(true));
        Self::build(file, environment())
    }

    fn build<F>(file: Option<F>, env: config::Environment) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(file);
        }
        let settings = builder.add_source(env).build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero timeout, an unparseable bind
    /// address, or an inconsistent source list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.race.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "race.timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.server.socket_addr()?;
        self.registry()?;
        Ok(())
    }

    /// Builds the source registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if configured sources are inconsistent.
    pub fn registry(&self) -> Result<SourceRegistry, RegistryError> {
        match &self.sources {
            Some(sources) => SourceRegistry::new(sources.clone()),
            None => Ok(SourceRegistry::builtin()),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
