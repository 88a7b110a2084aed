//! Server configuration loaded from TOML.
//!
//! ```toml
//! listen = "127.0.0.1:9100"
//! display_name = "colhouse"
//! version = "23.8.1.1"
//! time_zone = "UTC"
//! isolation = "read_committed"
//! log_level = "info"
//!
//! [[users]]
//! name = "default"
//!
//! [[users]]
//! name = "reader"
//! password = "secret"
//! readonly = 2
//! ```
//!
//! Every key is optional; missing keys take the values of
//! [`ServerConfig::default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{DEFAULT_DATABASE, ReadOnlyLevel, User};
use crate::tx::IsolationLevel;

/// Default upper bound of a protocol frame payload (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A user account declared in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    /// Omitted means no password is required.
    #[serde(default)]
    pub password: Option<String>,
    /// Read-only level 0, 1 or 2.
    #[serde(default)]
    pub readonly: u64,
}

impl UserConfig {
    /// Converts into a full-access [`User`].
    pub fn to_user(&self) -> Result<User, ConfigError> {
        let readonly = ReadOnlyLevel::from_u64(self.readonly).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "user {}: readonly must be 0, 1 or 2, got {}",
                self.name, self.readonly
            ))
        })?;
        Ok(User::new(self.name.clone(), self.password.clone(), readonly))
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// TCP listen address.
    pub listen: String,
    /// Name reported to clients.
    pub display_name: String,
    /// Server version reported to clients (`major.minor[.patch[.build]]`).
    pub version: String,
    /// Server time zone reported to clients.
    pub time_zone: String,
    /// Database used when a client does not name one.
    pub default_database: String,
    pub isolation: IsolationLevel,
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    pub log_level: String,
    pub max_frame_size: usize,
    pub users: Vec<UserConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:9100".to_string(),
            display_name: "colhouse".to_string(),
            version: "23.8.1.1".to_string(),
            time_zone: "UTC".to_string(),
            default_database: DEFAULT_DATABASE.to_string(),
            isolation: IsolationLevel::default(),
            log_level: "info".to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            users: vec![UserConfig {
                name: "default".to_string(),
                password: None,
                readonly: 0,
            }],
        }
    }
}

impl ServerConfig {
    /// Loads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::Invalid("at least one user is required".to_string()));
        }
        for (i, user) in self.users.iter().enumerate() {
            if self.users[..i].iter().any(|u| u.name == user.name) {
                return Err(ConfigError::Invalid(format!("duplicate user {}", user.name)));
            }
            user.to_user()?;
        }
        if self.max_frame_size == 0 {
            return Err(ConfigError::Invalid("max_frame_size must be positive".to_string()));
        }
        if self.version.split('.').next().is_none_or(|major| major.parse::<u32>().is_err()) {
            return Err(ConfigError::Invalid(format!("invalid version {}", self.version)));
        }
        Ok(())
    }
}
