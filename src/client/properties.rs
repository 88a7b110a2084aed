//! Connection properties.
//!
//! Properties can be built from string key/value pairs, the way JDBC
//! `Properties` are passed around, or with the builder methods.

use crate::error_code::ErrorCode;

use super::error::SqlError;

pub const PROP_USER: &str = "user";
pub const PROP_PASSWORD: &str = "password";
pub const PROP_DATABASE: &str = "database";
pub const PROP_TRANSACTION_SUPPORT: &str = "transactionSupport";
pub const PROP_AUTO_COMMIT: &str = "autoCommit";
pub const PROP_CREATE_DATABASE: &str = "createDatabaseIfNotExist";
pub const PROP_SERVER_VERSION: &str = "server_version";
pub const PROP_SERVER_TIME_ZONE: &str = "server_time_zone";

/// Settings a connection is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProperties {
    pub user: String,
    pub password: String,
    /// `None` uses the server's default database.
    pub database: Option<String>,
    /// Wrap manual-commit work in server transactions.
    pub transaction_support: bool,
    pub auto_commit: bool,
    /// Run `CREATE DATABASE IF NOT EXISTS` on connect.
    pub create_database_if_not_exist: bool,
    /// Assumed server version. Together with `server_time_zone` this skips
    /// the server info probe.
    pub server_version: Option<String>,
    pub server_time_zone: Option<String>,
    pub client_name: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            user: "default".to_string(),
            password: String::new(),
            database: None,
            transaction_support: false,
            auto_commit: true,
            create_database_if_not_exist: false,
            server_version: None,
            server_time_zone: None,
            client_name: concat!("colhouse-driver/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConnectionProperties {
    /// Builds properties from key/value pairs on top of the defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SqlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut properties = Self::default();
        for (key, value) in pairs {
            properties.set(key.as_ref(), value.as_ref())?;
        }
        Ok(properties)
    }

    /// Sets one property by its key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SqlError> {
        match key {
            PROP_USER => self.user = value.to_string(),
            PROP_PASSWORD => self.password = value.to_string(),
            PROP_DATABASE => self.database = Some(value.to_string()).filter(|d| !d.is_empty()),
            PROP_TRANSACTION_SUPPORT => self.transaction_support = parse_bool(key, value)?,
            PROP_AUTO_COMMIT => self.auto_commit = parse_bool(key, value)?,
            PROP_CREATE_DATABASE => self.create_database_if_not_exist = parse_bool(key, value)?,
            PROP_SERVER_VERSION => self.server_version = Some(value.to_string()),
            PROP_SERVER_TIME_ZONE => self.server_time_zone = Some(value.to_string()),
            _ => {
                return Err(SqlError::new(
                    ErrorCode::UNKNOWN_SETTING,
                    format!("unknown connection property {key}"),
                ));
            }
        }
        Ok(())
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_transaction_support(mut self, enabled: bool) -> Self {
        self.transaction_support = enabled;
        self
    }

    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    pub fn with_create_database(mut self, enabled: bool) -> Self {
        self.create_database_if_not_exist = enabled;
        self
    }

    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    pub fn with_server_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.server_time_zone = Some(time_zone.into());
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SqlError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SqlError::new(
            ErrorCode::CANNOT_PARSE_TEXT,
            format!("invalid boolean '{value}' for connection property {key}"),
        )),
    }
}
