//! Shared server state: catalog, users and transaction manager.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::catalog::{Catalog, UserDirectory};
use crate::config::{ConfigError, ServerConfig};
use crate::tx::{IsolationLevel, TransactionManager};

/// Identity the server reports to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub display_name: String,
    pub version: String,
    pub time_zone: String,
}

/// Database orchestrates the components every session shares.
///
/// One `Database` backs all sessions of a server; it is usually held in an
/// `Arc` and handed to [`Session::open`](super::Session::open).
pub struct Database {
    catalog: Catalog,
    users: UserDirectory,
    tx_manager: TransactionManager,
    info: ServerInfo,
    isolation: IsolationLevel,
    default_database: String,
    next_session_id: AtomicU64,
}

impl Database {
    /// Builds a database from a validated config.
    ///
    /// The configured default database is created if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn new(config: &ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let users = UserDirectory::new();
        for user in &config.users {
            users.add(user.to_user()?);
        }

        let catalog = Catalog::new();
        catalog
            .create_database(&config.default_database, true)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        info!(
            version = %config.version,
            time_zone = %config.time_zone,
            isolation = %config.isolation,
            users = config.users.len(),
            "database initialized"
        );

        Ok(Self {
            catalog,
            users,
            tx_manager: TransactionManager::new(),
            info: ServerInfo {
                display_name: config.display_name.clone(),
                version: config.version.clone(),
                time_zone: config.time_zone.clone(),
            },
            isolation: config.isolation,
            default_database: config.default_database.clone(),
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Returns a reference to the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns a reference to the user directory.
    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Returns a reference to the transaction manager.
    pub fn tx_manager(&self) -> &TransactionManager {
        &self.tx_manager
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Database a session starts in when the client names none.
    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    pub(crate) fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;

    #[test]
    fn test_new_from_default_config() {
        let db = Database::new(&ServerConfig::default()).unwrap();
        assert!(db.catalog().database_exists("default"));
        assert!(db.catalog().database_exists("system"));
        assert!(db.users().get("default").is_some());
        assert_eq!(db.isolation(), IsolationLevel::ReadCommitted);
        assert_eq!(db.info().display_name, "colhouse");
        assert_ne!(db.next_session_id(), db.next_session_id());
    }

    #[test]
    fn test_new_creates_default_database() {
        let config = ServerConfig {
            default_database: "analytics".to_string(),
            users: vec![UserConfig {
                name: "dba".to_string(),
                password: Some("dba".to_string()),
                readonly: 0,
            }],
            ..ServerConfig::default()
        };
        let db = Database::new(&config).unwrap();
        assert!(db.catalog().database_exists("analytics"));
        assert_eq!(db.default_database(), "analytics");
        assert!(db.users().authenticate("dba", "dba").is_ok());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ServerConfig {
            users: Vec::new(),
            ..ServerConfig::default()
        };
        assert!(Database::new(&config).is_err());
    }
}
