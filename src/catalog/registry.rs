//! Database and table registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::error::CatalogError;
use super::system::SystemTable;
use super::types::{DEFAULT_DATABASE, SYSTEM_DATABASE, TableDef};
use crate::heap::Table;

/// One database and its tables.
#[derive(Debug, Default)]
struct DatabaseEntry {
    /// The built-in `system` database. Its tables are virtual.
    builtin: bool,
    tables: BTreeMap<String, Arc<Table>>,
}

/// Snapshot of one database for `system.databases`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub name: String,
    pub engine: &'static str,
}

/// Registry of databases and their tables.
///
/// Catalog changes are not transactional: they take effect immediately and
/// are visible to every session. Table contents are versioned separately by
/// [`Table`].
#[derive(Debug)]
pub struct Catalog {
    databases: RwLock<BTreeMap<String, DatabaseEntry>>,
}

impl Catalog {
    /// Creates a catalog holding the `default` and `system` databases.
    pub fn new() -> Self {
        let mut databases = BTreeMap::new();
        databases.insert(DEFAULT_DATABASE.to_string(), DatabaseEntry::default());
        databases.insert(
            SYSTEM_DATABASE.to_string(),
            DatabaseEntry {
                builtin: true,
                tables: BTreeMap::new(),
            },
        );
        Self {
            databases: RwLock::new(databases),
        }
    }

    /// Returns true if the database exists.
    pub fn database_exists(&self, name: &str) -> bool {
        self.databases.read().contains_key(name)
    }

    /// Creates a database.
    ///
    /// Returns `Ok(false)` when it already exists and `if_not_exists` is set.
    pub fn create_database(&self, name: &str, if_not_exists: bool) -> Result<bool, CatalogError> {
        let mut databases = self.databases.write();
        if databases.contains_key(name) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(CatalogError::DatabaseAlreadyExists {
                name: name.to_string(),
            });
        }
        databases.insert(name.to_string(), DatabaseEntry::default());
        debug!(database = name, "database created");
        Ok(true)
    }

    /// Drops a database and all of its tables.
    pub fn drop_database(&self, name: &str, if_exists: bool) -> Result<bool, CatalogError> {
        let mut databases = self.databases.write();
        match databases.get(name) {
            None if if_exists => Ok(false),
            None => Err(CatalogError::UnknownDatabase {
                name: name.to_string(),
            }),
            Some(entry) if entry.builtin => Err(CatalogError::ReadOnlyDatabase {
                name: name.to_string(),
            }),
            Some(_) => {
                databases.remove(name);
                debug!(database = name, "database dropped");
                Ok(true)
            }
        }
    }

    /// Lists databases ordered by name.
    pub fn list_databases(&self) -> Vec<DatabaseInfo> {
        self.databases
            .read()
            .iter()
            .map(|(name, entry)| DatabaseInfo {
                name: name.clone(),
                engine: if entry.builtin { "Memory" } else { "Atomic" },
            })
            .collect()
    }

    /// Registers a new table.
    ///
    /// Returns `Ok(false)` when a table of that name exists and
    /// `if_not_exists` is set.
    pub fn create_table(&self, def: TableDef, if_not_exists: bool) -> Result<bool, CatalogError> {
        let mut databases = self.databases.write();
        let entry = databases
            .get_mut(&def.database)
            .ok_or_else(|| CatalogError::UnknownDatabase {
                name: def.database.clone(),
            })?;
        if entry.builtin {
            return Err(CatalogError::ReadOnlyDatabase {
                name: def.database.clone(),
            });
        }
        if entry.tables.contains_key(&def.name) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(CatalogError::TableAlreadyExists {
                database: def.database.clone(),
                name: def.name.clone(),
            });
        }
        debug!(table = %def.qualified_name(), engine = %def.engine, "table created");
        entry
            .tables
            .insert(def.name.clone(), Arc::new(Table::new(def)));
        Ok(true)
    }

    /// Removes a table.
    pub fn drop_table(
        &self,
        database: &str,
        name: &str,
        if_exists: bool,
    ) -> Result<bool, CatalogError> {
        let mut databases = self.databases.write();
        let entry = databases
            .get_mut(database)
            .ok_or_else(|| CatalogError::UnknownDatabase {
                name: database.to_string(),
            })?;
        if entry.builtin {
            return Err(CatalogError::ReadOnlyDatabase {
                name: database.to_string(),
            });
        }
        if entry.tables.remove(name).is_some() {
            debug!(table = %format!("{database}.{name}"), "table dropped");
            return Ok(true);
        }
        if if_exists {
            Ok(false)
        } else {
            Err(CatalogError::UnknownTable {
                database: database.to_string(),
                name: name.to_string(),
            })
        }
    }

    /// Looks up a user table.
    ///
    /// Sessions keep the returned handle for the duration of a statement, so
    /// a concurrent DROP does not invalidate it.
    pub fn get_table(&self, database: &str, name: &str) -> Result<Arc<Table>, CatalogError> {
        let databases = self.databases.read();
        let entry = databases
            .get(database)
            .ok_or_else(|| CatalogError::UnknownDatabase {
                name: database.to_string(),
            })?;
        entry
            .tables
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownTable {
                database: database.to_string(),
                name: name.to_string(),
            })
    }

    /// Resolves a table of the `system` database.
    pub fn get_system_table(&self, database: &str, name: &str) -> Option<SystemTable> {
        if database != SYSTEM_DATABASE {
            return None;
        }
        SystemTable::parse(name)
    }

    /// Returns true if `database` is the built-in read-only database.
    pub fn is_builtin(&self, database: &str) -> bool {
        self.databases
            .read()
            .get(database)
            .is_some_and(|entry| entry.builtin)
    }

    /// Lists the tables of every database, ordered by database then name.
    pub fn list_tables(&self) -> Vec<Arc<Table>> {
        self.databases
            .read()
            .values()
            .flat_map(|entry| entry.tables.values().cloned())
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, TableEngine};
    use crate::datum::Type;

    fn def(database: &str, name: &str) -> TableDef {
        TableDef {
            database: database.to_string(),
            name: name.to_string(),
            columns: vec![ColumnDef::new("id", Type::UInt64)],
            engine: TableEngine::MergeTree,
            order_by: vec!["id".to_string()],
        }
    }

    #[test]
    fn test_builtin_databases() {
        let catalog = Catalog::new();
        assert!(catalog.database_exists("default"));
        assert!(catalog.database_exists("system"));
        assert!(catalog.is_builtin("system"));
        assert!(!catalog.is_builtin("default"));

        let names: Vec<_> = catalog.list_databases().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["default", "system"]);
    }

    #[test]
    fn test_create_and_drop_database() {
        let catalog = Catalog::new();
        assert_eq!(catalog.create_database("analytics", false), Ok(true));
        assert_eq!(catalog.create_database("analytics", true), Ok(false));
        assert_eq!(
            catalog.create_database("analytics", false),
            Err(CatalogError::DatabaseAlreadyExists {
                name: "analytics".to_string()
            })
        );

        catalog.create_table(def("analytics", "events"), false).unwrap();
        assert_eq!(catalog.drop_database("analytics", false), Ok(true));
        assert!(!catalog.database_exists("analytics"));
        assert_eq!(catalog.drop_database("analytics", true), Ok(false));
        assert!(catalog.drop_database("analytics", false).is_err());
        assert!(catalog.get_table("analytics", "events").is_err());
    }

    #[test]
    fn test_system_database_is_read_only() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.drop_database("system", false),
            Err(CatalogError::ReadOnlyDatabase { .. })
        ));
        assert!(matches!(
            catalog.create_table(def("system", "t"), false),
            Err(CatalogError::ReadOnlyDatabase { .. })
        ));
        assert_eq!(
            catalog.get_system_table("system", "databases"),
            Some(SystemTable::Databases)
        );
        assert_eq!(catalog.get_system_table("default", "databases"), None);
    }

    #[test]
    fn test_create_and_drop_table() {
        let catalog = Catalog::new();
        assert_eq!(catalog.create_table(def("default", "t"), false), Ok(true));
        assert_eq!(catalog.create_table(def("default", "t"), true), Ok(false));
        assert!(matches!(
            catalog.create_table(def("default", "t"), false),
            Err(CatalogError::TableAlreadyExists { .. })
        ));
        assert!(matches!(
            catalog.create_table(def("missing", "t"), false),
            Err(CatalogError::UnknownDatabase { .. })
        ));

        let table = catalog.get_table("default", "t").unwrap();
        assert_eq!(table.def().name, "t");
        assert_eq!(catalog.list_tables().len(), 1);

        assert_eq!(catalog.drop_table("default", "t", false), Ok(true));
        assert_eq!(catalog.drop_table("default", "t", true), Ok(false));
        assert!(matches!(
            catalog.get_table("default", "t"),
            Err(CatalogError::UnknownTable { .. })
        ));
    }
}
