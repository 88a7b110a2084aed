//! Virtual tables of the `system` database.

use super::types::ColumnDef;
use crate::datum::Type;

/// A table of the `system` database.
///
/// System tables have no storage; the executor materializes their rows from
/// the catalog and the user directory at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTable {
    /// `system.databases(name, engine)`
    Databases,
    /// `system.tables(database, name, engine, total_rows)`
    Tables,
    /// `system.one(dummy)`: exactly one row.
    One,
    /// `system.users(name, readonly)`
    Users,
}

impl SystemTable {
    pub fn name(self) -> &'static str {
        match self {
            SystemTable::Databases => "databases",
            SystemTable::Tables => "tables",
            SystemTable::One => "one",
            SystemTable::Users => "users",
        }
    }

    pub fn parse(name: &str) -> Option<SystemTable> {
        match name {
            "databases" => Some(SystemTable::Databases),
            "tables" => Some(SystemTable::Tables),
            "one" => Some(SystemTable::One),
            "users" => Some(SystemTable::Users),
            _ => None,
        }
    }

    /// Column layout of the table.
    pub fn columns(self) -> Vec<ColumnDef> {
        match self {
            SystemTable::Databases => vec![
                ColumnDef::new("name", Type::String),
                ColumnDef::new("engine", Type::String),
            ],
            SystemTable::Tables => vec![
                ColumnDef::new("database", Type::String),
                ColumnDef::new("name", Type::String),
                ColumnDef::new("engine", Type::String),
                ColumnDef::new("total_rows", Type::UInt64),
            ],
            SystemTable::One => vec![ColumnDef::new("dummy", Type::UInt8)],
            SystemTable::Users => vec![
                ColumnDef::new("name", Type::String),
                ColumnDef::new("readonly", Type::UInt8),
            ],
        }
    }
}
