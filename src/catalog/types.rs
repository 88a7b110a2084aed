//! Catalog data types for databases, tables and columns.

use std::fmt;

use super::error::CatalogError;
use crate::datum::Type;
use crate::sql::{CreateTableStmt, Expr};

/// Name of the database every session starts in by default.
pub const DEFAULT_DATABASE: &str = "default";

/// Name of the built-in, read-only database holding the system tables.
pub const SYSTEM_DATABASE: &str = "system";

/// Table engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableEngine {
    /// Plain in-memory table. Not transactional.
    Memory,
    /// Sorted, transactional table. Requires an ORDER BY key.
    MergeTree,
}

impl TableEngine {
    /// Returns the engine name as written in DDL.
    pub fn name(self) -> &'static str {
        match self {
            TableEngine::Memory => "Memory",
            TableEngine::MergeTree => "MergeTree",
        }
    }

    /// Parses an engine name (case-sensitive).
    pub fn parse(name: &str) -> Option<TableEngine> {
        match name {
            "Memory" => Some(TableEngine::Memory),
            "MergeTree" => Some(TableEngine::MergeTree),
            _ => None,
        }
    }

    /// Returns true if writes to this engine can take part in an explicit
    /// transaction.
    pub fn is_transactional(self) -> bool {
        matches!(self, TableEngine::MergeTree)
    }
}

impl fmt::Display for TableEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub ty: Type,
}

impl ColumnDef {
    /// Creates a new ColumnDef.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Validated table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Owning database.
    pub database: String,
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Engine.
    pub engine: TableEngine,
    /// Sorting key columns (empty for Memory and `ORDER BY tuple()`).
    pub order_by: Vec<String>,
}

impl TableDef {
    /// Builds a table definition from a parsed CREATE TABLE statement.
    ///
    /// `database` is the already resolved target database. A missing
    /// ENGINE clause defaults to `Memory`; `MergeTree` falls back to the
    /// PRIMARY KEY when ORDER BY is absent.
    pub fn from_stmt(database: &str, stmt: &CreateTableStmt) -> Result<TableDef, CatalogError> {
        let mut columns: Vec<ColumnDef> = Vec::with_capacity(stmt.columns.len());
        for spec in &stmt.columns {
            if columns.iter().any(|c| c.name == spec.name) {
                return Err(CatalogError::DuplicateColumn {
                    name: spec.name.clone(),
                });
            }
            let ty = Type::parse(&spec.type_name).ok_or_else(|| CatalogError::UnknownType {
                name: spec.type_name.clone(),
            })?;
            columns.push(ColumnDef::new(spec.name.clone(), ty));
        }

        let (engine, args): (TableEngine, &[Expr]) = match &stmt.engine {
            None => (TableEngine::Memory, &[]),
            Some(spec) => (
                TableEngine::parse(&spec.name).ok_or_else(|| CatalogError::UnknownStorage {
                    name: spec.name.clone(),
                })?,
                &spec.args,
            ),
        };
        if !args.is_empty() {
            return Err(CatalogError::EngineArguments {
                engine,
                message: "engine takes no arguments".to_string(),
            });
        }

        let key = stmt.order_by.as_ref().or(stmt.primary_key.as_ref());
        let order_by = match (engine, key) {
            (TableEngine::MergeTree, None) => {
                return Err(CatalogError::EngineArguments {
                    engine,
                    message: "ORDER BY or PRIMARY KEY clause is missing".to_string(),
                });
            }
            (_, Some(key)) => key.clone(),
            (_, None) => vec![],
        };
        for key_column in &order_by {
            if !columns.iter().any(|c| &c.name == key_column) {
                return Err(CatalogError::UnknownKeyColumn {
                    name: key_column.clone(),
                });
            }
        }

        Ok(TableDef {
            database: database.to_string(),
            name: stmt.table.name.clone(),
            columns,
            engine,
            order_by,
        })
    }

    /// Returns `database.name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    /// Returns the position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
