//! Catalog-specific errors.

use thiserror::Error;

use super::types::TableEngine;
use crate::error_code::ErrorCode;

/// Errors that can occur during catalog and access-control operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("database {name} does not exist")]
    UnknownDatabase { name: String },

    #[error("database {name} already exists")]
    DatabaseAlreadyExists { name: String },

    #[error("table {database}.{name} does not exist")]
    UnknownTable { database: String, name: String },

    #[error("table {database}.{name} already exists")]
    TableAlreadyExists { database: String, name: String },

    #[error("column {name} specified more than once")]
    DuplicateColumn { name: String },

    #[error("unknown data type {name}")]
    UnknownType { name: String },

    #[error("unknown table engine {name}")]
    UnknownStorage { name: String },

    /// Engine clause is malformed (arguments, missing sorting key).
    #[error("storage {engine}: {message}")]
    EngineArguments {
        engine: TableEngine,
        message: String,
    },

    #[error("sorting key column {name} is not a column of the table")]
    UnknownKeyColumn { name: String },

    /// The built-in `system` database cannot be modified.
    #[error("database {name} is read-only")]
    ReadOnlyDatabase { name: String },

    #[error("there is no user {name}")]
    UnknownUser { name: String },

    #[error("user {name} already exists")]
    UserAlreadyExists { name: String },

    #[error("{name}: authentication failed: wrong password or no such user")]
    AuthenticationFailed { name: String },
}

impl CatalogError {
    /// Numeric error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::UnknownDatabase { .. } => ErrorCode::UNKNOWN_DATABASE,
            CatalogError::DatabaseAlreadyExists { .. } => ErrorCode::DATABASE_ALREADY_EXISTS,
            CatalogError::UnknownTable { .. } => ErrorCode::UNKNOWN_TABLE,
            CatalogError::TableAlreadyExists { .. } => ErrorCode::TABLE_ALREADY_EXISTS,
            CatalogError::DuplicateColumn { .. } => ErrorCode::DUPLICATE_COLUMN,
            CatalogError::UnknownType { .. } => ErrorCode::UNKNOWN_TYPE,
            CatalogError::UnknownStorage { .. } => ErrorCode::UNKNOWN_STORAGE,
            CatalogError::EngineArguments { .. } => ErrorCode::NUMBER_OF_ARGUMENTS_DOESNT_MATCH,
            CatalogError::UnknownKeyColumn { .. } => ErrorCode::UNKNOWN_IDENTIFIER,
            CatalogError::ReadOnlyDatabase { .. } => ErrorCode::DATABASE_ACCESS_DENIED,
            CatalogError::UnknownUser { .. } => ErrorCode::UNKNOWN_USER,
            CatalogError::UserAlreadyExists { .. } => ErrorCode::ACCESS_ENTITY_ALREADY_EXISTS,
            CatalogError::AuthenticationFailed { .. } => ErrorCode::AUTHENTICATION_FAILED,
        }
    }
}
