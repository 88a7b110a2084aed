//! Executor-specific errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::datum::CoercionError;
use crate::error_code::ErrorCode;
use crate::heap::HeapError;

/// Errors that can occur during statement execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    /// Catalog error during table, database or user lookup.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Storage conflict.
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// Referenced column does not exist.
    #[error("missing columns: '{name}'")]
    UnknownColumn { name: String },

    #[error("column {name} specified more than once")]
    DuplicateColumn { name: String },

    #[error("unknown function {name}")]
    UnknownFunction { name: String },

    #[error("function {function} requires {expected} argument(s), passed {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    /// An INSERT row has the wrong number of values.
    #[error("number of columns doesn't match: expected {expected}, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    /// A value could not be stored in a column.
    #[error("column {column}: {source}")]
    Coercion {
        column: String,
        #[source]
        source: CoercionError,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivisionByZero,

    /// Column referenced outside of an aggregate in an aggregating SELECT.
    #[error("column {name} is not under aggregate function")]
    NotAnAggregate { name: String },

    /// A bare `INSERT INTO t` reached the server without data.
    #[error("no data to insert")]
    NoDataToInsert,

    /// A `?` placeholder was sent to the server unbound.
    #[error("query parameter #{index} was not set")]
    UnboundParameter { index: usize },

    /// Write to a non-transactional table inside an explicit transaction.
    #[error("table {table} with engine {engine} does not support transactions")]
    NotTransactional { table: String, engine: String },

    #[error("{user}: not enough privileges to {privilege} on {target}")]
    AccessDenied {
        user: String,
        privilege: String,
        target: String,
    },

    #[error("unknown setting {name}")]
    UnknownSetting { name: String },

    #[error("invalid value {value} for setting {name}")]
    InvalidSettingValue { name: String, value: String },

    /// Statement that the executor does not handle (session-level statements).
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl ExecutorError {
    /// Numeric error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecutorError::Catalog(e) => e.code(),
            ExecutorError::Heap(e) => e.code(),
            ExecutorError::UnknownColumn { .. } => ErrorCode::UNKNOWN_IDENTIFIER,
            ExecutorError::DuplicateColumn { .. } => ErrorCode::DUPLICATE_COLUMN,
            ExecutorError::UnknownFunction { .. } => ErrorCode::UNKNOWN_FUNCTION,
            ExecutorError::ArgumentCount { .. } => ErrorCode::NUMBER_OF_ARGUMENTS_DOESNT_MATCH,
            ExecutorError::ColumnCountMismatch { .. } => ErrorCode::NUMBER_OF_COLUMNS_DOESNT_MATCH,
            ExecutorError::Coercion {
                source: CoercionError::CannotParse { .. },
                ..
            } => ErrorCode::CANNOT_PARSE_TEXT,
            ExecutorError::Coercion { .. } | ExecutorError::TypeMismatch(_) => {
                ErrorCode::TYPE_MISMATCH
            }
            ExecutorError::DivisionByZero => ErrorCode::ILLEGAL_DIVISION,
            ExecutorError::NotAnAggregate { .. } => ErrorCode::NOT_AN_AGGREGATE,
            ExecutorError::NoDataToInsert => ErrorCode::NO_DATA_TO_INSERT,
            ExecutorError::UnboundParameter { .. } => ErrorCode::UNKNOWN_QUERY_PARAMETER,
            ExecutorError::NotTransactional { .. } => ErrorCode::NOT_IMPLEMENTED,
            ExecutorError::AccessDenied { .. } => ErrorCode::ACCESS_DENIED,
            ExecutorError::UnknownSetting { .. } => ErrorCode::UNKNOWN_SETTING,
            ExecutorError::InvalidSettingValue { .. } => ErrorCode::CANNOT_PARSE_TEXT,
            ExecutorError::Unsupported(_) => ErrorCode::LOGICAL_ERROR,
        }
    }
}
