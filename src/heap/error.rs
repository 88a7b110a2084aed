//! Error types for the heap module.

use thiserror::Error;

use crate::error_code::ErrorCode;

/// Errors from heap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// A row targeted by a write is already being deleted by another
    /// transaction (or was deleted after this snapshot was taken).
    #[error("row of table {table} was concurrently deleted by another transaction")]
    SerializationFailure {
        /// Qualified table name.
        table: String,
    },
}

impl HeapError {
    /// Numeric error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            HeapError::SerializationFailure { .. } => ErrorCode::SERIALIZATION_ERROR,
        }
    }
}
