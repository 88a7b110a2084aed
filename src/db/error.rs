//! Database-level errors.

use thiserror::Error;

use super::settings::SettingsError;
use crate::catalog::CatalogError;
use crate::error_code::ErrorCode;
use crate::executor::ExecutorError;
use crate::sql::SyntaxError;
use crate::tx::TxError;

/// Errors that can occur while a session executes a request.
///
/// Clients only ever see [`code`](Self::code) and the message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatabaseError {
    /// SQL parsing error.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// The request contained no statement.
    #[error("empty query")]
    EmptyQuery,

    /// Catalog or authentication error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Executor error.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Invalid or unknown setting.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Transaction manager error.
    #[error("transaction error: {0}")]
    Transaction(#[from] TxError),

    /// The statement is not allowed at the session's read-only level.
    #[error("{0}")]
    ReadOnly(String),

    /// BEGIN while a transaction is open.
    #[error("nested transactions are not supported")]
    TransactionAlreadyOpen,

    /// COMMIT or ROLLBACK without an open transaction.
    #[error("there is no current transaction")]
    NoTransaction,

    /// The transaction failed earlier and only ROLLBACK is accepted.
    #[error("transaction failed on an earlier error, commands ignored until ROLLBACK")]
    TransactionFailed,

    /// Result is larger than `max_result_rows` with overflow mode `throw`.
    #[error("limit for result exceeded, max rows: {limit}, current rows: {rows}")]
    TooManyRows { limit: u64, rows: u64 },
}

impl DatabaseError {
    /// Numeric error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            DatabaseError::Syntax(_) | DatabaseError::EmptyQuery => ErrorCode::SYNTAX_ERROR,
            DatabaseError::Catalog(e) => e.code(),
            DatabaseError::Executor(e) => e.code(),
            DatabaseError::Settings(e) => e.code(),
            DatabaseError::Transaction(_)
            | DatabaseError::TransactionAlreadyOpen
            | DatabaseError::NoTransaction
            | DatabaseError::TransactionFailed => ErrorCode::INVALID_TRANSACTION,
            DatabaseError::ReadOnly(_) => ErrorCode::READONLY,
            DatabaseError::TooManyRows { .. } => ErrorCode::TOO_MANY_ROWS_OR_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Span;

    #[test]
    fn test_codes() {
        let syntax = SyntaxError::new("unexpected token", Span::new(0, 1));
        assert_eq!(DatabaseError::from(syntax).code(), ErrorCode::SYNTAX_ERROR);
        assert_eq!(
            DatabaseError::from(CatalogError::UnknownDatabase {
                name: "x".to_string()
            })
            .code(),
            ErrorCode::UNKNOWN_DATABASE
        );
        assert_eq!(
            DatabaseError::ReadOnly("default: readonly mode".to_string()).code(),
            ErrorCode::READONLY
        );
        assert_eq!(DatabaseError::NoTransaction.code().as_i32(), 649);
    }
}
