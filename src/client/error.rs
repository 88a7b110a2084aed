use thiserror::Error;

use crate::db::DatabaseError;
use crate::error_code::ErrorCode;
use crate::protocol::ProtocolError;

/// The single error type of the driver.
///
/// Callers distinguish failures by [`error_code`](Self::error_code), which
/// carries the server's numeric code for server-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Code: {}. {message}", .code.as_i32())]
pub struct SqlError {
    code: ErrorCode,
    message: String,
}

impl SqlError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Raw numeric code, the way JDBC's `getErrorCode` reports it.
    pub fn error_code(&self) -> i32 {
        self.code.as_i32()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn closed() -> Self {
        Self::new(ErrorCode::NETWORK_ERROR, "connection is closed")
    }

    pub(crate) fn unexpected(what: impl std::fmt::Debug) -> Self {
        Self::new(
            ErrorCode::UNEXPECTED_PACKET_FROM_SERVER,
            format!("unexpected packet from server: {what:?}"),
        )
    }
}

impl From<DatabaseError> for SqlError {
    fn from(e: DatabaseError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<ProtocolError> for SqlError {
    fn from(e: ProtocolError) -> Self {
        let code = match e {
            ProtocolError::Io(_) => ErrorCode::NETWORK_ERROR,
            _ => ErrorCode::UNEXPECTED_PACKET_FROM_SERVER,
        };
        Self::new(code, e.to_string())
    }
}

impl From<std::io::Error> for SqlError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::NETWORK_ERROR, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SqlError::from(DatabaseError::NoTransaction);
        assert_eq!(err.error_code(), 649);

        let err = SqlError::from(ProtocolError::UnknownMessageType(b'?'));
        assert_eq!(err.code(), ErrorCode::UNEXPECTED_PACKET_FROM_SERVER);

        let err = SqlError::from(std::io::Error::other("reset"));
        assert_eq!(err.code(), ErrorCode::NETWORK_ERROR);
        assert_eq!(err.to_string(), "Code: 210. reset");
    }
}
