//! Numeric error codes shared by the server and the driver.
//!
//! Clients tell failure classes apart purely by these codes, never by the
//! Rust error variant. The numbers follow the reference columnar server so
//! that code written against it (e.g. "81 means unknown database") keeps
//! working against the mock.

use std::fmt;

/// A numeric server error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(i32);

macro_rules! error_codes {
    ($($name:ident = $value:literal),* $(,)?) => {
        impl ErrorCode {
            $(
                #[allow(missing_docs)]
                pub const $name: Self = Self($value);
            )*

            /// Returns the symbolic name of a known code, or `None`.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

error_codes! {
    CANNOT_PARSE_TEXT = 6,
    NUMBER_OF_COLUMNS_DOESNT_MATCH = 7,
    DUPLICATE_COLUMN = 15,
    NUMBER_OF_ARGUMENTS_DOESNT_MATCH = 42,
    UNKNOWN_FUNCTION = 46,
    UNKNOWN_IDENTIFIER = 47,
    NOT_IMPLEMENTED = 48,
    LOGICAL_ERROR = 49,
    UNKNOWN_TYPE = 50,
    TYPE_MISMATCH = 53,
    UNKNOWN_STORAGE = 56,
    TABLE_ALREADY_EXISTS = 57,
    UNKNOWN_TABLE = 60,
    SYNTAX_ERROR = 62,
    UNKNOWN_DATABASE = 81,
    DATABASE_ALREADY_EXISTS = 82,
    UNKNOWN_PACKET_FROM_CLIENT = 101,
    UNEXPECTED_PACKET_FROM_SERVER = 102,
    NO_DATA_TO_INSERT = 108,
    UNKNOWN_SETTING = 115,
    ILLEGAL_DIVISION = 153,
    READONLY = 164,
    UNKNOWN_USER = 192,
    NETWORK_ERROR = 210,
    NOT_AN_AGGREGATE = 215,
    DATABASE_ACCESS_DENIED = 291,
    SERIALIZATION_ERROR = 341,
    TOO_MANY_ROWS_OR_BYTES = 396,
    UNKNOWN_QUERY_PARAMETER = 456,
    ACCESS_ENTITY_ALREADY_EXISTS = 493,
    ACCESS_DENIED = 497,
    AUTHENTICATION_FAILED = 516,
    INVALID_TRANSACTION = 649,
}

impl ErrorCode {
    /// Wraps a raw code (e.g. one received over the wire).
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw numeric code.
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "UNKNOWN ({})", self.0),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}
