//! Session settings.

use thiserror::Error;

use crate::catalog::ReadOnlyLevel;
use crate::datum::Value;
use crate::error_code::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown setting {name}")]
    Unknown { name: String },

    #[error("cannot parse '{value}' as the value of setting {name}")]
    InvalidValue { name: String, value: String },
}

impl SettingsError {
    /// Numeric error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SettingsError::Unknown { .. } => ErrorCode::UNKNOWN_SETTING,
            SettingsError::InvalidValue { .. } => ErrorCode::CANNOT_PARSE_TEXT,
        }
    }
}

/// What happens when a result exceeds `max_result_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowMode {
    /// Fail with TOO_MANY_ROWS_OR_BYTES.
    #[default]
    Throw,
    /// Return the first `max_result_rows` rows.
    Break,
}

impl OverflowMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OverflowMode::Throw => "throw",
            OverflowMode::Break => "break",
        }
    }
}

/// Settings a session can change with SET or per-query SETTINGS.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Read-only level requested by the client. The effective level is the
    /// stricter of this and the user's own level.
    pub readonly: ReadOnlyLevel,
    /// Maximum result rows; 0 means unlimited.
    pub max_result_rows: u64,
    pub result_overflow_mode: OverflowMode,
    /// Run each request in one implicit transaction.
    pub implicit_transaction: bool,
}

impl Settings {
    /// Names of all supported settings.
    pub const NAMES: [&'static str; 4] = [
        "readonly",
        "max_result_rows",
        "result_overflow_mode",
        "implicit_transaction",
    ];

    /// Returns true if `name` is a supported setting.
    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// Returns the current value of a setting.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "readonly" => Some(Value::UInt64(self.readonly.as_u8() as u64)),
            "max_result_rows" => Some(Value::UInt64(self.max_result_rows)),
            "result_overflow_mode" => Some(Value::from(self.result_overflow_mode.as_str())),
            "implicit_transaction" => Some(Value::Bool(self.implicit_transaction)),
            _ => None,
        }
    }

    /// Parses and applies one setting.
    pub fn set(&mut self, name: &str, value: &Value) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        match name {
            "readonly" => self.readonly = ReadOnlyLevel::from_value(value).ok_or_else(invalid)?,
            "max_result_rows" => {
                self.max_result_rows = match value {
                    Value::String(s) => s.trim().parse().map_err(|_| invalid())?,
                    other => other.to_u64().ok_or_else(invalid)?,
                }
            }
            "result_overflow_mode" => {
                self.result_overflow_mode = match value.as_str() {
                    Some("throw") => OverflowMode::Throw,
                    Some("break") => OverflowMode::Break,
                    _ => return Err(invalid()),
                }
            }
            "implicit_transaction" => {
                self.implicit_transaction = parse_bool(value).ok_or_else(invalid)?
            }
            _ => {
                return Err(SettingsError::Unknown {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        other => match other.to_u64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.get("readonly"), Some(Value::UInt64(0)));
        assert_eq!(settings.get("max_result_rows"), Some(Value::UInt64(0)));
        assert_eq!(settings.get("result_overflow_mode"), Some(Value::from("throw")));
        assert_eq!(settings.get("implicit_transaction"), Some(Value::Bool(false)));
        assert_eq!(settings.get("max_threads"), None);
    }

    #[test]
    fn test_set() {
        let mut settings = Settings::default();
        settings.set("readonly", &Value::from("2")).unwrap();
        settings.set("max_result_rows", &Value::UInt64(5)).unwrap();
        settings.set("result_overflow_mode", &Value::from("break")).unwrap();
        settings.set("implicit_transaction", &Value::UInt64(1)).unwrap();
        assert_eq!(
            settings,
            Settings {
                readonly: ReadOnlyLevel::ReadOnlyKeepSettings,
                max_result_rows: 5,
                result_overflow_mode: OverflowMode::Break,
                implicit_transaction: true,
            }
        );
    }

    #[test]
    fn test_set_errors() {
        let mut settings = Settings::default();
        let err = settings.set("max_threads", &Value::UInt64(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UNKNOWN_SETTING);
        assert!(settings.set("readonly", &Value::UInt64(7)).is_err());
        assert!(settings.set("max_result_rows", &Value::Int64(-1)).is_err());
        assert!(settings.set("result_overflow_mode", &Value::from("drop")).is_err());
        assert_eq!(settings, Settings::default());
    }
}
