//! Column data types and values.
//!
//! [`Type`] names the column types a table can declare and knows how to
//! coerce an arbitrary [`Value`] into its own domain. [`Value`] is the single
//! runtime representation used by the executor, the wire protocol and the
//! driver. Narrow integer types share the 64-bit variants; the column type
//! carries the width.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Errors raised while coercing a value into a column type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// A string could not be parsed as the target type.
    #[error("cannot parse '{value}' as {ty}")]
    CannotParse {
        /// The offending text.
        value: String,
        /// Target type.
        ty: Type,
    },
    /// The value's kind has no conversion to the target type.
    #[error("cannot convert {value} to {ty}")]
    TypeMismatch {
        /// Display form of the offending value.
        value: String,
        /// Target type.
        ty: Type,
    },
}

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bool,
}

impl Type {
    /// All types in wire-tag order.
    const ALL: [Type; 12] = [
        Type::UInt8,
        Type::UInt16,
        Type::UInt32,
        Type::UInt64,
        Type::Int8,
        Type::Int16,
        Type::Int32,
        Type::Int64,
        Type::Float32,
        Type::Float64,
        Type::String,
        Type::Bool,
    ];

    /// Returns the canonical type name (e.g. `"UInt64"`).
    pub const fn name(self) -> &'static str {
        match self {
            Type::UInt8 => "UInt8",
            Type::UInt16 => "UInt16",
            Type::UInt32 => "UInt32",
            Type::UInt64 => "UInt64",
            Type::Int8 => "Int8",
            Type::Int16 => "Int16",
            Type::Int32 => "Int32",
            Type::Int64 => "Int64",
            Type::Float32 => "Float32",
            Type::Float64 => "Float64",
            Type::String => "String",
            Type::Bool => "Bool",
        }
    }

    /// Parses a type name.
    ///
    /// Canonical names are case-sensitive; the SQL-standard aliases
    /// (`INT`, `BIGINT`, `TEXT`, ...) are matched case-insensitively.
    pub fn parse(name: &str) -> Option<Type> {
        if let Some(ty) = Self::ALL.iter().find(|ty| ty.name() == name) {
            return Some(*ty);
        }
        match name.to_ascii_uppercase().as_str() {
            "TINYINT" => Some(Type::Int8),
            "SMALLINT" => Some(Type::Int16),
            "INT" | "INTEGER" => Some(Type::Int32),
            "BIGINT" => Some(Type::Int64),
            "FLOAT" | "REAL" => Some(Type::Float32),
            "DOUBLE" => Some(Type::Float64),
            "TEXT" | "VARCHAR" | "CHAR" => Some(Type::String),
            "BOOL" | "BOOLEAN" => Some(Type::Bool),
            _ => None,
        }
    }

    /// Returns the one-byte tag used on the wire.
    pub fn tag(self) -> u8 {
        Self::ALL.iter().position(|ty| *ty == self).unwrap_or(0) as u8
    }

    /// Resolves a wire tag back to a type.
    pub fn from_tag(tag: u8) -> Option<Type> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Returns true for the unsigned integer types.
    pub const fn is_unsigned(self) -> bool {
        matches!(self, Type::UInt8 | Type::UInt16 | Type::UInt32 | Type::UInt64)
    }

    /// Returns true for the signed integer types.
    pub const fn is_signed(self) -> bool {
        matches!(self, Type::Int8 | Type::Int16 | Type::Int32 | Type::Int64)
    }

    /// Bit width of integer types.
    const fn bits(self) -> u32 {
        match self {
            Type::UInt8 | Type::Int8 => 8,
            Type::UInt16 | Type::Int16 => 16,
            Type::UInt32 | Type::Int32 | Type::Float32 => 32,
            _ => 64,
        }
    }

    /// Value stored when an insert omits a column or supplies NULL.
    pub fn default_value(self) -> Value {
        match self {
            t if t.is_unsigned() => Value::UInt64(0),
            t if t.is_signed() => Value::Int64(0),
            Type::Float32 | Type::Float64 => Value::Float64(0.0),
            Type::Bool => Value::Bool(false),
            _ => Value::String(String::new()),
        }
    }

    /// Coerces `value` into this type.
    ///
    /// Integers wrap to the column width (`-1` into `UInt64` is
    /// `18446744073709551615`), floats truncate toward zero, strings are
    /// parsed, and NULL becomes [`default_value`](Self::default_value).
    pub fn coerce(self, value: Value) -> Result<Value, CoercionError> {
        if value.is_null() {
            return Ok(self.default_value());
        }

        match self {
            t if t.is_unsigned() => {
                let raw = self.integer_bits(&value)?;
                Ok(Value::UInt64(truncate_unsigned(raw as u64, t.bits())))
            }
            t if t.is_signed() => {
                let raw = self.integer_bits(&value)?;
                Ok(Value::Int64(truncate_signed(raw as i64, t.bits())))
            }
            Type::Float32 | Type::Float64 => {
                let f = match &value {
                    Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                        CoercionError::CannotParse {
                            value: s.clone(),
                            ty: self,
                        }
                    })?,
                    other => other.to_f64().ok_or_else(|| self.mismatch(other))?,
                };
                Ok(Value::Float64(if self == Type::Float32 {
                    f as f32 as f64
                } else {
                    f
                }))
            }
            Type::Bool => match &value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err(CoercionError::CannotParse {
                        value: s.clone(),
                        ty: self,
                    }),
                },
                other => other
                    .to_f64()
                    .map(|f| Value::Bool(f != 0.0))
                    .ok_or_else(|| self.mismatch(other)),
            },
            _ => Ok(match value {
                Value::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            }),
        }
    }

    /// Extracts the two's-complement bits of an integer-like value.
    fn integer_bits(self, value: &Value) -> Result<i128, CoercionError> {
        match value {
            Value::UInt64(v) => Ok(*v as i128),
            Value::Int64(v) => Ok(*v as i128),
            Value::Bool(b) => Ok(*b as i128),
            Value::Float64(f) if f.is_finite() => Ok(f.trunc() as i128),
            Value::String(s) => {
                let text = s.trim();
                text.parse::<i128>()
                    .ok()
                    .filter(|v| *v >= i64::MIN as i128 && *v <= u64::MAX as i128)
                    .ok_or_else(|| CoercionError::CannotParse {
                        value: s.clone(),
                        ty: self,
                    })
            }
            other => Err(self.mismatch(other)),
        }
    }

    fn mismatch(self, value: &Value) -> CoercionError {
        CoercionError::TypeMismatch {
            value: value.to_string(),
            ty: self,
        }
    }
}

fn truncate_unsigned(v: u64, bits: u32) -> u64 {
    if bits >= 64 { v } else { v & ((1u64 << bits) - 1) }
}

fn truncate_signed(v: i64, bits: u32) -> i64 {
    match bits {
        8 => v as i8 as i64,
        16 => v as i16 as i64,
        32 => v as i32 as i64,
        _ => v,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    UInt64(u64),
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
}

impl Value {
    /// Builds the narrowest integer value for `v`: non-negative values become
    /// `UInt64`, negative ones `Int64`. Returns `None` on overflow.
    pub fn from_integer(v: i128) -> Option<Value> {
        if v >= 0 {
            u64::try_from(v).ok().map(Value::UInt64)
        } else {
            i64::try_from(v).ok().map(Value::Int64)
        }
    }

    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Natural column type of this value, `None` for NULL.
    pub fn natural_type(&self) -> Option<Type> {
        match self {
            Value::Null => None,
            Value::UInt64(_) => Some(Type::UInt64),
            Value::Int64(_) => Some(Type::Int64),
            Value::Float64(_) => Some(Type::Float64),
            Value::String(_) => Some(Type::String),
            Value::Bool(_) => Some(Type::Bool),
        }
    }

    /// Borrows the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, if this value is integral.
    pub fn to_i128(&self) -> Option<i128> {
        match self {
            Value::UInt64(v) => Some(*v as i128),
            Value::Int64(v) => Some(*v as i128),
            Value::Bool(b) => Some(*b as i128),
            _ => None,
        }
    }

    /// Unsigned view; negative or non-integral values yield `None`.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_i128().and_then(|v| u64::try_from(v).ok())
    }

    /// Signed view; out-of-range or non-integral values yield `None`.
    pub fn to_i64(&self) -> Option<i64> {
        self.to_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Floating-point view of any numeric value.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            other => other.to_i128().map(|v| v as f64),
        }
    }

    /// Truthiness used by WHERE: non-zero numbers and `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Float64(f) => *f != 0.0,
            other => other.to_i128().is_some_and(|v| v != 0),
        }
    }

    /// Compares two values. Numbers compare across variants; NULL and
    /// mismatched kinds are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::String(_), _) | (_, Value::String(_)) => None,
            (Value::Float64(_), _) | (_, Value::Float64(_)) => {
                self.to_f64()?.partial_cmp(&other.to_f64()?)
            }
            _ => Some(self.to_i128()?.cmp(&other.to_i128()?)),
        }
    }

    /// Renders this value as a SQL literal the lexer reads back verbatim.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(f) => format!("{f:?}"),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('\'');
                for ch in s.chars() {
                    match ch {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        ch => out.push(ch),
                    }
                }
                out.push('\'');
                out
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt64(v as u64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parse() {
        assert_eq!(Type::parse("UInt64"), Some(Type::UInt64));
        assert_eq!(Type::parse("String"), Some(Type::String));
        assert_eq!(Type::parse("bigint"), Some(Type::Int64));
        assert_eq!(Type::parse("uint64"), None);
        assert_eq!(Type::parse("Nullable(String)"), None);
    }

    #[test]
    fn test_type_tag() {
        for ty in Type::ALL {
            assert_eq!(Type::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(Type::from_tag(200), None);
    }

    #[test]
    fn test_negative_wraps_into_unsigned() {
        assert_eq!(
            Type::UInt64.coerce(Value::Int64(-1)).unwrap(),
            Value::UInt64(u64::MAX)
        );
        assert_eq!(
            Type::UInt8.coerce(Value::Int64(-1)).unwrap(),
            Value::UInt64(255)
        );
        assert_eq!(
            Type::UInt8.coerce(Value::UInt64(256)).unwrap(),
            Value::UInt64(0)
        );
    }

    #[test]
    fn test_signed_truncation() {
        assert_eq!(
            Type::Int8.coerce(Value::UInt64(200)).unwrap(),
            Value::Int64(-56)
        );
        assert_eq!(
            Type::Int64.coerce(Value::Float64(-2.9)).unwrap(),
            Value::Int64(-2)
        );
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(
            Type::UInt32.coerce(Value::from(" 42 ")).unwrap(),
            Value::UInt64(42)
        );
        assert!(matches!(
            Type::UInt32.coerce(Value::from("abc")),
            Err(CoercionError::CannotParse { .. })
        ));
        assert_eq!(
            Type::String.coerce(Value::UInt64(7)).unwrap(),
            Value::from("7")
        );
    }

    #[test]
    fn test_null_becomes_default() {
        assert_eq!(Type::UInt64.coerce(Value::Null).unwrap(), Value::UInt64(0));
        assert_eq!(
            Type::String.coerce(Value::Null).unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_compare_across_numeric_kinds() {
        assert_eq!(
            Value::UInt64(1).compare(&Value::Int64(-1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Float64(1.5).compare(&Value::UInt64(2)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("a").compare(&Value::UInt64(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_sql_literal_escaping() {
        assert_eq!(Value::from("it's").to_sql_literal(), "'it\\'s'");
        assert_eq!(Value::from("a\\b").to_sql_literal(), "'a\\\\b'");
        assert_eq!(Value::Float64(1.0).to_sql_literal(), "1.0");
        assert_eq!(Value::Int64(-3).to_sql_literal(), "-3");
    }

    #[test]
    fn test_from_integer() {
        assert_eq!(Value::from_integer(5), Some(Value::UInt64(5)));
        assert_eq!(Value::from_integer(-5), Some(Value::Int64(-5)));
        assert_eq!(Value::from_integer(i128::MAX), None);
    }
}
