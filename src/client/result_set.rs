//! Forward-only cursor over a query result.

use crate::datum::Value;
use crate::error_code::ErrorCode;
use crate::executor::{ColumnDesc, ExecResult};

use super::error::SqlError;

/// Selects a column by 1-based position or by label.
pub trait ColumnIndex {
    /// Returns the 0-based position of the column, if it exists.
    fn position(&self, columns: &[ColumnDesc]) -> Option<usize>;
}

impl ColumnIndex for usize {
    fn position(&self, columns: &[ColumnDesc]) -> Option<usize> {
        (1..=columns.len()).contains(self).then(|| self - 1)
    }
}

impl ColumnIndex for &str {
    fn position(&self, columns: &[ColumnDesc]) -> Option<usize> {
        columns
            .iter()
            .position(|c| c.name == *self)
            .or_else(|| columns.iter().position(|c| c.name.eq_ignore_ascii_case(self)))
    }
}

/// Rows of one result, read with [`next`](Self::next) and the `get_*`
/// getters. NULL reads as `None` from [`get_string`](Self::get_string) and
/// as zero or `false` from the numeric getters.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<ColumnDesc>,
    rows: Vec<Vec<Value>>,
    /// 1-based row under the cursor; 0 before the first row.
    cursor: usize,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnDesc>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            cursor: 0,
        }
    }

    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    /// Number of rows in the result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Moves to the next row. Returns false past the last one.
    pub fn next(&mut self) -> bool {
        if self.cursor < self.rows.len() {
            self.cursor += 1;
            true
        } else {
            self.cursor = self.rows.len() + 1;
            false
        }
    }

    /// Returns the raw value of a column in the current row.
    pub fn get_value<I: ColumnIndex>(&self, index: I) -> Result<&Value, SqlError> {
        let row = self
            .cursor
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| SqlError::new(ErrorCode::LOGICAL_ERROR, "cursor is not on a row"))?;
        let position = index.position(&self.columns).ok_or_else(|| {
            SqlError::new(ErrorCode::UNKNOWN_IDENTIFIER, "no such column in the result set")
        })?;
        row.get(position).ok_or_else(|| {
            SqlError::new(ErrorCode::LOGICAL_ERROR, "row is shorter than its header")
        })
    }

    pub fn get_string<I: ColumnIndex>(&self, index: I) -> Result<Option<String>, SqlError> {
        let value = self.get_value(index)?;
        Ok((!value.is_null()).then(|| value.to_string()))
    }

    pub fn get_i64<I: ColumnIndex>(&self, index: I) -> Result<i64, SqlError> {
        match self.get_value(index)? {
            Value::Null => Ok(0),
            Value::Bool(b) => Ok(*b as i64),
            Value::String(s) => s.trim().parse().map_err(|_| mismatch(s, "Int64")),
            value => value.to_i64().ok_or_else(|| mismatch(value, "Int64")),
        }
    }

    pub fn get_i32<I: ColumnIndex>(&self, index: I) -> Result<i32, SqlError> {
        let value = self.get_i64(index)?;
        i32::try_from(value).map_err(|_| mismatch(value, "Int32"))
    }

    pub fn get_u64<I: ColumnIndex>(&self, index: I) -> Result<u64, SqlError> {
        match self.get_value(index)? {
            Value::Null => Ok(0),
            Value::Bool(b) => Ok(*b as u64),
            Value::String(s) => s.trim().parse().map_err(|_| mismatch(s, "UInt64")),
            value => value.to_u64().ok_or_else(|| mismatch(value, "UInt64")),
        }
    }

    pub fn get_f64<I: ColumnIndex>(&self, index: I) -> Result<f64, SqlError> {
        match self.get_value(index)? {
            Value::Null => Ok(0.0),
            Value::Bool(b) => Ok(*b as u8 as f64),
            Value::String(s) => s.trim().parse().map_err(|_| mismatch(s, "Float64")),
            value => value.to_f64().ok_or_else(|| mismatch(value, "Float64")),
        }
    }

    pub fn get_bool<I: ColumnIndex>(&self, index: I) -> Result<bool, SqlError> {
        match self.get_value(index)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(mismatch(s, "Bool")),
            },
            value => Ok(value.is_truthy()),
        }
    }
}

impl From<ExecResult> for ResultSet {
    /// Row counts become an empty result.
    fn from(result: ExecResult) -> Self {
        match result {
            ExecResult::Rows(rows) => ResultSet::new(rows.columns, rows.rows),
            ExecResult::Affected(_) => ResultSet::default(),
        }
    }
}

fn mismatch(value: impl std::fmt::Display, ty: &str) -> SqlError {
    SqlError::new(
        ErrorCode::TYPE_MISMATCH,
        format!("cannot read '{value}' as {ty}"),
    )
}
