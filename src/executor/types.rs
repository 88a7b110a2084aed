//! Executor output types.

use crate::datum::{Type, Value};

/// Description of an output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDesc {
    /// Column name (alias or expression text).
    pub name: String,
    /// Statically inferred column type.
    pub ty: Type,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A materialized query result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rows {
    pub columns: Vec<ColumnDesc>,
    pub rows: Vec<Vec<Value>>,
}

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    /// SELECT output.
    Rows(Rows),
    /// Number of rows written (0 for DDL and session statements).
    Affected(u64),
}
