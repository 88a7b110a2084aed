//! Prepared statements.
//!
//! Parameters are rendered into the SQL text as literals on the client;
//! the server never sees a placeholder. Two templates are recognized:
//!
//! - SQL with `?` placeholders, e.g. `SELECT count() FROM t WHERE v > ?`
//! - a bare `INSERT INTO t [(cols)]`, where parameters form one row and a
//!   batch is sent as a single multi-row INSERT

use std::mem;

use tracing::debug;

use crate::datum::Value;
use crate::error_code::ErrorCode;
use crate::executor::ExecResult;
use crate::sql::{Lexer, Parser, Statement, TokenKind};

use super::connection::Connection;
use super::error::SqlError;
use super::result_set::ResultSet;

#[derive(Debug, Clone, PartialEq)]
enum Template {
    /// SQL split at its placeholders; `n` placeholders give `n + 1` parts.
    Placeholders(Vec<String>),
    /// `INSERT INTO t [(cols)]` without VALUES.
    Insert(String),
}

impl Template {
    fn parse(sql: &str) -> Template {
        let sql = sql.trim().trim_end_matches(';').trim_end();
        if let Ok(Some(Statement::Insert(insert))) = Parser::new(sql).parse()
            && insert.rows.is_empty()
        {
            return Template::Insert(sql.to_string());
        }

        let mut parts = Vec::new();
        let mut start = 0;
        for token in Lexer::new(sql).tokenize() {
            if token.kind == TokenKind::Placeholder {
                parts.push(sql[start..token.span.start].to_string());
                start = token.span.end;
            }
        }
        parts.push(sql[start..].to_string());
        Template::Placeholders(parts)
    }

    /// Number of parameters, `None` when any count is accepted.
    fn parameter_count(&self) -> Option<usize> {
        match self {
            Template::Placeholders(parts) => Some(parts.len() - 1),
            Template::Insert(_) => None,
        }
    }

    fn render(&self, values: &[Value]) -> String {
        match self {
            Template::Placeholders(parts) => {
                let mut sql = String::new();
                for (i, part) in parts.iter().enumerate() {
                    sql.push_str(part);
                    if let Some(value) = values.get(i) {
                        sql.push_str(&value.to_sql_literal());
                    }
                }
                sql
            }
            Template::Insert(prefix) => render_insert(prefix, &[values.to_vec()]),
        }
    }
}

fn render_insert(prefix: &str, rows: &[Vec<Value>]) -> String {
    let mut sql = format!("{prefix} VALUES ");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push('(');
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&value.to_sql_literal());
        }
        sql.push(')');
    }
    sql
}

/// A statement with bound parameters and an optional batch.
///
/// Parameter indexes are 1-based. Bound values stay set after
/// [`add_batch`](Self::add_batch) until replaced or cleared.
pub struct PreparedStatement {
    connection: Connection,
    template: Template,
    parameters: Vec<Option<Value>>,
    batch: Vec<Vec<Value>>,
}

impl PreparedStatement {
    pub(crate) fn new(connection: Connection, sql: &str) -> Self {
        let template = Template::parse(sql);
        let parameters = vec![None; template.parameter_count().unwrap_or(0)];
        Self {
            connection,
            template,
            parameters,
            batch: Vec::new(),
        }
    }

    /// Number of `?` placeholders, `None` for an INSERT template.
    pub fn parameter_count(&self) -> Option<usize> {
        self.template.parameter_count()
    }

    /// Binds `value` to parameter `index`.
    pub fn set_value(&mut self, index: usize, value: impl Into<Value>) -> Result<(), SqlError> {
        let count = self.template.parameter_count();
        if index == 0 || count.is_some_and(|count| index > count) {
            return Err(SqlError::new(
                ErrorCode::UNKNOWN_QUERY_PARAMETER,
                format!("parameter index {index} is out of range"),
            ));
        }
        if self.parameters.len() < index {
            self.parameters.resize(index, None);
        }
        self.parameters[index - 1] = Some(value.into());
        Ok(())
    }

    pub fn set_int(&mut self, index: usize, value: i32) -> Result<(), SqlError> {
        self.set_value(index, value)
    }

    pub fn set_long(&mut self, index: usize, value: i64) -> Result<(), SqlError> {
        self.set_value(index, value)
    }

    pub fn set_double(&mut self, index: usize, value: f64) -> Result<(), SqlError> {
        self.set_value(index, value)
    }

    pub fn set_bool(&mut self, index: usize, value: bool) -> Result<(), SqlError> {
        self.set_value(index, value)
    }

    pub fn set_string(&mut self, index: usize, value: &str) -> Result<(), SqlError> {
        self.set_value(index, value)
    }

    pub fn set_null(&mut self, index: usize) -> Result<(), SqlError> {
        self.set_value(index, Value::Null)
    }

    /// Unbinds all parameters.
    pub fn clear_parameters(&mut self) {
        self.parameters = vec![None; self.template.parameter_count().unwrap_or(0)];
    }

    /// Drops the pending batch without sending it.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Runs the statement with the bound parameters.
    pub async fn execute(&mut self) -> Result<ExecResult, SqlError> {
        let values = self.bound_values()?;
        let sql = self.template.render(&values);
        self.connection.execute(&sql).await
    }

    pub async fn execute_query(&mut self) -> Result<ResultSet, SqlError> {
        Ok(ResultSet::from(self.execute().await?))
    }

    /// Runs the statement and returns the number of rows written.
    pub async fn execute_update(&mut self) -> Result<u64, SqlError> {
        match self.execute().await? {
            ExecResult::Affected(n) => Ok(n),
            ExecResult::Rows(_) => Ok(0),
        }
    }

    /// Adds the bound parameters to the batch.
    pub fn add_batch(&mut self) -> Result<(), SqlError> {
        let values = self.bound_values()?;
        self.batch.push(values);
        Ok(())
    }

    /// Sends the batch and empties it. Returns one row count per batch
    /// entry; an empty batch sends nothing.
    ///
    /// With an INSERT template the whole batch is one INSERT, so it is
    /// applied atomically under auto-commit.
    pub async fn execute_batch(&mut self) -> Result<Vec<u64>, SqlError> {
        let batch = mem::take(&mut self.batch);
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        debug!(entries = batch.len(), "executing batch");

        match &self.template {
            Template::Insert(prefix) => {
                let sql = render_insert(prefix, &batch);
                self.connection.execute(&sql).await?;
                Ok(vec![1; batch.len()])
            }
            Template::Placeholders(_) => {
                let mut counts = Vec::with_capacity(batch.len());
                for values in &batch {
                    let sql = self.template.render(values);
                    counts.push(match self.connection.execute(&sql).await? {
                        ExecResult::Affected(n) => n,
                        ExecResult::Rows(_) => 0,
                    });
                }
                Ok(counts)
            }
        }
    }

    fn bound_values(&self) -> Result<Vec<Value>, SqlError> {
        if self.parameters.is_empty() && matches!(self.template, Template::Insert(_)) {
            return Err(SqlError::new(
                ErrorCode::NO_DATA_TO_INSERT,
                "no parameters are bound",
            ));
        }
        self.parameters
            .iter()
            .enumerate()
            .map(|(i, value)| {
                value.clone().ok_or_else(|| {
                    SqlError::new(
                        ErrorCode::UNKNOWN_QUERY_PARAMETER,
                        format!("parameter {} is not set", i + 1),
                    )
                })
            })
            .collect()
    }
}
