use crate::executor::ExecResult;

use super::connection::Connection;
use super::error::SqlError;
use super::result_set::ResultSet;

/// Runs ad-hoc SQL on a connection and keeps the last result.
pub struct Statement {
    connection: Connection,
    last: Option<ExecResult>,
}

impl Statement {
    pub(crate) fn new(connection: Connection) -> Self {
        Self {
            connection,
            last: None,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Runs `sql`. Returns true when the result is a result set, available
    /// through [`result_set`](Self::result_set); otherwise the row count is
    /// available through [`update_count`](Self::update_count).
    pub async fn execute(&mut self, sql: &str) -> Result<bool, SqlError> {
        self.last = None;
        let result = self.connection.execute(sql).await?;
        let is_rows = matches!(result, ExecResult::Rows(_));
        self.last = Some(result);
        Ok(is_rows)
    }

    /// Runs `sql` and returns its rows. Statements without rows return an
    /// empty result set.
    pub async fn execute_query(&mut self, sql: &str) -> Result<ResultSet, SqlError> {
        self.execute(sql).await?;
        Ok(self.last.clone().map(ResultSet::from).unwrap_or_default())
    }

    /// Runs `sql` and returns the number of rows written.
    pub async fn execute_update(&mut self, sql: &str) -> Result<u64, SqlError> {
        self.execute(sql).await?;
        Ok(self.update_count().unwrap_or(0))
    }

    /// Rows of the last statement, if it returned any.
    pub fn result_set(&self) -> Option<ResultSet> {
        match &self.last {
            Some(ExecResult::Rows(rows)) => {
                Some(ResultSet::new(rows.columns.clone(), rows.rows.clone()))
            }
            _ => None,
        }
    }

    /// Row count of the last statement, if it did not return rows.
    pub fn update_count(&self) -> Option<u64> {
        match self.last {
            Some(ExecResult::Affected(n)) => Some(n),
            _ => None,
        }
    }
}
