//! Execution context for statements.
//!
//! The [`SessionEnv`] trait abstracts the session state the executor reads
//! (current database, user, settings), keeping the executor decoupled from
//! the concrete [`Session`](crate::db::Session). [`ExecContext`] bundles it
//! with the shared catalog, the transaction manager and the snapshot the
//! statement runs under.

use crate::catalog::{Catalog, UserDirectory};
use crate::datum::Value;
use crate::sql::{Privilege, TableName};
use crate::tx::{Snapshot, TransactionManager, TxId};

use super::error::ExecutorError;

/// Session-level values visible to SQL functions and name resolution.
pub trait SessionEnv {
    /// Database unqualified table names resolve against.
    fn current_database(&self) -> &str;

    /// Authenticated user name.
    fn current_user(&self) -> &str;

    fn server_version(&self) -> &str;

    fn time_zone(&self) -> &str;

    /// Effective value of a setting, `None` if the name is unknown.
    fn setting(&self, name: &str) -> Option<Value>;
}

/// Everything a statement needs to run.
pub struct ExecContext<'a> {
    pub catalog: &'a Catalog,
    pub users: &'a UserDirectory,
    pub tx_manager: &'a TransactionManager,
    /// Visibility for reads and deletes.
    pub snapshot: Snapshot,
    /// Transaction that owns writes; INVALID for read-only statements.
    pub txid: TxId,
    /// True inside BEGIN ... COMMIT.
    pub explicit_transaction: bool,
    pub env: &'a dyn SessionEnv,
}

impl ExecContext<'_> {
    /// Resolves the database part of a table name.
    pub fn database_of(&self, table: &TableName) -> String {
        table
            .database
            .clone()
            .unwrap_or_else(|| self.env.current_database().to_string())
    }

    /// Fails with ACCESS_DENIED unless the current user holds `privilege`
    /// on `database.table`.
    pub fn check_privilege(
        &self,
        privilege: Privilege,
        database: &str,
        table: &str,
    ) -> Result<(), ExecutorError> {
        let user = self.env.current_user();
        if self.users.check_privilege(user, privilege, database, table) {
            return Ok(());
        }
        Err(ExecutorError::AccessDenied {
            user: user.to_string(),
            privilege: format!("{privilege:?}").to_uppercase(),
            target: format!("{database}.{table}"),
        })
    }

    /// Transaction id for a write, failing if the caller did not open one.
    pub fn write_txid(&self) -> Result<TxId, ExecutorError> {
        if self.txid.is_invalid() {
            return Err(ExecutorError::Unsupported(
                "write outside of a transaction".to_string(),
            ));
        }
        Ok(self.txid)
    }
}
