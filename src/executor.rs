//! Statement executor.
//!
//! This module evaluates parsed statements against the catalog and the MVCC
//! heap. Transaction boundaries are the caller's concern: the
//! [`ExecContext`] carries the snapshot to read with and the transaction to
//! write as.
//!
//! # Architecture
//!
//! ```text
//! Statement
//!     |
//! [execute] -- dispatches by statement kind
//!     |
//!     +-- SELECT: load source (table scan / system rows)
//!     |             -> bind -> filter -> project | count -> limit
//!     +-- INSERT / DELETE: resolve target, check engine and grants,
//!     |             coerce values / evaluate predicate, write as ctx.txid
//!     +-- DDL / users / grants: catalog and user directory, immediate
//! ```
//!
//! # Components
//!
//! - [`BoundExpr`]: Bound expression tree with bind-time column resolution
//! - [`SessionEnv`]: Session values the executor reads
//! - [`ColumnDesc`]: Output column metadata
//! - [`Rows`] / [`ExecResult`]: Statement output

mod context;
mod ddl;
mod dml;
mod error;
mod eval;
mod expr;
mod select;
mod system;
mod types;

pub use context::{ExecContext, SessionEnv};
pub use error::ExecutorError;
pub use expr::{BindScope, BoundExpr, ScalarFunction};
pub use types::{ColumnDesc, ExecResult, Rows};

use crate::sql::Statement;

/// Executes one statement.
///
/// Session-level statements (USE, SET, BEGIN, COMMIT, ROLLBACK) are handled
/// by the session and rejected here.
pub fn execute(ctx: &ExecContext<'_>, stmt: &Statement) -> Result<ExecResult, ExecutorError> {
    match stmt {
        Statement::Select(select) => select::execute_select(ctx, select).map(ExecResult::Rows),
        Statement::Insert(insert) => dml::execute_insert(ctx, insert).map(ExecResult::Affected),
        Statement::Delete(delete) => dml::execute_delete(ctx, delete).map(ExecResult::Affected),
        Statement::CreateTable(create) => {
            ddl::execute_create_table(ctx, create).map(|()| ExecResult::Affected(0))
        }
        Statement::DropTable(drop) => {
            ddl::execute_drop_table(ctx, drop).map(|()| ExecResult::Affected(0))
        }
        Statement::CreateDatabase(create) => {
            ddl::execute_create_database(ctx, create).map(|()| ExecResult::Affected(0))
        }
        Statement::DropDatabase(drop) => {
            ddl::execute_drop_database(ctx, drop).map(|()| ExecResult::Affected(0))
        }
        Statement::CreateUser(create) => {
            ddl::execute_create_user(ctx, create).map(|()| ExecResult::Affected(0))
        }
        Statement::DropUser(drop) => {
            ddl::execute_drop_user(ctx, drop).map(|()| ExecResult::Affected(0))
        }
        Statement::Grant(grant) => ddl::execute_grant(ctx, grant).map(|()| ExecResult::Affected(0)),
        Statement::Use(_)
        | Statement::Set(_)
        | Statement::Begin
        | Statement::Commit
        | Statement::Rollback => Err(ExecutorError::Unsupported(format!(
            "session statement passed to executor: {stmt:?}"
        ))),
    }
}
