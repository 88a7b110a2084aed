//! Client session management for database operations.
//!
//! The [`Session`] type represents a single client session and manages
//! transaction state, settings and SQL execution. It sits between the
//! protocol layer (Connection) and the shared [`Database`].

use std::sync::Arc;

use tracing::{debug, info};

use super::Database;
use super::error::DatabaseError;
use super::settings::{OverflowMode, Settings};
use crate::catalog::{CatalogError, ReadOnlyLevel};
use crate::datum::Value;
use crate::executor::{self, ExecContext, ExecResult, ExecutorError, SessionEnv};
use crate::sql::{Parser, SettingAssignment, Statement};
use crate::tx::{IsolationLevel, Snapshot, TxId};

/// Transaction state for a session.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// Transaction ID.
    pub txid: TxId,
    /// Whether the transaction has failed and awaits ROLLBACK.
    pub failed: bool,
    /// Opened by `implicit_transaction` for the current request only.
    pub implicit: bool,
    /// Snapshot taken at BEGIN under snapshot isolation.
    snapshot: Option<Snapshot>,
}

/// Transaction status reported after every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Idle,
    InTransaction,
    /// An earlier statement failed; only ROLLBACK (or COMMIT, which rolls
    /// back) is accepted.
    Failed,
}

/// Server and account details a client probes after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub display_name: String,
    pub version: String,
    pub time_zone: String,
    pub user: String,
    /// Current database of the session.
    pub database: String,
    /// Read-only level of the user account, ignoring session settings.
    pub readonly: ReadOnlyLevel,
}

/// A client session managing transaction state and SQL execution.
///
/// # Transaction Ownership
///
/// A transaction opened with BEGIN belongs to this session until COMMIT or
/// ROLLBACK. Dropping the session aborts it.
pub struct Session {
    id: u64,
    database: Arc<Database>,
    user: String,
    user_readonly: ReadOnlyLevel,
    current_database: String,
    settings: Settings,
    transaction: Option<TransactionState>,
}

impl Session {
    /// Authenticates `user` and opens a session.
    ///
    /// `current_database` is not validated: statements that need it fail
    /// with UNKNOWN_DATABASE until it exists. `None` or an empty name selects
    /// the server's default database.
    ///
    /// # Errors
    ///
    /// Returns AUTHENTICATION_FAILED for an unknown user or a wrong password.
    pub fn open(
        database: Arc<Database>,
        user: &str,
        password: &str,
        current_database: Option<&str>,
    ) -> Result<Self, DatabaseError> {
        let account = database.users().authenticate(user, password)?;
        let current_database = current_database
            .filter(|name| !name.is_empty())
            .unwrap_or(database.default_database())
            .to_string();
        let id = database.next_session_id();
        info!(
            session_id = id,
            user,
            database = %current_database,
            readonly = %account.readonly,
            "session opened"
        );
        Ok(Self {
            id,
            database,
            user: account.name,
            user_readonly: account.readonly,
            current_database,
            settings: Settings::default(),
            transaction: None,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the current transaction state, if any.
    pub fn transaction(&self) -> Option<&TransactionState> {
        self.transaction.as_ref()
    }

    pub fn transaction_status(&self) -> TransactionStatus {
        match &self.transaction {
            None => TransactionStatus::Idle,
            Some(tx) if tx.failed => TransactionStatus::Failed,
            Some(_) => TransactionStatus::InTransaction,
        }
    }

    /// The stricter of the user's level and the `readonly` setting.
    pub fn effective_readonly(&self) -> ReadOnlyLevel {
        self.user_readonly.max(self.settings.readonly)
    }

    pub fn server_info(&self) -> SessionInfo {
        let info = self.database.info();
        SessionInfo {
            display_name: info.display_name.clone(),
            version: info.version.clone(),
            time_zone: info.time_zone.clone(),
            user: self.user.clone(),
            database: self.current_database.clone(),
            readonly: self.user_readonly,
        }
    }

    /// Parses and executes a request.
    ///
    /// The request may hold several `;`-separated statements; they run in
    /// order and the result of the last one is returned. `query_settings`
    /// apply to this request only, while SET statements inside it persist.
    ///
    /// Any error raised while an explicit transaction is open marks that
    /// transaction failed.
    pub fn execute(
        &mut self,
        sql: &str,
        query_settings: &[SettingAssignment],
    ) -> Result<ExecResult, DatabaseError> {
        debug!(session_id = self.id, sql, "executing request");
        let result = self.execute_request(sql, query_settings);
        if let Err(e) = &result {
            if let Some(tx) = &mut self.transaction
                && !tx.failed
            {
                tx.failed = true;
                debug!(session_id = self.id, txid = %tx.txid, "transaction marked failed");
            }
            debug!(session_id = self.id, code = %e.code(), error = %e, "request failed");
        }
        result
    }

    fn execute_request(
        &mut self,
        sql: &str,
        query_settings: &[SettingAssignment],
    ) -> Result<ExecResult, DatabaseError> {
        let statements = Parser::new(sql).parse_script()?;
        if statements.is_empty() {
            return Err(DatabaseError::EmptyQuery);
        }

        let mut changes = Vec::new();
        if query_settings.is_empty() {
            return self.run_request(&statements, &mut changes);
        }

        let saved = self.settings.clone();
        let result = self
            .apply_settings(query_settings)
            .and_then(|()| self.run_request(&statements, &mut changes));
        self.settings = saved;
        for change in &changes {
            self.settings.set(&change.name, &change.value)?;
        }
        result
    }

    fn apply_settings(&mut self, assignments: &[SettingAssignment]) -> Result<(), DatabaseError> {
        assignments.iter().try_for_each(|a| self.apply_setting(a))
    }

    /// Runs the statements of one request, inside one implicit transaction
    /// when `implicit_transaction` is on and no transaction is open.
    fn run_request(
        &mut self,
        statements: &[Statement],
        changes: &mut Vec<SettingAssignment>,
    ) -> Result<ExecResult, DatabaseError> {
        let implicit = self.settings.implicit_transaction && self.transaction.is_none();
        if implicit {
            self.begin(true);
        }

        let mut result = Ok(ExecResult::Affected(0));
        for stmt in statements {
            result = self.execute_statement(stmt, changes);
            if result.is_err() {
                break;
            }
        }

        if implicit && let Some(tx) = self.transaction.take() {
            match &result {
                Ok(_) => self.finish(tx, true)?,
                Err(_) => {
                    let _ = self.finish(tx, false);
                }
            }
        }
        result
    }

    /// Executes one parsed statement.
    fn execute_statement(
        &mut self,
        stmt: &Statement,
        changes: &mut Vec<SettingAssignment>,
    ) -> Result<ExecResult, DatabaseError> {
        if let Some(tx) = &self.transaction
            && tx.failed
            && !matches!(stmt, Statement::Commit | Statement::Rollback)
        {
            return Err(DatabaseError::TransactionFailed);
        }
        if !matches!(
            stmt,
            Statement::CreateDatabase(_) | Statement::DropDatabase(_) | Statement::Use(_)
        ) && !self.database.catalog().database_exists(&self.current_database)
        {
            return Err(CatalogError::UnknownDatabase {
                name: self.current_database.clone(),
            }
            .into());
        }
        if stmt.is_write() && self.effective_readonly().is_read_only() {
            return Err(DatabaseError::ReadOnly(format!(
                "{}: cannot execute query in readonly mode",
                self.user
            )));
        }

        match stmt {
            Statement::Begin => {
                if self.transaction.is_some() {
                    return Err(DatabaseError::TransactionAlreadyOpen);
                }
                self.begin(false);
                Ok(ExecResult::Affected(0))
            }
            Statement::Commit => match self.transaction.take() {
                Some(tx) if tx.implicit => {
                    self.transaction = Some(tx);
                    Err(DatabaseError::NoTransaction)
                }
                Some(tx) if tx.failed => {
                    self.finish(tx, false)?;
                    Err(DatabaseError::TransactionFailed)
                }
                Some(tx) => {
                    self.finish(tx, true)?;
                    Ok(ExecResult::Affected(0))
                }
                None => Err(DatabaseError::NoTransaction),
            },
            Statement::Rollback => match self.transaction.take() {
                Some(tx) if tx.implicit => {
                    self.transaction = Some(tx);
                    Err(DatabaseError::NoTransaction)
                }
                Some(tx) => {
                    self.finish(tx, false)?;
                    Ok(ExecResult::Affected(0))
                }
                None => Err(DatabaseError::NoTransaction),
            },
            Statement::Use(name) => {
                if !self.database.catalog().database_exists(name) {
                    return Err(CatalogError::UnknownDatabase { name: name.clone() }.into());
                }
                debug!(session_id = self.id, database = %name, "current database changed");
                self.current_database = name.clone();
                Ok(ExecResult::Affected(0))
            }
            Statement::Set(assignments) => {
                for assignment in assignments {
                    self.apply_setting(assignment)?;
                    changes.push(assignment.clone());
                }
                Ok(ExecResult::Affected(0))
            }
            Statement::Select(_) => {
                let result = match &self.transaction {
                    Some(tx) => self.run(stmt, tx.txid, self.snapshot_of(tx), !tx.implicit),
                    None => self.run(
                        stmt,
                        TxId::INVALID,
                        self.database.tx_manager().snapshot(TxId::INVALID),
                        false,
                    ),
                }?;
                self.limit_rows(result)
            }
            // NOTE: DDL never joins the open transaction.
            _ if stmt.is_ddl() => Ok(self.run(
                stmt,
                TxId::INVALID,
                self.database.tx_manager().snapshot(TxId::INVALID),
                false,
            )?),
            _ => self.within_transaction(stmt),
        }
    }

    /// Executes a write inside the open transaction, or in its own
    /// auto-commit transaction when there is none.
    fn within_transaction(&mut self, stmt: &Statement) -> Result<ExecResult, DatabaseError> {
        if let Some(tx) = &self.transaction {
            return Ok(self.run(stmt, tx.txid, self.snapshot_of(tx), !tx.implicit)?);
        }

        let tx_manager = self.database.tx_manager();
        let txid = tx_manager.begin();
        match self.run(stmt, txid, tx_manager.snapshot(txid), false) {
            Ok(result) => {
                tx_manager.commit(txid)?;
                Ok(result)
            }
            Err(e) => {
                let _ = tx_manager.abort(txid);
                Err(e.into())
            }
        }
    }

    fn run(
        &self,
        stmt: &Statement,
        txid: TxId,
        snapshot: Snapshot,
        explicit_transaction: bool,
    ) -> Result<ExecResult, ExecutorError> {
        let ctx = ExecContext {
            catalog: self.database.catalog(),
            users: self.database.users(),
            tx_manager: self.database.tx_manager(),
            snapshot,
            txid,
            explicit_transaction,
            env: self,
        };
        executor::execute(&ctx, stmt)
    }

    fn snapshot_of(&self, tx: &TransactionState) -> Snapshot {
        match &tx.snapshot {
            Some(snapshot) => snapshot.clone(),
            None => self.database.tx_manager().snapshot(tx.txid),
        }
    }

    fn begin(&mut self, implicit: bool) {
        let tx_manager = self.database.tx_manager();
        let txid = tx_manager.begin();
        let snapshot = match self.database.isolation() {
            IsolationLevel::Snapshot => Some(tx_manager.snapshot(txid)),
            IsolationLevel::ReadCommitted => None,
        };
        debug!(session_id = self.id, %txid, implicit, "transaction started");
        self.transaction = Some(TransactionState {
            txid,
            failed: false,
            implicit,
            snapshot,
        });
    }

    fn finish(&self, tx: TransactionState, commit: bool) -> Result<(), DatabaseError> {
        let tx_manager = self.database.tx_manager();
        if commit {
            tx_manager.commit(tx.txid)?;
            debug!(session_id = self.id, txid = %tx.txid, "transaction committed");
        } else {
            tx_manager.abort(tx.txid)?;
            debug!(session_id = self.id, txid = %tx.txid, "transaction rolled back");
        }
        Ok(())
    }

    /// Validates and applies one setting under the read-only rules.
    ///
    /// Assigning a setting its current value is not a change and is always
    /// accepted.
    fn apply_setting(&mut self, assignment: &SettingAssignment) -> Result<(), DatabaseError> {
        let name = assignment.name.as_str();
        let mut next = self.settings.clone();
        next.set(name, &assignment.value)?;

        let level = self.effective_readonly();
        if level == ReadOnlyLevel::ReadOnly {
            match name {
                // Wrapping reads in a transaction cannot enable writes.
                "implicit_transaction" => {
                    self.settings = next;
                    return Ok(());
                }
                // NOTE: a request to stay read-only is a no-op at level 1.
                "readonly" if next.readonly != ReadOnlyLevel::ReadWrite => return Ok(()),
                _ => {}
            }
        }

        let changed = if name == "readonly" {
            next.readonly != level
        } else {
            next != self.settings
        };
        let denied = match level {
            ReadOnlyLevel::ReadWrite => false,
            ReadOnlyLevel::ReadOnly => changed,
            ReadOnlyLevel::ReadOnlyKeepSettings => changed && name == "readonly",
        };
        if denied {
            return Err(DatabaseError::ReadOnly(format!(
                "{}: cannot modify '{name}' setting in readonly mode",
                self.user
            )));
        }

        self.settings = next;
        Ok(())
    }

    fn limit_rows(&self, result: ExecResult) -> Result<ExecResult, DatabaseError> {
        let limit = self.settings.max_result_rows;
        match result {
            ExecResult::Rows(mut rows) if limit > 0 && rows.rows.len() as u64 > limit => {
                match self.settings.result_overflow_mode {
                    OverflowMode::Throw => Err(DatabaseError::TooManyRows {
                        limit,
                        rows: rows.rows.len() as u64,
                    }),
                    OverflowMode::Break => {
                        rows.rows.truncate(limit as usize);
                        Ok(ExecResult::Rows(rows))
                    }
                }
            }
            other => Ok(other),
        }
    }
}

impl SessionEnv for Session {
    fn current_database(&self) -> &str {
        &self.current_database
    }

    fn current_user(&self) -> &str {
        &self.user
    }

    fn server_version(&self) -> &str {
        &self.database.info().version
    }

    fn time_zone(&self) -> &str {
        &self.database.info().time_zone
    }

    fn setting(&self, name: &str) -> Option<Value> {
        match name {
            "readonly" => Some(Value::UInt64(self.effective_readonly().as_u8() as u64)),
            _ => self.settings.get(name),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(tx) = self.transaction.take() {
            let _ = self.database.tx_manager().abort(tx.txid);
            debug!(session_id = self.id, txid = %tx.txid, "open transaction aborted");
        }
        info!(session_id = self.id, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, UserConfig};
    use crate::error_code::ErrorCode;

    fn user(name: &str, readonly: u64) -> UserConfig {
        UserConfig {
            name: name.to_string(),
            password: None,
            readonly,
        }
    }

    fn open_test_db(isolation: IsolationLevel) -> Arc<Database> {
        let config = ServerConfig {
            isolation,
            users: vec![user("default", 0), user("reader", 1), user("keeper", 2)],
            ..ServerConfig::default()
        };
        Arc::new(Database::new(&config).unwrap())
    }

    fn session(db: &Arc<Database>, user: &str) -> Session {
        Session::open(Arc::clone(db), user, "", None).unwrap()
    }

    fn exec(session: &mut Session, sql: &str) -> Result<ExecResult, DatabaseError> {
        session.execute(sql, &[])
    }

    fn code(result: Result<ExecResult, DatabaseError>) -> i32 {
        result.unwrap_err().code().as_i32()
    }

    fn scalar(session: &mut Session, sql: &str) -> Value {
        match exec(session, sql).unwrap() {
            ExecResult::Rows(rows) => rows.rows[0][0].clone(),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    fn count(session: &mut Session, table: &str) -> u64 {
        scalar(session, &format!("select count() from {table}"))
            .to_u64()
            .unwrap()
    }

    fn setting(name: &str, value: impl Into<Value>) -> SettingAssignment {
        SettingAssignment {
            name: name.to_string(),
            value: value.into(),
        }
    }

    fn create_tables(session: &mut Session) {
        exec(
            session,
            "create table t(id UInt64) engine = MergeTree order by id; \
             create table m(id UInt64) engine = Memory",
        )
        .unwrap();
    }

    #[test]
    fn test_autocommit_writes_are_visible() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut a = session(&db, "default");
        let mut b = session(&db, "default");
        create_tables(&mut a);

        let result = exec(&mut a, "insert into t values (1), (2)").unwrap();
        assert_eq!(result, ExecResult::Affected(2));
        assert_eq!(count(&mut b, "t"), 2);
        assert_eq!(a.transaction_status(), TransactionStatus::Idle);
        assert_eq!(db.tx_manager().active_count(), 0);
    }

    #[test]
    fn test_explicit_transaction_isolation() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut a = session(&db, "default");
        let mut b = session(&db, "default");
        create_tables(&mut a);

        exec(&mut a, "begin transaction").unwrap();
        exec(&mut a, "insert into t values (1)").unwrap();
        assert_eq!(a.transaction_status(), TransactionStatus::InTransaction);
        assert_eq!(count(&mut a, "t"), 1);
        assert_eq!(count(&mut b, "t"), 0);
        exec(&mut a, "rollback").unwrap();
        assert_eq!(count(&mut a, "t"), 0);

        exec(&mut a, "begin; insert into t values (2); insert into t values (3)").unwrap();
        assert_eq!(count(&mut b, "t"), 0);
        exec(&mut a, "commit").unwrap();
        assert_eq!(count(&mut b, "t"), 2);
    }

    #[test]
    fn test_transaction_control_errors() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        create_tables(&mut s);

        assert_eq!(code(exec(&mut s, "commit")), 649);
        assert_eq!(code(exec(&mut s, "rollback")), 649);
        exec(&mut s, "begin").unwrap();
        assert_eq!(code(exec(&mut s, "begin")), 649);
        assert_eq!(s.transaction_status(), TransactionStatus::Failed);
        assert_eq!(code(exec(&mut s, "select 1")), 649);
        assert_eq!(code(exec(&mut s, "commit")), 649);
        assert!(s.transaction().is_none());
        assert_eq!(db.tx_manager().active_count(), 0);

        exec(&mut s, "begin; insert into t values (1)").unwrap();
        assert_eq!(code(exec(&mut s, "insert into t values ('x')")), 6);
        assert_eq!(s.transaction_status(), TransactionStatus::Failed);
        exec(&mut s, "rollback").unwrap();
        assert_eq!(count(&mut s, "t"), 0);
    }

    #[test]
    fn test_memory_table_in_explicit_transaction() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        create_tables(&mut s);

        exec(&mut s, "insert into m values (1)").unwrap();
        exec(&mut s, "begin").unwrap();
        assert_eq!(count(&mut s, "m"), 1);
        assert_eq!(
            exec(&mut s, "insert into m values (2)").unwrap_err().code(),
            ErrorCode::NOT_IMPLEMENTED
        );
        exec(&mut s, "rollback").unwrap();
    }

    #[test]
    fn test_ddl_is_not_transactional() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        exec(&mut s, "begin; create table t(id UInt64) engine = Memory; rollback").unwrap();
        assert!(db.catalog().get_table("default", "t").is_ok());
    }

    #[test]
    fn test_unknown_database() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = Session::open(Arc::clone(&db), "default", "", Some("missing")).unwrap();
        assert_eq!(code(exec(&mut s, "select 1")), 81);
        assert_eq!(code(exec(&mut s, "use other")), 81);

        exec(&mut s, "create database if not exists missing").unwrap();
        assert_eq!(scalar(&mut s, "select currentDatabase()"), Value::from("missing"));
        assert_eq!(
            scalar(&mut s, "select count() from system.databases where name = 'missing'"),
            Value::UInt64(1)
        );
        exec(&mut s, "use default").unwrap();
        assert_eq!(scalar(&mut s, "select currentDatabase()"), Value::from("default"));
    }

    #[test]
    fn test_authentication() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        exec(&mut s, "create user dba identified by 'dba'").unwrap();
        assert!(Session::open(Arc::clone(&db), "dba", "dba", None).is_ok());
        let err = Session::open(Arc::clone(&db), "dba", "wrong", None).err().unwrap();
        assert_eq!(err.code(), ErrorCode::AUTHENTICATION_FAILED);
    }

    #[test]
    fn test_readonly_user_level_1() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        create_tables(&mut session(&db, "default"));
        let mut s = session(&db, "reader");

        assert_eq!(s.server_info().readonly, ReadOnlyLevel::ReadOnly);
        assert_eq!(code(exec(&mut s, "insert into t values (1)")), 164);
        assert_eq!(code(exec(&mut s, "drop table if exists t")), 164);
        assert_eq!(code(exec(&mut s, "set max_result_rows = 5; select 1")), 164);
        // Same value is not a change.
        exec(&mut s, "set readonly = 1").unwrap();
        assert_eq!(scalar(&mut s, "select 1"), Value::UInt64(1));
    }

    #[test]
    fn test_readonly_user_level_1_driver_settings() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        create_tables(&mut session(&db, "default"));
        let mut s = session(&db, "reader");

        let implicit = [setting("implicit_transaction", 1u64)];
        let result = s.execute("select count() from t", &implicit).unwrap();
        assert!(matches!(result, ExecResult::Rows(_)));
        let err = s.execute("insert into t values (1)", &implicit).unwrap_err();
        assert_eq!(err.code(), ErrorCode::READONLY);
        assert!(s.transaction().is_none());

        // Asking to stay read-only does not lift level 1.
        let readonly = [setting("readonly", 2u64)];
        s.execute("select 1", &readonly).unwrap();
        assert_eq!(code(exec(&mut s, "set max_result_rows = 5")), 164);
        assert_eq!(s.effective_readonly(), ReadOnlyLevel::ReadOnly);
    }

    #[test]
    fn test_readonly_user_level_2() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        create_tables(&mut session(&db, "default"));
        let mut s = session(&db, "keeper");

        assert_eq!(scalar(&mut s, "set max_result_rows = 5; select 1"), Value::UInt64(1));
        assert_eq!(s.settings().max_result_rows, 5);
        assert_eq!(code(exec(&mut s, "set readonly = 0")), 164);
        assert_eq!(code(exec(&mut s, "insert into t values (1)")), 164);
        assert_eq!(scalar(&mut s, "select getSetting('readonly')"), Value::UInt64(2));
    }

    #[test]
    fn test_readonly_query_setting() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        create_tables(&mut s);

        let readonly = [setting("readonly", 2u64)];
        let err = s.execute("insert into t values (1)", &readonly).unwrap_err();
        assert_eq!(err.code(), ErrorCode::READONLY);
        s.execute("set max_result_rows = 10", &readonly).unwrap();

        // The query setting is gone, the SET persists.
        assert_eq!(s.settings().readonly, ReadOnlyLevel::ReadWrite);
        assert_eq!(s.settings().max_result_rows, 10);
        exec(&mut s, "insert into t values (1)").unwrap();
        assert_eq!(count(&mut s, "t"), 1);
    }

    #[test]
    fn test_max_result_rows() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        create_tables(&mut s);
        exec(&mut s, "insert into t values (1), (2), (3)").unwrap();

        exec(&mut s, "set max_result_rows = 2").unwrap();
        assert_eq!(code(exec(&mut s, "select * from t")), 396);

        let result = s
            .execute("select * from t", &[setting("result_overflow_mode", "break")])
            .unwrap();
        match result {
            ExecResult::Rows(rows) => assert_eq!(rows.rows.len(), 2),
            other => panic!("expected rows, got {other:?}"),
        }
        assert_eq!(code(exec(&mut s, "set max_threads = 1")), 115);
    }

    #[test]
    fn test_implicit_transaction() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        create_tables(&mut s);
        let implicit = [setting("implicit_transaction", 1u64)];

        let err = s
            .execute("insert into t values (1); insert into t values ('x')", &implicit)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CANNOT_PARSE_TEXT);
        assert_eq!(count(&mut s, "t"), 0);

        s.execute("insert into t values (1); insert into t values (2)", &implicit)
            .unwrap();
        assert_eq!(count(&mut s, "t"), 2);
        assert!(s.transaction().is_none());
        assert_eq!(db.tx_manager().active_count(), 0);
    }

    #[test]
    fn test_drop_aborts_open_transaction() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut reader = session(&db, "default");
        create_tables(&mut reader);
        {
            let mut writer = session(&db, "default");
            exec(&mut writer, "begin; insert into t values (1)").unwrap();
            assert_eq!(db.tx_manager().active_count(), 1);
        }
        assert_eq!(db.tx_manager().active_count(), 0);
        assert_eq!(count(&mut reader, "t"), 0);
    }

    #[test]
    fn test_snapshot_isolation() {
        let db = open_test_db(IsolationLevel::Snapshot);
        let mut a = session(&db, "default");
        let mut b = session(&db, "default");
        create_tables(&mut a);

        exec(&mut a, "begin").unwrap();
        assert_eq!(count(&mut a, "t"), 0);
        exec(&mut b, "insert into t values (1)").unwrap();
        assert_eq!(count(&mut a, "t"), 0);
        exec(&mut a, "insert into t values (2)").unwrap();
        assert_eq!(count(&mut a, "t"), 1);
        exec(&mut a, "commit").unwrap();
        assert_eq!(count(&mut a, "t"), 2);
    }

    #[test]
    fn test_empty_and_invalid_requests() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "default");
        assert_eq!(code(exec(&mut s, " ; -- nothing")), 62);
        assert_eq!(code(exec(&mut s, "selec 1")), 62);
    }

    #[test]
    fn test_server_info_and_functions() {
        let db = open_test_db(IsolationLevel::ReadCommitted);
        let mut s = session(&db, "keeper");
        let info = s.server_info();
        assert_eq!(info.version, "23.8.1.1");
        assert_eq!(info.time_zone, "UTC");
        assert_eq!(info.user, "keeper");
        assert_eq!(info.database, "default");
        assert_eq!(scalar(&mut s, "select currentUser()"), Value::from("keeper"));
        assert_eq!(scalar(&mut s, "select timezone()"), Value::from("UTC"));
    }
}
