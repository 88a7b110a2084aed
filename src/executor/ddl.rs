//! Schema and access-control statements.
//!
//! These take effect immediately and are never part of a transaction.
//! Users created through SQL need an `ALL` grant covering the target for
//! schema changes; database and user management needs a global `ALL` grant.

use crate::catalog::{GrantScope, ReadOnlyLevel, TableDef};
use crate::sql::{
    Authentication, CreateDatabaseStmt, CreateTableStmt, CreateUserStmt, DropDatabaseStmt,
    DropTableStmt, DropUserStmt, GrantStmt, GrantTarget, Privilege,
};

use super::context::ExecContext;
use super::error::ExecutorError;

/// Placeholder table name for privilege checks that target a whole database.
const ANY_TABLE: &str = "*";

pub fn execute_create_table(
    ctx: &ExecContext<'_>,
    stmt: &CreateTableStmt,
) -> Result<(), ExecutorError> {
    let database = ctx.database_of(&stmt.table);
    ctx.check_privilege(Privilege::All, &database, &stmt.table.name)?;
    let def = TableDef::from_stmt(&database, stmt)?;
    ctx.catalog.create_table(def, stmt.if_not_exists)?;
    Ok(())
}

pub fn execute_drop_table(
    ctx: &ExecContext<'_>,
    stmt: &DropTableStmt,
) -> Result<(), ExecutorError> {
    let database = ctx.database_of(&stmt.table);
    ctx.check_privilege(Privilege::All, &database, &stmt.table.name)?;
    ctx.catalog
        .drop_table(&database, &stmt.table.name, stmt.if_exists)?;
    Ok(())
}

pub fn execute_create_database(
    ctx: &ExecContext<'_>,
    stmt: &CreateDatabaseStmt,
) -> Result<(), ExecutorError> {
    ctx.check_privilege(Privilege::All, &stmt.name, ANY_TABLE)?;
    ctx.catalog
        .create_database(&stmt.name, stmt.if_not_exists)?;
    Ok(())
}

pub fn execute_drop_database(
    ctx: &ExecContext<'_>,
    stmt: &DropDatabaseStmt,
) -> Result<(), ExecutorError> {
    ctx.check_privilege(Privilege::All, &stmt.name, ANY_TABLE)?;
    ctx.catalog.drop_database(&stmt.name, stmt.if_exists)?;
    Ok(())
}

/// Creates a user. The only supported user setting is `readonly`.
pub fn execute_create_user(
    ctx: &ExecContext<'_>,
    stmt: &CreateUserStmt,
) -> Result<(), ExecutorError> {
    ctx.check_privilege(Privilege::All, ANY_TABLE, ANY_TABLE)?;

    let mut readonly = ReadOnlyLevel::ReadWrite;
    for setting in &stmt.settings {
        if setting.name != "readonly" {
            return Err(ExecutorError::UnknownSetting {
                name: setting.name.clone(),
            });
        }
        readonly = ReadOnlyLevel::from_value(&setting.value).ok_or_else(|| {
            ExecutorError::InvalidSettingValue {
                name: setting.name.clone(),
                value: setting.value.to_string(),
            }
        })?;
    }
    let password = match &stmt.auth {
        Authentication::NoPassword => None,
        Authentication::Password(p) => Some(p.clone()),
    };
    ctx.users
        .create(&stmt.name, password, readonly, stmt.if_not_exists)?;
    Ok(())
}

pub fn execute_drop_user(ctx: &ExecContext<'_>, stmt: &DropUserStmt) -> Result<(), ExecutorError> {
    ctx.check_privilege(Privilege::All, ANY_TABLE, ANY_TABLE)?;
    ctx.users.drop_users(&stmt.names, stmt.if_exists)?;
    Ok(())
}

pub fn execute_grant(ctx: &ExecContext<'_>, stmt: &GrantStmt) -> Result<(), ExecutorError> {
    ctx.check_privilege(Privilege::All, ANY_TABLE, ANY_TABLE)?;
    let scope = match &stmt.target {
        GrantTarget::All => GrantScope::Global,
        GrantTarget::CurrentDatabase => {
            GrantScope::Database(ctx.env.current_database().to_string())
        }
        GrantTarget::Database(db) => GrantScope::Database(db.clone()),
        GrantTarget::Table(table) => GrantScope::Table {
            database: ctx.database_of(table),
            name: table.name.clone(),
        },
    };
    ctx.users.grant(&stmt.grantees, &stmt.privileges, scope)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::catalog::ReadOnlyLevel;
    use crate::error_code::ErrorCode;
    use crate::executor::context::tests::TestDb;
    use crate::executor::{ExecResult, ExecutorError, execute};
    use crate::sql::{Parser, Privilege};
    use crate::tx::TxId;

    fn run(db: &TestDb, sql: &str) -> Result<ExecResult, ExecutorError> {
        let stmt = Parser::new(sql).parse().unwrap().unwrap();
        execute(&db.ctx(TxId::INVALID), &stmt)
    }

    #[test]
    fn test_table_lifecycle() {
        let db = TestDb::new();
        run(&db, "create database if not exists analytics").unwrap();
        run(&db, "create table analytics.events(id UInt64) engine=MergeTree order by id").unwrap();
        assert!(db.catalog.get_table("analytics", "events").is_ok());
        assert_eq!(
            run(&db, "create table analytics.events(id UInt64) engine=Memory")
                .unwrap_err()
                .code(),
            ErrorCode::TABLE_ALREADY_EXISTS
        );
        run(&db, "create table if not exists analytics.events(id UInt64) engine=Memory").unwrap();

        run(&db, "drop table analytics.events").unwrap();
        run(&db, "drop table if exists analytics.events").unwrap();
        assert_eq!(
            run(&db, "drop table analytics.events").unwrap_err().code(),
            ErrorCode::UNKNOWN_TABLE
        );
        run(&db, "drop database analytics").unwrap();
        assert_eq!(
            run(&db, "create table analytics.t(id UInt64)").unwrap_err().code(),
            ErrorCode::UNKNOWN_DATABASE
        );
    }

    #[test]
    fn test_database_errors() {
        let db = TestDb::new();
        assert_eq!(
            run(&db, "create database default").unwrap_err().code(),
            ErrorCode::DATABASE_ALREADY_EXISTS
        );
        assert_eq!(
            run(&db, "drop database nope").unwrap_err().code(),
            ErrorCode::UNKNOWN_DATABASE
        );
        assert_eq!(
            run(&db, "drop database system").unwrap_err().code(),
            ErrorCode::DATABASE_ACCESS_DENIED
        );
    }

    #[test]
    fn test_users_and_grants() {
        let db = TestDb::new();
        run(&db, "create user ro identified by 'pw' settings readonly = 2").unwrap();
        let user = db.users.get("ro").unwrap();
        assert_eq!(user.readonly, ReadOnlyLevel::ReadOnlyKeepSettings);
        assert_eq!(user.password.as_deref(), Some("pw"));
        assert_eq!(
            run(&db, "create user ro").unwrap_err().code(),
            ErrorCode::ACCESS_ENTITY_ALREADY_EXISTS
        );
        assert_eq!(
            run(&db, "create user x settings max_threads = 1").unwrap_err().code(),
            ErrorCode::UNKNOWN_SETTING
        );

        run(&db, "grant select, insert on *.* to ro").unwrap();
        assert!(db.users.check_privilege("ro", Privilege::Insert, "any", "t"));
        assert!(!db.users.check_privilege("ro", Privilege::Delete, "any", "t"));

        assert_eq!(
            run(&db, "grant all on *.* to ghost").unwrap_err().code(),
            ErrorCode::UNKNOWN_USER
        );
        run(&db, "drop user if exists ro, ghost").unwrap();
        assert!(db.users.get("ro").is_none());
    }
}
