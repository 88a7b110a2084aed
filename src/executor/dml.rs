//! INSERT and DELETE execution.

use std::sync::Arc;

use crate::catalog::CatalogError;
use crate::datum::Value;
use crate::heap::Table;
use crate::sql::{DeleteStmt, InsertStmt, Privilege, TableName};

use super::context::ExecContext;
use super::error::ExecutorError;
use super::expr::{BindScope, BoundExpr};
use super::types::ColumnDesc;

/// Resolves the target of a write and checks that it may be written.
///
/// System tables fail DATABASE_ACCESS_DENIED, missing grants ACCESS_DENIED,
/// and non-transactional engines inside an explicit transaction
/// NOT_IMPLEMENTED.
fn resolve_target(
    ctx: &ExecContext<'_>,
    name: &TableName,
    privilege: Privilege,
) -> Result<Arc<Table>, ExecutorError> {
    let database = ctx.database_of(name);
    if ctx.catalog.is_builtin(&database) {
        return Err(CatalogError::ReadOnlyDatabase { name: database }.into());
    }
    let table = ctx.catalog.get_table(&database, &name.name)?;
    ctx.check_privilege(privilege, &database, &name.name)?;

    let def = table.def();
    if ctx.explicit_transaction && !def.engine.is_transactional() {
        return Err(ExecutorError::NotTransactional {
            table: def.qualified_name(),
            engine: def.engine.name().to_string(),
        });
    }
    Ok(table)
}

/// Executes an INSERT ... VALUES.
///
/// Omitted columns receive their type's default value; every value is
/// coerced into its column type before anything is written.
pub fn execute_insert(ctx: &ExecContext<'_>, stmt: &InsertStmt) -> Result<u64, ExecutorError> {
    if stmt.rows.is_empty() {
        return Err(ExecutorError::NoDataToInsert);
    }
    let table = resolve_target(ctx, &stmt.table, Privilege::Insert)?;
    let def = table.def();

    // Position in the table of each supplied value.
    let targets: Vec<usize> = match &stmt.columns {
        None => (0..def.columns.len()).collect(),
        Some(names) => {
            let mut targets = Vec::with_capacity(names.len());
            for name in names {
                let index = def
                    .column_index(name)
                    .ok_or_else(|| ExecutorError::UnknownColumn { name: name.clone() })?;
                if targets.contains(&index) {
                    return Err(ExecutorError::DuplicateColumn { name: name.clone() });
                }
                targets.push(index);
            }
            targets
        }
    };

    let mut rows = Vec::with_capacity(stmt.rows.len());
    for exprs in &stmt.rows {
        if exprs.len() != targets.len() {
            return Err(ExecutorError::ColumnCountMismatch {
                expected: targets.len(),
                found: exprs.len(),
            });
        }
        let mut row: Vec<Value> = def.columns.iter().map(|c| c.ty.default_value()).collect();
        for (expr, &index) in exprs.iter().zip(&targets) {
            let value = BoundExpr::bind(expr, &BindScope::EMPTY, ctx.env)?.evaluate(&[], None)?;
            let column = &def.columns[index];
            row[index] = column
                .ty
                .coerce(value)
                .map_err(|source| ExecutorError::Coercion {
                    column: column.name.clone(),
                    source,
                })?;
        }
        rows.push(row);
    }

    Ok(table.insert(ctx.write_txid()?, rows) as u64)
}

/// Executes a DELETE, marking matching rows as deleted by the current
/// transaction.
pub fn execute_delete(ctx: &ExecContext<'_>, stmt: &DeleteStmt) -> Result<u64, ExecutorError> {
    let table = resolve_target(ctx, &stmt.table, Privilege::Delete)?;
    let columns: Vec<ColumnDesc> = table
        .def()
        .columns
        .iter()
        .map(|c| ColumnDesc::new(c.name.clone(), c.ty))
        .collect();
    let scope = BindScope {
        table: Some(&stmt.table.name),
        columns: &columns,
    };
    let filter = stmt
        .where_clause
        .as_ref()
        .map(|expr| BoundExpr::bind(expr, &scope, ctx.env))
        .transpose()?;

    let txid = ctx.write_txid()?;
    let deleted = table.delete(txid, &ctx.snapshot, ctx.tx_manager, |row| match &filter {
        Some(filter) => filter.matches(row),
        None => Ok(true),
    })?;
    Ok(deleted as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::ErrorCode;
    use crate::executor::context::tests::{TestDb, TestEnv};
    use crate::executor::execute;
    use crate::sql::Parser;
    use crate::tx::TxId;

    /// Runs `sql` in its own committed transaction.
    fn run(db: &TestDb, sql: &str) -> Result<u64, ExecutorError> {
        let stmt = Parser::new(sql).parse().unwrap().unwrap();
        let txid = db.tx_manager.begin();
        let result = execute(&db.ctx(txid), &stmt);
        match &result {
            Ok(_) => db.tx_manager.commit(txid).unwrap(),
            Err(_) => db.tx_manager.abort(txid).unwrap(),
        }
        result.map(|r| match r {
            crate::executor::ExecResult::Affected(n) => n,
            _ => 0,
        })
    }

    fn values(db: &TestDb) -> Vec<Vec<Value>> {
        db.catalog
            .get_table("default", "t")
            .unwrap()
            .scan(&db.tx_manager.snapshot(TxId::INVALID), &db.tx_manager)
    }

    fn setup(engine: &str) -> TestDb {
        let db = TestDb::new();
        run(
            &db,
            &format!("create table t(id UInt64, name String, flag UInt8) engine={engine}"),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_insert_with_column_list_and_defaults() {
        let db = setup("MergeTree order by id");
        assert_eq!(run(&db, "insert into t(name, id) values ('x', 1), ('y', -1)"), Ok(2));
        assert_eq!(
            values(&db),
            vec![
                vec![Value::UInt64(1), Value::from("x"), Value::UInt64(0)],
                vec![Value::UInt64(u64::MAX), Value::from("y"), Value::UInt64(0)],
            ]
        );
    }

    #[test]
    fn test_insert_coercion() {
        let db = setup("MergeTree order by id");
        assert_eq!(run(&db, "insert into t values ('42', 7, 300)"), Ok(1));
        assert_eq!(
            values(&db),
            vec![vec![Value::UInt64(42), Value::from("7"), Value::UInt64(44)]]
        );

        let err = run(&db, "insert into t values ('x', 'a', 1)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CANNOT_PARSE_TEXT);
    }

    #[test]
    fn test_insert_errors() {
        let db = setup("MergeTree order by id");
        let code = |sql: &str| run(&db, sql).unwrap_err().code();
        assert_eq!(code("insert into t"), ErrorCode::NO_DATA_TO_INSERT);
        assert_eq!(code("insert into t values (1)"), ErrorCode::NUMBER_OF_COLUMNS_DOESNT_MATCH);
        assert_eq!(code("insert into t(nope) values (1)"), ErrorCode::UNKNOWN_IDENTIFIER);
        assert_eq!(code("insert into t(id, id) values (1, 2)"), ErrorCode::DUPLICATE_COLUMN);
        assert_eq!(code("insert into t(id) values (?)"), ErrorCode::UNKNOWN_QUERY_PARAMETER);
        assert_eq!(code("insert into missing values (1)"), ErrorCode::UNKNOWN_TABLE);
        assert_eq!(code("insert into system.one values (1)"), ErrorCode::DATABASE_ACCESS_DENIED);
        assert!(values(&db).is_empty());
    }

    #[test]
    fn test_delete() {
        let db = setup("MergeTree order by id");
        run(&db, "insert into t(id) values (1), (2), (3)").unwrap();
        assert_eq!(run(&db, "delete from t where id > 1"), Ok(2));
        assert_eq!(values(&db).len(), 1);
        assert_eq!(run(&db, "delete from t"), Ok(1));
        assert!(values(&db).is_empty());
    }

    #[test]
    fn test_memory_table_rejects_explicit_transaction() {
        let db = setup("Memory");
        let stmt = Parser::new("insert into t(id) values (1)").parse().unwrap().unwrap();
        let txid = db.tx_manager.begin();
        let ctx = ExecContext {
            explicit_transaction: true,
            ..db.ctx(txid)
        };
        assert_eq!(execute(&ctx, &stmt).unwrap_err().code(), ErrorCode::NOT_IMPLEMENTED);

        // Outside an explicit transaction the write succeeds.
        assert_eq!(execute(&db.ctx(txid), &stmt), Ok(crate::executor::ExecResult::Affected(1)));
        db.tx_manager.commit(txid).unwrap();
    }

    #[test]
    fn test_write_requires_grant() {
        let db = setup("MergeTree order by id");
        run(&db, "create user guest").unwrap();
        let env = TestEnv {
            user: "guest".to_string(),
            ..TestEnv::default()
        };
        let stmt = Parser::new("insert into t(id) values (1)").parse().unwrap().unwrap();
        let txid = db.tx_manager.begin();
        let ctx = ExecContext { env: &env, ..db.ctx(txid) };
        assert_eq!(execute(&ctx, &stmt).unwrap_err().code(), ErrorCode::ACCESS_DENIED);

        run(&db, "grant insert on default.t to guest").unwrap();
        assert!(execute(&ctx, &stmt).is_ok());
        db.tx_manager.commit(txid).unwrap();
    }
}
