//! Row materialization for the `system` database.

use crate::catalog::SystemTable;
use crate::datum::Value;

use super::context::ExecContext;

/// Builds the current rows of a system table.
///
/// `system.tables.total_rows` counts committed rows only, independent of the
/// reading session.
pub fn system_rows(ctx: &ExecContext<'_>, table: SystemTable) -> Vec<Vec<Value>> {
    match table {
        SystemTable::Databases => ctx
            .catalog
            .list_databases()
            .into_iter()
            .map(|db| vec![Value::String(db.name), Value::from(db.engine)])
            .collect(),
        SystemTable::Tables => ctx
            .catalog
            .list_tables()
            .into_iter()
            .map(|table| {
                let def = table.def();
                vec![
                    Value::String(def.database.clone()),
                    Value::String(def.name.clone()),
                    Value::from(def.engine.name()),
                    Value::UInt64(table.live_rows(ctx.tx_manager)),
                ]
            })
            .collect(),
        SystemTable::One => vec![vec![Value::UInt64(0)]],
        SystemTable::Users => ctx
            .users
            .list()
            .into_iter()
            .map(|user| vec![Value::String(user.name), Value::UInt64(user.readonly.as_u8() as u64)])
            .collect(),
    }
}
