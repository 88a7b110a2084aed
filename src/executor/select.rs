//! SELECT execution: scan, filter, project, aggregate, limit.

use crate::datum::{Type, Value};
use crate::sql::{SelectItem, SelectStmt};

use super::context::ExecContext;
use super::error::ExecutorError;
use super::expr::{BindScope, BoundExpr};
use super::system::system_rows;
use super::types::{ColumnDesc, Rows};

/// Rows of the FROM clause together with their layout.
struct Source {
    table: Option<String>,
    columns: Vec<ColumnDesc>,
    rows: Vec<Vec<Value>>,
}

/// Loads the rows of the FROM clause visible to the context's snapshot.
///
/// Without FROM the source is a single row with no columns.
fn load_source(ctx: &ExecContext<'_>, stmt: &SelectStmt) -> Result<Source, ExecutorError> {
    let Some(from) = &stmt.from else {
        return Ok(Source {
            table: None,
            columns: vec![],
            rows: vec![vec![]],
        });
    };

    let database = ctx.database_of(from);
    if let Some(system) = ctx.catalog.get_system_table(&database, &from.name) {
        let columns = system
            .columns()
            .into_iter()
            .map(|c| ColumnDesc::new(c.name, c.ty))
            .collect();
        return Ok(Source {
            table: Some(from.name.clone()),
            columns,
            rows: system_rows(ctx, system),
        });
    }

    let table = ctx.catalog.get_table(&database, &from.name)?;
    let columns = table
        .def()
        .columns
        .iter()
        .map(|c| ColumnDesc::new(c.name.clone(), c.ty))
        .collect();
    Ok(Source {
        table: Some(from.name.clone()),
        columns,
        rows: table.scan(&ctx.snapshot, ctx.tx_manager),
    })
}

/// Executes a SELECT.
pub fn execute_select(ctx: &ExecContext<'_>, stmt: &SelectStmt) -> Result<Rows, ExecutorError> {
    let source = load_source(ctx, stmt)?;
    let scope = BindScope {
        table: source.table.as_deref(),
        columns: &source.columns,
    };

    let filter = stmt
        .where_clause
        .as_ref()
        .map(|expr| BoundExpr::bind(expr, &scope, ctx.env))
        .transpose()?;
    if let Some(filter) = &filter
        && filter.contains_aggregate()
    {
        return Err(ExecutorError::Unsupported(
            "aggregate function in WHERE".to_string(),
        ));
    }

    let mut projections = Vec::new();
    let mut columns = Vec::new();
    for item in &stmt.columns {
        match item {
            SelectItem::Wildcard => {
                for (index, column) in source.columns.iter().enumerate() {
                    projections.push(BoundExpr::Column {
                        index,
                        ty: column.ty,
                    });
                    columns.push(column.clone());
                }
            }
            SelectItem::Expr { expr, alias } => {
                let bound = BoundExpr::bind(expr, &scope, ctx.env)?;
                let name = alias.clone().unwrap_or_else(|| expr.to_string());
                columns.push(ColumnDesc::new(name, bound.ty().unwrap_or(Type::String)));
                projections.push(bound);
            }
        }
    }

    let mut filtered = Vec::with_capacity(source.rows.len());
    for row in source.rows {
        if let Some(filter) = &filter
            && !filter.matches(&row)?
        {
            continue;
        }
        filtered.push(row);
    }

    let limit = stmt.limit.map_or(usize::MAX, |n| n as usize);
    let rows = if projections.iter().any(BoundExpr::contains_aggregate) {
        let count = filtered.len() as u64;
        let mut row = Vec::with_capacity(projections.len());
        for expr in &projections {
            if let Some(name) = first_free_column(expr, &source.columns) {
                return Err(ExecutorError::NotAnAggregate { name });
            }
            row.push(expr.evaluate(&[], Some(count))?);
        }
        vec![row].into_iter().take(limit).collect()
    } else {
        let mut rows = Vec::new();
        for row in filtered.iter().take(limit) {
            let values = projections
                .iter()
                .map(|expr| expr.evaluate(row, None))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(values);
        }
        rows
    };

    Ok(Rows { columns, rows })
}

/// Returns the name of a column referenced outside an aggregate.
fn first_free_column(expr: &BoundExpr, columns: &[ColumnDesc]) -> Option<String> {
    match expr {
        BoundExpr::Column { index, .. } => columns.get(*index).map(|c| c.name.clone()),
        BoundExpr::BinaryOp { left, right, .. } => {
            first_free_column(left, columns).or_else(|| first_free_column(right, columns))
        }
        BoundExpr::UnaryOp { operand, .. } => first_free_column(operand, columns),
        BoundExpr::Function { arg, .. } => first_free_column(arg, columns),
        BoundExpr::Literal(_) | BoundExpr::Count => None,
    }
}
