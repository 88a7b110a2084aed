//! Bound expression tree with bind-time column resolution.
//!
//! [`BoundExpr`] is the executor's internal representation of SQL expressions.
//! Unlike the AST [`Expr`], column references are resolved to positional
//! indices and session functions (`version()`, `currentDatabase()`, ...) are
//! folded into literals at bind time.

use crate::datum::{Type, Value};
use crate::sql::{BinaryOperator, Expr, UnaryOperator};

use super::context::SessionEnv;
use super::error::ExecutorError;
use super::types::ColumnDesc;

/// Row-level scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    Lower,
    Upper,
    Length,
}

/// An expression tree with column references resolved to positional indices.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    /// Constant.
    Literal(Value),
    /// Column reference resolved to a positional index.
    Column { index: usize, ty: Type },
    BinaryOp {
        left: Box<BoundExpr>,
        op: BinaryOperator,
        right: Box<BoundExpr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<BoundExpr>,
    },
    Function {
        func: ScalarFunction,
        arg: Box<BoundExpr>,
    },
    /// `count()`, `count(*)` or `count(expr)`: number of rows that passed
    /// the WHERE clause.
    Count,
}

/// Names visible to column references.
pub struct BindScope<'a> {
    /// Table name usable as a qualifier (`t.col`).
    pub table: Option<&'a str>,
    pub columns: &'a [ColumnDesc],
}

impl BindScope<'_> {
    /// A scope without columns (INSERT values, FROM-less SELECT).
    pub const EMPTY: BindScope<'static> = BindScope {
        table: None,
        columns: &[],
    };
}

impl BoundExpr {
    /// Binds an AST expression.
    ///
    /// Fails on unknown columns or functions, wrong argument counts and
    /// unbound `?` placeholders.
    pub fn bind(
        expr: &Expr,
        scope: &BindScope<'_>,
        env: &dyn SessionEnv,
    ) -> Result<BoundExpr, ExecutorError> {
        match expr {
            Expr::Literal(v) => Ok(BoundExpr::Literal(v.clone())),
            Expr::ColumnRef { table, column } => resolve_column(table.as_deref(), column, scope),
            Expr::Parameter(index) => Err(ExecutorError::UnboundParameter { index: index + 1 }),
            Expr::BinaryOp { left, op, right } => Ok(BoundExpr::BinaryOp {
                left: Box::new(Self::bind(left, scope, env)?),
                op: *op,
                right: Box::new(Self::bind(right, scope, env)?),
            }),
            Expr::UnaryOp { op, operand } => Ok(BoundExpr::UnaryOp {
                op: *op,
                operand: Box::new(Self::bind(operand, scope, env)?),
            }),
            Expr::Function { name, args } => bind_function(name, args, scope, env),
        }
    }

    /// Returns the output type, or `None` for an untyped NULL literal.
    pub fn ty(&self) -> Option<Type> {
        match self {
            BoundExpr::Literal(v) => v.natural_type(),
            BoundExpr::Column { ty, .. } => Some(*ty),
            BoundExpr::BinaryOp { left, op, right } => binary_op_type(*op, left.ty(), right.ty()),
            BoundExpr::UnaryOp {
                op: UnaryOperator::Not,
                ..
            } => Some(Type::UInt8),
            BoundExpr::UnaryOp { operand, .. } => match operand.ty() {
                Some(Type::Float32 | Type::Float64) => Some(Type::Float64),
                Some(_) => Some(Type::Int64),
                None => None,
            },
            BoundExpr::Function {
                func: ScalarFunction::Length,
                ..
            }
            | BoundExpr::Count => Some(Type::UInt64),
            BoundExpr::Function { .. } => Some(Type::String),
        }
    }

    /// Returns true if the tree contains an aggregate.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            BoundExpr::Count => true,
            BoundExpr::BinaryOp { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            BoundExpr::UnaryOp { operand, .. } => operand.contains_aggregate(),
            BoundExpr::Function { arg, .. } => arg.contains_aggregate(),
            BoundExpr::Literal(_) | BoundExpr::Column { .. } => false,
        }
    }
}

/// Result type of a binary operator.
fn binary_op_type(op: BinaryOperator, left: Option<Type>, right: Option<Type>) -> Option<Type> {
    if op.is_comparison() || matches!(op, BinaryOperator::And | BinaryOperator::Or) {
        return Some(Type::UInt8);
    }
    let (left, right) = (left?, right?);
    let is_float = |t: Type| matches!(t, Type::Float32 | Type::Float64);
    if op == BinaryOperator::Div || is_float(left) || is_float(right) {
        Some(Type::Float64)
    } else if left.is_unsigned() && right.is_unsigned() {
        Some(Type::UInt64)
    } else {
        Some(Type::Int64)
    }
}

fn resolve_column(
    table: Option<&str>,
    column: &str,
    scope: &BindScope<'_>,
) -> Result<BoundExpr, ExecutorError> {
    let unknown = || ExecutorError::UnknownColumn {
        name: match table {
            Some(t) => format!("{t}.{column}"),
            None => column.to_string(),
        },
    };
    if let Some(qualifier) = table
        && scope.table != Some(qualifier)
    {
        return Err(unknown());
    }
    scope
        .columns
        .iter()
        .position(|c| c.name == column)
        .map(|index| BoundExpr::Column {
            index,
            ty: scope.columns[index].ty,
        })
        .ok_or_else(unknown)
}

fn bind_function(
    name: &str,
    args: &[Expr],
    scope: &BindScope<'_>,
    env: &dyn SessionEnv,
) -> Result<BoundExpr, ExecutorError> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(ExecutorError::ArgumentCount {
                function: name.to_string(),
                expected,
                found: args.len(),
            })
        }
    };
    let text = |s: &str| Ok(BoundExpr::Literal(Value::String(s.to_string())));

    match name.to_ascii_lowercase().as_str() {
        "count" => {
            if args.len() > 1 {
                arity(1)?;
            }
            // The argument only needs to resolve; stored rows are never NULL.
            for arg in args {
                BoundExpr::bind(arg, scope, env)?;
            }
            Ok(BoundExpr::Count)
        }
        "version" => {
            arity(0)?;
            text(env.server_version())
        }
        "timezone" => {
            arity(0)?;
            text(env.time_zone())
        }
        "currentdatabase" => {
            arity(0)?;
            text(env.current_database())
        }
        "currentuser" => {
            arity(0)?;
            text(env.current_user())
        }
        "getsetting" => {
            arity(1)?;
            let setting = match &args[0] {
                Expr::Literal(Value::String(s)) => s,
                other => {
                    return Err(ExecutorError::TypeMismatch(format!(
                        "getSetting expects a constant string, got {other}"
                    )));
                }
            };
            env.setting(setting)
                .map(BoundExpr::Literal)
                .ok_or_else(|| ExecutorError::UnknownSetting {
                    name: setting.clone(),
                })
        }
        "lower" | "upper" | "length" => {
            arity(1)?;
            let func = match name.to_ascii_lowercase().as_str() {
                "lower" => ScalarFunction::Lower,
                "upper" => ScalarFunction::Upper,
                _ => ScalarFunction::Length,
            };
            Ok(BoundExpr::Function {
                func,
                arg: Box::new(BoundExpr::bind(&args[0], scope, env)?),
            })
        }
        _ => Err(ExecutorError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::context::tests::TestEnv;
    use crate::sql::Parser;

    fn columns() -> Vec<ColumnDesc> {
        vec![
            ColumnDesc::new("id", Type::UInt64),
            ColumnDesc::new("name", Type::String),
        ]
    }

    fn bind(sql: &str) -> Result<BoundExpr, ExecutorError> {
        let expr = Parser::new(sql).parse_expr().unwrap();
        let columns = columns();
        let scope = BindScope {
            table: Some("t"),
            columns: &columns,
        };
        BoundExpr::bind(&expr, &scope, &TestEnv::default())
    }

    #[test]
    fn test_bind_columns() {
        assert_eq!(
            bind("name").unwrap(),
            BoundExpr::Column {
                index: 1,
                ty: Type::String
            }
        );
        assert_eq!(bind("t.id").unwrap().ty(), Some(Type::UInt64));
        assert!(matches!(bind("missing"), Err(ExecutorError::UnknownColumn { .. })));
        assert!(matches!(bind("u.id"), Err(ExecutorError::UnknownColumn { .. })));
    }

    #[test]
    fn test_bind_session_functions() {
        assert_eq!(
            bind("currentDatabase()").unwrap(),
            BoundExpr::Literal(Value::String("default".to_string()))
        );
        assert_eq!(
            bind("getSetting('readonly')").unwrap(),
            BoundExpr::Literal(Value::UInt64(0))
        );
        assert!(matches!(
            bind("getSetting('nope')"),
            Err(ExecutorError::UnknownSetting { .. })
        ));
        assert!(matches!(
            bind("version(1)"),
            Err(ExecutorError::ArgumentCount { .. })
        ));
        assert!(matches!(
            bind("frobnicate(id)"),
            Err(ExecutorError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_bind_count() {
        assert_eq!(bind("count()").unwrap(), BoundExpr::Count);
        assert_eq!(bind("count(*)").unwrap(), BoundExpr::Count);
        assert!(bind("count(id) + 1").unwrap().contains_aggregate());
        assert!(bind("count(missing)").is_err());
    }

    #[test]
    fn test_bind_parameter_fails() {
        assert_eq!(
            bind("id = ?").unwrap_err(),
            ExecutorError::UnboundParameter { index: 1 }
        );
    }

    #[test]
    fn test_static_types() {
        assert_eq!(bind("id + 1").unwrap().ty(), Some(Type::UInt64));
        assert_eq!(bind("id - -1").unwrap().ty(), Some(Type::Int64));
        assert_eq!(bind("id / 2").unwrap().ty(), Some(Type::Float64));
        assert_eq!(bind("id = 1 AND name <> 'x'").unwrap().ty(), Some(Type::UInt8));
        assert_eq!(bind("length(name)").unwrap().ty(), Some(Type::UInt64));
        assert_eq!(bind("upper(name)").unwrap().ty(), Some(Type::String));
        assert_eq!(bind("NULL").unwrap().ty(), None);
    }
}
