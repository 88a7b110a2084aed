//! Expression evaluator.
//!
//! Evaluates [`BoundExpr`] nodes against a row of values. Integer arithmetic
//! wraps at 64 bits; `/` always divides as floating point; comparisons and
//! logical operators yield `UInt8` 0/1 with NULL propagation.

use std::cmp::Ordering;

use crate::datum::Value;
use crate::sql::{BinaryOperator, UnaryOperator};

use super::error::ExecutorError;
use super::expr::{BoundExpr, ScalarFunction};

impl BoundExpr {
    /// Evaluates the expression against `row`.
    ///
    /// `count` is the value [`BoundExpr::Count`] evaluates to; it is only
    /// available when an aggregating SELECT produces its result row.
    pub fn evaluate(&self, row: &[Value], count: Option<u64>) -> Result<Value, ExecutorError> {
        match self {
            BoundExpr::Literal(v) => Ok(v.clone()),
            BoundExpr::Column { index, .. } => row.get(*index).cloned().ok_or_else(|| {
                ExecutorError::Unsupported(format!("column index {index} out of range"))
            }),
            BoundExpr::BinaryOp { left, op, right } => {
                let l = left.evaluate(row, count)?;
                let r = right.evaluate(row, count)?;
                eval_binary_op(&l, *op, &r)
            }
            BoundExpr::UnaryOp { op, operand } => {
                let v = operand.evaluate(row, count)?;
                eval_unary_op(*op, &v)
            }
            BoundExpr::Function { func, arg } => {
                let v = arg.evaluate(row, count)?;
                eval_function(*func, &v)
            }
            BoundExpr::Count => count.map(Value::UInt64).ok_or_else(|| {
                ExecutorError::Unsupported("aggregate evaluated per row".to_string())
            }),
        }
    }

    /// Evaluates the expression as a WHERE condition.
    pub fn matches(&self, row: &[Value]) -> Result<bool, ExecutorError> {
        Ok(self.evaluate(row, None)?.is_truthy())
    }
}

fn flag(b: bool) -> Value {
    Value::UInt64(b as u64)
}

/// Evaluates a binary operation.
fn eval_binary_op(left: &Value, op: BinaryOperator, right: &Value) -> Result<Value, ExecutorError> {
    match op {
        BinaryOperator::And => return Ok(eval_and(left, right)),
        BinaryOperator::Or => return Ok(eval_or(left, right)),
        _ => {}
    }

    // NULL propagation for all other operators
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    if op.is_comparison() {
        let ordering = left.compare(right).ok_or_else(|| {
            ExecutorError::TypeMismatch(format!("cannot compare {left} with {right}"))
        })?;
        let result = match op {
            BinaryOperator::Eq => ordering == Ordering::Equal,
            BinaryOperator::Neq => ordering != Ordering::Equal,
            BinaryOperator::Lt => ordering == Ordering::Less,
            BinaryOperator::LtEq => ordering != Ordering::Greater,
            BinaryOperator::Gt => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(flag(result));
    }

    eval_arithmetic(left, op, right)
}

fn eval_arithmetic(
    left: &Value,
    op: BinaryOperator,
    right: &Value,
) -> Result<Value, ExecutorError> {
    let mismatch = || {
        ExecutorError::TypeMismatch(format!(
            "illegal types of arguments {left} and {right} for operator {}",
            op.as_str()
        ))
    };

    let both_integers = matches!(
        (left, right),
        (Value::UInt64(_) | Value::Int64(_), Value::UInt64(_) | Value::Int64(_))
    );
    if op == BinaryOperator::Div || !both_integers {
        let (l, r) = match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => return Err(mismatch()),
            _ => (
                left.to_f64().ok_or_else(mismatch)?,
                right.to_f64().ok_or_else(mismatch)?,
            ),
        };
        let result = match op {
            BinaryOperator::Add => l + r,
            BinaryOperator::Sub => l - r,
            BinaryOperator::Mul => l * r,
            BinaryOperator::Div => l / r,
            _ => l % r,
        };
        return Ok(Value::Float64(result));
    }

    let (l, r) = (
        left.to_i128().ok_or_else(mismatch)?,
        right.to_i128().ok_or_else(mismatch)?,
    );
    let result = match op {
        BinaryOperator::Add => l.wrapping_add(r),
        BinaryOperator::Sub => l.wrapping_sub(r),
        BinaryOperator::Mul => l.wrapping_mul(r),
        _ => {
            if r == 0 {
                return Err(ExecutorError::DivisionByZero);
            }
            l % r
        }
    };
    let unsigned = matches!((left, right), (Value::UInt64(_), Value::UInt64(_)));
    Ok(if unsigned {
        Value::UInt64(result as u64)
    } else {
        Value::Int64(result as i64)
    })
}

/// AND with NULL logic: a false operand wins over NULL.
fn eval_and(left: &Value, right: &Value) -> Value {
    match (left.is_null(), right.is_null()) {
        (false, false) => flag(left.is_truthy() && right.is_truthy()),
        (true, false) if !right.is_truthy() => flag(false),
        (false, true) if !left.is_truthy() => flag(false),
        _ => Value::Null,
    }
}

/// OR with NULL logic: a true operand wins over NULL.
fn eval_or(left: &Value, right: &Value) -> Value {
    match (left.is_null(), right.is_null()) {
        (false, false) => flag(left.is_truthy() || right.is_truthy()),
        (true, false) if right.is_truthy() => flag(true),
        (false, true) if left.is_truthy() => flag(true),
        _ => Value::Null,
    }
}

fn eval_unary_op(op: UnaryOperator, value: &Value) -> Result<Value, ExecutorError> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOperator::Not, v) => Ok(flag(!v.is_truthy())),
        (UnaryOperator::Minus, Value::Float64(f)) => Ok(Value::Float64(-f)),
        (UnaryOperator::Minus, Value::UInt64(v)) => Ok(Value::Int64((*v as i64).wrapping_neg())),
        (UnaryOperator::Minus, Value::Int64(v)) => Ok(Value::Int64(v.wrapping_neg())),
        (UnaryOperator::Minus, v) => Err(ExecutorError::TypeMismatch(format!(
            "illegal type of argument {v} for unary minus"
        ))),
    }
}

fn eval_function(func: ScalarFunction, value: &Value) -> Result<Value, ExecutorError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let text = value.as_str().ok_or_else(|| {
        ExecutorError::TypeMismatch(format!(
            "illegal argument {value} for {func:?}, expected String"
        ))
    })?;
    Ok(match func {
        ScalarFunction::Lower => Value::String(text.to_lowercase()),
        ScalarFunction::Upper => Value::String(text.to_uppercase()),
        // Byte length, like the reference server.
        ScalarFunction::Length => Value::UInt64(text.len() as u64),
    })
}
