// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-process evaluation of scalar sub-expressions.
//!
//! Pattern values in a predicate may be arbitrary scalar computations
//! (`"prefix" + suffix`, `name.to_lower()`, `limit * 2`). They are evaluated
//! synchronously, without I/O, when the query is built. References to the
//! query source cannot be evaluated and are reported as
//! [`EvalError::NotScalar`].

use std::cmp::Ordering;

use crate::error::EvalError;
use crate::expr::{ArithOp, CompareOp, Expr};
use crate::value::Value;

/// Evaluate a scalar expression to a value.
pub fn evaluate(expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Constant(v) => Ok(v.clone()),
        Expr::Arith { op, left, right } => arith(*op, evaluate(left)?, evaluate(right)?),
        Expr::Not(inner) => match evaluate(inner)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(EvalError::TypeMismatch {
                op: "!",
                left: other.type_name(),
                right: "bool",
            }),
        },
        Expr::Compare { op, left, right } if op.is_relational() => {
            let (l, r) = (evaluate(left)?, evaluate(right)?);
            compare_values(*op, &l, &r)
                .map(Value::Bool)
                .ok_or(EvalError::TypeMismatch {
                    op: op.symbol(),
                    left: l.type_name(),
                    right: r.type_name(),
                })
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let receiver = target.as_deref().map(evaluate).transpose()?;
            let args = args.iter().map(evaluate).collect::<Result<Vec<_>, _>>()?;
            call(method, receiver, args)
        }
        other => Err(EvalError::NotScalar(other.to_string())),
    }
}

/// Compare two constants. `None` when the values are not comparable.
///
/// Integers and floats compare numerically; strings lexically; booleans and
/// null only under `==`/`!=`.
pub fn compare_values(op: CompareOp, left: &Value, right: &Value) -> Option<bool> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };

    match op {
        CompareOp::Equal => Some(ordering.map_or(left == right, |o| o == Ordering::Equal)),
        CompareOp::NotEqual => Some(ordering.map_or(left != right, |o| o != Ordering::Equal)),
        CompareOp::GreaterThan => ordering.map(|o| o == Ordering::Greater),
        CompareOp::GreaterThanOrEqual => ordering.map(|o| o != Ordering::Less),
        CompareOp::LessThan => ordering.map(|o| o == Ordering::Less),
        CompareOp::LessThanOrEqual => ordering.map(|o| o != Ordering::Greater),
        CompareOp::StartsWith | CompareOp::EndsWith | CompareOp::Like => None,
    }
}

fn arith(op: ArithOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let mismatch = |l: &Value, r: &Value| EvalError::TypeMismatch {
        op: op.symbol(),
        left: l.type_name(),
        right: r.type_name(),
    };

    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                ArithOp::Add => a.checked_add(b),
                ArithOp::Subtract => a.checked_sub(b),
                ArithOp::Multiply => a.checked_mul(b),
                ArithOp::Divide | ArithOp::Remainder if b == 0 => {
                    return Err(EvalError::DivisionByZero)
                }
                ArithOp::Divide => a.checked_div(b),
                ArithOp::Remainder => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or(EvalError::Overflow(op.symbol()))
        }
        (Value::Str(a), b) if op == ArithOp::Add && b.is_scalar() => {
            Ok(Value::Str(format!("{a}{}", b.to_plain_string())))
        }
        (a, Value::Str(b)) if op == ArithOp::Add && a.is_scalar() => {
            Ok(Value::Str(format!("{}{b}", a.to_plain_string())))
        }
        (a, b) => {
            let (x, y) = match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => (x, y),
                _ => return Err(mismatch(a, b)),
            };
            let result = match op {
                ArithOp::Add => x + y,
                ArithOp::Subtract => x - y,
                ArithOp::Multiply => x * y,
                ArithOp::Divide | ArithOp::Remainder if y == 0.0 => {
                    return Err(EvalError::DivisionByZero)
                }
                ArithOp::Divide => x / y,
                ArithOp::Remainder => x % y,
            };
            Ok(Value::Float(result))
        }
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arity {
            method: method.to_string(),
            expected,
            actual: args.len(),
        })
    }
}

fn call(method: &str, receiver: Option<Value>, args: Vec<Value>) -> Result<Value, EvalError> {
    match (method, receiver) {
        ("concat", None) => Ok(Value::Str(
            args.iter().map(Value::to_plain_string).collect::<String>(),
        )),
        ("to_lower" | "to_lower_invariant", Some(v)) => {
            expect_args(method, &args, 0)?;
            map_str(v, "to_lower", |s| s.to_lowercase())
        }
        ("to_upper" | "to_upper_invariant", Some(v)) => {
            expect_args(method, &args, 0)?;
            map_str(v, "to_upper", |s| s.to_uppercase())
        }
        ("trim", Some(v)) => {
            expect_args(method, &args, 0)?;
            map_str(v, "trim", |s| s.trim().to_string())
        }
        ("to_string", Some(v)) => {
            expect_args(method, &args, 0)?;
            Ok(Value::Str(v.to_plain_string()))
        }
        ("len", Some(Value::Str(s))) => {
            expect_args(method, &args, 0)?;
            Ok(Value::Int(s.chars().count() as i64))
        }
        ("len", Some(Value::List(items))) => {
            expect_args(method, &args, 0)?;
            Ok(Value::Int(items.len() as i64))
        }
        (other, _) => Err(EvalError::UnknownMethod(other.to_string())),
    }
}

fn map_str(
    value: Value,
    op: &'static str,
    f: impl FnOnce(&str) -> String,
) -> Result<Value, EvalError> {
    match value {
        Value::Str(s) => Ok(Value::Str(f(&s))),
        Value::Null => Ok(Value::Null),
        other => Err(EvalError::TypeMismatch {
            op,
            left: other.type_name(),
            right: "string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_and_arithmetic() {
        assert_eq!(evaluate(&Expr::constant(5)).unwrap(), Value::Int(5));
        let e = Expr::constant(7).arith(ArithOp::Multiply, 6);
        assert_eq!(evaluate(&e).unwrap(), Value::Int(42));
        let e = Expr::constant(1.5).arith(ArithOp::Add, 1);
        assert_eq!(evaluate(&e).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_string_concatenation() {
        let e = Expr::constant("foo").arith(ArithOp::Add, 42);
        assert_eq!(evaluate(&e).unwrap(), Value::from("foo42"));
        let e = Expr::call_static("concat", vec!["a".into(), Expr::constant(Value::Null), "b".into()]);
        assert_eq!(evaluate(&e).unwrap(), Value::from("ab"));
    }

    #[test]
    fn test_string_methods() {
        let e = Expr::constant("  MiXed ").call("trim", vec![]).call("to_lower", vec![]);
        assert_eq!(evaluate(&e).unwrap(), Value::from("mixed"));
        let e = Expr::constant(Value::Null).call("to_upper", vec![]);
        assert_eq!(evaluate(&e).unwrap(), Value::Null);
    }

    #[test]
    fn test_division_by_zero() {
        let e = Expr::constant(1).arith(ArithOp::Divide, 0);
        assert_eq!(evaluate(&e), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_overflow_is_reported() {
        let e = Expr::constant(i64::MAX).arith(ArithOp::Add, 1);
        assert_eq!(evaluate(&e), Err(EvalError::Overflow("+")));
    }

    #[test]
    fn test_field_reference_is_not_scalar() {
        let e = Expr::field("title");
        assert!(matches!(evaluate(&e), Err(EvalError::NotScalar(_))));
        let e = Expr::source("doc").member("title");
        assert!(matches!(evaluate(&e), Err(EvalError::NotScalar(_))));
    }

    #[test]
    fn test_unknown_method() {
        let e = Expr::call_static("now", vec![]);
        assert_eq!(evaluate(&e), Err(EvalError::UnknownMethod("now".to_string())));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(CompareOp::LessThan, &Value::Int(1), &Value::Float(1.5)), Some(true));
        assert_eq!(compare_values(CompareOp::Equal, &Value::from("a"), &Value::from("a")), Some(true));
        assert_eq!(compare_values(CompareOp::Equal, &Value::Null, &Value::from("a")), Some(false));
        assert_eq!(compare_values(CompareOp::GreaterThan, &Value::Null, &Value::Int(1)), None);
        assert_eq!(compare_values(CompareOp::StartsWith, &Value::from("a"), &Value::from("a")), None);
    }
}
