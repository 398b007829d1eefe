// SPDX-License-Identifier: PMPL-1.0-or-later
//! String method idioms as comparisons.
//!
//! | idiom                        | result                 |
//! |------------------------------|------------------------|
//! | `f.starts_with(v)`           | `f starts_with v`      |
//! | `f.ends_with(v)`             | `f ends_with v`        |
//! | `f.contains(v)`              | `f like v`             |
//! | `f.equals(v)`, `equals(f, v)`| `f == v`               |
//! | `is_null_or_empty(f)`        | `f == null`            |
//!
//! A recognised comparison compared against a boolean constant is unwrapped:
//! `(cmp) == true` is `cmp`, `(cmp) == false` is `!cmp`.

use sift_expr::{CompareOp, Expr, Value};

use super::is_value;
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct MethodCallComparisons;

fn pattern_op(method: &str) -> Option<CompareOp> {
    match method {
        "starts_with" => Some(CompareOp::StartsWith),
        "ends_with" => Some(CompareOp::EndsWith),
        "contains" => Some(CompareOp::Like),
        "equals" => Some(CompareOp::Equal),
        _ => None,
    }
}

fn rewrite_call(target: Option<Box<Expr>>, method: String, mut args: Vec<Expr>) -> Expr {
    match (target, args.len()) {
        (Some(field), 1) if !is_value(&field) && is_value(&args[0]) => {
            match pattern_op(&method) {
                // A list argument is a collection test, not a substring test.
                Some(CompareOp::Like) if matches!(args[0], Expr::Constant(Value::List(_))) => {
                    Expr::Call {
                        target: Some(field),
                        method,
                        args,
                    }
                }
                Some(op) => (*field).compare(op, args.remove(0)),
                None => Expr::Call {
                    target: Some(field),
                    method,
                    args,
                },
            }
        }
        (Some(field), 0) if method == "is_null_or_empty" && !is_value(&field) => {
            (*field).equals(Value::Null)
        }
        (None, 1) if method == "is_null_or_empty" && !is_value(&args[0]) => {
            args.remove(0).equals(Value::Null)
        }
        (None, 2) if method == "equals" => {
            let right = args.remove(1);
            args.remove(0).equals(right)
        }
        (target, _) => Expr::Call {
            target,
            method,
            args,
        },
    }
}

/// `(cmp) == b`, `(cmp) != b` and their mirrors, reduced to `cmp` or `!cmp`.
fn unwrap_bool_compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    let side = match (&left, &right) {
        (Expr::Compare { .. }, Expr::Constant(Value::Bool(b))) => Some((false, *b)),
        (Expr::Constant(Value::Bool(b)), Expr::Compare { .. }) => Some((true, *b)),
        _ => None,
    };
    let keep = match (side, op) {
        (Some((_, expected)), CompareOp::Equal) => expected,
        (Some((_, expected)), CompareOp::NotEqual) => !expected,
        _ => return left.compare(op, right),
    };
    let mirrored = side.is_some_and(|(mirrored, _)| mirrored);
    let cmp = if mirrored { right } else { left };
    if keep {
        cmp
    } else {
        !cmp
    }
}

impl RewritePass for MethodCallComparisons {
    fn name(&self) -> &str {
        "method_call_comparisons"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            Ok(match node {
                Expr::Call {
                    target,
                    method,
                    args,
                } => rewrite_call(target, method, args),
                Expr::Compare { op, left, right } => unwrap_bool_compare(op, *left, *right),
                other => other,
            })
        })
    }
}
