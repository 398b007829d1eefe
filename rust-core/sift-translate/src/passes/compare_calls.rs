// SPDX-License-Identifier: PMPL-1.0-or-later
//! Three-way comparison calls.
//!
//! `compare(a, b) OP 0` and `a.compare_to(b) OP 0` are `a OP b`. With the zero
//! on the left the operator is mirrored: `0 < compare(a, b)` is `a > b`.

use sift_expr::{CompareOp, Expr, Value};

use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct CompareCalls;

fn is_zero(expr: &Expr) -> bool {
    matches!(expr, Expr::Constant(Value::Int(0)))
}

/// Operands of a three-way comparison call, or the node back if it is not
/// one.
fn split_compare_call(expr: Expr) -> Result<(Expr, Expr), Expr> {
    match expr {
        Expr::Call {
            target: None,
            method,
            mut args,
        } if method == "compare" && args.len() == 2 => {
            let b = args.remove(1);
            Ok((args.remove(0), b))
        }
        Expr::Call {
            target: Some(a),
            method,
            mut args,
        } if method == "compare_to" && args.len() == 1 => Ok((*a, args.remove(0))),
        other => Err(other),
    }
}

fn unwrap_compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    if !op.is_relational() {
        return left.compare(op, right);
    }
    if is_zero(&right) {
        return match split_compare_call(left) {
            Ok((a, b)) => a.compare(op, b),
            Err(left) => left.compare(op, right),
        };
    }
    match (is_zero(&left), op.mirror()) {
        (true, Some(mirrored)) => match split_compare_call(right) {
            Ok((a, b)) => a.compare(mirrored, b),
            Err(right) => left.compare(op, right),
        },
        _ => left.compare(op, right),
    }
}

impl RewritePass for CompareCalls {
    fn name(&self) -> &str {
        "compare_calls"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            Ok(match node {
                Expr::Compare { op, left, right } => unwrap_compare(op, *left, *right),
                other => other,
            })
        })
    }
}
