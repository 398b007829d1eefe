// SPDX-License-Identifier: PMPL-1.0-or-later
//! No-op removal.
//!
//! [`NoOpMethodCalls`] strips calls that do not change what an index lookup
//! means: case folding, trimming and string conversion applied to a field.
//! The index applies its own analysis to stored values.
//!
//! [`NoOpConditions`] folds conditions whose value is known without looking
//! at a document. A branch is only dropped when it is free of calls to
//! unknown methods.

use sift_expr::{compare_values, evaluate, Expr, LogicalOp, Value};

use super::{is_field_ref, is_value};
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

const NO_OP_METHODS: &[&str] = &[
    "to_lower",
    "to_lower_invariant",
    "to_upper",
    "to_upper_invariant",
    "trim",
    "to_string",
];

pub struct NoOpMethodCalls;

impl RewritePass for NoOpMethodCalls {
    fn name(&self) -> &str {
        "no_op_method_calls"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            Ok(match node {
                Expr::Call {
                    target: Some(target),
                    method,
                    args,
                } if args.is_empty()
                    && NO_OP_METHODS.contains(&method.as_str())
                    && is_field_ref(&target) =>
                {
                    *target
                }
                other => other,
            })
        })
    }
}

pub struct NoOpConditions;

/// Value of a comparison between two document-independent operands.
fn constant_comparison(node: &Expr) -> Option<bool> {
    let Expr::Compare { op, left, right } = node else {
        return None;
    };
    if !op.is_relational() || !is_value(left) || !is_value(right) {
        return None;
    }
    if !left.is_pure() || !right.is_pure() {
        return None;
    }
    let (l, r) = (evaluate(left).ok()?, evaluate(right).ok()?);
    compare_values(*op, &l, &r)
}

fn fold_logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    // Identity element: AND true, OR false.
    let identity = op == LogicalOp::And;
    match (left.as_bool_constant(), right.as_bool_constant()) {
        (Some(l), _) if l == identity => return right,
        (_, Some(r)) if r == identity => return left,
        (Some(_), _) if right.is_pure() => return Expr::Constant(Value::Bool(!identity)),
        (_, Some(_)) if left.is_pure() => return Expr::Constant(Value::Bool(!identity)),
        _ => {}
    }
    left.logical(op, right)
}

impl RewritePass for NoOpConditions {
    fn name(&self) -> &str {
        "no_op_conditions"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            if let Some(b) = constant_comparison(&node) {
                return Ok(Expr::constant(b));
            }
            Ok(match node {
                Expr::Not(inner) => match inner.as_bool_constant() {
                    Some(b) => Expr::constant(!b),
                    None => Expr::Not(inner),
                },
                Expr::Logical { op, left, right } => fold_logical(op, *left, *right),
                other => other,
            })
        })
    }
}
