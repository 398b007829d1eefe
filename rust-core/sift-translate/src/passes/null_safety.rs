// SPDX-License-Identifier: PMPL-1.0-or-later
//! Redundant null guards.
//!
//! `f != null && f > 3` is just `f > 3`: a comparison against a non-null
//! value already excludes documents without `f`. The guard may sit on either
//! side. Inequality does not imply presence, so `f != null && f != 3` is kept.
//! An empty pattern matches documents without the field, so the guard is only
//! dropped for a constant that is neither null nor empty.

use sift_expr::{CompareOp, Expr, LogicalOp, Value};

use super::is_field_ref;
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct NullSafetyGuards;

fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Constant(Value::Null))
}

/// A constant that cannot turn into an empty pattern at build time.
fn is_present_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Constant(Value::Null) => false,
        Expr::Constant(Value::Str(s)) => !s.is_empty(),
        Expr::Constant(_) => true,
        _ => false,
    }
}

/// The field tested by `f != null` or `null != f`.
fn guarded_field(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Compare {
            op: CompareOp::NotEqual,
            left,
            right,
        } => match (left.as_ref(), right.as_ref()) {
            (Expr::Field(name), r) if is_null(r) => Some(name.as_str()),
            (l, Expr::Field(name)) if is_null(l) => Some(name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Whether `expr` compares `field` against a non-empty constant in a way that
/// can only hold when the field is present.
fn implies_present(expr: &Expr, field: &str) -> bool {
    let Expr::Compare { op, left, right } = expr else {
        return false;
    };
    if *op == CompareOp::NotEqual {
        return false;
    }
    let (f, v) = if is_field_ref(left) {
        (left.as_ref(), right.as_ref())
    } else {
        (right.as_ref(), left.as_ref())
    };
    matches!(f, Expr::Field(name) if name == field) && is_present_constant(v)
}

fn redundant_guard(left: &Expr, right: &Expr) -> Option<bool> {
    if guarded_field(left).is_some_and(|f| implies_present(right, f)) {
        return Some(true);
    }
    if guarded_field(right).is_some_and(|f| implies_present(left, f)) {
        return Some(false);
    }
    None
}

impl RewritePass for NullSafetyGuards {
    fn name(&self) -> &str {
        "null_safety_guards"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            Ok(match node {
                Expr::Logical {
                    op: LogicalOp::And,
                    left,
                    right,
                } => match redundant_guard(&left, &right) {
                    Some(true) => *right,
                    Some(false) => *left,
                    None => Expr::Logical {
                        op: LogicalOp::And,
                        left,
                        right,
                    },
                },
                other => other,
            })
        })
    }
}
