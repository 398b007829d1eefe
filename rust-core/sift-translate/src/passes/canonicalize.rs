// SPDX-License-Identifier: PMPL-1.0-or-later
//! Reduction to canonical form.
//!
//! Every comparison between a field and a value becomes a [`QueryExpr`].
//! Negation is pushed down to the leaves (De Morgan) and absorbed into their
//! occur, so the output has no `!` nodes. What is left is:
//!
//! - `Query` leaves
//! - `&&` / `||` nodes
//! - `Boost` wrappers, and boost calls whose factor is still unresolved
//! - boolean constants
//!
//! Anything else is rejected.

use sift_expr::{CompareOp, Expr, FieldTarget, QueryExpr, QueryKind, Value};

use super::boost::boost_parts;
use super::is_value;
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct Canonicalize;

fn predicate(
    target: FieldTarget,
    op: CompareOp,
    value: Expr,
    negate: bool,
) -> Expr {
    let (kind, occur) = QueryKind::from_compare(op);
    let query = match target {
        FieldTarget::Named(name) => QueryExpr::new(name, kind, value),
        FieldTarget::Any => QueryExpr::any_field(kind, value),
    }
    .with_occur(occur);
    Expr::query(if negate { query.negated() } else { query })
}

fn field_target(expr: &Expr) -> Option<FieldTarget> {
    match expr {
        Expr::Field(name) => Some(FieldTarget::Named(name.clone())),
        Expr::AnyField => Some(FieldTarget::Any),
        _ => None,
    }
}

fn comparison(op: CompareOp, left: Expr, right: Expr, negate: bool) -> Result<Expr, TranslateError> {
    if let Some(target) = field_target(&left) {
        if is_value(&right) {
            return Ok(predicate(target, op, right, negate));
        }
    }
    if let Some(target) = field_target(&right) {
        if is_value(&left) {
            let mirrored = op.mirror().ok_or_else(|| {
                TranslateError::unsupported(
                    "pattern comparison with the field on the right",
                    left.clone().compare(op, right.clone()),
                )
            })?;
            return Ok(predicate(target, mirrored, left, negate));
        }
    }
    Err(TranslateError::unsupported(
        "comparison must be between a field and a value",
        left.compare(op, right),
    ))
}

fn canonical(expr: Expr, negate: bool) -> Result<Expr, TranslateError> {
    match expr {
        Expr::Compare { op, left, right } => comparison(op, *left, *right, negate),
        Expr::Query(query) => Ok(Expr::Query(if negate {
            Box::new(query.negated())
        } else {
            query
        })),
        Expr::Logical { op, left, right } => {
            let op = if negate { op.dual() } else { op };
            Ok(canonical(*left, negate)?.logical(op, canonical(*right, negate)?))
        }
        Expr::Not(inner) => canonical(*inner, !negate),
        Expr::Constant(Value::Bool(b)) => Ok(Expr::constant(b != negate)),
        Expr::Boost { inner, factor } => Ok(canonical(*inner, negate)?.boosted(factor)),
        node if boost_parts(&node).is_some() => boost_call(node, negate),
        other => Err(TranslateError::unsupported("no query equivalent", other)),
    }
}

/// Canonicalize the predicate of a boost idiom, keeping the idiom itself.
fn boost_call(node: Expr, negate: bool) -> Result<Expr, TranslateError> {
    Ok(match node {
        Expr::Call {
            target: Some(pred),
            method,
            args,
        } => Expr::Call {
            target: Some(Box::new(canonical(*pred, negate)?)),
            method,
            args,
        },
        Expr::Call {
            target: None,
            method,
            mut args,
        } => {
            let pred = canonical(args.remove(0), negate)?;
            args.insert(0, pred);
            Expr::Call {
                target: None,
                method,
                args,
            }
        }
        Expr::Arith { op, left, right } => Expr::Arith {
            op,
            left: Box::new(canonical(*left, negate)?),
            right,
        },
        other => other,
    })
}

impl RewritePass for Canonicalize {
    fn name(&self) -> &str {
        "canonicalize"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        canonical(expr, false)
    }
}
