// SPDX-License-Identifier: PMPL-1.0-or-later
//! Bare fields used as conditions.
//!
//! A field reference standing where a boolean is expected is a flag test:
//! `doc.published` means `published == true` and `!doc.published` means
//! `published == false`. Boolean positions are the root, the operands of
//! `&&`/`||`/`!`, and the predicate of a boost.

use sift_expr::{ArithOp, Expr};

use super::boost::boost_parts;
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct FlagConditions;

fn flag(expr: Expr, boolean_position: bool) -> Expr {
    if !boolean_position {
        return expr.try_map_children::<std::convert::Infallible>(|c| Ok(flag(c, false)))
            .unwrap_or_else(|never| match never {});
    }
    match expr {
        Expr::Field(_) => expr.equals(true),
        Expr::Not(inner) if matches!(*inner, Expr::Field(_)) => (*inner).equals(false),
        Expr::Not(inner) => Expr::Not(Box::new(flag(*inner, true))),
        Expr::Logical { op, left, right } => Expr::Logical {
            op,
            left: Box::new(flag(*left, true)),
            right: Box::new(flag(*right, true)),
        },
        Expr::Boost { inner, factor } => Expr::Boost {
            inner: Box::new(flag(*inner, true)),
            factor,
        },
        node if boost_parts(&node).is_some() => boost_target(node),
        other => flag(other, false),
    }
}

/// Rewrite the predicate of a boost idiom as a boolean position and its
/// factor as a value position.
fn boost_target(node: Expr) -> Expr {
    match node {
        Expr::Call {
            target: Some(pred),
            method,
            args,
        } => Expr::Call {
            target: Some(Box::new(flag(*pred, true))),
            method,
            args: args.into_iter().map(|a| flag(a, false)).collect(),
        },
        Expr::Call {
            target: None,
            method,
            args,
        } => Expr::Call {
            target: None,
            method,
            args: args
                .into_iter()
                .enumerate()
                .map(|(i, a)| flag(a, i == 0))
                .collect(),
        },
        Expr::Arith {
            op: ArithOp::Multiply,
            left,
            right,
        } => Expr::Arith {
            op: ArithOp::Multiply,
            left: Box::new(flag(*left, true)),
            right: Box::new(flag(*right, false)),
        },
        other => other,
    }
}

impl RewritePass for FlagConditions {
    fn name(&self) -> &str {
        "flag_conditions"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        Ok(flag(expr, true))
    }
}
