// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sub-query membership tests.
//!
//! `doc.tags contains v` is an equality on a multi-valued field.
//! `[a, b] contains doc.kind` is a disjunction of equalities.

use sift_expr::{Expr, Value};

use super::is_value;
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct SubQueryContains;

fn any_equal(item: Expr, candidates: Vec<Expr>) -> Expr {
    candidates
        .into_iter()
        .map(|candidate| item.clone().equals(candidate))
        .reduce(|acc, next| acc | next)
        .unwrap_or(Expr::Constant(Value::Bool(false)))
}

fn flatten(collection: Expr, item: Expr) -> Expr {
    match collection {
        Expr::Constant(Value::List(values)) if !is_value(&item) => {
            any_equal(item, values.into_iter().map(Expr::Constant).collect())
        }
        Expr::Tuple(items) if !is_value(&item) && items.iter().all(is_value) => {
            any_equal(item, items)
        }
        collection if !is_value(&collection) && is_value(&item) => collection.equals(item),
        collection => Expr::Contains {
            collection: Box::new(collection),
            item: Box::new(item),
        },
    }
}

impl RewritePass for SubQueryContains {
    fn name(&self) -> &str {
        "sub_query_contains"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| match node {
            Expr::Contains { collection, item } => Ok(flatten(*collection, *item)),
            other => Ok(other),
        })
    }
}
