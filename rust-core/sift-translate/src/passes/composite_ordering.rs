// SPDX-License-Identifier: PMPL-1.0-or-later
//! Multi-key ordering.
//!
//! An ordering key given as a tuple, `(doc.last, doc.first)`, is one
//! directive over several fields. It becomes a `Composite` node, expanded
//! per field later by [`crate::OrderingExpander`]. Nested tuples flatten; a
//! single-key tuple is just that key.

use sift_expr::Expr;

use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct CompositeOrdering;

fn composite(items: Vec<Expr>) -> Result<Expr, TranslateError> {
    let mut keys = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Expr::Composite(nested) => keys.extend(nested),
            key => keys.push(key),
        }
    }
    match keys.len() {
        0 => Err(TranslateError::UnsupportedConstruct(
            "empty ordering tuple".to_string(),
        )),
        1 => Ok(keys.remove(0)),
        _ => Ok(Expr::Composite(keys)),
    }
}

impl RewritePass for CompositeOrdering {
    fn name(&self) -> &str {
        "composite_ordering"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| match node {
            Expr::Tuple(items) => composite(items),
            other => Ok(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(e: Expr) -> Result<Expr, TranslateError> {
        CompositeOrdering.rewrite(e)
    }

    #[test]
    fn test_tuple_becomes_composite() {
        let e = Expr::Tuple(vec![Expr::field("last"), Expr::field("first")]);
        assert_eq!(
            run(e).unwrap(),
            Expr::Composite(vec![Expr::field("last"), Expr::field("first")])
        );
    }

    #[test]
    fn test_single_key_unwraps() {
        assert_eq!(
            run(Expr::Tuple(vec![Expr::field("a")])).unwrap(),
            Expr::field("a")
        );
    }

    #[test]
    fn test_nested_tuples_flatten() {
        let e = Expr::Tuple(vec![
            Expr::field("a"),
            Expr::Tuple(vec![Expr::field("b"), Expr::field("c")]),
        ]);
        assert_eq!(
            run(e).unwrap(),
            Expr::Composite(vec![Expr::field("a"), Expr::field("b"), Expr::field("c")])
        );
    }

    #[test]
    fn test_empty_tuple_rejected() {
        assert!(run(Expr::Tuple(vec![])).is_err());
    }

    #[test]
    fn test_plain_key_untouched() {
        assert_eq!(run(Expr::field("a")).unwrap(), Expr::field("a"));
    }
}
