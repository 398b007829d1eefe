// SPDX-License-Identifier: PMPL-1.0-or-later
//! Boost extraction.
//!
//! Recognised forms, where `pred` is a boolean-valued sub-tree and `f` a
//! numeric value independent of the document:
//!
//! - `pred.boost(f)`
//! - `boost(pred, f)`
//! - `pred * f`
//!
//! The pass runs twice. The early run catches boosts on predicates that are
//! already recognisable; the late run, after canonicalization, catches the
//! rest and folds a boost sitting directly on a single field predicate into
//! that predicate.

use sift_expr::{evaluate, ArithOp, Expr, Value};

use super::is_value;
use crate::error::TranslateError;
use crate::pipeline::RewritePass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Early,
    Late,
}

pub struct BoostExtraction {
    stage: Stage,
}

impl BoostExtraction {
    /// Before flag and method-call rewriting.
    pub fn early() -> Self {
        Self {
            stage: Stage::Early,
        }
    }

    /// After canonicalization; also folds boosts into field predicates.
    pub fn late() -> Self {
        Self { stage: Stage::Late }
    }
}

/// The predicate and factor of a boost idiom.
pub(crate) fn boost_parts(node: &Expr) -> Option<(&Expr, &Expr)> {
    match node {
        Expr::Call {
            target: Some(pred),
            method,
            args,
        } if method == "boost" && args.len() == 1 => Some((pred, &args[0])),
        Expr::Call {
            target: None,
            method,
            args,
        } if method == "boost" && args.len() == 2 => Some((&args[0], &args[1])),
        Expr::Arith {
            op: ArithOp::Multiply,
            left,
            right,
        } => Some((left, right)),
        _ => None,
    }
}

pub(crate) fn check_factor(factor: f32) -> Result<f32, TranslateError> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(factor)
    } else {
        Err(TranslateError::UnsupportedConstruct(format!(
            "boost factor must be finite and non-negative, got {factor}"
        )))
    }
}

/// Numeric factor of a boost, if it can be computed now.
fn factor_value(factor: &Expr) -> Result<Option<f32>, TranslateError> {
    if !is_value(factor) {
        return Ok(None);
    }
    match evaluate(factor) {
        Ok(Value::Int(i)) => check_factor(i as f32).map(Some),
        Ok(Value::Float(x)) => check_factor(x as f32).map(Some),
        _ => Ok(None),
    }
}

fn fold(node: Expr) -> Result<Expr, TranslateError> {
    match node {
        Expr::Boost { inner, factor } => {
            let factor = check_factor(factor)?;
            Ok(match *inner {
                Expr::Query(query) => Expr::Query(Box::new(query.with_boost(factor))),
                inner => inner.boosted(factor),
            })
        }
        other => Ok(other),
    }
}

impl BoostExtraction {
    fn extract(&self, node: Expr) -> Result<Expr, TranslateError> {
        let Some((pred, factor)) = boost_parts(&node) else {
            return match self.stage {
                Stage::Early => Ok(node),
                Stage::Late => fold(node),
            };
        };
        if !pred.is_boolean_valued() {
            return Ok(node);
        }
        let Some(factor) = factor_value(factor)? else {
            return Ok(node);
        };
        let boosted = pred.clone().boosted(factor);
        match self.stage {
            Stage::Early => Ok(boosted),
            Stage::Late => fold(boosted),
        }
    }
}

impl RewritePass for BoostExtraction {
    fn name(&self) -> &str {
        match self.stage {
            Stage::Early => "boost_extraction_early",
            Stage::Late => "boost_extraction_late",
        }
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| self.extract(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_expr::{QueryExpr, QueryKind};

    fn title_eq() -> Expr {
        Expr::field("title").equals("rust")
    }

    fn title_query() -> QueryExpr {
        QueryExpr::new("title", QueryKind::Equal, Value::from("rust"))
    }

    #[test]
    fn test_early_forms() {
        let early = BoostExtraction::early();
        let expected = title_eq().boosted(2.0);
        assert_eq!(early.rewrite(title_eq().call("boost", vec![2.into()])).unwrap(), expected);
        assert_eq!(
            early.rewrite(Expr::call_static("boost", vec![title_eq(), 2.0.into()])).unwrap(),
            expected
        );
        assert_eq!(
            early.rewrite(title_eq().arith(ArithOp::Multiply, 2)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_early_skips_non_boolean_targets() {
        let early = BoostExtraction::early();
        let flag = Expr::field("featured").call("boost", vec![3.into()]);
        assert_eq!(early.rewrite(flag.clone()).unwrap(), flag);
        let arithmetic = Expr::field("price").arith(ArithOp::Multiply, 2).gt(10);
        assert_eq!(early.rewrite(arithmetic.clone()).unwrap(), arithmetic);
    }

    #[test]
    fn test_early_does_not_fold() {
        let e = Expr::query(title_query()).boosted(2.0);
        assert_eq!(BoostExtraction::early().rewrite(e.clone()).unwrap(), e);
    }

    #[test]
    fn test_computed_factor() {
        let e = title_eq().call("boost", vec![Expr::constant(1).arith(ArithOp::Add, 1)]);
        assert_eq!(
            BoostExtraction::early().rewrite(e).unwrap(),
            title_eq().boosted(2.0)
        );
    }

    #[test]
    fn test_negative_factor_rejected() {
        let e = title_eq().call("boost", vec![(-1).into()]);
        assert!(matches!(
            BoostExtraction::early().rewrite(e),
            Err(TranslateError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_late_folds_into_query() {
        let late = BoostExtraction::late();
        let e = Expr::query(title_query()).call("boost", vec![3.into()]);
        assert_eq!(
            late.rewrite(e).unwrap(),
            Expr::query(title_query().with_boost(3.0))
        );
        let e = Expr::query(title_query()).boosted(0.5);
        assert_eq!(
            late.rewrite(e).unwrap(),
            Expr::query(title_query().with_boost(0.5))
        );
    }

    #[test]
    fn test_late_keeps_wrapper_over_logical() {
        let or = Expr::query(title_query()) | Expr::query(title_query().negated());
        let e = or.clone().boosted(2.0);
        assert_eq!(BoostExtraction::late().rewrite(e.clone()).unwrap(), e);
    }

    #[test]
    fn test_late_nested_boost_outer_wins() {
        let e = Expr::query(title_query()).boosted(2.0).boosted(3.0);
        assert_eq!(
            BoostExtraction::late().rewrite(e).unwrap(),
            Expr::query(title_query().with_boost(3.0))
        );
    }
}
