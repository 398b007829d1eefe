// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rewrite pipeline.
//!
//! A pipeline is an ordered list of [`RewritePass`]es. Each pass runs over the
//! whole tree and hands its result to the next; no pass ever sees a tree that
//! an earlier pass has not finished with. The two stock pipelines are
//! [`RewritePipeline::filter`] and [`RewritePipeline::ordering`].

use sift_expr::Expr;
use tracing::debug;

use crate::error::TranslateError;
use crate::passes::{
    BoostExtraction, Canonicalize, CompareCalls, CompositeOrdering, FlagConditions,
    MethodCallComparisons, NoOpConditions, NoOpMethodCalls, NullSafetyGuards, SearchMethodCalls,
    SourceMemberAccess, SubQueryContains,
};

/// One tree-to-tree rewrite.
///
/// Passes are deterministic and hold no per-call state, so a single instance
/// can serve any number of translations.
pub trait RewritePass: Send + Sync {
    /// Short name used in logs and `explain` output.
    fn name(&self) -> &str;

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError>;
}

/// An ordered sequence of rewrite passes.
pub struct RewritePipeline {
    passes: Vec<Box<dyn RewritePass>>,
}

impl RewritePipeline {
    pub fn new(passes: Vec<Box<dyn RewritePass>>) -> Self {
        Self { passes }
    }

    /// Passes for filter predicates, ending in canonical form.
    pub fn filter() -> Self {
        Self::new(vec![
            Box::new(SubQueryContains),
            Box::new(SearchMethodCalls),
            Box::new(SourceMemberAccess),
            Box::new(BoostExtraction::early()),
            Box::new(FlagConditions),
            Box::new(NoOpMethodCalls),
            Box::new(NoOpConditions),
            Box::new(MethodCallComparisons),
            Box::new(NullSafetyGuards),
            Box::new(CompareCalls),
            Box::new(Canonicalize),
            Box::new(BoostExtraction::late()),
        ])
    }

    /// Passes for ordering keys.
    pub fn ordering() -> Self {
        Self::new(vec![
            Box::new(SourceMemberAccess),
            Box::new(NoOpMethodCalls),
            Box::new(CompositeOrdering),
        ])
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass in order.
    pub fn normalize(&self, expr: Expr) -> Result<Expr, TranslateError> {
        self.normalize_with(expr, |_, _| {})
    }

    /// Run every pass in order, calling `observe` with each pass name and the
    /// tree it produced.
    pub fn normalize_with(
        &self,
        mut expr: Expr,
        mut observe: impl FnMut(&str, &Expr),
    ) -> Result<Expr, TranslateError> {
        for pass in &self.passes {
            let before = expr.clone();
            expr = pass.rewrite(expr)?;
            debug!(pass = pass.name(), changed = expr != before, "rewrite pass applied");
            observe(pass.name(), &expr);
        }
        Ok(expr)
    }
}

impl Default for RewritePipeline {
    fn default() -> Self {
        Self::filter()
    }
}
