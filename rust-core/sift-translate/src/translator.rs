// SPDX-License-Identifier: PMPL-1.0-or-later
//! Translator facade.
//!
//! Ties the pipelines, the builder and the ordering expander together behind
//! one value that can be shared between threads. Each call works on its own
//! tree and its own builder; the translator holds no per-call state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sift_expr::{Expr, OrderBy, Ordering};
use tracing::debug;

use crate::builder::QueryBuilder;
use crate::config::TranslatorConfig;
use crate::error::TranslateError;
use crate::mapping::FieldMappingProvider;
use crate::ordering::{OrderingExpander, SortField};
use crate::parser::{PatternParser, QueryStringParser};
use crate::pipeline::RewritePipeline;
use crate::query::SearchQuery;

/// Result of translating an order-by clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedOrdering {
    /// Entries after rewriting and composite expansion.
    pub orderings: Vec<Ordering>,
    /// The same entries resolved against the field mapping.
    pub sort_fields: Vec<SortField>,
}

/// One rewrite pass as seen by [`Translator::explain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainStep {
    pub pass: String,
    pub tree: String,
    pub changed: bool,
}

/// How a filter was translated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub input: String,
    pub steps: Vec<ExplainStep>,
    pub query: String,
}

impl Explanation {
    /// Multi-line text rendering: the input, each pass that changed the tree,
    /// and the final query.
    pub fn render_text(&self) -> String {
        let mut out = format!("input: {}\n", self.input);
        for step in self.steps.iter().filter(|s| s.changed) {
            out.push_str(&format!("{:<24} {}\n", step.pass, step.tree));
        }
        out.push_str(&format!("query: {}\n", self.query));
        out
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

/// Translates filter and ordering expressions into index queries.
pub struct Translator {
    config: TranslatorConfig,
    mapping: Arc<dyn FieldMappingProvider>,
    parser: Arc<dyn PatternParser>,
    filter: RewritePipeline,
    ordering: RewritePipeline,
    expander: OrderingExpander,
}

impl Translator {
    /// A translator with the default configuration.
    pub fn new(mapping: Arc<dyn FieldMappingProvider>) -> Self {
        let config = TranslatorConfig::default();
        let parser = Arc::new(QueryStringParser::new(config.parser.clone()));
        Self {
            config,
            mapping,
            parser,
            filter: RewritePipeline::filter(),
            ordering: RewritePipeline::ordering(),
            expander: OrderingExpander,
        }
    }

    /// A translator with a validated configuration.
    pub fn with_config(
        mapping: Arc<dyn FieldMappingProvider>,
        config: TranslatorConfig,
    ) -> Result<Self, TranslateError> {
        config.validate()?;
        let parser = Arc::new(QueryStringParser::new(config.parser.clone()));
        Ok(Self {
            parser,
            config,
            ..Self::new(mapping)
        })
    }

    /// Replace the pattern parser.
    pub fn with_parser(mut self, parser: Arc<dyn PatternParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn mapping(&self) -> &dyn FieldMappingProvider {
        self.mapping.as_ref()
    }

    pub fn filter_pipeline(&self) -> &RewritePipeline {
        &self.filter
    }

    fn check_depth(&self, expr: &Expr) -> Result<(), TranslateError> {
        let depth = expr.depth();
        if depth > self.config.max_expression_depth {
            return Err(TranslateError::ExpressionTooDeep {
                depth,
                limit: self.config.max_expression_depth,
            });
        }
        Ok(())
    }

    fn normalize(&self, pipeline: &RewritePipeline, expr: Expr) -> Result<Expr, TranslateError> {
        self.check_depth(&expr)?;
        let log_rewrites = self.config.log_rewrites;
        pipeline.normalize_with(expr, |pass, tree| {
            if log_rewrites {
                debug!(pass, tree = %tree, "rewritten tree");
            }
        })
    }

    /// Run the filter pipeline only, returning the canonical tree.
    pub fn normalize_filter(&self, expr: Expr) -> Result<Expr, TranslateError> {
        self.normalize(&self.filter, expr)
    }

    /// Build a query from an already canonical tree.
    pub fn build(&self, canonical: &Expr) -> Result<SearchQuery, TranslateError> {
        QueryBuilder::new(self.mapping.as_ref(), self.parser.as_ref()).build(canonical)
    }

    /// Translate a filter expression into a query.
    pub fn translate_filter(&self, expr: Expr) -> Result<SearchQuery, TranslateError> {
        debug!(depth = expr.depth(), "translating filter");
        let canonical = self.normalize_filter(expr)?;
        let query = self.build(&canonical)?;
        debug!(query = %query, "filter translated");
        Ok(query)
    }

    /// Rewrite and expand an order-by clause, then resolve its sort fields.
    pub fn translate_ordering(&self, order_by: OrderBy) -> Result<TranslatedOrdering, TranslateError> {
        debug!(entries = order_by.len(), "translating ordering");
        let rewritten = order_by
            .orderings
            .into_iter()
            .map(|o| Ok(Ordering::new(self.normalize(&self.ordering, o.expr)?, o.direction)))
            .collect::<Result<Vec<_>, TranslateError>>()?;
        let orderings = self.expander.expand(rewritten);
        let sort_fields = orderings
            .iter()
            .map(|o| SortField::resolve(o, self.mapping.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entries = orderings.len(), "ordering translated");
        Ok(TranslatedOrdering {
            orderings,
            sort_fields,
        })
    }

    /// Translate a filter, recording the tree after every pass.
    pub fn explain(&self, expr: Expr) -> Result<Explanation, TranslateError> {
        self.check_depth(&expr)?;
        let input = expr.to_string();
        let mut steps = Vec::with_capacity(self.filter.len());
        let mut previous = input.clone();
        let canonical = self.filter.normalize_with(expr, |pass, tree| {
            let rendered = tree.to_string();
            steps.push(ExplainStep {
                pass: pass.to_string(),
                changed: rendered != previous,
                tree: rendered.clone(),
            });
            previous = rendered;
        })?;
        let query = self.build(&canonical)?;
        Ok(Explanation {
            input,
            steps,
            query: query.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StaticFieldMap;
    use crate::query::Occur;
    use sift_expr::Direction;

    fn doc() -> Expr {
        Expr::source("doc")
    }

    fn translator() -> Translator {
        let map = StaticFieldMap::new()
            .text("title")
            .keyword("status")
            .numeric("year");
        Translator::new(Arc::new(map))
    }

    #[test]
    fn test_translate_filter() {
        let e = doc().member("year").gt(2020) & doc().member("status").not_equals("draft");
        let q = translator().translate_filter(e).unwrap();
        assert_eq!(q.to_string(), "+year:{2020 TO *] -status:draft");
    }

    #[test]
    fn test_depth_guard() {
        let config = TranslatorConfig {
            max_expression_depth: 3,
            ..TranslatorConfig::default()
        };
        let t = Translator::with_config(Arc::new(StaticFieldMap::new().text("a")), config).unwrap();
        let shallow = Expr::field("a").equals("x");
        assert!(t.translate_filter(shallow).is_ok());
        let deep = !!(Expr::field("a").equals("x") & Expr::field("a").equals("y"));
        assert!(matches!(
            t.translate_filter(deep),
            Err(TranslateError::ExpressionTooDeep { depth: 5, limit: 3 })
        ));
    }

    #[test]
    fn test_with_config_validates() {
        let config = TranslatorConfig {
            max_expression_depth: 0,
            ..TranslatorConfig::default()
        };
        assert!(Translator::with_config(Arc::new(StaticFieldMap::new()), config).is_err());
    }

    #[test]
    fn test_translate_ordering() {
        let order_by = OrderBy::new()
            .then(Ordering::ascending(doc().member("status")))
            .then(Ordering::descending(Expr::Tuple(vec![
                doc().member("year"),
                doc().member("title").call("to_lower", vec![]),
            ])));
        let out = translator().translate_ordering(order_by).unwrap();
        assert_eq!(
            out.orderings,
            vec![
                Ordering::ascending(Expr::field("status")),
                Ordering::descending(Expr::field("year")),
                Ordering::descending(Expr::field("title")),
            ]
        );
        let described: Vec<String> = out.sort_fields.iter().map(ToString::to_string).collect();
        assert_eq!(described, vec!["status asc", "year desc", "title desc"]);
        assert!(out.sort_fields[1].numeric);
        assert_eq!(out.orderings[2].direction, Direction::Descending);
    }

    #[test]
    fn test_explain() {
        let e = doc().member("title").call("starts_with", vec!["ru".into()]);
        let explanation = translator().explain(e).unwrap();
        assert_eq!(explanation.steps.len(), 12);
        let changed: Vec<&str> = explanation
            .steps
            .iter()
            .filter(|s| s.changed)
            .map(|s| s.pass.as_str())
            .collect();
        assert_eq!(
            changed,
            vec!["source_member_access", "method_call_comparisons", "canonicalize"]
        );
        assert_eq!(explanation.query, "+title:ru*");
        assert!(explanation.render_text().contains("query: +title:ru*"));
    }

    #[test]
    fn test_custom_parser() {
        struct Fixed;
        impl PatternParser for Fixed {
            fn parse(&self, field: &str, _: &str) -> Result<SearchQuery, TranslateError> {
                Ok(SearchQuery::term(field, "fixed"))
            }
            fn parse_across_fields(
                &self,
                _: &[String],
                _: &str,
            ) -> Result<SearchQuery, TranslateError> {
                Ok(SearchQuery::match_all())
            }
        }
        let t = translator().with_parser(Arc::new(Fixed));
        let q = t.translate_filter(Expr::field("title").equals("anything")).unwrap();
        assert_eq!(q, SearchQuery::single(Occur::Must, SearchQuery::term("title", "fixed")));
    }

    #[test]
    fn test_translator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Translator>();
    }
}
