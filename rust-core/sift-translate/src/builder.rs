// SPDX-License-Identifier: PMPL-1.0-or-later
//! Query builder.
//!
//! Walks a canonical filter tree depth-first and assembles a [`SearchQuery`]
//! on an explicit stack:
//!
//! - a field predicate pushes one single-clause container
//! - `&&` / `||` pop their two operands and push one container (`Must`/`Must`
//!   or `Should`/`Should`). A predicate operand contributes its clause
//!   directly; a logical operand stays nested
//! - a boost wrapper sets the boost of whatever its operand pushed
//! - a boolean constant pushes a container over match-all, except a bare
//!   `true` at the root, which pushes nothing
//!
//! A builder serves one translation. Reading the result never changes the
//! stack.

use sift_expr::{Expr, FieldTarget, LogicalOp, Occur, QueryExpr, QueryKind, Value};
use tracing::{trace, warn};

use crate::error::TranslateError;
use crate::mapping::{FieldMapping, FieldMappingProvider};
use crate::parser::PatternParser;
use crate::passes::check_factor;
use crate::query::{BooleanQuery, Number, NumericRange, SearchNode, SearchQuery, TermRange};

/// Builds one [`SearchQuery`] from one canonical tree.
pub struct QueryBuilder<'a> {
    mapping: &'a dyn FieldMappingProvider,
    parser: &'a dyn PatternParser,
    stack: Vec<SearchQuery>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(mapping: &'a dyn FieldMappingProvider, parser: &'a dyn PatternParser) -> Self {
        Self {
            mapping,
            parser,
            stack: Vec::new(),
        }
    }

    /// Translate `expr` and return the finished query.
    pub fn build(mut self, expr: &Expr) -> Result<SearchQuery, TranslateError> {
        self.visit(expr, true)?;

        let expected = if expr.as_bool_constant() == Some(true) { 0 } else { 1 };
        if self.stack.len() != expected {
            return Err(TranslateError::StackImbalance {
                depth: self.stack.len(),
            });
        }
        Ok(self.query())
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The query on top of the stack, or match-all when the stack is empty.
    ///
    /// A top-level container made only of exclusions matches nothing in most
    /// engines, so the returned copy gains a `Must` match-all clause. The
    /// stack itself is left as it was.
    pub fn query(&self) -> SearchQuery {
        let Some(top) = self.stack.last() else {
            return SearchQuery::match_all();
        };
        match top.as_boolean() {
            Some(boolean) if boolean.is_exclude_only() => {
                warn!(
                    clauses = boolean.len(),
                    "query has only exclusion clauses; adding match-all"
                );
                top.clone().completed()
            }
            _ => top.clone(),
        }
    }

    fn push(&mut self, query: SearchQuery) {
        trace!(depth = self.stack.len() + 1, query = %query, "push");
        self.stack.push(query);
    }

    fn pop(&mut self) -> Result<SearchQuery, TranslateError> {
        let query = self
            .stack
            .pop()
            .ok_or(TranslateError::StackImbalance { depth: 0 })?;
        trace!(depth = self.stack.len(), "pop");
        Ok(query)
    }

    fn visit(&mut self, expr: &Expr, root: bool) -> Result<(), TranslateError> {
        let before = self.stack.len();
        match expr {
            Expr::Query(query) => {
                let leaf = self.leaf(query)?;
                self.push(leaf);
            }
            Expr::Logical { op, left, right } => {
                self.visit(left, false)?;
                self.visit(right, false)?;
                let second = self.pop()?;
                let first = self.pop()?;
                let occur = match op {
                    LogicalOp::And => Occur::Must,
                    LogicalOp::Or => Occur::Should,
                };
                let mut combined = BooleanQuery::new();
                absorb(&mut combined, first, occur);
                absorb(&mut combined, second, occur);
                self.push(SearchQuery::boolean(combined));
            }
            Expr::Boost { inner, factor } => {
                self.visit(inner, false)?;
                let top = self
                    .stack
                    .last_mut()
                    .ok_or(TranslateError::StackImbalance { depth: 0 })?;
                top.boost = check_factor(*factor)?;
            }
            Expr::Constant(Value::Bool(true)) if root => {
                debug_assert_eq!(self.stack.len(), before);
                return Ok(());
            }
            Expr::Constant(Value::Bool(b)) => {
                let occur = if *b { Occur::Must } else { Occur::MustNot };
                self.push(SearchQuery::single(occur, SearchQuery::match_all()));
            }
            other => {
                return Err(TranslateError::unsupported(
                    "not a canonical query node",
                    other,
                ))
            }
        }
        debug_assert_eq!(self.stack.len(), before + 1);
        Ok(())
    }

    fn leaf(&self, expr: &QueryExpr) -> Result<SearchQuery, TranslateError> {
        let (inner, occur) = match &expr.target {
            FieldTarget::Any => {
                let value = evaluate_pattern("*", expr)?;
                let fields = self.mapping.all_field_names();
                let inner = self
                    .parser
                    .parse_across_fields(&fields, &value.to_plain_string())?;
                (inner, expr.occur)
            }
            FieldTarget::Named(name) => {
                let mapping = self
                    .mapping
                    .resolve(name)
                    .ok_or_else(|| TranslateError::UnresolvedField(name.clone()))?;
                let value = evaluate_pattern(name, expr)?;
                if expr.kind.is_range() {
                    (range(mapping, expr.kind, &value)?, expr.occur)
                } else {
                    self.match_query(mapping, expr, &value)?
                }
            }
        };
        Ok(SearchQuery::single(occur, inner.with_boost(check_factor(expr.boost)?)))
    }

    /// Equality and pattern kinds. An empty pattern means "field has no
    /// value": the pattern becomes `*` and the occur is inverted.
    fn match_query(
        &self,
        mapping: &dyn FieldMapping,
        expr: &QueryExpr,
        value: &Value,
    ) -> Result<(SearchQuery, Occur), TranslateError> {
        let field = mapping.index_field_name();
        let text = mapping.convert_to_query_string(value);
        let mut pattern = match expr.kind {
            QueryKind::Prefix => format!("{text}*"),
            QueryKind::Suffix => format!("*{text}"),
            QueryKind::Wildcard => format!("*{text}*"),
            _ => text,
        };
        let mut occur = expr.occur;
        if pattern.is_empty() {
            pattern = "*".to_string();
            occur = occur.negate();
        }

        let query = if mapping.is_numeric() {
            if pattern == "*" {
                SearchQuery::wildcard(field, "*")
            } else {
                let number = to_number(field, value)?;
                SearchQuery::term(field, number.to_string())
            }
        } else {
            self.parser.parse(field, &pattern)?
        };
        Ok((query, occur))
    }
}

/// Add one operand of `&&`/`||` to `target`.
///
/// A predicate container (one clause, unit boost) is unwrapped when its
/// clause keeps its meaning under `occur`: an included clause always does, an
/// excluded one only under `&&`. Anything else is added whole, completed with
/// a match-all clause if it only excludes.
fn absorb(target: &mut BooleanQuery, operand: SearchQuery, occur: Occur) {
    let unboosted = (operand.boost - 1.0).abs() <= f32::EPSILON;
    let lifted = match operand.single_clause().map(|c| c.occur) {
        Some(Occur::Must) if unboosted => Some(occur),
        Some(Occur::MustNot) if unboosted && occur == Occur::Must => Some(Occur::MustNot),
        _ => None,
    };
    match (lifted, operand.node) {
        (Some(clause_occur), SearchNode::Boolean(mut boolean)) => {
            let clause = boolean.clauses.remove(0);
            target.push(clause_occur, clause.query);
        }
        (_, node) => target.push(
            occur,
            SearchQuery {
                node,
                boost: operand.boost,
            }
            .completed(),
        ),
    }
}

fn evaluate_pattern(field: &str, expr: &QueryExpr) -> Result<Value, TranslateError> {
    expr.pattern
        .evaluate()
        .map_err(|source| TranslateError::PatternEvaluation {
            field: field.to_string(),
            source,
        })
}

fn to_number(field: &str, value: &Value) -> Result<Number, TranslateError> {
    Number::from_value(value).ok_or_else(|| TranslateError::InvalidNumber {
        field: field.to_string(),
        value: value.to_plain_string(),
    })
}

/// Ranges are open on the unbounded side; the open side is inclusive.
fn range(
    mapping: &dyn FieldMapping,
    kind: QueryKind,
    value: &Value,
) -> Result<SearchQuery, TranslateError> {
    let field = mapping.index_field_name();
    let (lower_bounded, inclusive) = match kind {
        QueryKind::GreaterThan => (true, false),
        QueryKind::GreaterThanOrEqual => (true, true),
        QueryKind::LessThan => (false, false),
        QueryKind::LessThanOrEqual => (false, true),
        other => {
            return Err(TranslateError::UnsupportedConstruct(format!(
                "{other} is not a range kind"
            )))
        }
    };

    let node = if mapping.is_numeric() {
        let bound = Some(to_number(field, value)?);
        SearchNode::NumericRange(if lower_bounded {
            NumericRange::new(field, bound, None, inclusive, true)
        } else {
            NumericRange::new(field, None, bound, true, inclusive)
        })
    } else {
        let bound = Some(mapping.convert_to_query_string(value));
        SearchNode::TermRange(if lower_bounded {
            TermRange::new(field, bound, None, inclusive, true)
        } else {
            TermRange::new(field, None, bound, true, inclusive)
        })
    };
    Ok(SearchQuery::new(node))
}
