// SPDX-License-Identifier: PMPL-1.0-or-later
//! Engine-ready boolean query tree.
//!
//! This is the value the query builder produces: a tree of clauses, each a
//! sub-query paired with an [`Occur`]. Every node carries its own boost.
//! The tree renders in Lucene query syntax through `Display`, which is what
//! logs and `explain` output show.

use serde::{Deserialize, Serialize};
use sift_expr::Value;
use std::fmt;

pub use sift_expr::Occur;

/// A numeric bound value. Both bounds of one range share a variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Numeric view of a scalar. Strings are parsed, integers first.
    pub fn from_value(value: &Value) -> Option<Number> {
        match value {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Number::Int)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(Number::Float))
            }
            _ => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn widen(self) -> Number {
        Number::Float(self.as_f64())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Range over a numeric field. An absent bound is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub field: String,
    pub lower: Option<Number>,
    pub upper: Option<Number>,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
}

impl NumericRange {
    /// Build a range. Mixed integer/float bounds are widened to float so both
    /// sides share one numeric type.
    pub fn new(
        field: impl Into<String>,
        lower: Option<Number>,
        upper: Option<Number>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Self {
        let (lower, upper) = match (lower, upper) {
            (Some(l @ Number::Int(_)), Some(u @ Number::Float(_)))
            | (Some(l @ Number::Float(_)), Some(u @ Number::Int(_))) => {
                (Some(l.widen()), Some(u.widen()))
            }
            bounds => bounds,
        };
        Self {
            field: field.into(),
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        }
    }
}

/// Lexicographic range over a string field. An absent bound is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRange {
    pub field: String,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
}

impl TermRange {
    pub fn new(
        field: impl Into<String>,
        lower: Option<String>,
        upper: Option<String>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Self {
        Self {
            field: field.into(),
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        }
    }
}

/// One clause of a boolean container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub occur: Occur,
    pub query: SearchQuery,
}

impl Clause {
    pub fn new(occur: Occur, query: SearchQuery) -> Self {
        Self { occur, query }
    }
}

/// A container of clauses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BooleanQuery {
    pub clauses: Vec<Clause>,
}

impl BooleanQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clause(mut self, occur: Occur, query: SearchQuery) -> Self {
        self.clauses.push(Clause::new(occur, query));
        self
    }

    pub fn push(&mut self, occur: Occur, query: SearchQuery) {
        self.clauses.push(Clause::new(occur, query));
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True when there is at least one clause and every clause excludes.
    ///
    /// Such a container matches nothing on its own in most index engines.
    pub fn is_exclude_only(&self) -> bool {
        !self.clauses.is_empty() && self.clauses.iter().all(|c| c.occur == Occur::MustNot)
    }
}

/// The kinds of sub-query the builder and pattern parser produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchNode {
    MatchAll,
    Term { field: String, text: String },
    Prefix { field: String, prefix: String },
    Wildcard { field: String, pattern: String },
    Phrase { field: String, terms: Vec<String> },
    NumericRange(NumericRange),
    TermRange(TermRange),
    Boolean(BooleanQuery),
}

/// A sub-query with its boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub node: SearchNode,
    pub boost: f32,
}

impl SearchQuery {
    pub fn new(node: SearchNode) -> Self {
        Self { node, boost: 1.0 }
    }

    pub fn match_all() -> Self {
        Self::new(SearchNode::MatchAll)
    }

    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(SearchNode::Term {
            field: field.into(),
            text: text.into(),
        })
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(SearchNode::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        })
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(SearchNode::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        })
    }

    pub fn phrase(field: impl Into<String>, terms: Vec<String>) -> Self {
        Self::new(SearchNode::Phrase {
            field: field.into(),
            terms,
        })
    }

    pub fn numeric_range(range: NumericRange) -> Self {
        Self::new(SearchNode::NumericRange(range))
    }

    pub fn term_range(range: TermRange) -> Self {
        Self::new(SearchNode::TermRange(range))
    }

    pub fn boolean(query: BooleanQuery) -> Self {
        Self::new(SearchNode::Boolean(query))
    }

    /// A container holding exactly one clause.
    pub fn single(occur: Occur, query: SearchQuery) -> Self {
        Self::boolean(BooleanQuery::new().with_clause(occur, query))
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn as_boolean(&self) -> Option<&BooleanQuery> {
        match &self.node {
            SearchNode::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Direct clauses; empty for anything but a boolean container.
    pub fn clauses(&self) -> &[Clause] {
        self.as_boolean().map_or(&[], BooleanQuery::clauses)
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self.node, SearchNode::MatchAll)
    }

    /// The only clause of a one-clause container.
    pub fn single_clause(&self) -> Option<&Clause> {
        match self.clauses() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// An exclusion-only container gains a `Must` match-all clause so that it
    /// matches something on its own. Anything else is returned as is.
    pub fn completed(self) -> SearchQuery {
        match self.node {
            SearchNode::Boolean(boolean) if boolean.is_exclude_only() => SearchQuery {
                node: SearchNode::Boolean(
                    boolean.with_clause(Occur::Must, SearchQuery::match_all()),
                ),
                boost: self.boost,
            },
            node => SearchQuery {
                node,
                boost: self.boost,
            },
        }
    }
}

fn write_range_bound<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    bound: Option<&T>,
) -> fmt::Result {
    match bound {
        Some(v) => write!(f, "{v}"),
        None => write!(f, "*"),
    }
}

fn write_range<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    field: &str,
    lower: Option<&T>,
    upper: Option<&T>,
    lower_inclusive: bool,
    upper_inclusive: bool,
) -> fmt::Result {
    write!(f, "{field}:{}", if lower_inclusive { '[' } else { '{' })?;
    write_range_bound(f, lower)?;
    write!(f, " TO ")?;
    write_range_bound(f, upper)?;
    write!(f, "{}", if upper_inclusive { ']' } else { '}' })
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let boosted = (self.boost - 1.0).abs() > f32::EPSILON;
        match &self.node {
            SearchNode::MatchAll => write!(f, "*:*")?,
            SearchNode::Term { field, text } => write!(f, "{field}:{text}")?,
            SearchNode::Prefix { field, prefix } => write!(f, "{field}:{prefix}*")?,
            SearchNode::Wildcard { field, pattern } => write!(f, "{field}:{pattern}")?,
            SearchNode::Phrase { field, terms } => write!(f, "{field}:\"{}\"", terms.join(" "))?,
            SearchNode::NumericRange(r) => write_range(
                f,
                &r.field,
                r.lower.as_ref(),
                r.upper.as_ref(),
                r.lower_inclusive,
                r.upper_inclusive,
            )?,
            SearchNode::TermRange(r) => write_range(
                f,
                &r.field,
                r.lower.as_ref(),
                r.upper.as_ref(),
                r.lower_inclusive,
                r.upper_inclusive,
            )?,
            SearchNode::Boolean(b) => {
                if boosted {
                    write!(f, "(")?;
                }
                for (i, clause) in b.clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", clause.occur.symbol())?;
                    if clause.query.as_boolean().is_some() && !clause.query.is_boosted() {
                        write!(f, "({})", clause.query)?;
                    } else {
                        write!(f, "{}", clause.query)?;
                    }
                }
                if boosted {
                    write!(f, ")")?;
                }
            }
        }
        if boosted {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}

impl SearchQuery {
    fn is_boosted(&self) -> bool {
        (self.boost - 1.0).abs() > f32::EPSILON
    }
}
