// SPDX-License-Identifier: PMPL-1.0-or-later
//! Canonical query-expression nodes.
//!
//! After the rewrite pipeline has run, a filter tree consists only of
//! [`QueryExpr`] leaves, logical AND/OR nodes, boost wrappers and (rarely)
//! boolean constants. These are the node kinds the query builder accepts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;
use crate::eval;
use crate::expr::{CompareOp, Expr};
use crate::value::Value;

/// Per-clause matching requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause should match; it scores but is not required.
    Should,
    /// The clause must not match.
    MustNot,
}

impl Occur {
    /// Include becomes exclude and vice versa. `Should` negates to `MustNot`.
    pub fn negate(self) -> Occur {
        match self {
            Occur::Must | Occur::Should => Occur::MustNot,
            Occur::MustNot => Occur::Must,
        }
    }

    /// Lucene-syntax prefix for a clause with this occur.
    pub fn symbol(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

/// What a field predicate asks of its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Equal,
    Prefix,
    Suffix,
    Wildcard,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl QueryKind {
    /// Map a comparison operator onto a query kind and occur.
    ///
    /// `!=` is an excluded equality.
    pub fn from_compare(op: CompareOp) -> (QueryKind, Occur) {
        match op {
            CompareOp::Equal => (QueryKind::Equal, Occur::Must),
            CompareOp::NotEqual => (QueryKind::Equal, Occur::MustNot),
            CompareOp::GreaterThan => (QueryKind::GreaterThan, Occur::Must),
            CompareOp::GreaterThanOrEqual => (QueryKind::GreaterThanOrEqual, Occur::Must),
            CompareOp::LessThan => (QueryKind::LessThan, Occur::Must),
            CompareOp::LessThanOrEqual => (QueryKind::LessThanOrEqual, Occur::Must),
            CompareOp::StartsWith => (QueryKind::Prefix, Occur::Must),
            CompareOp::EndsWith => (QueryKind::Suffix, Occur::Must),
            CompareOp::Like => (QueryKind::Wildcard, Occur::Must),
        }
    }

    pub fn is_range(self) -> bool {
        matches!(
            self,
            QueryKind::GreaterThan
                | QueryKind::GreaterThanOrEqual
                | QueryKind::LessThan
                | QueryKind::LessThanOrEqual
        )
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Equal => "equal",
            QueryKind::Prefix => "prefix",
            QueryKind::Suffix => "suffix",
            QueryKind::Wildcard => "wildcard",
            QueryKind::GreaterThan => "gt",
            QueryKind::GreaterThanOrEqual => "gte",
            QueryKind::LessThan => "lt",
            QueryKind::LessThanOrEqual => "lte",
        };
        f.write_str(name)
    }
}

/// The field a predicate applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTarget {
    /// One logical field, resolved through the field mapping at build time.
    Named(String),
    /// Every mapped field.
    Any,
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTarget::Named(name) => write!(f, "{name}"),
            FieldTarget::Any => write!(f, "*"),
        }
    }
}

/// A scalar computation captured during canonicalization and run later.
///
/// The rewrite passes only move this value around; the query builder calls
/// [`DeferredValue::evaluate`] once per predicate.
#[derive(Debug, Clone)]
pub struct DeferredValue {
    source: Arc<Expr>,
}

impl DeferredValue {
    pub fn new(source: Expr) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// The captured sub-tree.
    pub fn source(&self) -> &Expr {
        &self.source
    }

    /// Run the computation. Lists are rejected: a pattern is a single scalar
    /// or null.
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        let value = eval::evaluate(&self.source)?;
        if value.is_scalar() {
            Ok(value)
        } else {
            Err(EvalError::NotScalar(value.to_string()))
        }
    }
}

impl PartialEq for DeferredValue {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl From<Value> for DeferredValue {
    fn from(value: Value) -> Self {
        DeferredValue::new(Expr::Constant(value))
    }
}

impl From<Expr> for DeferredValue {
    fn from(source: Expr) -> Self {
        DeferredValue::new(source)
    }
}

impl Serialize for DeferredValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.source.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DeferredValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Expr::deserialize(deserializer).map(DeferredValue::new)
    }
}

/// One field predicate in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpr {
    pub target: FieldTarget,
    pub kind: QueryKind,
    pub occur: Occur,
    pub boost: f32,
    pub pattern: DeferredValue,
}

impl QueryExpr {
    /// A required predicate on `field` with unit boost.
    pub fn new(field: impl Into<String>, kind: QueryKind, pattern: impl Into<DeferredValue>) -> Self {
        Self {
            target: FieldTarget::Named(field.into()),
            kind,
            occur: Occur::Must,
            boost: 1.0,
            pattern: pattern.into(),
        }
    }

    /// A required predicate across every mapped field.
    pub fn any_field(kind: QueryKind, pattern: impl Into<DeferredValue>) -> Self {
        Self {
            target: FieldTarget::Any,
            kind,
            occur: Occur::Must,
            boost: 1.0,
            pattern: pattern.into(),
        }
    }

    pub fn with_occur(mut self, occur: Occur) -> Self {
        self.occur = occur;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn is_any_field(&self) -> bool {
        matches!(self.target, FieldTarget::Any)
    }

    /// The same predicate with its occur negated.
    pub fn negated(mut self) -> Self {
        self.occur = self.occur.negate();
        self
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}({})",
            self.occur.symbol(),
            self.target,
            self.kind,
            self.pattern.source()
        )?;
        if (self.boost - 1.0).abs() > f32::EPSILON {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}
