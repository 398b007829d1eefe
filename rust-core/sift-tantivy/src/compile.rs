// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compilation of [`SearchQuery`] trees into tantivy queries.
//!
//! Node mapping:
//!
//! - match-all → `AllQuery`
//! - term → `TermQuery`, typed after the schema field
//! - prefix and wildcard → `RegexQuery`; a bare `*` on a numeric field is a
//!   range over the whole column
//! - phrase → `PhraseQuery` (a one-term phrase is a `TermQuery`)
//! - numeric and term ranges → `RangeQuery`
//! - boolean → `BooleanQuery`
//!
//! A boost other than 1.0 wraps the compiled node in a `BoostQuery`.

use std::ops::Bound;

use sift_expr::{Expr, Occur};
use sift_translate::{Number, NumericRange, SearchNode, SearchQuery, TermRange, Translator};
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, Occur as TantivyOccur, PhraseQuery, Query, RangeQuery,
    RegexQuery, TermQuery,
};
use tantivy::schema::{Field, FieldType, IndexRecordOption, Schema};
use tantivy::Term;
use tracing::debug;

use crate::error::BridgeError;

fn occur(occur: Occur) -> TantivyOccur {
    match occur {
        Occur::Must => TantivyOccur::Must,
        Occur::Should => TantivyOccur::Should,
        Occur::MustNot => TantivyOccur::MustNot,
    }
}

/// Regex for a query-string wildcard pattern. `\x` is a literal `x`.
pub fn wildcard_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                out.push_str(&regex::escape(&literal.to_string()));
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out
}

/// Compiles queries against one schema.
pub struct QueryCompiler<'a> {
    schema: &'a Schema,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Compile `query` into a tantivy query.
    pub fn compile(&self, query: &SearchQuery) -> Result<Box<dyn Query>, BridgeError> {
        debug!(query = %query, "compiling query");
        self.compile_query(query)
    }

    /// Translate a filter expression and compile the result.
    pub fn compile_filter(
        &self,
        translator: &Translator,
        filter: Expr,
    ) -> Result<Box<dyn Query>, BridgeError> {
        let query = translator.translate_filter(filter)?;
        self.compile(&query)
    }

    fn compile_query(&self, query: &SearchQuery) -> Result<Box<dyn Query>, BridgeError> {
        let compiled = self.node(&query.node)?;
        if (query.boost - 1.0).abs() > f32::EPSILON {
            Ok(Box::new(BoostQuery::new(compiled, query.boost)))
        } else {
            Ok(compiled)
        }
    }

    fn field(&self, name: &str) -> Result<(Field, &FieldType), BridgeError> {
        let field = self
            .schema
            .get_field(name)
            .map_err(|_| BridgeError::UnknownField(name.to_string()))?;
        Ok((field, self.schema.get_field_entry(field).field_type()))
    }

    fn node(&self, node: &SearchNode) -> Result<Box<dyn Query>, BridgeError> {
        let query: Box<dyn Query> = match node {
            SearchNode::MatchAll => Box::new(AllQuery),
            SearchNode::Term { field, text } => {
                let (f, field_type) = self.field(field)?;
                let term = typed_term(f, field_type, field, text)?;
                Box::new(TermQuery::new(term, IndexRecordOption::Basic))
            }
            SearchNode::Prefix { field, prefix } => {
                let (f, field_type) = self.field(field)?;
                if is_numeric(field_type) {
                    return Err(BridgeError::Unsupported(format!(
                        "prefix query on numeric field {field}"
                    )));
                }
                Box::new(RegexQuery::from_pattern(&format!("{}.*", regex::escape(prefix)), f)?)
            }
            SearchNode::Wildcard { field, pattern } => {
                let (f, field_type) = self.field(field)?;
                match (is_numeric(field_type), pattern.as_str()) {
                    (true, "*") => Box::new(full_range(f, field_type)?),
                    (true, _) => {
                        return Err(BridgeError::Unsupported(format!(
                            "wildcard pattern on numeric field {field}"
                        )))
                    }
                    (false, _) => Box::new(RegexQuery::from_pattern(&wildcard_regex(pattern), f)?),
                }
            }
            SearchNode::Phrase { field, terms } => {
                let (f, _) = self.field(field)?;
                match terms.as_slice() {
                    [] => return Err(BridgeError::Unsupported(format!("empty phrase on {field}"))),
                    [only] => Box::new(TermQuery::new(
                        Term::from_field_text(f, only),
                        IndexRecordOption::Basic,
                    )),
                    _ => Box::new(PhraseQuery::new(
                        terms.iter().map(|t| Term::from_field_text(f, t)).collect(),
                    )),
                }
            }
            SearchNode::NumericRange(range) => self.numeric_range(range)?,
            SearchNode::TermRange(range) => self.term_range(range)?,
            SearchNode::Boolean(boolean) => {
                let clauses = boolean
                    .clauses()
                    .iter()
                    .map(|c| Ok((occur(c.occur), self.compile_query(&c.query)?)))
                    .collect::<Result<Vec<_>, BridgeError>>()?;
                Box::new(BooleanQuery::new(clauses))
            }
        };
        Ok(query)
    }

    fn numeric_range(&self, range: &NumericRange) -> Result<Box<dyn Query>, BridgeError> {
        let (f, field_type) = self.field(&range.field)?;
        if !is_numeric(field_type) {
            return Err(BridgeError::Unsupported(format!(
                "numeric range on non-numeric field {}",
                range.field
            )));
        }
        let lower = numeric_bound(f, field_type, &range.field, range.lower, range.lower_inclusive, true)?;
        let upper = numeric_bound(f, field_type, &range.field, range.upper, range.upper_inclusive, false)?;
        let query: Box<dyn Query> = match (lower, upper) {
            (Bound::Unbounded, Bound::Unbounded) => Box::new(full_range(f, field_type)?),
            (lower, upper) => Box::new(RangeQuery::new(lower, upper)),
        };
        Ok(query)
    }

    fn term_range(&self, range: &TermRange) -> Result<Box<dyn Query>, BridgeError> {
        let (f, _) = self.field(&range.field)?;
        let bound = |value: &Option<String>, inclusive: bool| match value {
            None => Bound::Unbounded,
            Some(text) if inclusive => Bound::Included(Term::from_field_text(f, text)),
            Some(text) => Bound::Excluded(Term::from_field_text(f, text)),
        };
        let query: Box<dyn Query> = match (range.lower.is_none(), range.upper.is_none()) {
            (true, true) => Box::new(RegexQuery::from_pattern(".*", f)?),
            _ => Box::new(RangeQuery::new(
                bound(&range.lower, range.lower_inclusive),
                bound(&range.upper, range.upper_inclusive),
            )),
        };
        Ok(query)
    }
}

fn is_numeric(field_type: &FieldType) -> bool {
    matches!(field_type, FieldType::I64(_) | FieldType::U64(_) | FieldType::F64(_))
}

/// Exact term for `text`, parsed as the field's column type.
fn typed_term(field: Field, field_type: &FieldType, name: &str, text: &str) -> Result<Term, BridgeError> {
    let invalid = || BridgeError::invalid(name, text);
    Ok(match field_type {
        FieldType::I64(_) => Term::from_field_i64(field, text.parse().map_err(|_| invalid())?),
        FieldType::U64(_) => Term::from_field_u64(field, text.parse().map_err(|_| invalid())?),
        FieldType::F64(_) => Term::from_field_f64(field, text.parse().map_err(|_| invalid())?),
        _ => Term::from_field_text(field, text),
    })
}

/// Every document with a value in a numeric column.
fn full_range(field: Field, field_type: &FieldType) -> Result<RangeQuery, BridgeError> {
    let lowest = match field_type {
        FieldType::I64(_) => Term::from_field_i64(field, i64::MIN),
        FieldType::U64(_) => Term::from_field_u64(field, 0),
        FieldType::F64(_) => Term::from_field_f64(field, f64::MIN),
        _ => {
            return Err(BridgeError::Unsupported(
                "full range on non-numeric field".to_string(),
            ))
        }
    };
    Ok(RangeQuery::new(Bound::Included(lowest), Bound::Unbounded))
}

/// Integer form of a range bound on an integer column.
///
/// A fractional bound rounds towards the inside of the range and becomes
/// inclusive.
fn integral_bound(
    name: &str,
    value: Number,
    inclusive: bool,
    lower: bool,
) -> Result<(i64, bool), BridgeError> {
    match value {
        Number::Int(i) => Ok((i, inclusive)),
        Number::Float(x) if !x.is_finite() => Err(BridgeError::invalid(name, x)),
        Number::Float(x) if x.fract() != 0.0 => {
            let rounded = if lower { x.ceil() } else { x.floor() };
            Ok((rounded as i64, true))
        }
        Number::Float(x) => Ok((x as i64, inclusive)),
    }
}

fn numeric_bound(
    field: Field,
    field_type: &FieldType,
    name: &str,
    value: Option<Number>,
    inclusive: bool,
    lower: bool,
) -> Result<Bound<Term>, BridgeError> {
    let Some(value) = value else {
        return Ok(Bound::Unbounded);
    };
    let (term, inclusive) = match field_type {
        FieldType::F64(_) => (Term::from_field_f64(field, value.as_f64()), inclusive),
        FieldType::I64(_) => {
            let (int, inclusive) = integral_bound(name, value, inclusive, lower)?;
            (Term::from_field_i64(field, int), inclusive)
        }
        FieldType::U64(_) => {
            let (int, inclusive) = integral_bound(name, value, inclusive, lower)?;
            match u64::try_from(int) {
                Ok(v) => (Term::from_field_u64(field, v), inclusive),
                // Every u64 lies above a negative lower bound.
                Err(_) if lower => return Ok(Bound::Unbounded),
                Err(_) => return Err(BridgeError::invalid(name, int)),
            }
        }
        _ => return Err(BridgeError::invalid(name, value.as_f64())),
    };
    Ok(if inclusive {
        Bound::Included(term)
    } else {
        Bound::Excluded(term)
    })
}
