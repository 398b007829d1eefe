// SPDX-License-Identifier: PMPL-1.0-or-later
//! Translation error types.

use sift_expr::EvalError;
use thiserror::Error;

/// Errors that can occur while translating an expression into a query.
///
/// None of these are retried; translation is a pure transformation and a
/// failed call leaves nothing behind.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// A node reached the builder, or a late rewrite pass, in a shape that
    /// has no query equivalent.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    #[error("unresolved field: {0}")]
    UnresolvedField(String),

    #[error("failed to evaluate pattern for field {field}: {source}")]
    PatternEvaluation {
        field: String,
        #[source]
        source: EvalError,
    },

    /// Internal consistency fault in the pipeline or builder.
    #[error("query stack imbalance: expected depth 1, found {depth}")]
    StackImbalance { depth: usize },

    #[error("invalid numeric value for field {field}: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("pattern parse error: {0}")]
    PatternParse(String),

    #[error("expression depth {depth} exceeds limit {limit}")]
    ExpressionTooDeep { depth: usize, limit: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TranslateError {
    pub(crate) fn unsupported(what: &str, node: impl std::fmt::Display) -> Self {
        TranslateError::UnsupportedConstruct(format!("{what}: {node}"))
    }

    /// True for faults in this crate rather than in the caller's expression.
    pub fn is_internal(&self) -> bool {
        matches!(self, TranslateError::StackImbalance { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = TranslateError::UnresolvedField("author".to_string());
        assert_eq!(err.to_string(), "unresolved field: author");
    }

    #[test]
    fn test_pattern_evaluation_keeps_cause() {
        let err = TranslateError::PatternEvaluation {
            field: "year".to_string(),
            source: EvalError::DivisionByZero,
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_internal_errors() {
        assert!(TranslateError::StackImbalance { depth: 2 }.is_internal());
        assert!(!TranslateError::UnresolvedField("x".to_string()).is_internal());
    }
}
