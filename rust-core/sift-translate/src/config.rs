// SPDX-License-Identifier: PMPL-1.0-or-later
//! Translator configuration.
//!
//! Defaults:
//! - parser: no lowercasing of expanded terms, leading wildcards allowed,
//!   unmodified clauses combine as SHOULD
//! - max_expression_depth: 256
//! - log_rewrites: false

use serde::{Deserialize, Serialize};
use sift_expr::Occur;

use crate::error::TranslateError;

/// Options for the free-text pattern parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Lowercase the text of prefix and wildcard terms.
    pub lowercase_expanded_terms: bool,
    /// Accept patterns whose first character is `*` or `?`.
    pub allow_leading_wildcard: bool,
    /// Occur given to clauses without a `+`/`-` modifier.
    pub default_operator: Occur,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            lowercase_expanded_terms: false,
            allow_leading_wildcard: true,
            default_operator: Occur::Should,
        }
    }
}

/// Configuration for [`crate::Translator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub parser: ParserOptions,
    /// Trees deeper than this are rejected before any rewriting.
    pub max_expression_depth: usize,
    /// Render the tree after every rewrite pass at debug level.
    pub log_rewrites: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            parser: ParserOptions::default(),
            max_expression_depth: 256,
            log_rewrites: false,
        }
    }
}

impl TranslatorConfig {
    /// Parse and validate a JSON document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TranslateError> {
        let config: TranslatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TranslateError> {
        if self.max_expression_depth == 0 {
            return Err(TranslateError::InvalidConfig(
                "max_expression_depth must be at least 1".to_string(),
            ));
        }
        if self.parser.default_operator == Occur::MustNot {
            return Err(TranslateError::InvalidConfig(
                "parser.default_operator cannot be must_not".to_string(),
            ));
        }
        Ok(())
    }
}
