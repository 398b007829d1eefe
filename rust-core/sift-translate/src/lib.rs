// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sift Translate
//!
//! Turns Sift expression trees into boolean index queries:
//!
//! 1. a [`RewritePipeline`] of small passes reduces an arbitrary filter tree to
//!    canonical form (field predicates, AND/OR, boosts)
//! 2. a [`QueryBuilder`] walks the canonical tree and assembles a
//!    [`SearchQuery`] on an explicit stack
//! 3. orderings go through their own pipeline and the [`OrderingExpander`]
//!
//! [`Translator`] wires these together against a [`FieldMappingProvider`] and
//! a [`PatternParser`].

pub mod builder;
pub mod config;
pub mod error;
pub mod mapping;
pub mod ordering;
pub mod parser;
pub mod passes;
pub mod pipeline;
pub mod query;
pub mod translator;

pub use builder::QueryBuilder;
pub use config::{ParserOptions, TranslatorConfig};
pub use error::TranslateError;
pub use mapping::{FieldKind, FieldMapConfig, FieldMapping, FieldMappingProvider, FieldSpec, StaticFieldMap};
pub use ordering::{OrderingExpander, SortField};
pub use parser::{PatternParser, QueryStringParser};
pub use pipeline::{RewritePass, RewritePipeline};
pub use query::{BooleanQuery, Clause, Number, NumericRange, Occur, SearchNode, SearchQuery, TermRange};
pub use translator::{ExplainStep, Explanation, TranslatedOrdering, Translator};
