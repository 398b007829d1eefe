// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sift Tantivy
//!
//! Runs Sift queries on a tantivy index:
//!
//! - [`SchemaFieldMap`] is a field mapping read from the index schema
//! - [`QueryCompiler`] turns a translated [`sift_translate::SearchQuery`]
//!   into a tantivy query

pub mod compile;
pub mod error;
pub mod schema;

pub use compile::{wildcard_regex, QueryCompiler};
pub use error::BridgeError;
pub use schema::{NumericType, SchemaField, SchemaFieldMap};
