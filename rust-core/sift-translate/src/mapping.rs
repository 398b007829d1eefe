// SPDX-License-Identifier: PMPL-1.0-or-later
//! Field mapping: logical field names to index fields.
//!
//! The builder only sees the [`FieldMappingProvider`] trait. [`StaticFieldMap`]
//! is a table-backed implementation that can be loaded from JSON; index
//! adapters provide their own (see the `sift-tantivy` crate).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sift_expr::Value;

use crate::error::TranslateError;

/// How one logical field is stored in the index.
pub trait FieldMapping: Send + Sync {
    fn index_field_name(&self) -> &str;

    /// Numeric fields get numeric ranges and exact numeric terms.
    fn is_numeric(&self) -> bool;

    /// String form of a value as the index stores it.
    fn convert_to_query_string(&self, value: &Value) -> String;
}

/// Registry of field mappings, shared read-only between translations.
pub trait FieldMappingProvider: Send + Sync {
    fn resolve(&self, logical_name: &str) -> Option<&dyn FieldMapping>;

    /// Every index field name, sorted and distinct. Used for any-field
    /// predicates.
    fn all_field_names(&self) -> Vec<String>;
}

/// Storage kind of a configured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Tokenized text.
    #[default]
    Text,
    /// Untokenized exact value.
    Keyword,
    Numeric,
}

/// Configuration of a single field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Index field name; the logical name when absent.
    pub index_name: Option<String>,
    pub kind: FieldKind,
    /// Lowercase string values before they reach the index.
    pub lowercase: bool,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn stored_as(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn lowercased(mut self) -> Self {
        self.lowercase = true;
        self
    }
}

/// Serialized form of a [`StaticFieldMap`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldMapConfig {
    pub fields: BTreeMap<String, FieldSpec>,
}

/// A resolved field of a [`StaticFieldMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct MappedField {
    index_name: String,
    kind: FieldKind,
    lowercase: bool,
}

impl MappedField {
    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl FieldMapping for MappedField {
    fn index_field_name(&self) -> &str {
        &self.index_name
    }

    fn is_numeric(&self) -> bool {
        self.kind == FieldKind::Numeric
    }

    fn convert_to_query_string(&self, value: &Value) -> String {
        let text = value.to_plain_string();
        if self.lowercase && self.kind != FieldKind::Numeric {
            text.to_lowercase()
        } else {
            text
        }
    }
}

/// Field mapping backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticFieldMap {
    fields: BTreeMap<String, MappedField>,
}

impl StaticFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, logical_name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(logical_name, spec);
        self
    }

    pub fn text(self, name: impl Into<String>) -> Self {
        self.with_field(name, FieldSpec::new(FieldKind::Text))
    }

    pub fn keyword(self, name: impl Into<String>) -> Self {
        self.with_field(name, FieldSpec::new(FieldKind::Keyword))
    }

    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.with_field(name, FieldSpec::new(FieldKind::Numeric))
    }

    pub fn insert(&mut self, logical_name: impl Into<String>, spec: FieldSpec) {
        let logical_name = logical_name.into();
        let index_name = spec.index_name.unwrap_or_else(|| logical_name.clone());
        self.fields.insert(
            logical_name,
            MappedField {
                index_name,
                kind: spec.kind,
                lowercase: spec.lowercase,
            },
        );
    }

    pub fn from_config(config: FieldMapConfig) -> Result<Self, TranslateError> {
        let mut map = Self::new();
        for (name, spec) in config.fields {
            if name.is_empty() {
                return Err(TranslateError::InvalidConfig(
                    "field names must not be empty".to_string(),
                ));
            }
            if spec.index_name.as_deref() == Some("") {
                return Err(TranslateError::InvalidConfig(format!(
                    "field {name}: index_name must not be empty"
                )));
            }
            map.insert(name, spec);
        }
        Ok(map)
    }

    /// Load from JSON of the form `{"fields": {"title": {"kind": "text"}}}`.
    pub fn from_json(json: &str) -> Result<Self, TranslateError> {
        let config: FieldMapConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldMappingProvider for StaticFieldMap {
    fn resolve(&self, logical_name: &str) -> Option<&dyn FieldMapping> {
        self.fields
            .get(logical_name)
            .map(|f| f as &dyn FieldMapping)
    }

    fn all_field_names(&self) -> Vec<String> {
        self.fields
            .values()
            .map(|f| f.index_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
