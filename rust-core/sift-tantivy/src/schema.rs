// SPDX-License-Identifier: PMPL-1.0-or-later
//! Field mapping read from a tantivy schema.

use std::collections::BTreeMap;

use sift_expr::Value;
use sift_translate::{FieldMapping, FieldMappingProvider};
use tantivy::schema::{FieldType, Schema};

use crate::error::BridgeError;

/// Numeric column type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    I64,
    U64,
    F64,
}

/// One indexed schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    name: String,
    numeric: Option<NumericType>,
    text: bool,
    lowercase: bool,
}

impl SchemaField {
    fn from_type(name: &str, field_type: &FieldType) -> Self {
        let numeric = match field_type {
            FieldType::I64(_) => Some(NumericType::I64),
            FieldType::U64(_) => Some(NumericType::U64),
            FieldType::F64(_) => Some(NumericType::F64),
            _ => None,
        };
        // Every stock tokenizer except `raw` lowercases.
        let lowercase = match field_type {
            FieldType::Str(options) => options
                .get_indexing_options()
                .is_some_and(|indexing| indexing.tokenizer() != "raw"),
            _ => false,
        };
        Self {
            name: name.to_string(),
            numeric,
            text: matches!(field_type, FieldType::Str(_)),
            lowercase,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn numeric_type(&self) -> Option<NumericType> {
        self.numeric
    }

    /// Whether values are lowercased by the field's tokenizer.
    pub fn is_tokenized(&self) -> bool {
        self.lowercase
    }
}

impl FieldMapping for SchemaField {
    fn index_field_name(&self) -> &str {
        &self.name
    }

    fn is_numeric(&self) -> bool {
        self.numeric.is_some()
    }

    fn convert_to_query_string(&self, value: &Value) -> String {
        let text = value.to_plain_string();
        if self.lowercase {
            text.to_lowercase()
        } else {
            text
        }
    }
}

/// Maps logical names to the indexed fields of a [`Schema`].
///
/// Logical names are the schema field names unless an alias says otherwise.
#[derive(Debug, Clone, Default)]
pub struct SchemaFieldMap {
    fields: BTreeMap<String, SchemaField>,
    aliases: BTreeMap<String, String>,
}

impl SchemaFieldMap {
    /// Every indexed field of `schema`.
    pub fn new(schema: &Schema) -> Self {
        let fields = schema
            .fields()
            .filter(|(_, entry)| entry.field_type().is_indexed())
            .map(|(_, entry)| {
                (
                    entry.name().to_string(),
                    SchemaField::from_type(entry.name(), entry.field_type()),
                )
            })
            .collect();
        Self {
            fields,
            aliases: BTreeMap::new(),
        }
    }

    /// Resolve `logical` to the schema field `index_name`.
    pub fn with_alias(
        mut self,
        logical: impl Into<String>,
        index_name: &str,
    ) -> Result<Self, BridgeError> {
        if !self.fields.contains_key(index_name) {
            return Err(BridgeError::UnknownField(index_name.to_string()));
        }
        self.aliases.insert(logical.into(), index_name.to_string());
        Ok(self)
    }

    pub fn field(&self, index_name: &str) -> Option<&SchemaField> {
        self.fields.get(index_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldMappingProvider for SchemaFieldMap {
    fn resolve(&self, logical_name: &str) -> Option<&dyn FieldMapping> {
        let index_name = self
            .aliases
            .get(logical_name)
            .map(String::as_str)
            .unwrap_or(logical_name);
        self.fields.get(index_name).map(|f| f as &dyn FieldMapping)
    }

    /// Indexed text fields only; numeric columns cannot take free-text
    /// patterns.
    fn all_field_names(&self) -> Vec<String> {
        self.fields
            .values()
            .filter(|f| f.text)
            .map(|f| f.name.clone())
            .collect()
    }
}
