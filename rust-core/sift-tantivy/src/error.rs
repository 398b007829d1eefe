// SPDX-License-Identifier: PMPL-1.0-or-later
//! Bridge errors

use sift_translate::TranslateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Unknown index field: {0}")]
    UnknownField(String),

    #[error("Invalid value {value:?} for field {field}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported query: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl From<tantivy::TantivyError> for BridgeError {
    fn from(e: tantivy::TantivyError) -> Self {
        BridgeError::IndexError(e.to_string())
    }
}

impl BridgeError {
    pub(crate) fn invalid(field: &str, value: impl ToString) -> Self {
        BridgeError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
