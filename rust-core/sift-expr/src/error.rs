// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scalar evaluation errors.

use thiserror::Error;

/// Errors raised while evaluating a scalar sub-expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("not a scalar expression: {0}")]
    NotScalar(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("method {method} expects {expected} argument(s), got {actual}")]
    Arity {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("cannot apply {op} to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(&'static str),
}
