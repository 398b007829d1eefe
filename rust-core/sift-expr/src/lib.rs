// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sift Expressions
//!
//! The typed expression trees that application code builds to describe a
//! filter or an ordering, the canonical node kinds those trees are reduced to
//! before query building, and in-process evaluation of the scalar
//! sub-expressions that supply predicate values.

pub mod canonical;
pub mod error;
pub mod eval;
pub mod expr;
pub mod ordering;
pub mod value;

pub use canonical::{DeferredValue, FieldTarget, Occur, QueryExpr, QueryKind};
pub use error::EvalError;
pub use eval::{compare_values, evaluate};
pub use expr::{ArithOp, CompareOp, Expr, LogicalOp, PURE_METHODS};
pub use ordering::{Direction, OrderBy, Ordering};
pub use value::Value;
