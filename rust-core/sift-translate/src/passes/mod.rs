// SPDX-License-Identifier: PMPL-1.0-or-later
//! The rewrite passes that make up the stock pipelines.
//!
//! Each pass is a unit struct (or a small configured struct) implementing
//! [`crate::RewritePass`]. Passes match on node shape and leave everything
//! they do not recognise untouched; only [`Canonicalize`] rejects input.

mod boost;
mod canonicalize;
mod compare_calls;
mod composite_ordering;
mod contains;
mod flags;
mod method_compare;
mod no_op;
mod null_safety;
mod search_methods;
mod source_members;

pub use boost::BoostExtraction;
pub(crate) use boost::check_factor;
pub use canonicalize::Canonicalize;
pub use compare_calls::CompareCalls;
pub use composite_ordering::CompositeOrdering;
pub use contains::SubQueryContains;
pub use flags::FlagConditions;
pub use method_compare::MethodCallComparisons;
pub use no_op::{NoOpConditions, NoOpMethodCalls};
pub use null_safety::NullSafetyGuards;
pub use search_methods::SearchMethodCalls;
pub use source_members::SourceMemberAccess;

use sift_expr::Expr;

/// A direct field reference, named or any-field.
pub(crate) fn is_field_ref(expr: &Expr) -> bool {
    matches!(expr, Expr::Field(_) | Expr::AnyField)
}

/// Something that can become a predicate value: it does not depend on the
/// document.
pub(crate) fn is_value(expr: &Expr) -> bool {
    !expr.references_source()
}

