// SPDX-License-Identifier: PMPL-1.0-or-later
//! Member access on the query source becomes a field reference.
//!
//! Both the property style `doc.author.name` and the call style
//! `doc.get("author")` are accepted. Nested access joins with `.`.

use sift_expr::{Expr, Value};

use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct SourceMemberAccess;

/// The field path reached by accessing `member` on `target`, if `target` is
/// the source or a field.
fn member_of(target: &Expr, member: &str) -> Option<Expr> {
    match target {
        Expr::Source(_) => Some(Expr::Field(member.to_string())),
        Expr::Field(parent) => Some(Expr::Field(format!("{parent}.{member}"))),
        _ => None,
    }
}

impl RewritePass for SourceMemberAccess {
    fn name(&self) -> &str {
        "source_member_access"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            let resolved = match &node {
                Expr::Member { target, member } => member_of(target, member),
                Expr::Call {
                    target: Some(target),
                    method,
                    args,
                } if method == "get" => match args.as_slice() {
                    [Expr::Constant(Value::Str(name))] => member_of(target, name),
                    _ => None,
                },
                _ => None,
            };
            Ok(resolved.unwrap_or(node))
        })
    }
}
