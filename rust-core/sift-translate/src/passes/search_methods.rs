// SPDX-License-Identifier: PMPL-1.0-or-later
//! Search extension methods.
//!
//! `any_field(doc)` (or `doc.any_field()`) stands for every mapped field.
//! `matches(x, p)` (or `x.matches(p)`) is a pattern equality `x == p`.

use sift_expr::Expr;

use crate::error::TranslateError;
use crate::pipeline::RewritePass;

pub struct SearchMethodCalls;

fn is_source(expr: &Expr) -> bool {
    matches!(expr, Expr::Source(_))
}

fn rewrite_call(target: Option<Box<Expr>>, method: String, mut args: Vec<Expr>) -> Expr {
    match (target, args.len()) {
        (None, 1) if method == "any_field" && is_source(&args[0]) => Expr::AnyField,
        (Some(t), 0) if method == "any_field" && is_source(&t) => Expr::AnyField,
        (None, 2) if method == "matches" => {
            let pattern = args.remove(1);
            args.remove(0).equals(pattern)
        }
        (Some(t), 1) if method == "matches" => (*t).equals(args.remove(0)),
        (target, _) => Expr::Call {
            target,
            method,
            args,
        },
    }
}

impl RewritePass for SearchMethodCalls {
    fn name(&self) -> &str {
        "search_method_calls"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr, TranslateError> {
        expr.transform_up(&mut |node| {
            Ok(match node {
                Expr::Call {
                    target,
                    method,
                    args,
                } => rewrite_call(target, method, args),
                other => other,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Expr {
        Expr::source("doc")
    }

    fn run(e: Expr) -> Expr {
        SearchMethodCalls.rewrite(e).unwrap()
    }

    #[test]
    fn test_any_field_static_and_instance() {
        let e = Expr::call_static("any_field", vec![doc()]).equals("foo");
        assert_eq!(run(e), Expr::AnyField.equals("foo"));
        let e = doc().call("any_field", vec![]).equals("foo");
        assert_eq!(run(e), Expr::AnyField.equals("foo"));
    }

    #[test]
    fn test_matches() {
        let e = Expr::call_static("matches", vec![doc().member("title"), "ru*".into()]);
        assert_eq!(run(e), doc().member("title").equals("ru*"));
        let e = doc().member("title").call("matches", vec!["x".into()]);
        assert_eq!(run(e), doc().member("title").equals("x"));
    }

    #[test]
    fn test_matches_inside_any_field() {
        let e = Expr::call_static(
            "matches",
            vec![Expr::call_static("any_field", vec![doc()]), "foo*".into()],
        );
        assert_eq!(run(e), Expr::AnyField.equals("foo*"));
    }

    #[test]
    fn test_other_calls_untouched() {
        let e = doc().member("title").call("starts_with", vec!["a".into()]);
        assert_eq!(run(e.clone()), e);
        let e = Expr::call_static("any_field", vec![Expr::constant(1)]);
        assert_eq!(run(e.clone()), e);
    }
}
