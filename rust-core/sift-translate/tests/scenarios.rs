// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end translation scenarios
//!
//! Each test starts from the expression an application would write and checks
//! the query that comes out of the full pipeline and builder.

use std::sync::{Arc, Mutex};

use sift_expr::{Direction, Expr, OrderBy, Ordering, Value};
use sift_translate::{
    Number, NumericRange, Occur, PatternParser, SearchNode, SearchQuery, StaticFieldMap,
    TranslateError, Translator,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sift_translate=trace")
        .with_test_writer()
        .try_init();
}

fn doc() -> Expr {
    Expr::source("doc")
}

fn catalog() -> StaticFieldMap {
    StaticFieldMap::new()
        .text("title")
        .keyword("status")
        .keyword("tags")
        .keyword("published")
        .numeric("year")
}

fn translator() -> Translator {
    init_logging();
    Translator::new(Arc::new(catalog()))
}

/// Parser that records multi-field calls and answers with fixed terms.
#[derive(Default)]
struct RecordingParser {
    across: Mutex<Vec<(Vec<String>, String)>>,
}

impl PatternParser for RecordingParser {
    fn parse(&self, field: &str, pattern: &str) -> Result<SearchQuery, TranslateError> {
        Ok(SearchQuery::term(field, pattern))
    }

    fn parse_across_fields(
        &self,
        fields: &[String],
        pattern: &str,
    ) -> Result<SearchQuery, TranslateError> {
        self.across
            .lock()
            .map_err(|_| TranslateError::PatternParse("poisoned".to_string()))?
            .push((fields.to_vec(), pattern.to_string()));
        Ok(SearchQuery::term("_all", pattern))
    }
}

#[test]
fn test_numeric_window_round_trip() {
    let e = doc().member("year").gt(5) & doc().member("year").lt(10);
    let q = translator().translate_filter(e).unwrap();

    assert!((q.boost - 1.0).abs() < f32::EPSILON);
    assert_eq!(q.clauses().len(), 2);
    assert!(q.clauses().iter().all(|c| c.occur == Occur::Must));
    assert_eq!(
        q.clauses()[0].query.node,
        SearchNode::NumericRange(NumericRange::new("year", Some(Number::Int(5)), None, false, true))
    );
    assert_eq!(
        q.clauses()[1].query.node,
        SearchNode::NumericRange(NumericRange::new("year", None, Some(Number::Int(10)), true, false))
    );
}

#[test]
fn test_all_excluded_conjunction_gains_match_all() {
    let e = doc().member("status").not_equals("a") & doc().member("status").not_equals("b");
    let q = translator().translate_filter(e).unwrap();

    assert_eq!(q.clauses().len(), 3);
    assert_eq!(q.clauses()[0].occur, Occur::MustNot);
    assert_eq!(q.clauses()[1].occur, Occur::MustNot);
    assert_eq!(q.clauses()[2].occur, Occur::Must);
    assert!(q.clauses()[2].query.is_match_all());
    assert_eq!(q.to_string(), "-status:a -status:b +*:*");
}

#[test]
fn test_any_field_goes_to_multi_field_parser() {
    let parser = Arc::new(RecordingParser::default());
    let t = translator().with_parser(parser.clone());

    let e = Expr::call_static("any_field", vec![doc()]).equals("foo");
    let q = t.translate_filter(e).unwrap();

    let calls = parser.across.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            vec![
                "published".to_string(),
                "status".to_string(),
                "tags".to_string(),
                "title".to_string(),
                "year".to_string(),
            ],
            "foo".to_string()
        )]
    );
    assert_eq!(q, SearchQuery::single(Occur::Must, SearchQuery::term("_all", "foo")));
}

#[test]
fn test_any_field_with_stock_parser() {
    let map = StaticFieldMap::new().text("title").keyword("status");
    let t = Translator::new(Arc::new(map));
    let e = doc().call("any_field", vec![]).call("matches", vec!["rust".into()]);
    let q = t.translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+(status:rust title:rust)");
}

#[test]
fn test_method_idioms() {
    let e = doc()
        .member("title")
        .call("to_lower", vec![])
        .call("starts_with", vec!["ru".into()])
        & !doc().member("title").call("ends_with", vec!["st".into()]);
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+title:ru* -title:*st");
}

#[test]
fn test_contains_against_constant_list() {
    let e = Expr::contains(Value::from(vec!["a", "b"]), doc().member("status"));
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "status:a status:b");
}

#[test]
fn test_contains_on_multi_valued_field() {
    let e = Expr::contains(doc().member("tags"), "rust");
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+tags:rust");
}

#[test]
fn test_null_guard_is_dropped() {
    let e = doc().member("status").not_equals(Value::Null) & doc().member("status").equals("open");
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+status:open");
}

#[test]
fn test_null_guard_kept_for_empty_pattern() {
    // `status == ""` matches documents without a status, so the guard matters.
    let e = doc().member("status").not_equals(Value::Null) & doc().member("status").equals("");
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+status:* -status:*");
}

#[test]
fn test_null_check_matches_missing_field() {
    let q = translator()
        .translate_filter(doc().member("status").equals(Value::Null))
        .unwrap();
    assert_eq!(q.to_string(), "-status:* +*:*");

    let q = translator()
        .translate_filter(doc().member("status").not_equals(Value::Null))
        .unwrap();
    assert_eq!(q.to_string(), "+status:*");
}

#[test]
fn test_flag_fields() {
    let e = doc().member("published") & doc().member("title").equals("x");
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+published:true +title:x");
}

#[test]
fn test_boost_call_lands_on_predicate() {
    let e = doc()
        .member("title")
        .call("equals", vec!["rust".into()])
        .call("boost", vec![2.0_f64.into()]);
    let q = translator().translate_filter(e).unwrap();
    assert!((q.boost - 1.0).abs() < f32::EPSILON);
    assert!((q.clauses()[0].query.boost - 2.0).abs() < f32::EPSILON);
    assert_eq!(q.to_string(), "+title:rust^2");
}

#[test]
fn test_compare_call_becomes_range() {
    let e = Expr::call_static("compare", vec![doc().member("title"), "m".into()]).lt(0);
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "+title:[* TO m}");
}

#[test]
fn test_negated_disjunction() {
    let e = !(doc().member("status").equals("a") | doc().member("year").ge(2000));
    let q = translator().translate_filter(e).unwrap();
    assert_eq!(q.to_string(), "-status:a -year:[2000 TO *] +*:*");
}

#[test]
fn test_failures() {
    let t = translator();
    assert!(matches!(
        t.translate_filter(doc().member("author").equals("x")),
        Err(TranslateError::UnresolvedField(f)) if f == "author"
    ));
    assert!(matches!(
        t.translate_filter(doc().member("title").call("len", vec![]).gt(3)),
        Err(TranslateError::UnsupportedConstruct(_))
    ));
    assert!(matches!(
        t.translate_filter(doc().member("year").equals("soon")),
        Err(TranslateError::InvalidNumber { .. })
    ));
}

#[test]
fn test_ordering_scenario() {
    let order_by = OrderBy::new()
        .then(Ordering::descending(Expr::Tuple(vec![
            doc().member("year"),
            doc().member("title"),
        ])))
        .then(Ordering::ascending(doc().member("status").call("trim", vec![])));
    let out = translator().translate_ordering(order_by).unwrap();

    let keys: Vec<(String, Direction)> = out
        .orderings
        .iter()
        .map(|o| (o.expr.to_string(), o.direction))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("[year]".to_string(), Direction::Descending),
            ("[title]".to_string(), Direction::Descending),
            ("[status]".to_string(), Direction::Ascending),
        ]
    );
    let described: Vec<String> = out.sort_fields.iter().map(ToString::to_string).collect();
    assert_eq!(described, vec!["year desc", "title desc", "status asc"]);
}

#[test]
fn test_translator_from_json_config() {
    let fields = StaticFieldMap::from_json(
        r#"{"fields": {"headline": {"index_name": "title_t", "kind": "text", "lowercase": true}}}"#,
    )
    .unwrap();
    let config = sift_translate::TranslatorConfig::from_json(r#"{"max_expression_depth": 16}"#).unwrap();
    let t = Translator::with_config(Arc::new(fields), config).unwrap();
    let q = t.translate_filter(doc().member("headline").equals("Rust")).unwrap();
    assert_eq!(q.to_string(), "+title_t:rust");
}
