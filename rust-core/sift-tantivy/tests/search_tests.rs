// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end search over an in-memory tantivy index

use std::sync::Arc;

use sift_expr::{Expr, Value};
use sift_tantivy::{QueryCompiler, SchemaFieldMap};
use sift_translate::Translator;
use tantivy::collector::TopDocs;
use tantivy::query::Query;
use tantivy::schema::{Field, Schema, Value as _, FAST, INDEXED, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexWriter, TantivyDocument};

struct Library {
    index: Index,
    schema: Schema,
    id: Field,
}

impl Library {
    fn new() -> Self {
        let mut builder = Schema::builder();
        let id = builder.add_text_field("id", STRING | STORED);
        let title = builder.add_text_field("title", TEXT | STORED);
        let status = builder.add_text_field("status", STRING | STORED);
        let year = builder.add_i64_field("year", INDEXED | FAST | STORED);
        let schema = builder.build();

        let index = Index::create_in_ram(schema.clone());
        let mut writer: IndexWriter = index.writer(50_000_000).unwrap();
        writer
            .add_document(doc!(id => "1", title => "Rust in Action", status => "published", year => 2019i64))
            .unwrap();
        writer
            .add_document(doc!(id => "2", title => "Programming Rust", status => "draft", year => 2021i64))
            .unwrap();
        writer
            .add_document(doc!(id => "3", title => "Zero to Production", status => "published", year => 2022i64))
            .unwrap();
        writer
            .add_document(doc!(id => "4", title => "The Rust Book", status => "archived"))
            .unwrap();
        writer.commit().unwrap();

        Self { index, schema, id }
    }

    fn translator(&self) -> Translator {
        Translator::new(Arc::new(SchemaFieldMap::new(&self.schema)))
    }

    fn run(&self, query: &dyn Query) -> Vec<String> {
        let reader = self.index.reader().unwrap();
        let searcher = reader.searcher();
        let hits = searcher.search(query, &TopDocs::with_limit(10)).unwrap();
        let mut ids: Vec<String> = hits
            .into_iter()
            .map(|(_, address)| {
                let stored: TantivyDocument = searcher.doc(address).unwrap();
                stored
                    .get_first(self.id)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        ids.sort();
        ids
    }

    fn search(&self, filter: Expr) -> Vec<String> {
        let query = QueryCompiler::new(&self.schema)
            .compile_filter(&self.translator(), filter)
            .unwrap();
        self.run(query.as_ref())
    }
}

fn doc_ref() -> Expr {
    Expr::source("doc")
}

#[test]
fn test_numeric_window() {
    let library = Library::new();
    let e = doc_ref().member("year").gt(2019) & doc_ref().member("year").lt(2023);
    assert_eq!(library.search(e), vec!["2", "3"]);

    let e = doc_ref().member("year").ge(2019) & doc_ref().member("year").le(2021);
    assert_eq!(library.search(e), vec!["1", "2"]);
}

#[test]
fn test_prefix_on_tokenized_title() {
    let library = Library::new();
    let e = doc_ref().member("title").call("starts_with", vec!["Rus".into()]);
    assert_eq!(library.search(e), vec!["1", "2", "4"]);
}

#[test]
fn test_exclusion_only_filter() {
    let library = Library::new();
    let e = doc_ref().member("status").not_equals("draft");
    assert_eq!(library.search(e), vec!["1", "3", "4"]);

    let e = doc_ref().member("status").not_equals("draft") & doc_ref().member("status").not_equals("archived");
    assert_eq!(library.search(e), vec!["1", "3"]);
}

#[test]
fn test_missing_numeric_value() {
    let library = Library::new();
    assert_eq!(library.search(doc_ref().member("year").equals(Value::Null)), vec!["4"]);
    assert_eq!(
        library.search(doc_ref().member("year").not_equals(Value::Null)),
        vec!["1", "2", "3"]
    );
}

#[test]
fn test_exact_numeric_term() {
    let library = Library::new();
    assert_eq!(library.search(doc_ref().member("year").equals(2021)), vec!["2"]);
}

#[test]
fn test_membership_in_list() {
    let library = Library::new();
    let e = Expr::contains(Value::from(vec!["draft", "archived"]), doc_ref().member("status"));
    assert_eq!(library.search(e), vec!["2", "4"]);
}

#[test]
fn test_any_field_search() {
    let library = Library::new();
    let e = Expr::call_static("any_field", vec![doc_ref()]).equals("production");
    assert_eq!(library.search(e), vec!["3"]);
}

#[test]
fn test_boosted_disjunction() {
    let library = Library::new();
    let e = doc_ref()
        .member("title")
        .call("equals", vec!["rust".into()])
        .call("boost", vec![3.0_f64.into()])
        | doc_ref().member("status").equals("published");
    assert_eq!(library.search(e), vec!["1", "2", "3", "4"]);
}

#[test]
fn test_negated_conjunction() {
    let library = Library::new();
    let e = !(doc_ref().member("status").equals("published") & doc_ref().member("year").gt(2020));
    assert_eq!(library.search(e), vec!["1", "2", "4"]);
}
