// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the query-string pattern parser.
// Run with: cargo +nightly fuzz run fuzz_pattern_parser
//
// Patterns reach the parser from application values, so any UTF-8 input must
// either parse or be rejected with an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sift_translate::{ParserOptions, PatternParser, QueryStringParser};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() <= 4096 {
            let parser = QueryStringParser::default();
            let _ = parser.parse("title", input);

            let fields = vec!["body".to_string(), "title".to_string()];
            let _ = parser.parse_across_fields(&fields, input);

            let strict = QueryStringParser::new(ParserOptions {
                allow_leading_wildcard: false,
                lowercase_expanded_terms: true,
                ..ParserOptions::default()
            });
            if let Ok(query) = strict.parse("title", input) {
                // Rendering must not panic either.
                let _ = query.to_string();
            }
        }
    }
});
