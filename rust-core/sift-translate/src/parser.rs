// SPDX-License-Identifier: PMPL-1.0-or-later
//! Free-text pattern parsing.
//!
//! Predicate values that reach the builder as non-numeric patterns are handed
//! to a [`PatternParser`]. [`QueryStringParser`] understands a small subset of
//! Lucene query syntax:
//!
//! ```text
//! pattern := clause (WS clause)*
//! clause  := ('+' | '-')? (phrase | word)
//! phrase  := '"' chars '"'
//! word    := (char | '\' char)+        '*' and '?' are wildcards
//! ```
//!
//! A word whose only wildcard is a trailing `*` becomes a prefix query; other
//! wildcard words become wildcard queries. Field names are never taken from
//! the pattern; the caller supplies them.

use sift_expr::Occur;

use crate::config::ParserOptions;
use crate::error::TranslateError;
use crate::query::{BooleanQuery, SearchQuery};

/// Parses pattern text into a query against one field or many.
pub trait PatternParser: Send + Sync {
    fn parse(&self, field: &str, pattern: &str) -> Result<SearchQuery, TranslateError>;

    /// Each clause of `pattern` matches if it matches in any of `fields`.
    fn parse_across_fields(
        &self,
        fields: &[String],
        pattern: &str,
    ) -> Result<SearchQuery, TranslateError>;
}

/// One character of a word and whether it was escaped.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Glyph {
    ch: char,
    escaped: bool,
}

impl Glyph {
    fn is_wildcard(self) -> bool {
        !self.escaped && (self.ch == '*' || self.ch == '?')
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Word(Vec<Glyph>),
    Phrase(String),
}

#[derive(Debug, Clone, PartialEq)]
struct RawClause {
    modifier: Option<Occur>,
    body: Body,
}

/// Splits a pattern into clauses.
struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn clauses(mut self) -> Result<Vec<RawClause>, TranslateError> {
        let mut clauses = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else { break };

            let followed = self.peek_next().is_some_and(|c| !c.is_whitespace());
            let modifier = match ch {
                '+' if followed => Some(Occur::Must),
                '-' if followed => Some(Occur::MustNot),
                _ => None,
            };
            if modifier.is_some() {
                self.position += 1;
            }

            let body = if self.peek() == Some('"') {
                self.position += 1;
                Body::Phrase(self.read_phrase()?)
            } else {
                Body::Word(self.read_word()?)
            };
            clauses.push(RawClause { modifier, body });
        }
        Ok(clauses)
    }

    fn read_phrase(&mut self) -> Result<String, TranslateError> {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            self.position += 1;
            match ch {
                '"' => return Ok(text),
                '\\' => match self.peek() {
                    Some(next) => {
                        text.push(next);
                        self.position += 1;
                    }
                    None => break,
                },
                other => text.push(other),
            }
        }
        Err(TranslateError::PatternParse("unterminated phrase".to_string()))
    }

    fn read_word(&mut self) -> Result<Vec<Glyph>, TranslateError> {
        let mut glyphs = Vec::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                break;
            }
            self.position += 1;
            if ch == '\\' {
                let next = self.peek().ok_or_else(|| {
                    TranslateError::PatternParse("dangling escape at end of pattern".to_string())
                })?;
                self.position += 1;
                glyphs.push(Glyph {
                    ch: next,
                    escaped: true,
                });
            } else {
                glyphs.push(Glyph { ch, escaped: false });
            }
        }
        Ok(glyphs)
    }
}

/// Lucene-style pattern parser.
#[derive(Debug, Clone, Default)]
pub struct QueryStringParser {
    options: ParserOptions,
}

impl QueryStringParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    fn expanded(&self, text: String) -> String {
        if self.options.lowercase_expanded_terms {
            text.to_lowercase()
        } else {
            text
        }
    }

    fn word_query(&self, field: &str, glyphs: &[Glyph]) -> Result<SearchQuery, TranslateError> {
        let wildcards = glyphs.iter().filter(|g| g.is_wildcard()).count();
        if wildcards == 0 {
            let text: String = glyphs.iter().map(|g| g.ch).collect();
            return Ok(SearchQuery::term(field, text));
        }

        if let [only] = glyphs {
            if only.ch == '*' {
                return Ok(SearchQuery::wildcard(field, "*"));
            }
        }

        if let Some((last, head)) = glyphs.split_last() {
            if wildcards == 1 && last.is_wildcard() && last.ch == '*' {
                let prefix: String = head.iter().map(|g| g.ch).collect();
                return Ok(SearchQuery::prefix(field, self.expanded(prefix)));
            }
        }

        if !self.options.allow_leading_wildcard && glyphs.first().is_some_and(|g| g.is_wildcard()) {
            return Err(TranslateError::PatternParse(
                "leading wildcard not allowed".to_string(),
            ));
        }

        let mut pattern = String::new();
        for glyph in glyphs {
            if glyph.escaped && matches!(glyph.ch, '*' | '?' | '\\') {
                pattern.push('\\');
            }
            pattern.push(glyph.ch);
        }
        Ok(SearchQuery::wildcard(field, self.expanded(pattern)))
    }

    fn phrase_query(&self, field: &str, text: &str) -> Result<SearchQuery, TranslateError> {
        let mut terms: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        match terms.len() {
            0 => Err(TranslateError::PatternParse("empty phrase".to_string())),
            1 => Ok(SearchQuery::term(field, terms.remove(0))),
            _ => Ok(SearchQuery::phrase(field, terms)),
        }
    }

    fn clause_query(&self, field: &str, body: &Body) -> Result<SearchQuery, TranslateError> {
        match body {
            Body::Word(glyphs) => self.word_query(field, glyphs),
            Body::Phrase(text) => self.phrase_query(field, text),
        }
    }

    fn combine(&self, mut clauses: Vec<(Option<Occur>, SearchQuery)>) -> SearchQuery {
        if matches!(clauses.as_slice(), [(None, _)]) {
            if let Some((_, query)) = clauses.pop() {
                return query;
            }
        }
        let mut boolean = BooleanQuery::new();
        for (modifier, query) in clauses {
            boolean.push(modifier.unwrap_or(self.options.default_operator), query);
        }
        SearchQuery::boolean(boolean)
    }

    fn lex(pattern: &str) -> Result<Vec<RawClause>, TranslateError> {
        let clauses = Lexer::new(pattern).clauses()?;
        if clauses.is_empty() {
            return Err(TranslateError::PatternParse("empty pattern".to_string()));
        }
        Ok(clauses)
    }
}

impl PatternParser for QueryStringParser {
    fn parse(&self, field: &str, pattern: &str) -> Result<SearchQuery, TranslateError> {
        let clauses = Self::lex(pattern)?
            .into_iter()
            .map(|c| Ok((c.modifier, self.clause_query(field, &c.body)?)))
            .collect::<Result<Vec<_>, TranslateError>>()?;
        Ok(self.combine(clauses))
    }

    fn parse_across_fields(
        &self,
        fields: &[String],
        pattern: &str,
    ) -> Result<SearchQuery, TranslateError> {
        let (first, rest) = fields
            .split_first()
            .ok_or_else(|| TranslateError::PatternParse("no fields to search".to_string()))?;
        if rest.is_empty() {
            return self.parse(first, pattern);
        }

        let mut clauses = Vec::new();
        for clause in Self::lex(pattern)? {
            let mut across = BooleanQuery::new();
            for field in fields {
                across.push(Occur::Should, self.clause_query(field, &clause.body)?);
            }
            clauses.push((clause.modifier, SearchQuery::boolean(across)));
        }
        Ok(self.combine(clauses))
    }
}
