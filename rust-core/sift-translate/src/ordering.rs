// SPDX-License-Identifier: PMPL-1.0-or-later
//! Ordering expansion and sort-field resolution.

use serde::{Deserialize, Serialize};
use sift_expr::{Direction, Expr, Ordering};
use std::fmt;

use crate::error::TranslateError;
use crate::mapping::FieldMappingProvider;

/// Expands composite ordering entries into one entry per field.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderingExpander;

impl OrderingExpander {
    /// Replace every composite entry, where it stands, by its fields in
    /// declared order, each with the composite's direction. Other entries
    /// keep their relative position. Expanding twice changes nothing.
    pub fn expand(&self, orderings: Vec<Ordering>) -> Vec<Ordering> {
        let mut expanded = Vec::with_capacity(orderings.len());
        for ordering in orderings {
            match ordering.expr {
                Expr::Composite(keys) => expanded.extend(
                    keys.into_iter()
                        .map(|key| Ordering::new(key, ordering.direction)),
                ),
                expr => expanded.push(Ordering::new(expr, ordering.direction)),
            }
        }
        expanded
    }
}

/// One resolved sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Index field name.
    pub field: String,
    pub numeric: bool,
    pub descending: bool,
}

impl SortField {
    /// Resolve an expanded ordering entry, which must be a plain field.
    pub fn resolve(
        ordering: &Ordering,
        mapping: &dyn FieldMappingProvider,
    ) -> Result<SortField, TranslateError> {
        let Expr::Field(name) = &ordering.expr else {
            return Err(TranslateError::unsupported(
                "ordering key must be a field",
                &ordering.expr,
            ));
        };
        let field = mapping
            .resolve(name)
            .ok_or_else(|| TranslateError::UnresolvedField(name.clone()))?;
        Ok(SortField {
            field: field.index_field_name().to_string(),
            numeric: field.is_numeric(),
            descending: ordering.direction == Direction::Descending,
        })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.field,
            if self.descending { "desc" } else { "asc" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StaticFieldMap;

    fn f(name: &str) -> Expr {
        Expr::field(name)
    }

    #[test]
    fn test_expand_in_place() {
        let orderings = vec![
            Ordering::ascending(f("a")),
            Ordering::descending(Expr::Composite(vec![f("x"), f("y"), f("z")])),
            Ordering::ascending(f("b")),
        ];
        let expanded = OrderingExpander.expand(orderings);
        assert_eq!(
            expanded,
            vec![
                Ordering::ascending(f("a")),
                Ordering::descending(f("x")),
                Ordering::descending(f("y")),
                Ordering::descending(f("z")),
                Ordering::ascending(f("b")),
            ]
        );
    }

    #[test]
    fn test_expand_is_idempotent() {
        let orderings = vec![
            Ordering::descending(Expr::Composite(vec![f("x"), f("y")])),
            Ordering::ascending(f("b")),
        ];
        let once = OrderingExpander.expand(orderings);
        let twice = OrderingExpander.expand(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_expand_without_composites_is_identity() {
        let orderings = vec![Ordering::ascending(f("a")), Ordering::descending(f("b"))];
        assert_eq!(OrderingExpander.expand(orderings.clone()), orderings);
    }

    #[test]
    fn test_sort_field_resolution() {
        let map = StaticFieldMap::new().text("title").numeric("year");
        let sort = SortField::resolve(&Ordering::descending(f("year")), &map).unwrap();
        assert_eq!(
            sort,
            SortField {
                field: "year".to_string(),
                numeric: true,
                descending: true,
            }
        );
        assert_eq!(sort.to_string(), "year desc");

        assert!(matches!(
            SortField::resolve(&Ordering::ascending(f("missing")), &map),
            Err(TranslateError::UnresolvedField(_))
        ));
        assert!(matches!(
            SortField::resolve(&Ordering::ascending(Expr::constant(1)), &map),
            Err(TranslateError::UnsupportedConstruct(_))
        ));
    }
}
