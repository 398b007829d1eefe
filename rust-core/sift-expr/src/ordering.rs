// SPDX-License-Identifier: PMPL-1.0-or-later
//! Order-by clauses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expr::Expr;

/// Sort direction of one ordering entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => write!(f, "asc"),
            Direction::Descending => write!(f, "desc"),
        }
    }
}

/// One `(key expression, direction)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub expr: Expr,
    pub direction: Direction,
}

impl Ordering {
    pub fn new(expr: Expr, direction: Direction) -> Self {
        Self { expr, direction }
    }

    pub fn ascending(expr: Expr) -> Self {
        Self::new(expr, Direction::Ascending)
    }

    pub fn descending(expr: Expr) -> Self {
        Self::new(expr, Direction::Descending)
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.direction)
    }
}

/// An order-by clause: entries in priority order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderBy {
    pub orderings: Vec<Ordering>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn len(&self) -> usize {
        self.orderings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orderings.is_empty()
    }
}

impl From<Vec<Ordering>> for OrderBy {
    fn from(orderings: Vec<Ordering>) -> Self {
        Self { orderings }
    }
}
