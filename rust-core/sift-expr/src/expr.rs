// SPDX-License-Identifier: PMPL-1.0-or-later
//! Expression tree nodes.
//!
//! Trees are built by application code (usually through the builder
//! methods on [`Expr`]) and rewritten by the translation pipeline. Nodes are
//! owned values: a rewrite consumes a tree and returns a new one, so a tree
//! handed to the pipeline is never observed half-rewritten.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::canonical::QueryExpr;
use crate::value::Value;

/// Binary comparison operators.
///
/// The pattern operators (`StartsWith`, `EndsWith`, `Like`) only appear once
/// method-call idioms have been recognised by the rewrite pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    StartsWith,
    EndsWith,
    Like,
}

impl CompareOp {
    /// The operator obtained by swapping the operands, if one exists.
    ///
    /// `a < b` is `b > a`; equality is symmetric; pattern operators have no
    /// mirror.
    pub fn mirror(self) -> Option<CompareOp> {
        match self {
            CompareOp::Equal => Some(CompareOp::Equal),
            CompareOp::NotEqual => Some(CompareOp::NotEqual),
            CompareOp::GreaterThan => Some(CompareOp::LessThan),
            CompareOp::GreaterThanOrEqual => Some(CompareOp::LessThanOrEqual),
            CompareOp::LessThan => Some(CompareOp::GreaterThan),
            CompareOp::LessThanOrEqual => Some(CompareOp::GreaterThanOrEqual),
            CompareOp::StartsWith | CompareOp::EndsWith | CompareOp::Like => None,
        }
    }

    /// True for `==`, `!=` and the four ordering comparisons.
    pub fn is_relational(self) -> bool {
        !matches!(
            self,
            CompareOp::StartsWith | CompareOp::EndsWith | CompareOp::Like
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::StartsWith => "starts_with",
            CompareOp::EndsWith => "ends_with",
            CompareOp::Like => "like",
        }
    }
}

/// Scalar arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Remainder => "%",
        }
    }
}

/// Short-circuit logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// The dual operator under De Morgan's laws.
    pub fn dual(self) -> LogicalOp {
        match self {
            LogicalOp::And => LogicalOp::Or,
            LogicalOp::Or => LogicalOp::And,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// Methods with no side effects that predicates are commonly built from.
///
/// Calls to anything outside this list are treated as potentially
/// side-effecting when deciding whether a branch may be dropped.
pub const PURE_METHODS: &[&str] = &[
    "any_field",
    "boost",
    "compare",
    "compare_to",
    "concat",
    "contains",
    "ends_with",
    "equals",
    "get",
    "is_null_or_empty",
    "len",
    "matches",
    "starts_with",
    "to_lower",
    "to_lower_invariant",
    "to_string",
    "to_upper",
    "to_upper_invariant",
    "trim",
];

/// Methods whose result is a boolean when called on a field reference.
const PREDICATE_METHODS: &[&str] = &[
    "contains",
    "ends_with",
    "equals",
    "is_null_or_empty",
    "matches",
    "starts_with",
];

/// A node in a query expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A literal value.
    Constant(Value),
    /// The document the query ranges over, by parameter name.
    Source(String),
    /// Property-style access, `target.member`.
    Member { target: Box<Expr>, member: String },
    /// Instance (`target.method(args)`) or static (`method(args)`) call.
    Call {
        target: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
    /// A resolved reference to a logical field.
    Field(String),
    /// Marker for "search every mapped field".
    AnyField,
    /// Sub-query membership test: does `collection` contain `item`.
    Contains {
        collection: Box<Expr>,
        item: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// Several keys grouped together, as in a multi-key ordering.
    Tuple(Vec<Expr>),
    /// Relevance boost applied to a predicate sub-tree.
    Boost { inner: Box<Expr>, factor: f32 },
    /// Canonical field predicate.
    Query(Box<QueryExpr>),
    /// Several ordering keys sharing one direction.
    Composite(Vec<Expr>),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn source(name: impl Into<String>) -> Self {
        Expr::Source(name.into())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(name.into())
    }

    /// Static call, `method(args)`.
    pub fn call_static(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: None,
            method: method.into(),
            args,
        }
    }

    pub fn member(self, member: impl Into<String>) -> Self {
        Expr::Member {
            target: Box::new(self),
            member: member.into(),
        }
    }

    /// Instance call on `self`.
    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: Some(Box::new(self)),
            method: method.into(),
            args,
        }
    }

    pub fn compare(self, op: CompareOp, rhs: impl Into<Expr>) -> Self {
        Expr::Compare {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into()),
        }
    }

    pub fn equals(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Equal, rhs)
    }

    pub fn not_equals(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::NotEqual, rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::GreaterThan, rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::GreaterThanOrEqual, rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::LessThan, rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::LessThanOrEqual, rhs)
    }

    pub fn arith(self, op: ArithOp, rhs: impl Into<Expr>) -> Self {
        Expr::Arith {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into()),
        }
    }

    pub fn logical(self, op: LogicalOp, rhs: Expr) -> Self {
        Expr::Logical {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    pub fn contains(collection: impl Into<Expr>, item: impl Into<Expr>) -> Self {
        Expr::Contains {
            collection: Box::new(collection.into()),
            item: Box::new(item.into()),
        }
    }

    pub fn boosted(self, factor: f32) -> Self {
        Expr::Boost {
            inner: Box::new(self),
            factor,
        }
    }

    pub fn query(query: QueryExpr) -> Self {
        Expr::Query(Box::new(query))
    }

    /// The boolean literal, if this node is one.
    pub fn as_bool_constant(&self) -> Option<bool> {
        match self {
            Expr::Constant(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Whether this node produces a boolean without further rewriting.
    pub fn is_boolean_valued(&self) -> bool {
        match self {
            Expr::Compare { .. }
            | Expr::Logical { .. }
            | Expr::Not(_)
            | Expr::Query(_)
            | Expr::Contains { .. }
            | Expr::Boost { .. } => true,
            Expr::Constant(v) => v.as_bool().is_some(),
            Expr::Call { method, .. } => PREDICATE_METHODS.contains(&method.as_str()),
            _ => false,
        }
    }

    /// Whether any node below (and including) this one refers to the query
    /// source or to a field of it.
    pub fn references_source(&self) -> bool {
        match self {
            Expr::Source(_) | Expr::Field(_) | Expr::AnyField => true,
            Expr::Query(_) => true,
            _ => self.children().any(Expr::references_source),
        }
    }

    /// Whether every call below this node is a known pure method.
    pub fn is_pure(&self) -> bool {
        match self {
            Expr::Call { method, .. } if !PURE_METHODS.contains(&method.as_str()) => false,
            _ => self.children().all(Expr::is_pure),
        }
    }

    /// Height of the tree rooted here; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().map(Expr::depth).max().unwrap_or(0)
    }

    /// Borrowing iterator over the direct children of this node.
    ///
    /// The pattern of a [`Expr::Query`] is not a child: it is a scalar
    /// computation, not part of the query structure.
    pub fn children(&self) -> impl Iterator<Item = &Expr> {
        let children: Vec<&Expr> = match self {
            Expr::Constant(_) | Expr::Source(_) | Expr::Field(_) | Expr::AnyField => Vec::new(),
            Expr::Query(_) => Vec::new(),
            Expr::Member { target, .. } => vec![target.as_ref()],
            Expr::Call { target, args, .. } => target
                .iter()
                .map(|t| t.as_ref())
                .chain(args.iter())
                .collect(),
            Expr::Contains { collection, item } => vec![collection.as_ref(), item.as_ref()],
            Expr::Compare { left, right, .. }
            | Expr::Arith { left, right, .. }
            | Expr::Logical { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Not(inner) => vec![inner.as_ref()],
            Expr::Boost { inner, .. } => vec![inner.as_ref()],
            Expr::Tuple(items) | Expr::Composite(items) => items.iter().collect(),
        };
        children.into_iter()
    }

    /// Rebuild this node with every direct child replaced by `f(child)`.
    pub fn try_map_children<E>(
        self,
        mut f: impl FnMut(Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        let mut apply = |e: Box<Expr>| f(*e).map(Box::new);
        Ok(match self {
            leaf @ (Expr::Constant(_)
            | Expr::Source(_)
            | Expr::Field(_)
            | Expr::AnyField
            | Expr::Query(_)) => leaf,
            Expr::Member { target, member } => Expr::Member {
                target: apply(target)?,
                member,
            },
            Expr::Call {
                target,
                method,
                args,
            } => {
                let target = match target {
                    Some(t) => Some(apply(t)?),
                    None => None,
                };
                let args = args
                    .into_iter()
                    .map(|a| apply(Box::new(a)).map(|b| *b))
                    .collect::<Result<Vec<_>, E>>()?;
                Expr::Call {
                    target,
                    method,
                    args,
                }
            }
            Expr::Contains { collection, item } => Expr::Contains {
                collection: apply(collection)?,
                item: apply(item)?,
            },
            Expr::Compare { op, left, right } => Expr::Compare {
                op,
                left: apply(left)?,
                right: apply(right)?,
            },
            Expr::Arith { op, left, right } => Expr::Arith {
                op,
                left: apply(left)?,
                right: apply(right)?,
            },
            Expr::Logical { op, left, right } => Expr::Logical {
                op,
                left: apply(left)?,
                right: apply(right)?,
            },
            Expr::Not(inner) => Expr::Not(apply(inner)?),
            Expr::Tuple(items) => Expr::Tuple(
                items
                    .into_iter()
                    .map(|i| apply(Box::new(i)).map(|b| *b))
                    .collect::<Result<Vec<_>, E>>()?,
            ),
            Expr::Composite(items) => Expr::Composite(
                items
                    .into_iter()
                    .map(|i| apply(Box::new(i)).map(|b| *b))
                    .collect::<Result<Vec<_>, E>>()?,
            ),
            Expr::Boost { inner, factor } => Expr::Boost {
                inner: apply(inner)?,
                factor,
            },
        })
    }

    /// Post-order rewrite: children first, then `f` on the rebuilt node.
    pub fn transform_up<E, F>(self, f: &mut F) -> Result<Expr, E>
    where
        F: FnMut(Expr) -> Result<Expr, E>,
    {
        let rebuilt = self.try_map_children(|child| child.transform_up(&mut *f))?;
        f(rebuilt)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Constant(value)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Constant(Value::from(s))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Constant(Value::Str(s))
    }
}

impl From<i64> for Expr {
    fn from(i: i64) -> Self {
        Expr::Constant(Value::Int(i))
    }
}

impl From<i32> for Expr {
    fn from(i: i32) -> Self {
        Expr::Constant(Value::from(i))
    }
}

impl From<f64> for Expr {
    fn from(x: f64) -> Self {
        Expr::Constant(Value::Float(x))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Constant(Value::Bool(b))
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.logical(LogicalOp::And, rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.logical(LogicalOp::Or, rhs)
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Source(name) => write!(f, "{name}"),
            Expr::Member { target, member } => write!(f, "{target}.{member}"),
            Expr::Call {
                target,
                method,
                args,
            } => {
                if let Some(target) = target {
                    write!(f, "{target}.")?;
                }
                write!(f, "{method}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Field(name) => write!(f, "[{name}]"),
            Expr::AnyField => write!(f, "[*]"),
            Expr::Contains { collection, item } => write!(f, "({item} in {collection})"),
            Expr::Compare { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Arith { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Logical { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Tuple(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Expr::Boost { inner, factor } => write!(f, "{inner}^{factor}"),
            Expr::Query(query) => write!(f, "{query}"),
            Expr::Composite(items) => {
                write!(f, "composite(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
        }
    }
}
