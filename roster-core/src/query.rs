//! Query construction and filtering for document backends.
//!
//! Queries are built with a fluent builder and carry an optional filter
//! expression, a sort specification, and skip/limit bounds:
//!
//! ```ignore
//! use roster_core::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("department", "Engineering"))
//!     .sort("salary", SortDirection::Desc)
//!     .skip(10)
//!     .limit(10)
//!     .build();
//! ```
//!
//! Backends consume filter expressions through the [`QueryVisitor`] trait,
//! either evaluating them directly or translating them into a native query
//! language.

use bson::Bson;

use crate::error::StoreError;

/// Sort direction for query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Which field to sort by, and in which direction.
#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// String contains the value as a substring, case-insensitively.
    Contains,
    /// Array contains an element exactly equal to the value, case-sensitively.
    Has,
}

/// A filter expression for selecting documents.
///
/// Expressions compose with `And`, `Or` and `Not` to form conjunctive or
/// disjunctive predicates over document fields.
#[derive(Debug, Clone)]
pub enum Expr {
    /// All sub-expressions must match.
    And(Vec<Expr>),
    /// Any sub-expression may match.
    Or(Vec<Expr>),
    /// Inverts the sub-expression.
    Not(Box<Expr>),
    /// The field is present (or absent, when `false`).
    Exists(String, bool),
    /// A single field comparison.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND, flattening
    /// into an existing AND list where possible.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR, flattening
    /// into an existing OR list where possible.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// A structured query: filter, then sort, then skip/limit.
///
/// A query with no sort and no bounds is the unbounded form used for
/// collection scans such as membership searches.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
    /// Number of documents to skip (for pagination).
    pub skip: Option<usize>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates an empty query matching every document.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Constructor helpers for filter expressions.
///
/// All methods accept field names as `Into<String>` and values as
/// `Into<Bson>`:
///
/// ```ignore
/// let expr = Filter::eq("department", "Sales").and(Filter::gte("salary", 50_000));
/// ```
pub struct Filter;

impl Filter {
    /// Field equals the value exactly.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// String field contains the value as a substring, ignoring case.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    /// Array field contains an element exactly equal to the value.
    ///
    /// Unlike [`Filter::contains`], this is a case-sensitive whole-element
    /// match: `has("skills", "Go")` does not match `["Golang"]`.
    pub fn has(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Has, value.into())
    }

    /// Field is present on the document.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Field is absent from the document.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// All expressions must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Any expression may match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the sort field and direction.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.query.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Builds the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks a filter expression, producing a backend-specific output per node.
pub trait QueryVisitor {
    type Output;
    type Error: Into<StoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_chaining_flattens() {
        let expr = Filter::eq("department", "Engineering")
            .and(Filter::gte("salary", 50_000))
            .and(Filter::lte("salary", 90_000));

        match expr {
            Expr::And(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn or_chaining_flattens() {
        let expr = Filter::eq("department", "Sales")
            .or(Filter::eq("department", "Marketing"))
            .or(Filter::eq("department", "Support"));

        match expr {
            Expr::Or(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn builder_sets_all_parts() {
        let query = Query::builder()
            .filter(Filter::contains("name", "ann"))
            .sort("salary", SortDirection::Desc)
            .skip(20)
            .limit(10)
            .build();

        assert!(query.filter.is_some());
        let sort = query.sort.expect("sort set");
        assert_eq!(sort.field, "salary");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(query.skip, Some(20));
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn has_is_distinct_from_contains() {
        let has = Filter::has("skills", "Go");
        let contains = Filter::contains("skills", "Go");

        match (has, contains) {
            (
                Expr::Field { op: FieldOp::Has, .. },
                Expr::Field { op: FieldOp::Contains, .. },
            ) => {}
            other => panic!("unexpected expressions: {other:?}"),
        }
    }
}
