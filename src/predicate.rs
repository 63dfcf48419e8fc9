//! Query predicate builder
//!
//! Composes equality terms with AND/OR into a filter that either
//! serializes to a backend selection clause with positional placeholders
//! (for SQL-shaped indexes) or evaluates directly against a [`Row`]
//! (for in-process indexes). Construction is pure; malformed input such
//! as an empty combinator list is rejected up front, never at build time.

use crate::error::{Error, Result};
use crate::index::{Row, Value};
use serde::{Deserialize, Serialize};

/// A boolean filter expression over named columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `column = ?`
    Eq { column: String, value: Value },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// Serialized form of a predicate: selection clause plus bind arguments
///
/// Placeholders are emitted left to right and `args` follows the same
/// order, so `args[n]` always binds the n-th `?` of `clause`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub clause: String,
    pub args: Vec<Value>,
}

impl Predicate {
    /// Equality term on one column
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Conjunction of two sub-expressions
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of two sub-expressions
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Conjunction over a term list; empty input is a construction error
    pub fn all(terms: Vec<Predicate>) -> Result<Self> {
        Self::fold(terms, Predicate::and)
    }

    /// Disjunction over a term list; empty input is a construction error
    pub fn any(terms: Vec<Predicate>) -> Result<Self> {
        Self::fold(terms, Predicate::or)
    }

    fn fold(terms: Vec<Predicate>, combine: fn(Predicate, Predicate) -> Predicate) -> Result<Self> {
        let mut iter = terms.into_iter();
        let first = iter.next().ok_or(Error::EmptyPredicate)?;
        Ok(iter.fold(first, combine))
    }

    /// Serialize to a selection clause and ordered bind arguments
    pub fn build(&self) -> Selection {
        let mut clause = String::new();
        let mut args = Vec::new();
        self.write(&mut clause, &mut args);
        Selection { clause, args }
    }

    fn write(&self, clause: &mut String, args: &mut Vec<Value>) {
        match self {
            Predicate::Eq { column, value } => {
                clause.push_str(column);
                clause.push_str(" = ?");
                args.push(value.clone());
            }
            Predicate::And(left, right) => Self::write_pair(clause, args, left, right, "AND"),
            Predicate::Or(left, right) => Self::write_pair(clause, args, left, right, "OR"),
        }
    }

    fn write_pair(
        clause: &mut String,
        args: &mut Vec<Value>,
        left: &Predicate,
        right: &Predicate,
        op: &str,
    ) {
        clause.push('(');
        left.write(clause, args);
        clause.push_str(") ");
        clause.push_str(op);
        clause.push_str(" (");
        right.write(clause, args);
        clause.push(')');
    }

    /// Evaluate against one row; absent columns simply do not match
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Eq { column, value } => row.get(column) == Some(value),
            Predicate::And(left, right) => left.matches(row) && right.matches(row),
            Predicate::Or(left, right) => left.matches(row) || right.matches(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_term() {
        let sel = Predicate::eq("media_type", 1i64).build();
        assert_eq!(sel.clause, "media_type = ?");
        assert_eq!(sel.args, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_and_parenthesizes_and_orders_args() {
        let sel = Predicate::eq("media_type", 1i64)
            .and(Predicate::eq("is_trashed", 0i64))
            .build();
        assert_eq!(sel.clause, "(media_type = ?) AND (is_trashed = ?)");
        assert_eq!(sel.args, vec![Value::Integer(1), Value::Integer(0)]);
    }

    #[test]
    fn test_nested_combinators_keep_placeholder_order() {
        let sel = Predicate::eq("a", 1i64)
            .or(Predicate::eq("b", "x"))
            .and(Predicate::eq("c", 3i64))
            .build();
        assert_eq!(sel.clause, "((a = ?) OR (b = ?)) AND (c = ?)");
        assert_eq!(
            sel.args,
            vec![Value::Integer(1), Value::Text("x".into()), Value::Integer(3)]
        );
        // one placeholder per argument, in emission order
        assert_eq!(sel.clause.matches('?').count(), sel.args.len());
    }

    #[test]
    fn test_empty_combinator_rejected_at_construction() {
        assert!(matches!(Predicate::all(vec![]), Err(Error::EmptyPredicate)));
        assert!(matches!(Predicate::any(vec![]), Err(Error::EmptyPredicate)));
    }

    #[test]
    fn test_all_folds_terms() {
        let p = Predicate::all(vec![
            Predicate::eq("a", 1i64),
            Predicate::eq("b", 2i64),
            Predicate::eq("c", 3i64),
        ])
        .unwrap();
        assert_eq!(p.build().clause, "((a = ?) AND (b = ?)) AND (c = ?)");
    }

    #[test]
    fn test_matches_row() {
        let row = Row::new().set("media_type", 1i64).set("is_favorite", 1i64);
        let p = Predicate::eq("media_type", 1i64).and(Predicate::eq("is_favorite", 1i64));
        assert!(p.matches(&row));

        let q = Predicate::eq("media_type", 3i64).or(Predicate::eq("is_favorite", 1i64));
        assert!(q.matches(&row));

        let r = Predicate::eq("missing_column", 1i64);
        assert!(!r.matches(&row));
    }
}
