//! Field predicates evaluated against a single record.
//!
//! Records are sparse, so every predicate has to say what happens when the
//! field is absent or holds the wrong type:
//!
//! | predicate | field absent | wrong type |
//! |---|---|---|
//! | `Equals` | no match | no match (values differ) |
//! | `NotEqual` | **match** | match (values differ) |
//! | `GreaterThan` / `GreaterOrEqual` / `LessThan` / `LessOrEqual` | no match | no match unless a number |
//! | `Matches` | no match | no match unless a string |

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use shelf_types::Record;

use crate::error::{QueryError, QueryResult};

/// A single narrowing condition on one field.
#[derive(Clone, Debug)]
pub enum Predicate {
    Equals(String, Value),
    NotEqual(String, Value),
    GreaterThan(String, f64),
    GreaterOrEqual(String, f64),
    LessThan(String, f64),
    LessOrEqual(String, f64),
    Matches(String, Regex),
}

impl Predicate {
    /// Build a [`Predicate::Matches`] from pattern text.
    pub fn pattern(field: impl Into<String>, pattern: &str, case_insensitive: bool) -> QueryResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| QueryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::Matches(field.into(), regex))
    }

    /// The field this predicate inspects.
    pub fn field(&self) -> &str {
        match self {
            Self::Equals(f, _)
            | Self::NotEqual(f, _)
            | Self::GreaterThan(f, _)
            | Self::GreaterOrEqual(f, _)
            | Self::LessThan(f, _)
            | Self::LessOrEqual(f, _)
            | Self::Matches(f, _) => f,
        }
    }

    /// Evaluate against one record.
    pub fn test(&self, record: &Record) -> bool {
        let Some(actual) = record.get(self.field()) else {
            return matches!(self, Self::NotEqual(..));
        };
        match self {
            Self::Equals(_, expected) => values_equal(actual, expected),
            Self::NotEqual(_, expected) => !values_equal(actual, expected),
            Self::GreaterThan(_, bound) => numeric_cmp(actual, *bound) == Some(Ordering::Greater),
            Self::GreaterOrEqual(_, bound) => matches!(
                numeric_cmp(actual, *bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::LessThan(_, bound) => numeric_cmp(actual, *bound) == Some(Ordering::Less),
            Self::LessOrEqual(_, bound) => matches!(
                numeric_cmp(actual, *bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Matches(_, regex) => actual.as_str().is_some_and(|s| regex.is_match(s)),
        }
    }
}

/// Equality that treats `1` and `1.0` as the same number.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn numeric_cmp(actual: &Value, bound: f64) -> Option<Ordering> {
    match actual {
        Value::Number(n) => n.as_f64()?.partial_cmp(&bound),
        _ => None,
    }
}
