//! Selectors: which rows a read targets

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::FieldValue;

/// Values a single column must match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Match {
    /// Column equals the value
    One(FieldValue),
    /// Column equals any of the values
    Any(Vec<FieldValue>),
}

impl Match {
    pub fn one(value: impl Into<FieldValue>) -> Self {
        Self::One(value.into())
    }

    pub fn any<T: Into<FieldValue>>(values: impl IntoIterator<Item = T>) -> Self {
        values.into_iter().collect()
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Any(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Any(values) if values.is_empty())
    }

    /// Check a column value against this match
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            Self::One(expected) => expected == value,
            Self::Any(expected) => expected.contains(value),
        }
    }
}

impl From<FieldValue> for Match {
    fn from(value: FieldValue) -> Self {
        Self::One(value)
    }
}

impl<T: Into<FieldValue>> FromIterator<T> for Match {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Any(iter.into_iter().map(Into::into).collect())
    }
}

/// Column → match map; iteration order is the column name order
pub type FieldFilters = BTreeMap<String, Match>;

/// Comparison operators for extra predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    IsNull,
    IsNotNull,
}

impl Comparison {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator takes a right-hand value
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// An extra condition ANDed into field and filter-map reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub comparison: Comparison,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl Predicate {
    pub fn new(
        column: impl Into<String>,
        comparison: Comparison,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            column: column.into(),
            comparison,
            value: Some(value.into()),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(column, Comparison::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(column, Comparison::Ne, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(column, Comparison::Gt, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(column, Comparison::Lt, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(column, Comparison::Like, pattern.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            comparison: Comparison::IsNull,
            value: None,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            comparison: Comparison::IsNotNull,
            value: None,
        }
    }

    /// Evaluate against a column value (`None` means SQL NULL)
    pub fn accepts(&self, actual: Option<&FieldValue>) -> bool {
        match (self.comparison, actual, self.value.as_ref()) {
            (Comparison::IsNull, actual, _) => actual.is_none(),
            (Comparison::IsNotNull, actual, _) => actual.is_some(),
            (_, None, _) | (_, _, None) => false,
            (Comparison::Eq, Some(a), Some(v)) => a == v,
            (Comparison::Ne, Some(a), Some(v)) => a != v,
            (Comparison::Gt, Some(a), Some(v)) => a > v,
            (Comparison::Gte, Some(a), Some(v)) => a >= v,
            (Comparison::Lt, Some(a), Some(v)) => a < v,
            (Comparison::Lte, Some(a), Some(v)) => a <= v,
            (Comparison::Like, Some(a), Some(v)) => match (a.as_text(), v.as_text()) {
                (Some(text), Some(pattern)) => like_matches(text, pattern),
                _ => false,
            },
        }
    }
}

/// SQL `LIKE` with `%` and `_` wildcards
fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // dp[j]: pattern[..j] matches text[..i]
    let mut dp = vec![false; pattern.len() + 1];
    dp[0] = true;
    for j in 1..=pattern.len() {
        dp[j] = dp[j - 1] && pattern[j - 1] == '%';
    }

    for c in &text {
        let mut prev = dp[0];
        dp[0] = false;
        for j in 1..=pattern.len() {
            let current = dp[j];
            dp[j] = match pattern[j - 1] {
                '%' => dp[j] || dp[j - 1],
                '_' => prev,
                p => prev && p == *c,
            };
            prev = current;
        }
    }

    dp[pattern.len()]
}

/// Which rows a read targets
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Lookup by one primary key
    PrimaryKey(Uuid),
    /// Rows whose primary key is in the list
    PrimaryKeys(Vec<Uuid>),
    /// One column matched against one or several values
    Field {
        column: String,
        matching: Match,
        extra: Vec<Predicate>,
    },
    /// `all` ANDed together, `any` ORed together; both groups ANDed when
    /// both are present
    Filters {
        all: FieldFilters,
        any: FieldFilters,
        extra: Vec<Predicate>,
    },
    /// Full scan of the entity's table
    Everything,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_accepts() {
        let one = Match::one("ann");
        assert!(one.accepts(&FieldValue::from("ann")));
        assert!(!one.accepts(&FieldValue::from("bob")));

        let any = Match::any(["ann", "bob"]);
        assert!(any.is_multi());
        assert!(any.accepts(&FieldValue::from("bob")));
        assert!(!any.accepts(&FieldValue::from("cat")));
    }

    #[test]
    fn test_empty_match() {
        let empty: Match = Vec::<String>::new().into_iter().collect();
        assert!(empty.is_empty());
        assert!(!Match::one(1).is_empty());
    }

    #[test]
    fn test_predicate_comparisons() {
        let value = FieldValue::from(5);
        assert!(Predicate::gt("n", 3).accepts(Some(&value)));
        assert!(!Predicate::lt("n", 3).accepts(Some(&value)));
        assert!(Predicate::ne("n", 4).accepts(Some(&value)));
        assert!(!Predicate::eq("n", 5).accepts(None));
        assert!(Predicate::is_null("n").accepts(None));
        assert!(Predicate::is_not_null("n").accepts(Some(&value)));
    }

    #[test]
    fn test_like_patterns() {
        assert!(like_matches("https://example.com", "https://%"));
        assert!(like_matches("abc", "a_c"));
        assert!(like_matches("abc", "%"));
        assert!(!like_matches("abc", "a_"));
        assert!(!like_matches("http://x", "https://%"));
    }

    #[test]
    fn test_comparison_sql() {
        assert_eq!(Comparison::Ne.sql(), "<>");
        assert!(!Comparison::IsNull.takes_value());
        assert!(Comparison::Like.takes_value());
    }
}
