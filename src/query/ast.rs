//! Query model
//!
//! Plain data describing a SOQL query as the form layer sees it: an object,
//! a field list, an ordered list of filter conditions, optional ordering and
//! an optional row limit.
//!
//! # Example
//!
//! ```text
//! SELECT Id, Name FROM Contact WHERE Name LIKE '%Acme%' ORDER BY Name DESC LIMIT 10
//! ```

use crate::query::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object queried when none has been selected
pub const FALLBACK_OBJECT: &str = "Account";

/// Field selected when the field list is empty
pub const DEFAULT_FIELD: &str = "Id";

/// Comparison operators available in a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
}

impl Operator {
    /// SOQL spelling of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Like => "LIKE",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }

    /// Whether the value is a comma-separated set
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" | "EQ" => Ok(Self::Eq),
            "!=" | "<>" | "NEQ" => Ok(Self::Neq),
            "LIKE" => Ok(Self::Like),
            ">" | "GT" => Ok(Self::Gt),
            "<" | "LT" => Ok(Self::Lt),
            ">=" | "GTE" => Ok(Self::Gte),
            "<=" | "LTE" => Ok(Self::Lte),
            "IN" => Ok(Self::In),
            "NOT IN" | "NOT_IN" => Ok(Self::NotIn),
            _ => Err(QueryError::InvalidOperator(s.to_string())),
        }
    }
}

/// Logical connective between a condition and the one after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Conjunction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(QueryError::Parse(format!("Unknown conjunction: {}", s))),
        }
    }
}

/// Sort direction for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filter entry: `field operator value`, joined to the next entry by
/// `conjunction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub raw_value: String,
    /// `None` only on the last active condition
    #[serde(default)]
    pub conjunction: Option<Conjunction>,
}

impl Condition {
    /// Create a condition with no trailing conjunction
    pub fn new(field: impl Into<String>, operator: Operator, raw_value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            raw_value: raw_value.into(),
            conjunction: None,
        }
    }

    /// Join this condition to the next one with AND
    pub fn and(mut self) -> Self {
        self.conjunction = Some(Conjunction::And);
        self
    }

    /// Join this condition to the next one with OR
    pub fn or(mut self) -> Self {
        self.conjunction = Some(Conjunction::Or);
        self
    }

    /// Set the conjunction explicitly
    pub fn with_conjunction(mut self, conjunction: Option<Conjunction>) -> Self {
        self.conjunction = conjunction;
        self
    }

    /// A condition takes part in compilation only when field and value are set
    pub fn is_active(&self) -> bool {
        !self.field.trim().is_empty() && !self.raw_value.is_empty()
    }
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Everything needed to compile one query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Object to query; empty means [`FALLBACK_OBJECT`]
    #[serde(default)]
    pub object: String,
    /// Fields to select; empty means [`DEFAULT_FIELD`]
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_fields() -> Vec<String> {
    vec![DEFAULT_FIELD.to_string()]
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            object: String::new(),
            fields: default_fields(),
            conditions: Vec::new(),
            order_by: None,
            limit: None,
        }
    }
}

impl QuerySpec {
    /// Start a spec for the given object
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            ..Self::default()
        }
    }

    /// Replace the field list
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append a condition
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the ORDER BY clause
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy::new(field, direction));
        self
    }

    /// Set the row limit
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Object name with the fallback applied
    pub fn object_or_fallback(&self) -> &str {
        let object = self.object.trim();
        if object.is_empty() {
            FALLBACK_OBJECT
        } else {
            object
        }
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::compiler::compile(self))
    }
}
