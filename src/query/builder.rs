//! Query builder controller
//!
//! Holds the editable state behind a query form: selected object and
//! fields, a list of condition rows (possibly half filled in), ordering and
//! the raw limit input. Every mutation recompiles the query string, so
//! [`QueryBuilder::query`] is always current.
//!
//! The controller is an explicit value owned by whoever drives the form;
//! there is no global instance.

use crate::clipboard::{Clipboard, ClipboardError};
use crate::query::ast::{Condition, Conjunction, Direction, Operator, OrderBy, QuerySpec};
use crate::query::compiler::compile;
use serde::{Deserialize, Serialize};

/// One row of the condition editor as the form holds it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRow {
    #[serde(default)]
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub conjunction: Conjunction,
}

impl Default for ConditionRow {
    fn default() -> Self {
        Self {
            field: String::new(),
            operator: Operator::Eq,
            value: String::new(),
            conjunction: Conjunction::And,
        }
    }
}

impl ConditionRow {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            conjunction: Conjunction::And,
        }
    }

    pub fn with_conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    fn is_complete(&self) -> bool {
        !self.field.trim().is_empty() && !self.value.is_empty()
    }
}

/// Editable query form state
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    object: String,
    fields: Vec<String>,
    rows: Vec<ConditionRow>,
    order_by_field: String,
    order_direction: Direction,
    limit_input: String,
    query: String,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            object: String::new(),
            fields: vec!["Id".to_string()],
            rows: Vec::new(),
            order_by_field: String::new(),
            order_direction: Direction::Asc,
            limit_input: String::new(),
            query: String::new(),
        };
        builder.refresh();
        builder
    }

    /// The most recently compiled query string
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current condition rows, complete or not
    pub fn rows(&self) -> &[ConditionRow] {
        &self.rows
    }

    pub fn set_object(&mut self, object: impl Into<String>) {
        self.object = object.into();
        self.refresh();
    }

    /// Replace the selected fields; an empty selection falls back to `Id`
    pub fn set_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        if self.fields.is_empty() {
            self.fields.push("Id".to_string());
        }
        self.refresh();
    }

    /// Append a blank condition row and return its index
    pub fn add_condition(&mut self) -> usize {
        self.rows.push(ConditionRow::default());
        self.refresh();
        self.rows.len() - 1
    }

    /// Append a filled-in condition row and return its index
    pub fn push_condition(&mut self, row: ConditionRow) -> usize {
        self.rows.push(row);
        self.refresh();
        self.rows.len() - 1
    }

    /// Replace the row at `index`; returns false when there is no such row
    pub fn update_condition(&mut self, index: usize, row: ConditionRow) -> bool {
        match self.rows.get_mut(index) {
            Some(slot) => {
                *slot = row;
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Remove the row at `index`
    pub fn remove_condition(&mut self, index: usize) -> Option<ConditionRow> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        self.refresh();
        Some(row)
    }

    pub fn set_order_by_field(&mut self, field: impl Into<String>) {
        self.order_by_field = field.into();
        self.refresh();
    }

    pub fn set_order_direction(&mut self, direction: Direction) {
        self.order_direction = direction;
        self.refresh();
    }

    /// Store the raw limit input; anything that is not a positive integer
    /// leaves the query without a LIMIT
    pub fn set_limit(&mut self, input: impl Into<String>) {
        self.limit_input = input.into();
        self.refresh();
    }

    /// Snapshot of the form as a [`QuerySpec`]
    ///
    /// Incomplete rows are dropped and the last remaining condition carries
    /// no conjunction.
    pub fn spec(&self) -> QuerySpec {
        let mut conditions: Vec<Condition> = self
            .rows
            .iter()
            .filter(|row| row.is_complete())
            .map(|row| {
                Condition::new(row.field.trim(), row.operator, row.value.clone())
                    .with_conjunction(Some(row.conjunction))
            })
            .collect();
        if let Some(last) = conditions.last_mut() {
            last.conjunction = None;
        }

        let order_by_field = self.order_by_field.trim();
        let order_by = if order_by_field.is_empty() {
            None
        } else {
            Some(OrderBy::new(order_by_field, self.order_direction))
        };

        QuerySpec {
            object: self.object.clone(),
            fields: self.fields.clone(),
            conditions,
            order_by,
            limit: parse_limit(&self.limit_input),
        }
    }

    /// Copy the current query to `clipboard`
    pub async fn copy_query(&self, clipboard: &dyn Clipboard) -> Result<(), ClipboardError> {
        clipboard.write_text(&self.query).await
    }

    fn refresh(&mut self) {
        self.query = compile(&self.spec());
    }
}

fn parse_limit(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|&n| n > 0)
}
