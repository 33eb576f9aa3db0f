//! Query compiler
//!
//! Assembles SELECT, FROM, WHERE, ORDER BY and LIMIT into the final SOQL
//! string. Compilation is pure and cannot fail: a missing object or an
//! empty field list fall back to defaults.

use crate::query::ast::{QuerySpec, DEFAULT_FIELD};
use crate::query::grouping::group_conditions;

/// Compile `spec` into a SOQL query string
///
/// Field names are trimmed and blank entries are dropped before joining
/// with `", "`, so `["Id", " Name ", ""]` selects `Id, Name`.
pub fn compile(spec: &QuerySpec) -> String {
    let mut query = String::from("SELECT ");

    let fields: Vec<&str> = spec
        .fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.is_empty() {
        query.push_str(DEFAULT_FIELD);
    } else {
        query.push_str(&fields.join(", "));
    }

    query.push_str(" FROM ");
    query.push_str(spec.object_or_fallback());

    let clause = group_conditions(&spec.conditions);
    if !clause.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&clause);
    }

    if let Some(order_by) = &spec.order_by {
        let field = order_by.field.trim();
        if !field.is_empty() {
            query.push_str(&format!(" ORDER BY {} {}", field, order_by.direction));
        }
    }

    if let Some(limit) = spec.limit.filter(|&n| n > 0) {
        query.push_str(&format!(" LIMIT {}", limit));
    }

    query
}
