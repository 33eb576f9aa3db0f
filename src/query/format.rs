//! Value literal formatting
//!
//! Turns the raw text typed into a condition's value box into the literal
//! syntax its operator expects. Quotes and wildcards inside the value are
//! passed through untouched, so a value containing `'` yields a malformed
//! (or injectable) query.

use crate::query::ast::Operator;
use regex::Regex;
use std::sync::OnceLock;

/// Prefix marking an Apex-style bind variable
pub const BIND_MARKER: char = '$';

fn numeric_literal() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("numeric literal pattern is valid")
    })
}

/// Whether `raw` reads as a plain numeric literal
pub fn is_numeric_literal(raw: &str) -> bool {
    numeric_literal().is_match(raw)
}

/// Render `raw` as a SOQL literal for `operator`
pub fn format_value(operator: Operator, raw: &str) -> String {
    match operator {
        Operator::Like => format!("'%{}%'", raw),
        op if op.takes_list() => format_list(raw),
        _ => format_scalar(raw),
    }
}

fn format_list(raw: &str) -> String {
    let items: Vec<String> = raw
        .split(',')
        .map(|item| format!("'{}'", item.trim()))
        .collect();
    format!("({})", items.join(", "))
}

fn format_scalar(raw: &str) -> String {
    if raw.starts_with(BIND_MARKER) || is_numeric_literal(raw) {
        raw.to_string()
    } else {
        format!("'{}'", raw)
    }
}
