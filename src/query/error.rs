//! Query error types
//!
//! Compilation itself never fails; these errors come from turning user text
//! (filter expressions, ORDER BY specs) into the query model.

use thiserror::Error;

/// Errors that can occur while reading query input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Filter expression could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operator text is not one of the supported operators
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// ORDER BY text is malformed
    #[error("Invalid order by: {0}")]
    InvalidOrderBy(String),
}

/// Result type for query input operations
pub type QueryResult<T> = Result<T, QueryError>;
