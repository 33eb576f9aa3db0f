//! SOQL query composition
//!
//! Turns a form-level description of a query into a SOQL string:
//!
//! - **AST**: query model types ([`QuerySpec`], [`Condition`], operators)
//! - **Format**: value literal rendering per operator
//! - **Grouping**: AND/OR folding of the condition list
//! - **Compiler**: SELECT/FROM/WHERE/ORDER BY/LIMIT assembly
//! - **Builder**: editable form state that recompiles on every change
//! - **Parser**: filter expressions typed on the command line
//!
//! # Examples
//!
//! ## Using QuerySpec
//!
//! ```rust
//! use sfquery::query::{compile, Condition, Direction, Operator, QuerySpec};
//!
//! let spec = QuerySpec::new("Contact")
//!     .fields(["Id", "Name"])
//!     .condition(Condition::new("Name", Operator::Like, "Acme"))
//!     .order_by("Name", Direction::Desc)
//!     .limit(10);
//!
//! assert_eq!(
//!     compile(&spec),
//!     "SELECT Id, Name FROM Contact WHERE Name LIKE '%Acme%' ORDER BY Name DESC LIMIT 10"
//! );
//! ```
//!
//! ## Using a filter expression
//!
//! ```rust
//! use sfquery::query::{compile, parse_filter, QuerySpec};
//!
//! let mut spec = QuerySpec::new("Account");
//! spec.conditions = parse_filter("Rating = Hot AND Industry = Tech OR Industry = Retail").unwrap();
//!
//! assert_eq!(
//!     compile(&spec),
//!     "SELECT Id FROM Account WHERE Rating = 'Hot' AND (Industry = 'Tech' OR Industry = 'Retail')"
//! );
//! ```

mod ast;
mod builder;
mod compiler;
mod error;
mod format;
mod grouping;
mod parser;

pub use ast::{
    Condition, Conjunction, Direction, Operator, OrderBy, QuerySpec, DEFAULT_FIELD,
    FALLBACK_OBJECT,
};
pub use builder::{ConditionRow, QueryBuilder};
pub use compiler::compile;
pub use error::{QueryError, QueryResult};
pub use format::{format_value, is_numeric_literal, BIND_MARKER};
pub use grouping::{group_conditions, render_condition};
pub use parser::{parse_filter, parse_order_by};
