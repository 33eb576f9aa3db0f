//! # sfquery
//!
//! Compose SOQL queries from a form-level description, authorize against
//! Salesforce with the OAuth 2.0 implicit grant, and run the result against
//! the REST query endpoint.
//!
//! ## Modules
//!
//! - [`query`]: query model, clause compiler and filter-expression parser
//! - [`auth`]: token store with a two-hour lifetime and the implicit-grant flow
//! - [`api`]: HTTP transport and query executor
//! - [`clipboard`]: clipboard capability used by "copy query"
//! - [`service`]: JSON request/response messages for a presentation layer
//! - [`config`]: TOML config with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sfquery::api::{ExecutorConfig, QueryExecutor, ReqwestTransport};
//! use sfquery::auth::{AuthFlow, ConsoleLauncher, OAuthConfig, TokenStore};
//! use sfquery::query::{Condition, Operator, QuerySpec};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(TokenStore::in_memory());
//!     let oauth = OAuthConfig {
//!         client_id: "3MVG9...".to_string(),
//!         ..OAuthConfig::default()
//!     };
//!     let auth = Arc::new(AuthFlow::new(oauth, Arc::new(ConsoleLauncher::default()), Arc::clone(&store)));
//!     let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
//!     let executor = QueryExecutor::new(transport, store, auth, ExecutorConfig::default());
//!
//!     let spec = QuerySpec::new("Account")
//!         .fields(["Id", "Name"])
//!         .condition(Condition::new("Industry", Operator::Eq, "Technology"))
//!         .limit(10);
//!
//!     let records = executor.execute_spec(&spec).await?;
//!     println!("{}", records);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod clipboard;
pub mod config;
pub mod query;
pub mod service;
pub mod telemetry;

// Re-export top-level types for convenience
pub use query::{
    compile, parse_filter, parse_order_by, Condition, Conjunction, Direction, Operator, OrderBy,
    QueryBuilder, QueryError, QuerySpec,
};

pub use auth::{AuthError, AuthFlow, OAuthConfig, TokenRecord, TokenStore};

pub use api::{ExecuteError, ExecutorConfig, QueryExecutor};

pub use clipboard::{Clipboard, ClipboardError};

pub use service::{QueryService, Request, Response};

pub use config::{Config, ConfigError, LoggingConfig};
