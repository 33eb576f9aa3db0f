//! Salesforce REST API access
//!
//! - **Transport**: authorized GET over reqwest (or a test double)
//! - **Executor**: token-gated execution of compiled SOQL
//!
//! ## Endpoint
//!
//! | Method | Path |
//! |--------|------|
//! | GET | `/services/data/{version}/query?q={soql}` |

mod error;
mod executor;
mod transport;

pub use error::ExecuteError;
pub use executor::{ExecutorConfig, QueryExecutor, DEFAULT_API_VERSION};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
