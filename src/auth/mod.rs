//! Access-token lifecycle
//!
//! - **Store**: cached token with expiry, persisted across restarts
//! - **Flow**: OAuth 2.0 implicit grant that fills the store
//! - **Launcher**: the interactive redirect step, injected by the caller
//!
//! ## Token lifetime
//!
//! A token is stale once it is more than two hours old
//! ([`TOKEN_TTL_MS`]). Stale tokens are not used; the executor runs the
//! flow again before querying.

mod error;
mod flow;
mod launcher;
mod store;

pub use error::{AuthError, StoreError};
pub use flow::{parse_redirect, AuthFlow, AuthState, ImplicitGrant, OAuthConfig};
pub use launcher::{AuthLauncher, ConsoleLauncher, LaunchError};
pub use store::{
    now_millis, JsonFileStore, KeyValueStore, MemoryStore, TokenRecord, TokenStatus, TokenStore,
    ACCESS_TOKEN_KEY, DEFAULT_INSTANCE_URL, INSTANCE_URL_KEY, ISSUED_AT_KEY, TOKEN_TTL_MS,
};
