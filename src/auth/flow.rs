//! OAuth 2.0 implicit-grant flow
//!
//! ```text
//! Idle → AwaitingUserInteraction → Exchanging → Succeeded
//!                 │                     │
//!                 └──────────┬──────────┘
//!                            ▼
//!                          Failed
//! ```
//!
//! Only one flow runs at a time. A caller that arrives while a flow is in
//! progress waits for it, then reuses the token it produced if that token
//! is fresh.

use crate::auth::error::AuthError;
use crate::auth::launcher::{AuthLauncher, LaunchError};
use crate::auth::store::{now_millis, TokenRecord, TokenStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::{form_urlencoded, Url};

/// Where to send the user and what to ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Authorization server, e.g. `https://login.salesforce.com`
    pub login_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    /// Space separated scopes
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            login_url: "https://login.salesforce.com".to_string(),
            client_id: String::new(),
            redirect_uri: "https://login.salesforce.com/services/oauth2/success".to_string(),
            scope: "api web refresh_token".to_string(),
        }
    }
}

/// Where the flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Idle,
    AwaitingUserInteraction,
    Exchanging,
    Succeeded,
    Failed,
}

/// Fields pulled out of the redirect fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitGrant {
    pub access_token: String,
    pub instance_url: Option<String>,
}

impl From<LaunchError> for AuthError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Cancelled => AuthError::Cancelled,
            LaunchError::Failed(message) => AuthError::Interaction(message),
        }
    }
}

/// Drives the implicit grant and writes the result to the token store
pub struct AuthFlow {
    config: OAuthConfig,
    launcher: Arc<dyn AuthLauncher>,
    store: Arc<TokenStore>,
    state: Mutex<AuthState>,
    in_flight: tokio::sync::Mutex<()>,
}

impl AuthFlow {
    pub fn new(config: OAuthConfig, launcher: Arc<dyn AuthLauncher>, store: Arc<TokenStore>) -> Self {
        Self {
            config,
            launcher,
            store,
            state: Mutex::new(AuthState::Idle),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Current state of the most recent flow
    pub fn state(&self) -> AuthState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: AuthState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Build the authorization URL carrying `state`
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}/services/oauth2/authorize?\
             client_id={}&\
             redirect_uri={}&\
             response_type=token&\
             scope={}&\
             state={}",
            self.config.login_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scope),
            urlencoding::encode(state),
        )
    }

    /// Run an interactive flow unconditionally
    pub async fn authorize(&self) -> Result<TokenRecord, AuthError> {
        let _guard = self.in_flight.lock().await;
        self.run().await
    }

    /// Return a fresh cached token, running a flow only if there is none
    ///
    /// Callers queued behind an in-progress flow pick up its token instead
    /// of starting another interaction.
    pub async fn ensure_token(&self) -> Result<TokenRecord, AuthError> {
        let _guard = self.in_flight.lock().await;
        if let Some(record) = self.store.get_valid(now_millis()).await {
            return Ok(record);
        }
        self.run().await
    }

    async fn run(&self) -> Result<TokenRecord, AuthError> {
        let result = self.exchange().await;
        match &result {
            Ok(record) => {
                self.set_state(AuthState::Succeeded);
                tracing::info!(instance_url = %record.instance_url, "Authorization succeeded");
            }
            Err(e) => {
                self.set_state(AuthState::Failed);
                tracing::warn!("Authorization failed: {}", e);
            }
        }
        result
    }

    async fn exchange(&self) -> Result<TokenRecord, AuthError> {
        if self.config.client_id.trim().is_empty() {
            return Err(AuthError::MissingClientId);
        }

        let state = uuid::Uuid::new_v4().to_string();
        let url = self.authorization_url(&state);

        self.set_state(AuthState::AwaitingUserInteraction);
        tracing::info!(login_url = %self.config.login_url, "Starting authorization");
        let redirect = self.launcher.launch(&url).await?;

        self.set_state(AuthState::Exchanging);
        let grant = parse_redirect(&redirect, &state)?;

        let instance_url = match grant.instance_url {
            Some(url) => url,
            None => self.store.instance_url().await?,
        };
        let record = TokenRecord::new(grant.access_token, now_millis(), instance_url);
        self.store.put(record.clone()).await?;

        Ok(record)
    }
}

/// Extract the grant from a redirect URL's fragment
///
/// A `state` in the response must match `expected_state`; a response
/// without one is accepted.
pub fn parse_redirect(redirect_url: &str, expected_state: &str) -> Result<ImplicitGrant, AuthError> {
    let url = Url::parse(redirect_url.trim())
        .map_err(|e| AuthError::Interaction(format!("Invalid redirect URL: {}", e)))?;

    // First occurrence of a key wins
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in form_urlencoded::parse(url.fragment().unwrap_or_default().as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    if let Some(error) = params.get("error") {
        return Err(AuthError::Denied {
            error: error.clone(),
            description: params.get("error_description").cloned(),
        });
    }

    if let Some(state) = params.get("state") {
        if state != expected_state {
            return Err(AuthError::StateMismatch);
        }
    }

    let access_token = params
        .get("access_token")
        .filter(|t| !t.is_empty())
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    let instance_url = params
        .get("instance_url")
        .filter(|u| !u.is_empty())
        .map(|u| u.trim_end_matches('/').to_string());

    Ok(ImplicitGrant {
        access_token,
        instance_url,
    })
}
