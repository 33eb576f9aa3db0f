//! Query executor
//!
//! Sends a compiled SOQL string to the REST query endpoint:
//!
//! ```text
//! GET <instance_url>/services/data/<api_version>/query?q=<urlencoded query>
//! Authorization: Bearer <token>
//! ```
//!
//! A missing or stale token triggers the auth flow first, so the caller
//! sees a single await. Nothing is retried.

use crate::api::error::ExecuteError;
use crate::api::transport::HttpTransport;
use crate::auth::{now_millis, AuthFlow, TokenRecord, TokenStore};
use crate::query::{compile, QuerySpec};
use serde_json::Value;
use std::sync::Arc;

/// REST API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "v57.0";

/// Executor behaviour
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Path segment such as `v57.0`
    pub api_version: String,
    /// Run the auth flow when the cached token is missing or stale
    pub auto_authorize: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            auto_authorize: true,
        }
    }
}

/// Executes queries against the REST API
pub struct QueryExecutor {
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    auth: Option<Arc<AuthFlow>>,
    config: ExecutorConfig,
}

impl QueryExecutor {
    /// Create an executor that refreshes tokens through `auth`
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<TokenStore>,
        auth: Arc<AuthFlow>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            transport,
            store,
            auth: Some(auth),
            config,
        }
    }

    /// Create an executor that only ever uses the cached token
    pub fn without_auth(
        transport: Arc<dyn HttpTransport>,
        store: Arc<TokenStore>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            transport,
            store,
            auth: None,
            config,
        }
    }

    /// Build the query endpoint URL
    pub fn query_url(&self, instance_url: &str, query: &str) -> String {
        format!(
            "{}/services/data/{}/query?q={}",
            instance_url.trim_end_matches('/'),
            self.config.api_version,
            urlencoding::encode(query)
        )
    }

    /// Execute a SOQL string and return the JSON body as-is (`null` when empty)
    pub async fn execute(&self, query: &str) -> Result<Value, ExecuteError> {
        let record = self.valid_token().await?;
        let url = self.query_url(&record.instance_url, query);

        tracing::debug!(instance_url = %record.instance_url, "Executing query: {}", query);
        let response = self.transport.get(&url, &record.access_token).await?;

        if !response.is_success() {
            tracing::warn!(
                status = response.status,
                "Query rejected: {}",
                response.status_text
            );
            return Err(ExecuteError::Api {
                status: response.status,
                status_text: response.status_text,
            });
        }

        // 204 and friends carry no body
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response.body).map_err(|e| ExecuteError::Decode(e.to_string()))
    }

    /// Compile `spec` and execute it
    pub async fn execute_spec(&self, spec: &QuerySpec) -> Result<Value, ExecuteError> {
        self.execute(&compile(spec)).await
    }

    /// Cached token if fresh, otherwise one from the auth flow
    async fn valid_token(&self) -> Result<TokenRecord, ExecuteError> {
        if let Some(record) = self.store.get_valid(now_millis()).await {
            return Ok(record);
        }

        match &self.auth {
            Some(auth) if self.config.auto_authorize => {
                tracing::info!("Access token missing or expired, authorizing");
                Ok(auth.ensure_token().await?)
            }
            _ => Err(ExecuteError::TokenUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpResponse, TransportError};
    use crate::auth::{AuthError, AuthLauncher, LaunchError, OAuthConfig, TokenRecord, TOKEN_TTL_MS};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records requests and replies with a fixed response
    struct FakeTransport {
        response: HttpResponse,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl FakeTransport {
        fn replying(status: u16, status_text: &str, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    status_text: status_text.to_string(),
                    body: body.to_string(),
                },
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(String, String)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn get(&self, url: &str, bearer_token: &str) -> Result<HttpResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), bearer_token.to_string()));
            Ok(self.response.clone())
        }
    }

    struct FixedLauncher(Result<String, LaunchError>);

    #[async_trait]
    impl AuthLauncher for FixedLauncher {
        async fn launch(&self, _url: &str) -> Result<String, LaunchError> {
            self.0.clone()
        }
    }

    fn auth_flow(store: &Arc<TokenStore>, redirect: Result<String, LaunchError>) -> Arc<AuthFlow> {
        let config = OAuthConfig {
            client_id: "client".to_string(),
            ..OAuthConfig::default()
        };
        Arc::new(AuthFlow::new(
            config,
            Arc::new(FixedLauncher(redirect)),
            Arc::clone(store),
        ))
    }

    async fn store_with_token(token: &str, issued_at: i64) -> Arc<TokenStore> {
        let store = Arc::new(TokenStore::in_memory());
        store
            .put(TokenRecord::new(token, issued_at, "https://acme.my.salesforce.com/"))
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_query_url() {
        let executor = QueryExecutor::without_auth(
            Arc::new(FakeTransport::replying(200, "OK", "{}")),
            Arc::new(TokenStore::in_memory()),
            ExecutorConfig::default(),
        );

        assert_eq!(
            executor.query_url("https://na1.salesforce.com/", "SELECT Id FROM Account"),
            "https://na1.salesforce.com/services/data/v57.0/query?q=SELECT%20Id%20FROM%20Account"
        );
    }

    #[tokio::test]
    async fn test_execute_returns_body_verbatim() {
        let body = r#"{"totalSize":1,"done":true,"records":[{"attributes":{"type":"Account"},"Id":"001"}]}"#;
        let transport = Arc::new(FakeTransport::replying(200, "OK", body));
        let store = store_with_token("tok", now_millis()).await;
        let executor =
            QueryExecutor::without_auth(transport.clone(), store, ExecutorConfig::default());

        let result = executor.execute("SELECT Id FROM Account").await.unwrap();
        assert_eq!(
            result,
            json!({"totalSize": 1, "done": true, "records": [{"attributes": {"type": "Account"}, "Id": "001"}]})
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            "https://acme.my.salesforce.com/services/data/v57.0/query?q=SELECT%20Id%20FROM%20Account"
        );
        assert_eq!(requests[0].1, "tok");
    }

    #[tokio::test]
    async fn test_unauthorized_is_api_error_and_store_untouched() {
        let transport = Arc::new(FakeTransport::replying(
            401,
            "Unauthorized",
            r#"[{"errorCode":"INVALID_SESSION_ID"}]"#,
        ));
        let now = now_millis();
        let store = store_with_token("tok", now).await;
        let before = store.get().await;
        let executor = QueryExecutor::without_auth(
            transport,
            Arc::clone(&store),
            ExecutorConfig::default(),
        );

        let err = executor.execute("SELECT Id FROM Account").await.unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::Api { status: 401, ref status_text } if status_text == "Unauthorized"
        ));
        assert_eq!(store.get().await, before);
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let transport = Arc::new(FakeTransport::replying(200, "OK", "<html>"));
        let store = store_with_token("tok", now_millis()).await;
        let executor = QueryExecutor::without_auth(transport, store, ExecutorConfig::default());

        let err = executor.execute("SELECT Id FROM Account").await.unwrap_err();
        assert!(matches!(err, ExecuteError::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let transport = Arc::new(FakeTransport::replying(204, "No Content", ""));
        let store = store_with_token("tok", now_millis()).await;
        let executor = QueryExecutor::without_auth(transport, store, ExecutorConfig::default());

        let result = executor.execute("SELECT Id FROM Account").await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_no_token_without_auth() {
        let transport = Arc::new(FakeTransport::replying(200, "OK", "{}"));
        let executor = QueryExecutor::without_auth(
            transport.clone(),
            Arc::new(TokenStore::in_memory()),
            ExecutorConfig::default(),
        );

        let err = executor.execute("SELECT Id FROM Account").await.unwrap_err();
        assert!(matches!(err, ExecuteError::TokenUnavailable));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_auto_authorize_disabled() {
        let store = store_with_token("old", now_millis() - TOKEN_TTL_MS - 1).await;
        let auth = auth_flow(&store, Ok("https://cb#access_token=new".to_string()));
        let executor = QueryExecutor::new(
            Arc::new(FakeTransport::replying(200, "OK", "{}")),
            store,
            auth,
            ExecutorConfig {
                auto_authorize: false,
                ..ExecutorConfig::default()
            },
        );

        let err = executor.execute("SELECT Id FROM Account").await.unwrap_err();
        assert!(matches!(err, ExecuteError::TokenUnavailable));
    }

    #[tokio::test]
    async fn test_stale_token_refreshed_before_query() {
        let store = store_with_token("old", now_millis() - TOKEN_TTL_MS - 1).await;
        let auth = auth_flow(&store, Ok("https://cb#access_token=new".to_string()));
        let transport = Arc::new(FakeTransport::replying(200, "OK", r#"{"records":[]}"#));
        let executor = QueryExecutor::new(
            transport.clone(),
            Arc::clone(&store),
            auth,
            ExecutorConfig::default(),
        );

        executor.execute("SELECT Id FROM Account").await.unwrap();

        assert_eq!(transport.requests()[0].1, "new");
        assert_eq!(store.get().await.unwrap().access_token, "new");
    }

    #[tokio::test]
    async fn test_refresh_failure_aborts_query() {
        let store = Arc::new(TokenStore::in_memory());
        let auth = auth_flow(&store, Err(LaunchError::Cancelled));
        let transport = Arc::new(FakeTransport::replying(200, "OK", "{}"));
        let executor = QueryExecutor::new(
            transport.clone(),
            store,
            auth,
            ExecutorConfig::default(),
        );

        let err = executor.execute("SELECT Id FROM Account").await.unwrap_err();
        assert!(matches!(err, ExecuteError::Auth(AuthError::Cancelled)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_execute_spec_compiles_first() {
        let transport = Arc::new(FakeTransport::replying(200, "OK", "{}"));
        let store = store_with_token("tok", now_millis()).await;
        let executor = QueryExecutor::without_auth(
            transport.clone(),
            store,
            ExecutorConfig {
                api_version: "v60.0".to_string(),
                ..ExecutorConfig::default()
            },
        );

        executor
            .execute_spec(&QuerySpec::new("Lead").limit(1))
            .await
            .unwrap();
        assert!(transport.requests()[0]
            .0
            .ends_with("/services/data/v60.0/query?q=SELECT%20Id%20FROM%20Lead%20LIMIT%201"));
    }
}
