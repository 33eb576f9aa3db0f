//! Request/response message service
//!
//! The presentation layer talks to the core through small JSON messages,
//! one per line. Every request gets exactly one response; failures are
//! tagged responses, never a crash.
//!
//! ```text
//! → {"type":"SF_QUERY","query":"SELECT Id FROM Account"}
//! ← {"success":true,"data":{"totalSize":1,"done":true,"records":[...]}}
//!
//! → {"type":"SF_AUTH"}
//! ← {"success":false,"error":"Authorization cancelled by user","code":"auth"}
//! ```

use crate::api::{ExecuteError, QueryExecutor};
use crate::auth::{now_millis, AuthFlow, TokenStore};
use crate::query::{compile, QuerySpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Incoming message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Run the interactive authorization flow
    #[serde(rename = "SF_AUTH")]
    Auth,

    /// Execute a SOQL string
    #[serde(rename = "SF_QUERY")]
    Query { query: String },

    /// Compile a query spec without executing it
    #[serde(rename = "SF_COMPILE")]
    Compile { spec: QuerySpec },

    /// Report token status
    #[serde(rename = "SF_STATUS")]
    Status,
}

/// Outgoing message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(code: &str, error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(code.to_string()),
        }
    }
}

impl From<ExecuteError> for Response {
    fn from(err: ExecuteError) -> Self {
        Response::failure(err.kind(), err)
    }
}

/// Dispatches requests to the auth flow, executor and compiler
pub struct QueryService {
    auth: Arc<AuthFlow>,
    executor: Arc<QueryExecutor>,
    store: Arc<TokenStore>,
}

impl QueryService {
    pub fn new(auth: Arc<AuthFlow>, executor: Arc<QueryExecutor>, store: Arc<TokenStore>) -> Self {
        Self {
            auth,
            executor,
            store,
        }
    }

    /// Handle one request
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Auth => match self.auth.authorize().await {
                Ok(record) => Response::ok(json!({
                    "instance_url": record.instance_url,
                    "issued_at": record.issued_at,
                })),
                Err(e) => Response::failure("auth", e),
            },
            Request::Query { query } => match self.executor.execute(&query).await {
                Ok(data) => Response::ok(data),
                Err(e) => e.into(),
            },
            Request::Compile { spec } => Response::ok(Value::String(compile(&spec))),
            Request::Status => match self.store.status(now_millis()).await {
                Ok(status) => match serde_json::to_value(status) {
                    Ok(data) => Response::ok(data),
                    Err(e) => Response::failure("internal", e),
                },
                Err(e) => Response::failure("store", e),
            },
        }
    }

    /// Parse and handle one JSON line
    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => Response::failure("invalid_request", e),
        }
    }

    /// Serve newline-delimited requests until `input` closes
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line).await;
            if !response.success {
                tracing::debug!("Request failed: {:?}", response.error);
            }

            let mut encoded = serde_json::to_vec(&response)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            encoded.push(b'\n');
            output.write_all(&encoded).await?;
            output.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ExecutorConfig, HttpResponse, HttpTransport, TransportError};
    use crate::auth::{AuthLauncher, LaunchError, OAuthConfig, TokenRecord};
    use async_trait::async_trait;

    struct StaticTransport(u16, &'static str, &'static str);

    #[async_trait]
    impl HttpTransport for StaticTransport {
        async fn get(&self, _url: &str, _token: &str) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: self.0,
                status_text: self.1.to_string(),
                body: self.2.to_string(),
            })
        }
    }

    struct CancellingLauncher;

    #[async_trait]
    impl AuthLauncher for CancellingLauncher {
        async fn launch(&self, _url: &str) -> Result<String, LaunchError> {
            Err(LaunchError::Cancelled)
        }
    }

    async fn service(transport: StaticTransport, with_token: bool) -> QueryService {
        let store = Arc::new(TokenStore::in_memory());
        if with_token {
            store
                .put(TokenRecord::new("tok", now_millis(), "https://na1.salesforce.com"))
                .await
                .unwrap();
        }
        let auth = Arc::new(AuthFlow::new(
            OAuthConfig {
                client_id: "client".to_string(),
                ..OAuthConfig::default()
            },
            Arc::new(CancellingLauncher),
            Arc::clone(&store),
        ));
        let executor = Arc::new(QueryExecutor::new(
            Arc::new(transport),
            Arc::clone(&store),
            Arc::clone(&auth),
            ExecutorConfig::default(),
        ));
        QueryService::new(auth, executor, store)
    }

    #[test]
    fn test_request_parsing() {
        let request: Request =
            serde_json::from_str(r#"{"type":"SF_QUERY","query":"SELECT Id FROM Account"}"#).unwrap();
        assert_eq!(
            request,
            Request::Query {
                query: "SELECT Id FROM Account".to_string()
            }
        );

        let request: Request = serde_json::from_str(r#"{"type":"SF_AUTH"}"#).unwrap();
        assert_eq!(request, Request::Auth);
    }

    #[test]
    fn test_response_serialization() {
        let ok = serde_json::to_string(&Response::ok(json!([1]))).unwrap();
        assert_eq!(ok, r#"{"success":true,"data":[1]}"#);

        let failure = serde_json::to_string(&Response::failure("api", "boom")).unwrap();
        assert_eq!(failure, r#"{"success":false,"error":"boom","code":"api"}"#);
    }

    #[tokio::test]
    async fn test_query_success() {
        let service = service(StaticTransport(200, "OK", r#"{"totalSize":0}"#), true).await;
        let response = service
            .handle(Request::Query {
                query: "SELECT Id FROM Account".to_string(),
            })
            .await;
        assert_eq!(response, Response::ok(json!({"totalSize": 0})));
    }

    #[tokio::test]
    async fn test_query_api_failure_is_tagged() {
        let service = service(StaticTransport(400, "Bad Request", "[]"), true).await;
        let response = service.handle_line(r#"{"type":"SF_QUERY","query":"SELEC"}"#).await;
        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("api"));
        assert_eq!(response.error.as_deref(), Some("Salesforce API error: Bad Request"));
    }

    #[tokio::test]
    async fn test_auth_failure_is_tagged() {
        let service = service(StaticTransport(200, "OK", "{}"), false).await;
        let response = service.handle(Request::Auth).await;
        assert_eq!(
            response,
            Response::failure("auth", "Authorization cancelled by user")
        );
    }

    #[tokio::test]
    async fn test_compile_and_invalid_request() {
        let service = service(StaticTransport(200, "OK", "{}"), false).await;

        let response = service
            .handle_line(r#"{"type":"SF_COMPILE","spec":{"object":"Lead","limit":5}}"#)
            .await;
        assert_eq!(response, Response::ok(json!("SELECT Id FROM Lead LIMIT 5")));

        let response = service.handle_line(r#"{"type":"SF_DELETE"}"#).await;
        assert_eq!(response.code.as_deref(), Some("invalid_request"));
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let service = service(StaticTransport(200, "OK", "{}"), true).await;
        let input: &[u8] = b"{\"type\":\"SF_STATUS\"}\n\nnot json\n";
        let mut output = Vec::new();

        service.serve(input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let status: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(status["success"], json!(true));
        assert_eq!(status["data"]["authenticated"], json!(true));

        let invalid: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(invalid["code"], json!("invalid_request"));
    }
}
