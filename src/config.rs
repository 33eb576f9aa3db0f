//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::api::{ExecutorConfig, DEFAULT_API_VERSION};
use crate::auth::{OAuthConfig, DEFAULT_INSTANCE_URL};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub salesforce: SalesforceConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Salesforce org and OAuth client settings
#[derive(Debug, Clone, Deserialize)]
pub struct SalesforceConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Connected app consumer key
    #[serde(default)]
    pub client_id: String,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Instance used until an authorization response names one
    #[serde(default = "default_instance_url")]
    pub default_instance_url: String,

    /// Try to open a browser for the authorization page
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_login_url() -> String {
    "https://login.salesforce.com".to_string()
}

fn default_redirect_uri() -> String {
    "https://login.salesforce.com/services/oauth2/success".to_string()
}

fn default_scope() -> String {
    "api web refresh_token".to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_instance_url() -> String {
    DEFAULT_INSTANCE_URL.to_string()
}

fn default_open_browser() -> bool {
    true
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            api_version: default_api_version(),
            default_instance_url: default_instance_url(),
            open_browser: default_open_browser(),
        }
    }
}

impl SalesforceConfig {
    /// OAuth settings for the auth flow
    pub fn oauth(&self) -> OAuthConfig {
        OAuthConfig {
            login_url: self.login_url.clone(),
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Where persisted state lives
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("sfquery").to_string_lossy().to_string())
        .unwrap_or_else(|| "./sfquery_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~` expanded
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.data_dir)),
            None => PathBuf::from(&self.data_dir),
        }
    }
}

/// HTTP client and execution behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Run the auth flow automatically when the token is missing or stale
    #[serde(default = "default_auto_authorize")]
    pub auto_authorize: bool,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_auto_authorize() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            auto_authorize: default_auto_authorize(),
        }
    }
}

/// Clipboard command override
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClipboardConfig {
    /// e.g. `"xclip -selection clipboard"`; detected when unset
    pub command: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("sfquery").join("config.toml")),
            Some(PathBuf::from("./sfquery.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Executor settings derived from this config
    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            api_version: self.salesforce.api_version.clone(),
            auto_authorize: self.http.auto_authorize,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Salesforce overrides
        if let Some(client_id) = lookup("SFQUERY_CLIENT_ID") {
            self.salesforce.client_id = client_id;
        }
        if let Some(login_url) = lookup("SFQUERY_LOGIN_URL") {
            self.salesforce.login_url = login_url;
        }
        if let Some(redirect_uri) = lookup("SFQUERY_REDIRECT_URI") {
            self.salesforce.redirect_uri = redirect_uri;
        }
        if let Some(scope) = lookup("SFQUERY_SCOPE") {
            self.salesforce.scope = scope;
        }
        if let Some(api_version) = lookup("SFQUERY_API_VERSION") {
            self.salesforce.api_version = api_version;
        }

        // Storage overrides
        if let Some(data_dir) = lookup("SFQUERY_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // HTTP overrides
        if let Some(timeout) = lookup("SFQUERY_REQUEST_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.http.request_timeout_secs = secs;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("SFQUERY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SFQUERY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# sfquery Configuration
#
# Environment variables override these settings:
# - SFQUERY_CLIENT_ID
# - SFQUERY_LOGIN_URL
# - SFQUERY_REDIRECT_URI
# - SFQUERY_SCOPE
# - SFQUERY_API_VERSION
# - SFQUERY_DATA_DIR
# - SFQUERY_REQUEST_TIMEOUT
# - SFQUERY_LOG_LEVEL
# - SFQUERY_LOG_FORMAT

[salesforce]
# Authorization server (use https://test.salesforce.com for sandboxes)
login_url = "https://login.salesforce.com"

# Connected app consumer key
client_id = ""

# Callback URL registered on the connected app
redirect_uri = "https://login.salesforce.com/services/oauth2/success"

# Requested OAuth scopes
scope = "api web refresh_token"

# REST API version
api_version = "v57.0"

# Instance used until an authorization response names one
default_instance_url = "https://na1.salesforce.com"

# Open a browser for the authorization page
open_browser = true

[storage]
# Directory for the token state file
data_dir = "~/.local/share/sfquery"

[http]
# Request timeout in seconds
request_timeout_secs = 30

# Re-authorize automatically when the token is missing or older than 2h
auto_authorize = true

[clipboard]
# Command that reads the query from stdin (detected when unset)
# command = "xclip -selection clipboard"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.salesforce.login_url, "https://login.salesforce.com");
        assert_eq!(config.salesforce.scope, "api web refresh_token");
        assert_eq!(config.salesforce.api_version, "v57.0");
        assert_eq!(config.salesforce.default_instance_url, "https://na1.salesforce.com");
        assert!(config.http.auto_authorize);
        assert!(config.clipboard.command.is_none());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.salesforce.client_id, "");
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.storage.data_dir, "~/.local/share/sfquery");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            [salesforce]
            client_id = "3MVG9abc"
            login_url = "https://test.salesforce.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.salesforce.client_id, "3MVG9abc");
        assert_eq!(config.salesforce.oauth().login_url, "https://test.salesforce.com");
        assert_eq!(config.salesforce.api_version, "v57.0");
        assert_eq!(config.http.request_timeout_secs, 30);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SFQUERY_CLIENT_ID", "from-env"),
            ("SFQUERY_API_VERSION", "v60.0"),
            ("SFQUERY_REQUEST_TIMEOUT", "not-a-number"),
            ("SFQUERY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.salesforce.client_id, "from-env");
        assert_eq!(config.executor().api_version, "v60.0");
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[salesforce\nclient_id = ").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_data_path_expands_home() {
        let storage = StorageConfig {
            data_dir: "/var/lib/sfquery".to_string(),
        };
        assert_eq!(storage.data_path(), PathBuf::from("/var/lib/sfquery"));

        if let Some(home) = dirs::home_dir() {
            let storage = StorageConfig {
                data_dir: "~/.sfquery".to_string(),
            };
            assert_eq!(storage.data_path(), home.join(".sfquery"));
        }
    }
}
