//! Token store
//!
//! Process-wide cache of the current access token, backed by a durable
//! key-value store so a token survives restarts.
//!
//! # Persisted keys
//!
//! | key | value |
//! |---|---|
//! | `access_token` | bearer token (string) |
//! | `token_issued_at` | issue time, epoch milliseconds (integer) |
//! | `instance_url` | API host for this org (string) |
//!
//! Token and issue time are always written together in a single persisted
//! write. Backend writes run on the blocking pool and are serialized; the
//! in-memory record is swapped only after the write lands, so readers see
//! either the previous record or the new one.

use crate::auth::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const ISSUED_AT_KEY: &str = "token_issued_at";
pub const INSTANCE_URL_KEY: &str = "instance_url";

/// Instance used when none has been recorded
pub const DEFAULT_INSTANCE_URL: &str = "https://na1.salesforce.com";

/// Token lifetime: two hours
pub const TOKEN_TTL_MS: i64 = 7_200_000;

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A cached credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    /// Epoch milliseconds
    pub issued_at: i64,
    pub instance_url: String,
}

impl TokenRecord {
    pub fn new(access_token: impl Into<String>, issued_at: i64, instance_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at,
            instance_url: instance_url.into(),
        }
    }

    /// Milliseconds since the token was issued
    pub fn age_ms(&self, now: i64) -> i64 {
        now - self.issued_at
    }

    /// Stale once strictly older than [`TOKEN_TTL_MS`]
    pub fn is_stale(&self, now: i64) -> bool {
        self.age_ms(now) > TOKEN_TTL_MS
    }
}

/// Snapshot of the cache for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStatus {
    pub authenticated: bool,
    pub stale: bool,
    pub issued_at: Option<i64>,
    pub age_ms: Option<i64>,
    pub instance_url: String,
}

// ============================================
// Durable key-value backends
// ============================================

/// Durable string-keyed JSON values
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write all entries in one durable step
    fn set_many(&self, entries: &[(&str, Value)]) -> Result<(), StoreError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Serialization format for the state file
#[derive(Serialize, Deserialize, Default)]
struct StateFileData {
    version: u32,
    #[serde(default)]
    entries: HashMap<String, Value>,
}

/// All entries in one JSON file, rewritten through a temp file + rename
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the state file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let entries = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open `state.json` under `data_dir`
    pub fn in_dir(data_dir: &Path) -> Result<Self, StoreError> {
        Self::open(data_dir.join("state.json"))
    }

    fn load_from_file(path: &Path) -> Result<HashMap<String, Value>, StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let data: StateFileData = serde_json::from_reader(reader).map_err(|e| {
            StoreError::Serialization(format!("Failed to load state file {:?}: {}", path, e))
        })?;

        Ok(data.entries)
    }

    fn persist(&self, entries: &HashMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = StateFileData {
            version: 1,
            entries: entries.clone(),
        };

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &data).map_err(|e| {
                StoreError::Serialization(format!("Failed to persist state file: {}", e))
            })?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.entries
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, Value)]) -> Result<(), StoreError> {
        let mut current = self.lock()?;
        let mut updated = current.clone();
        for (key, value) in entries {
            updated.insert((*key).to_string(), value.clone());
        }
        self.persist(&updated)?;
        *current = updated;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut current = self.lock()?;
        let mut updated = current.clone();
        for key in keys {
            updated.remove(*key);
        }
        self.persist(&updated)?;
        *current = updated;
        Ok(())
    }
}

/// Non-durable backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.entries
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, Value)]) -> Result<(), StoreError> {
        let mut current = self.lock()?;
        for (key, value) in entries {
            current.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut current = self.lock()?;
        for key in keys {
            current.remove(*key);
        }
        Ok(())
    }
}

// ============================================
// Token store
// ============================================

/// Cached credential state with expiry tracking
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    record: RwLock<Option<TokenRecord>>,
    writer: tokio::sync::Mutex<()>,
    default_instance_url: String,
}

impl TokenStore {
    /// Load the current record from `backend`
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        Self::with_default_instance(backend, DEFAULT_INSTANCE_URL)
    }

    /// Like [`TokenStore::open`] with a different fallback instance URL
    pub fn with_default_instance(
        backend: Arc<dyn KeyValueStore>,
        default_instance_url: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let default_instance_url = default_instance_url.into();
        let record = Self::load_record(backend.as_ref(), &default_instance_url)?;

        Ok(Self {
            backend,
            record: RwLock::new(record),
            writer: tokio::sync::Mutex::new(()),
            default_instance_url,
        })
    }

    /// Store with no persistence
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryStore::new()),
            record: RwLock::new(None),
            writer: tokio::sync::Mutex::new(()),
            default_instance_url: DEFAULT_INSTANCE_URL.to_string(),
        }
    }

    fn load_record(
        backend: &dyn KeyValueStore,
        default_instance_url: &str,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let token = match backend.get(ACCESS_TOKEN_KEY)? {
            Some(Value::String(token)) if !token.is_empty() => token,
            _ => return Ok(None),
        };

        // a token without an issue time is treated as issued at the epoch
        let issued_at = backend
            .get(ISSUED_AT_KEY)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        let instance_url = Self::load_instance_url(backend, default_instance_url)?;

        Ok(Some(TokenRecord {
            access_token: token,
            issued_at,
            instance_url,
        }))
    }

    fn load_instance_url(
        backend: &dyn KeyValueStore,
        default_instance_url: &str,
    ) -> Result<String, StoreError> {
        Ok(backend
            .get(INSTANCE_URL_KEY)?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| default_instance_url.to_string()))
    }

    /// Current record, stale or not
    pub async fn get(&self) -> Option<TokenRecord> {
        self.record.read().await.clone()
    }

    /// Current record if it is still fresh at `now`
    pub async fn get_valid(&self, now: i64) -> Option<TokenRecord> {
        self.get().await.filter(|r| !r.is_stale(now))
    }

    /// Run a backend write off the async workers
    async fn write_backend<F>(&self, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&dyn KeyValueStore) -> Result<(), StoreError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|e| StoreError::Lock(format!("Backend write task failed: {}", e)))?
    }

    /// Replace the record (token, issue time and instance URL together)
    pub async fn put(&self, record: TokenRecord) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let entries = [
            (ACCESS_TOKEN_KEY, Value::from(record.access_token.clone())),
            (ISSUED_AT_KEY, Value::from(record.issued_at)),
            (INSTANCE_URL_KEY, Value::from(record.instance_url.clone())),
        ];
        self.write_backend(move |backend| backend.set_many(&entries))
            .await?;

        tracing::debug!(
            issued_at = record.issued_at,
            instance_url = %record.instance_url,
            "Stored access token"
        );
        *self.record.write().await = Some(record);
        Ok(())
    }

    /// Forget the token; the instance URL is kept
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        self.write_backend(|backend| backend.remove_many(&[ACCESS_TOKEN_KEY, ISSUED_AT_KEY]))
            .await?;
        *self.record.write().await = None;
        Ok(())
    }

    /// Instance URL of the current record, or the stored/default one
    pub async fn instance_url(&self) -> Result<String, StoreError> {
        let current = self.record.read().await;
        match current.as_ref() {
            Some(record) => Ok(record.instance_url.clone()),
            None => Self::load_instance_url(self.backend.as_ref(), &self.default_instance_url),
        }
    }

    /// Point future queries at a different instance
    pub async fn set_instance_url(&self, url: impl Into<String>) -> Result<(), StoreError> {
        let url = url.into();
        let _writer = self.writer.lock().await;

        let value = Value::from(url.clone());
        self.write_backend(move |backend| backend.set_many(&[(INSTANCE_URL_KEY, value)]))
            .await?;

        if let Some(record) = self.record.write().await.as_mut() {
            record.instance_url = url;
        }
        Ok(())
    }

    /// Staleness check with the fixed TTL
    pub fn is_stale(record: &TokenRecord, now: i64) -> bool {
        record.is_stale(now)
    }

    /// Describe the cache at `now`
    pub async fn status(&self, now: i64) -> Result<TokenStatus, StoreError> {
        let instance_url = self.instance_url().await?;
        let status = match self.get().await {
            Some(record) => TokenStatus {
                authenticated: true,
                stale: record.is_stale(now),
                issued_at: Some(record.issued_at),
                age_ms: Some(record.age_ms(now)),
                instance_url,
            },
            None => TokenStatus {
                authenticated: false,
                stale: false,
                issued_at: None,
                age_ms: None,
                instance_url,
            },
        };
        Ok(status)
    }
}
