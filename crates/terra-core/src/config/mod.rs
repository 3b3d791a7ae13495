//! Process-wide configuration, loaded from environment and an optional
//! `terra.toml`, mirroring how the original service read a single `Settings`
//! object at startup.

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Minio,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Local
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub backend: StorageBackend,
    pub local_root: String,
    pub minio_endpoint: Option<String>,
    pub minio_bucket: Option<String>,
    pub minio_access_key: Option<String>,
    pub minio_secret_key: Option<String>,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_root: "./data/objects".to_string(),
            minio_endpoint: None,
            minio_bucket: None,
            minio_access_key: None,
            minio_secret_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database_path: String,
    pub min_pool_size: u32,
    pub max_pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "./data/terra.db".to_string(),
            min_pool_size: 1,
            max_pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_concurrency: usize,
    pub batch_size_min: usize,
    pub batch_size_max: usize,
    pub batch_size_default: usize,
    pub document_char_cap: usize,
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "qwen-plus".to_string(),
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            max_concurrency: 3,
            batch_size_min: 5,
            batch_size_max: 7,
            batch_size_default: 6,
            document_char_cap: 100_000,
            request_timeout_secs: 60,
        }
    }
}

/// Parsing/heuristic knobs that the original implementation hard-coded but
/// which are data-dependent enough to warrant being configurable (open
/// question iii in the design notes).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParseConfig {
    pub repeated_title_window: usize,
    pub repeated_title_min_seen: usize,
    pub repeated_title_buffer_cap: usize,
    pub convert_timeout_secs: u64,
    pub convert_poll_interval_secs: u64,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            repeated_title_window: 15,
            repeated_title_min_seen: 5,
            repeated_title_buffer_cap: 20,
            convert_timeout_secs: 60,
            convert_poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub jwt_expiry_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            jwt_algorithm: "HS256".to_string(),
            jwt_expiry_minutes: 60 * 24,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub db_schema: String,
    pub object_store: ObjectStoreConfig,
    pub store: StoreConfig,
    pub ai: AiConfig,
    pub parse: ParseConfig,
    pub auth: AuthConfig,
    pub auto_trigger_review: bool,
}

impl AppConfig {
    /// Loads defaults, then overlays any `TERRA_*` environment variables —
    /// the same precedence the original pydantic `Settings` class used
    /// (environment wins over file/defaults).
    pub fn from_env() -> Self {
        let mut cfg = AppConfig {
            db_schema: "public".to_string(),
            parse: ParseConfig::default(),
            ..Default::default()
        };

        if let Ok(v) = env::var("TERRA_DATABASE_PATH") {
            cfg.store.database_path = v;
        }
        if let Ok(v) = env::var("TERRA_DB_SCHEMA") {
            cfg.db_schema = v;
        }
        if let Ok(v) = env::var("TERRA_STORAGE_TYPE") {
            cfg.object_store.backend = match v.as_str() {
                "minio" => StorageBackend::Minio,
                _ => StorageBackend::Local,
            };
        }
        if let Ok(v) = env::var("TERRA_QWEN_API_KEY") {
            cfg.ai.api_key = Some(v);
        }
        if let Ok(v) = env::var("TERRA_QWEN_MODEL") {
            cfg.ai.model = v;
        }
        if let Ok(v) = env::var("TERRA_JWT_SECRET") {
            cfg.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("TERRA_AUTO_TRIGGER_REVIEW") {
            cfg.auto_trigger_review = matches!(v.as_str(), "1" | "true" | "TRUE");
        }
        cfg
    }
}
