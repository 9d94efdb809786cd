//! Configuration loading, validation, and management for Jarvis.
//!
//! Loads configuration from `~/.jarvis/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use jarvis_core::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.jarvis/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Key of the model preset used when a request names none
    #[serde(default = "default_current_model")]
    pub current_model: String,

    /// Model presets by key
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, ModelPreset>,

    /// Retrieval budget
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Cache capacities
    #[serde(default)]
    pub cache: CacheConfig,

    /// Completion backend
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store
    #[serde(default)]
    pub store: StoreConfig,

    /// Document ingestion limits
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Outgoing mail credentials
    #[serde(default)]
    pub email: EmailConfig,
}

fn default_current_model() -> String {
    "ultra_fast".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("current_model", &self.current_model)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("retrieval", &self.retrieval)
            .field("cache", &self.cache)
            .field("ollama", &self.ollama)
            .field("embedding", &self.embedding)
            .field("store", &self.store)
            .field("ingest", &self.ingest)
            .field("gateway", &self.gateway)
            .field("email", &self.email)
            .finish()
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("address", &self.address)
            .field("app_password", &redact(&self.app_password))
            .finish()
    }
}

/// A named model configuration: backend model id plus generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Backend model identifier (e.g., "llama3.2:1b")
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub options: GenerationOptions,
}

/// The built-in presets, from fastest to highest quality.
pub fn default_models() -> BTreeMap<String, ModelPreset> {
    let mut models = BTreeMap::new();
    models.insert(
        "fast".to_string(),
        ModelPreset {
            name: "llama3.2:1b".into(),
            description: "Fast responses with a small model".into(),
            options: GenerationOptions {
                temperature: Some(0.1),
                top_p: Some(0.7),
                top_k: Some(20),
                num_predict: Some(400),
                num_ctx: Some(2048),
                repeat_penalty: Some(1.05),
                num_thread: Some(-1),
                num_gpu: Some(1),
                mirostat: Some(2),
                mirostat_tau: Some(5.0),
                mirostat_eta: Some(0.1),
            },
        },
    );
    models.insert(
        "balanced".to_string(),
        ModelPreset {
            name: "llama3.2:3b".into(),
            description: "Balanced speed and quality".into(),
            options: GenerationOptions {
                temperature: Some(0.5),
                top_p: Some(0.9),
                num_predict: Some(250),
                num_ctx: Some(2048),
                repeat_penalty: Some(1.1),
                ..Default::default()
            },
        },
    );
    models.insert(
        "quality".to_string(),
        ModelPreset {
            name: "llama3".into(),
            description: "Best quality, slower responses".into(),
            options: GenerationOptions {
                temperature: Some(0.7),
                top_p: Some(0.9),
                num_predict: Some(400),
                num_ctx: Some(4096),
                repeat_penalty: Some(1.1),
                ..Default::default()
            },
        },
    );
    models.insert(
        "ultra_fast".to_string(),
        ModelPreset {
            name: "llama3.2:1b".into(),
            description: "Lowest latency, near-deterministic answers".into(),
            options: GenerationOptions {
                temperature: Some(0.05),
                top_p: Some(0.5),
                top_k: Some(10),
                num_predict: Some(300),
                num_ctx: Some(2048),
                repeat_penalty: Some(1.0),
                num_thread: Some(-1),
                num_gpu: Some(1),
                mirostat: Some(2),
                mirostat_tau: Some(3.0),
                mirostat_eta: Some(0.2),
            },
        },
    );
    models
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Character budget for assembled context
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,

    /// Nearest chunks fetched per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_context_length() -> usize {
    2000
}
fn default_top_k() -> usize {
    2
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_length: default_max_context_length(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_response_capacity")]
    pub response_capacity: usize,

    #[serde(default = "default_embedding_capacity")]
    pub embedding_capacity: usize,
}

fn default_response_capacity() -> usize {
    50
}
fn default_embedding_capacity() -> usize {
    100
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_capacity: default_response_capacity(),
            embedding_capacity: default_embedding_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Timeout for a single generation request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for the availability check
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,

    /// Skip the network and answer with canned text
    #[serde(default)]
    pub mock_mode: bool,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}
fn default_request_timeout() -> u64 {
    180
}
fn default_health_timeout() -> u64 {
    5
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            request_timeout_secs: default_request_timeout(),
            health_timeout_secs: default_health_timeout(),
            mock_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "hash"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector width for the hashing embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_provider() -> String {
    "ollama".into()
}
fn default_embedding_model() -> String {
    "all-minilm".into()
}
fn default_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> PathBuf {
    AppConfig::config_dir().join("knowledge.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Chunks kept per uploaded document
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

fn default_max_chunks() -> usize {
    100
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_password: Option<String>,
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.address.is_some() && self.app_password.is_some()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.jarvis/config.toml).
    ///
    /// Environment overrides are applied afterwards; see [`AppConfig::apply_env`].
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from environment-style lookups:
    /// - `MOCK_MODE` (`true`, `1`, `yes`) enables offline completions
    /// - `OLLAMA_URL` overrides the backend URL
    /// - `JARVIS_MODEL` overrides the current model preset
    /// - `GMAIL_EMAIL` / `GMAIL_APP_PASSWORD` fill in mail credentials
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(flag) = lookup("MOCK_MODE") {
            self.ollama.mock_mode = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            );
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("JARVIS_MODEL") {
            self.current_model = model;
        }
        if self.email.address.is_none() {
            self.email.address = lookup("GMAIL_EMAIL");
        }
        if self.email.app_password.is_none() {
            self.email.app_password = lookup("GMAIL_APP_PASSWORD");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".jarvis")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.models.contains_key(&self.current_model) {
            return Err(ConfigError::ValidationError(format!(
                "current_model '{}' is not one of the configured models",
                self.current_model
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        if self.retrieval.max_context_length == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_context_length must be > 0".into(),
            ));
        }

        if self.cache.response_capacity == 0 || self.cache.embedding_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache capacities must be > 0".into(),
            ));
        }

        if self.ingest.max_chunks == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_chunks must be > 0".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store backend '{}' (expected sqlite or memory)",
                self.store.backend
            )));
        }

        if !matches!(self.embedding.provider.as_str(), "ollama" | "hash") {
            return Err(ConfigError::ValidationError(format!(
                "unknown embedding provider '{}' (expected ollama or hash)",
                self.embedding.provider
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The preset currently selected by `current_model`.
    pub fn current_preset(&self) -> Option<&ModelPreset> {
        self.models.get(&self.current_model)
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            current_model: default_current_model(),
            models: default_models(),
            retrieval: RetrievalConfig::default(),
            cache: CacheConfig::default(),
            ollama: OllamaConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            gateway: GatewayConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
