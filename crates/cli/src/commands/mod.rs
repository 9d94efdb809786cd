pub mod chat;
pub mod doctor;
pub mod ingest;
pub mod init;
pub mod models;
pub mod serve;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jarvis_agent::ChatPipeline;
use jarvis_config::AppConfig;
use jarvis_core::Error;
use jarvis_providers::OllamaClient;

pub type CommandResult = jarvis_core::Result<()>;

/// The config file a command reads: `--config` if given, else the default.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn load_config(path: &Path) -> jarvis_core::Result<AppConfig> {
    AppConfig::load_with_env(path).map_err(|e| Error::Config {
        message: format!("Failed to load config: {e}"),
    })
}

/// Build the chat pipeline against the configured backends.
pub async fn build_pipeline(config: &AppConfig) -> jarvis_core::Result<ChatPipeline> {
    let backend = Arc::new(OllamaClient::from_config(&config.ollama)?);
    let embedder = jarvis_providers::build_embedder(config)?;
    let store = jarvis_memory::open_store(&config.store).await?;
    Ok(ChatPipeline::new(config, backend, embedder, store)?)
}
