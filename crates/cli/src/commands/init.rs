//! `jarvis init`: write a default config file.

use std::path::PathBuf;

use jarvis_config::AppConfig;
use jarvis_core::Error;

use super::{CommandResult, config_path};

pub fn run(config: Option<PathBuf>, force: bool) -> CommandResult {
    let path = config_path(config);

    if path.exists() && !force {
        println!("Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    let write_failed = |e: std::io::Error| Error::Internal(format!("Cannot write {}: {e}", path.display()));
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write_failed)?;
    }
    std::fs::write(&path, AppConfig::default_toml()).map_err(write_failed)?;

    println!("Created config at: {}", path.display());
    println!();
    println!("Next steps:");
    println!("   1. Start Ollama and run: ollama pull llama3.2:1b && ollama pull all-minilm");
    println!("   2. Run: jarvis ingest <file>");
    println!("   3. Run: jarvis serve");

    Ok(())
}
