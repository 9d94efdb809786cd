//! `jarvis stats`: knowledge-base and cache counters.

use std::path::PathBuf;

use super::{CommandResult, build_pipeline, config_path, load_config};

pub async fn run(config: Option<PathBuf>) -> CommandResult {
    let config = load_config(&config_path(config))?;
    let pipeline = build_pipeline(&config).await?;
    let stats = pipeline.stats().await?;

    println!("Jarvis Stats");
    println!("============");
    println!("  Store:        {} ({})", config.store.backend, config.store.path.display());
    println!("  Chunks:       {}", stats.total_chunks);
    println!("  Embeddings:   {}", pipeline.embedding_model());
    println!("  Model:        {}", stats.current_model);
    println!("  Offline mode: {}", stats.offline);

    Ok(())
}
