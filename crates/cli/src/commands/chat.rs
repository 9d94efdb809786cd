//! `jarvis chat`: run one question through the pipeline.

use std::path::PathBuf;

use jarvis_agent::ChatRequest;
use jarvis_core::ChatMode;

use super::{CommandResult, build_pipeline, config_path, load_config};

pub async fn run(
    config: Option<PathBuf>,
    message: String,
    mode: &str,
    model: Option<String>,
    json: bool,
) -> CommandResult {
    let config = load_config(&config_path(config))?;
    let pipeline = build_pipeline(&config).await?;

    let mut request = ChatRequest::new(message);
    request.mode = ChatMode::parse(mode);
    request.model = model;

    eprint!("  Thinking...");
    let reply = pipeline.chat(request).await;
    eprint!("\r              \r");

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!("{}", reply.response);
    if !reply.sources.is_empty() {
        println!();
        println!("  Sources: {}", reply.sources.join(", "));
    }
    tracing::debug!(steps = ?reply.processing_steps, "Chat finished");

    Ok(())
}
