//! `jarvis ingest`: add a document to the knowledge base.

use std::path::{Path, PathBuf};

use jarvis_core::{ConversationId, Error};

use super::{CommandResult, build_pipeline, config_path, load_config};

pub async fn run(config: Option<PathBuf>, file: &Path, conversation: Option<String>) -> CommandResult {
    let config = load_config(&config_path(config))?;
    let pipeline = build_pipeline(&config).await?;

    let bytes = read_document(file)?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let conversation = conversation.map(ConversationId::from);

    let receipt = pipeline
        .ingestor()
        .ingest(&filename, &bytes, conversation.as_ref())
        .await?;

    println!("{}", receipt.message);
    println!("   Document id: {}", receipt.doc_id);
    println!("   Chunks:      {}", receipt.chunks);

    Ok(())
}

fn read_document(file: &Path) -> jarvis_core::Result<Vec<u8>> {
    std::fs::read(file).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(format!("File not found: {}", file.display())),
        _ => Error::Internal(format!("Cannot read {}: {e}", file.display())),
    })
}
