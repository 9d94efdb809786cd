//! `jarvis serve`: start the HTTP API server.

use std::path::PathBuf;

use jarvis_core::Error;

use super::{CommandResult, config_path, load_config};

pub async fn run(config: Option<PathBuf>, port_override: Option<u16>) -> CommandResult {
    let mut config = load_config(&config_path(config))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Jarvis API");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.current_model);
    println!("   Offline:   {}", config.ollama.mock_mode);

    jarvis_gateway::start(config)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    Ok(())
}
