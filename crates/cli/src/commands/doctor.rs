//! `jarvis doctor`: diagnose system health.

use std::path::PathBuf;

use jarvis_core::provider::CompletionBackend;
use jarvis_providers::OllamaClient;

use super::{CommandResult, config_path};

pub async fn run(config: Option<PathBuf>) -> CommandResult {
    println!("Jarvis Doctor");
    println!("=============\n");

    let mut issues = 0;
    let path = config_path(config);

    if !path.exists() {
        println!("  [warn] No config file at {}, using defaults (run `jarvis init`)", path.display());
        issues += 1;
    }

    let config = match jarvis_config::AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  [ok]   Config valid");
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            println!("\n  1 blocking issue found.");
            return Ok(());
        }
    };

    match jarvis_memory::open_store(&config.store).await {
        Ok(store) => match store.count().await {
            Ok(n) => println!("  [ok]   {} store opened ({n} chunks)", store.name()),
            Err(e) => {
                println!("  [fail] Store query failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Store unavailable: {e}");
            issues += 1;
        }
    }

    if config.ollama.mock_mode {
        println!("  [ok]   Offline mode, skipping Ollama checks");
    } else {
        let client = OllamaClient::from_config(&config.ollama)?;
        match client.list_models().await {
            Ok(models) => {
                println!("  [ok]   Ollama reachable at {}", client.base_url());
                let wanted = config
                    .current_preset()
                    .map(|preset| preset.name.clone())
                    .unwrap_or_default();
                if jarvis_agent::completion::is_model_listed(&models, &wanted) {
                    println!("  [ok]   Model {wanted} installed");
                } else {
                    println!("  [warn] Model {wanted} missing, run: ollama pull {wanted}");
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  [fail] Ollama not reachable: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
