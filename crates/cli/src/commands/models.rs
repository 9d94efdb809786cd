//! `jarvis models`: list model presets.

use std::path::PathBuf;

use super::{CommandResult, config_path, load_config};

pub fn run(config: Option<PathBuf>) -> CommandResult {
    let config = load_config(&config_path(config))?;

    println!("Model presets");
    println!("=============");
    for (key, preset) in &config.models {
        let marker = if *key == config.current_model { "*" } else { " " };
        println!("  {marker} {key:<12} {:<14} {}", preset.name, preset.description);
    }
    println!();
    println!("  Switch with JARVIS_MODEL=<key> or `current_model` in config.toml");

    Ok(())
}
