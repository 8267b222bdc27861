use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::{
    app::{config_files, loaded_config_files, Config},
    ollama::{is_available, HttpHealthCheck, Platform},
    process::SystemRunner,
};

use super::Commands;

/// Handle CLI subcommands
pub async fn handle_command(
    command: &Commands,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Commands::Status => show_status(config, config_path).await,
    }
}

/// Show status of the runtime and its dependencies
async fn show_status(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let runner = SystemRunner::new();
    let runtime = &config.runtime.binary;

    println!("smolrun Status:");
    println!();

    let platform = Platform::detect(&config.install.os_release_path);
    println!("  Platform: {:?}", platform);

    if is_available(&runner, runtime).await {
        println!("  {} {}: Installed", "[OK]".green(), runtime);
    } else {
        println!("  {} {}: Not installed", "[ERROR]".red(), runtime);
    }

    let health = HttpHealthCheck::new(&config.runtime.base_url());
    match health.version().await {
        Some(version) => println!(
            "  {} Server: Running at {} (version {})",
            "[OK]".green(),
            config.runtime.base_url(),
            version
        ),
        None => println!(
            "  {} Server: Not reachable at {}",
            "[WARNING]".yellow(),
            config.runtime.base_url()
        ),
    }

    println!("  Model: {}", config.model.name);

    let loaded = loaded_config_files(config_path, &config_files());
    if loaded.is_empty() {
        println!("  Configuration: Not found (using defaults)");
    }
    for path in loaded {
        println!("  {} Configuration: {}", "[OK]".green(), path.display());
    }

    println!();
    Ok(())
}
