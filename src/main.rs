use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use smolrun::{
    app::{load_config, load_config_file, Config},
    cli::{handle_command, Cli},
    ollama::HttpHealthCheck,
    pipeline::Orchestrator,
    process::SystemRunner,
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        load_config_file(config_path)?
    } else {
        load_config().unwrap_or_else(|e| {
            eprintln!("[WARNING] Failed to load config: {}. Using defaults.", e);
            Config::default()
        })
    };
    cli.apply(&mut config);

    if let Some(command) = &cli.command {
        return handle_command(command, &config, cli.config.as_deref()).await;
    }

    let health = Arc::new(HttpHealthCheck::new(&config.runtime.base_url()));
    let orchestrator = Orchestrator::new(config, Arc::new(SystemRunner::new()), health)
        .with_prompt(cli.prompt.clone())
        .no_auto_install(cli.no_auto_install);

    let stdin = std::io::stdin();
    if let Err(e) = orchestrator
        .run(&mut stdin.lock(), &mut std::io::stdout())
        .await
    {
        tracing::error!("Bootstrap failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
