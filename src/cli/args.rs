use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::app::Config;

#[derive(Parser, Debug)]
#[command(name = "smolrun")]
#[command(version)]
#[command(
    about = "Install Ollama if needed, pull a small model and run one prompt",
    long_about = None
)]
pub struct Cli {
    /// Model to pull and run (e.g., smollm:135m, smollm:360m)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Prompt to send instead of asking for one
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't try to install Ollama when it is missing
    #[arg(long)]
    pub no_auto_install: bool,

    /// Stop a server started by this run when it ends
    #[arg(long)]
    pub stop_server_on_exit: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if self.stop_server_on_exit {
            config.server.stop_on_exit = true;
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Check status of the runtime and its server
    Status,
}
