/// Ollama integration module - Gateway
mod detector;
mod guide;
mod installer;
mod models;
mod platform;
mod prompt;
mod server;

pub use detector::is_available;
pub use guide::{manual_install_steps, print_manual_install};
pub use installer::{InstallMethod, InstallReport, Installer};
pub use models::pull_model;
pub use platform::Platform;
pub use prompt::{print_completion, print_run_failure, read_prompt, run_model};
pub use server::{ensure_server, start_server, HealthCheck, HttpHealthCheck};

#[cfg(test)]
pub use server::MockHealthCheck;
