pub mod app;
pub mod cli;
pub mod constants;
pub mod ollama;
pub mod pipeline;
pub mod process;
pub mod utils;

pub use app::{load_config, Config};
pub use pipeline::Orchestrator;
pub use utils::BootstrapError;
