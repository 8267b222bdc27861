/// Bootstrap pipeline - Gateway
mod orchestrator;

pub use orchestrator::Orchestrator;
