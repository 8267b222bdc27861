use thiserror::Error;

use crate::ollama::Platform;

/// Main error type for smolrun
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("'{tool}' was not found on this system")]
    MissingTool { tool: String },

    #[error("`{command}` failed ({})", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("No automatic installation available for {0}")]
    UnsupportedPlatform(Platform),

    #[error("Installation failed: {reason}")]
    InstallFailed { reason: String },

    #[error("'{runtime}' is still not callable after installation")]
    RuntimeUnavailable { runtime: String },

    #[error("Server did not become ready after {attempts} checks")]
    ServerNotReady { attempts: usize },

    #[error("Server exited before becoming ready ({})", exit_label(.code))]
    ServerExited { code: Option<i32> },

    #[error("Failed to download model '{model}': {source}")]
    ModelPull {
        model: String,
        #[source]
        source: Box<BootstrapError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BootstrapError {
    /// Captured stderr of a failed command, empty for every other variant
    pub fn stderr(&self) -> &str {
        match self {
            BootstrapError::CommandFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}
