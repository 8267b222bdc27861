use tracing::debug;

use crate::constants::VERSION_FLAG;
use crate::process::{CommandRunner, CommandSpec, StdioMode};

/// Check whether `program` can be started and answers `--version` with success
pub async fn is_available(runner: &dyn CommandRunner, program: &str) -> bool {
    let version_check = CommandSpec::new(program)
        .arg(VERSION_FLAG)
        .stdio(StdioMode::Discard);

    match runner.output(&version_check).await {
        Ok(output) => {
            debug!("`{}` exited with {:?}", version_check, output.code);
            output.success
        }
        Err(e) => {
            debug!("`{}` could not run: {}", version_check, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockCommandRunner};
    use crate::utils::BootstrapError;

    #[tokio::test]
    async fn test_available_when_version_succeeds() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .withf(|spec| spec.program == "ollama" && spec.args == ["--version"])
            .times(1)
            .returning(|_| Ok(CommandOutput::success("ollama version is 0.5.7")));

        assert!(is_available(&runner, "ollama").await);
    }

    #[tokio::test]
    async fn test_unavailable_when_missing() {
        let mut runner = MockCommandRunner::new();
        runner.expect_output().times(1).returning(|spec| {
            Err(BootstrapError::MissingTool {
                tool: spec.program.clone(),
            })
        });

        assert!(!is_available(&runner, "ollama").await);
    }

    #[tokio::test]
    async fn test_unavailable_on_nonzero_exit() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .times(1)
            .returning(|_| Ok(CommandOutput::failure(127, "")));

        assert!(!is_available(&runner, "brew").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_absent_executable_on_real_system() {
        let runner = crate::process::SystemRunner::new();
        assert!(!is_available(&runner, "smolrun-no-such-runtime").await);
    }
}
