use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use super::command::{CommandOutput, CommandSpec, StdioMode};
use crate::utils::BootstrapError;

/// Seam between the bootstrap flow and the operating system's processes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and return its exit status and output
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, BootstrapError>;

    /// Start a command in the background and hand back its handle
    async fn spawn(&self, spec: &CommandSpec) -> Result<ProcessHandle, BootstrapError>;
}

/// Run a command and turn a non-zero exit into [`BootstrapError::CommandFailed`]
pub async fn run_checked(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
) -> Result<CommandOutput, BootstrapError> {
    let output = runner.output(spec).await?;
    if !output.success {
        return Err(BootstrapError::CommandFailed {
            command: spec.to_string(),
            code: output.code,
            stderr: output.stderr_text(),
        });
    }
    Ok(output)
}

/// Observed state of a background process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Exited(Option<i32>),
}

enum HandleState {
    Child(Child),
    Untracked,
    Exited(Option<i32>),
    #[cfg(test)]
    Unobservable,
}

/// Owned handle to a background child process
///
/// Dropping or releasing the handle leaves the process running.
pub struct ProcessHandle {
    label: String,
    state: HandleState,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("label", &self.label)
            .field("pid", &self.id())
            .finish()
    }
}

impl ProcessHandle {
    pub fn from_child(label: impl Into<String>, child: Child) -> Self {
        Self {
            label: label.into(),
            state: HandleState::Child(child),
        }
    }

    /// A process that is assumed to keep running and cannot be signalled
    pub fn untracked(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: HandleState::Untracked,
        }
    }

    #[cfg(test)]
    pub fn exited(label: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            label: label.into(),
            state: HandleState::Exited(code),
        }
    }

    /// A process whose state cannot be polled
    #[cfg(test)]
    pub fn unobservable(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: HandleState::Unobservable,
        }
    }

    #[cfg(test)]
    pub fn was_terminated(&self) -> bool {
        matches!(self.state, HandleState::Exited(None))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> Option<u32> {
        match &self.state {
            HandleState::Child(child) => child.id(),
            _ => None,
        }
    }

    /// Poll the process without blocking
    pub fn state(&mut self) -> io::Result<ProcessState> {
        let code = match &mut self.state {
            HandleState::Child(child) => match child.try_wait()? {
                Some(status) => status.code(),
                None => return Ok(ProcessState::Running),
            },
            HandleState::Untracked => return Ok(ProcessState::Running),
            HandleState::Exited(code) => return Ok(ProcessState::Exited(*code)),
            #[cfg(test)]
            HandleState::Unobservable => {
                return Err(io::Error::new(io::ErrorKind::Other, "process table unavailable"))
            }
        };
        self.state = HandleState::Exited(code);
        Ok(ProcessState::Exited(code))
    }

    /// Kill the process and reap it
    pub async fn terminate(&mut self) -> io::Result<()> {
        match &mut self.state {
            HandleState::Child(child) => {
                debug!("Terminating {} (pid {:?})", self.label, child.id());
                child.kill().await?;
            }
            #[cfg(test)]
            HandleState::Unobservable => {}
            _ => return Ok(()),
        }
        self.state = HandleState::Exited(None);
        Ok(())
    }

    /// Give up ownership and leave the process running
    pub fn release(self) {
        debug!("Leaving {} running (pid {:?})", self.label, self.id());
    }
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Result<Command, BootstrapError> {
        // Resolve up front so a missing tool never reaches spawn
        let program = which::which(&spec.program).map_err(|_| BootstrapError::MissingTool {
            tool: spec.program.clone(),
        })?;

        let mut command = Command::new(program);
        command.args(&spec.args);
        command.envs(spec.env.iter().map(|(key, value)| (key, value)));

        let (stdout, stderr) = match spec.stdio {
            StdioMode::Capture => (Stdio::piped(), Stdio::piped()),
            StdioMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
            StdioMode::Discard => (Stdio::null(), Stdio::null()),
        };
        command.stdout(stdout).stderr(stderr);
        Ok(command)
    }
}

fn spawn_error(program: &str, err: io::Error) -> BootstrapError {
    if err.kind() == io::ErrorKind::NotFound {
        BootstrapError::MissingTool {
            tool: program.to_string(),
        }
    } else {
        BootstrapError::IoError(err)
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, BootstrapError> {
        let mut command = Self::command(spec)?;
        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        debug!("Running `{}`", spec);
        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&spec.program, e))?;

        // Feed stdin from its own task so a child filling its stdout pipe
        // cannot block the write
        let writer = match (child.stdin.take(), spec.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(tokio::spawn(async move {
                pipe.write_all(&input).await?;
                pipe.shutdown().await
            })),
            _ => None,
        };

        let output = child.wait_with_output().await?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                    return Err(BootstrapError::IoError(e));
                }
                Ok(_) => {}
                Err(e) => warn!("stdin writer for `{}` did not finish: {}", spec, e),
            }
        }

        debug!("`{}` exited with {:?}", spec, output.status.code());
        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<ProcessHandle, BootstrapError> {
        let mut command = Self::command(spec)?;
        command.stdin(Stdio::null());

        debug!("Starting `{}` in the background", spec);
        let child = command
            .spawn()
            .map_err(|e| spawn_error(&spec.program, e))?;

        Ok(ProcessHandle::from_child(spec.to_string(), child))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_missing_tool() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("smolrun-definitely-not-installed").arg("--version");

        let err = runner.output(&spec).await.unwrap_err();
        assert!(matches!(err, BootstrapError::MissingTool { tool } if tool == "smolrun-definitely-not-installed"));
    }

    #[tokio::test]
    async fn test_stdin_is_delivered() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("cat").stdin("Hello, smolrun!");

        let output = runner.output(&spec).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout_text(), "Hello, smolrun!");
    }

    #[tokio::test]
    async fn test_env_is_passed_to_child() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf %s \"$OLLAMA_HOST\""])
            .env("OLLAMA_HOST", "127.0.0.1:18777");

        let output = runner.output(&spec).await.unwrap();
        assert_eq!(output.stdout_text(), "127.0.0.1:18777");
    }

    #[tokio::test]
    async fn test_run_checked_reports_failure() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("sh").args(["-c", "echo broken >&2; exit 3"]);

        match run_checked(&runner, &spec).await {
            Err(BootstrapError::CommandFailed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("Expected command failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_background_process_lifecycle() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("sleep").arg("30").stdio(StdioMode::Discard);

        let mut handle = runner.spawn(&spec).await.unwrap();
        assert!(handle.id().is_some());
        assert_eq!(handle.state().unwrap(), ProcessState::Running);

        handle.terminate().await.unwrap();
        assert!(matches!(handle.state().unwrap(), ProcessState::Exited(_)));
    }
}
