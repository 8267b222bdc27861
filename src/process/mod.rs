/// External process plumbing - Gateway
mod command;
mod runner;

#[cfg(test)]
pub(crate) mod fake;

pub use command::{CommandOutput, CommandSpec, StdioMode};
pub use runner::{run_checked, CommandRunner, ProcessHandle, ProcessState, SystemRunner};

#[cfg(test)]
pub use runner::MockCommandRunner;
