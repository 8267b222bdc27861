use colored::Colorize;

use crate::process::{run_checked, CommandRunner, CommandSpec, StdioMode};
use crate::utils::BootstrapError;

/// Download `model` with `<runtime> pull`, streaming progress to the terminal
pub async fn pull_model(
    runner: &dyn CommandRunner,
    runtime: &str,
    model: &str,
) -> Result<(), BootstrapError> {
    println!("[DOWNLOADING] Downloading the {} model...", model);

    let spec = CommandSpec::new(runtime)
        .args(["pull", model])
        .stdio(StdioMode::Inherit);

    run_checked(runner, &spec)
        .await
        .map_err(|e| BootstrapError::ModelPull {
            model: model.to_string(),
            source: Box::new(e),
        })?;

    println!("{}", "[OK] Model downloaded successfully.".green());
    Ok(())
}
