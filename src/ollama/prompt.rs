use colored::Colorize;
use std::io::{BufRead, Write};

use crate::constants::PROMPT_LABEL;
use crate::process::{run_checked, CommandRunner, CommandSpec};
use crate::utils::BootstrapError;

/// Ask for a single line of input; end of input counts as an empty prompt
pub fn read_prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<String> {
    write!(output, "{}", PROMPT_LABEL)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed_len);
    Ok(line)
}

/// Send `prompt` to `<runtime> run <model>` on stdin and return the trimmed completion
pub async fn run_model(
    runner: &dyn CommandRunner,
    runtime: &str,
    model: &str,
    prompt: &str,
) -> Result<String, BootstrapError> {
    println!("[RUNNING] Running the {} model...", model);

    // The prompt goes through stdin so nothing needs shell escaping
    let spec = CommandSpec::new(runtime)
        .args(["run", model])
        .stdin(prompt.as_bytes());

    let output = run_checked(runner, &spec).await?;
    Ok(output.stdout_text().trim().to_string())
}

/// Print a completion under the output header
pub fn print_completion<W: Write>(output: &mut W, completion: &str) -> std::io::Result<()> {
    writeln!(output, "\n{}", "Model output:".bold())?;
    writeln!(output, "{}", completion)
}

/// Print why the run failed, including the runtime's own error text
pub fn print_run_failure<W: Write>(output: &mut W, err: &BootstrapError) -> std::io::Result<()> {
    writeln!(output, "{}", "Failed to run the model:".red())?;
    let stderr = err.stderr().trim();
    if stderr.is_empty() {
        writeln!(output, "{}", err)
    } else {
        writeln!(output, "{}", stderr)
    }
}
