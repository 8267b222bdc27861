use std::fmt;

/// How a child's stdout/stderr are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Buffer output so the caller can inspect it
    Capture,
    /// Pass output straight through to the terminal
    Inherit,
    /// Throw output away
    Discard,
}

/// Description of an external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables on top of the inherited environment
    pub env: Vec<(String, String)>,
    /// Bytes written to the child's stdin, which is closed afterwards
    pub stdin: Option<Vec<u8>>,
    pub stdio: StdioMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            stdio: StdioMode::Capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn stdio(mut self, mode: StdioMode) -> Self {
        self.stdio = mode;
        self
    }

    /// True when the command is `program` and its first argument is `first_arg`
    pub fn is(&self, program: &str, first_arg: Option<&str>) -> bool {
        self.program == program && self.args.first().map(String::as_str) == first_arg
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and buffered output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_program_and_args() {
        let spec = CommandSpec::new("sudo").args(["tar", "-C", "/usr", "-xzf", "ollama.tgz"]);
        assert_eq!(spec.to_string(), "sudo tar -C /usr -xzf ollama.tgz");
    }

    #[test]
    fn test_is_matches_program_and_first_arg() {
        let spec = CommandSpec::new("ollama").arg("pull").arg("smollm:135m");
        assert!(spec.is("ollama", Some("pull")));
        assert!(!spec.is("ollama", Some("run")));
        assert!(!spec.is("ollama", None));
        assert!(CommandSpec::new("sh").is("sh", None));
    }

    #[test]
    fn test_output_text_is_lossy() {
        let output = CommandOutput {
            stdout: vec![b'h', b'i', 0xff],
            ..CommandOutput::success("")
        };
        assert_eq!(output.stdout_text(), "hi\u{fffd}");
    }
}
