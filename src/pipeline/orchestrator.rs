use colored::Colorize;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    app::Config,
    ollama::{
        ensure_server, is_available, print_completion, print_manual_install, print_run_failure,
        pull_model, read_prompt, run_model, HealthCheck, Installer, Platform,
    },
    process::{CommandRunner, ProcessHandle},
    utils::BootstrapError,
};

/// Drives one bootstrap run: install if needed, pull, prompt, run
pub struct Orchestrator {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    health: Arc<dyn HealthCheck>,
    platform: Option<Platform>,
    prompt: Option<String>,
    no_auto_install: bool,
    /// Servers started during this run
    servers: Vec<ProcessHandle>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        health: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            config,
            runner,
            health,
            platform: None,
            prompt: None,
            no_auto_install: false,
            servers: Vec::new(),
        }
    }

    /// Use this platform instead of detecting the host
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use this prompt instead of asking for one
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn no_auto_install(mut self, no_auto_install: bool) -> Self {
        self.no_auto_install = no_auto_install;
        self
    }

    /// Run the whole flow, reading the prompt from `input` when none was given
    /// and writing the prompt label and the model's answer to `output`
    ///
    /// An error means the run must end with a failure status: the runtime
    /// could not be installed or the model could not be downloaded. A failed
    /// prompt run is reported and still returns `Ok`.
    pub async fn run<R: BufRead, W: Write>(
        mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), BootstrapError> {
        let result = self.run_steps(input, output).await;
        self.cleanup().await;
        result
    }

    async fn run_steps<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), BootstrapError> {
        let runtime = self.config.runtime.binary.clone();
        let model = self.config.model.name.clone();

        println!("Starting smolrun with model: {}", model.green());

        self.ensure_runtime(&runtime).await?;
        self.ensure_server().await;

        if let Err(e) = pull_model(self.runner.as_ref(), &runtime, &model).await {
            println!(
                "{}",
                "[ERROR] Failed to download the model. Please ensure that Ollama is properly set up."
                    .red()
            );
            return Err(e);
        }

        let prompt = match self.prompt.take() {
            Some(prompt) => prompt,
            None => read_prompt(input, output)?,
        };

        match run_model(self.runner.as_ref(), &runtime, &model, &prompt).await {
            Ok(completion) => print_completion(output, &completion)?,
            Err(e) => {
                warn!("Model run failed: {}", e);
                print_run_failure(output, &e)?;
            }
        }

        Ok(())
    }

    /// Install the runtime when it is not callable yet
    async fn ensure_runtime(&mut self, runtime: &str) -> Result<(), BootstrapError> {
        if is_available(self.runner.as_ref(), runtime).await {
            info!("{} is available", runtime);
            return Ok(());
        }

        println!("[WARNING] Ollama not found on this system.");
        let platform = self
            .platform
            .unwrap_or_else(|| Platform::detect(&self.config.install.os_release_path));

        if self.no_auto_install {
            print_manual_install(platform);
            return Err(BootstrapError::InstallFailed {
                reason: "automatic installation is disabled".to_string(),
            });
        }

        let installer = Installer::new(self.runner.as_ref(), self.health.as_ref(), &self.config);
        let report = match installer.install(platform).await {
            Ok(report) => report,
            Err(e) => {
                println!("{}", format!("[ERROR] {}", e).red());
                print_manual_install(platform);
                return Err(e);
            }
        };

        info!("Installed {} via {:?}", runtime, report.method);
        self.servers.extend(report.server);

        if !is_available(self.runner.as_ref(), runtime).await {
            println!(
                "{}",
                format!("[ERROR] {} was installed but cannot be run. Check your PATH.", runtime)
                    .red()
            );
            return Err(BootstrapError::RuntimeUnavailable {
                runtime: runtime.to_string(),
            });
        }

        println!("{}", "[OK] Ollama installed successfully.".green());
        Ok(())
    }

    /// Bring the service up; a failure here surfaces later through the pull
    async fn ensure_server(&mut self) {
        match ensure_server(
            self.runner.as_ref(),
            self.health.as_ref(),
            &self.config.runtime,
            &self.config.server,
        )
        .await
        {
            Ok(handle) => self.servers.extend(handle),
            Err(e) => {
                warn!("Runtime server did not start: {}", e);
                println!(
                    "[WARNING] Could not start the {} server: {}",
                    self.config.runtime.binary, e
                );
            }
        }
    }

    /// Stop or release every server this run started
    async fn cleanup(&mut self) {
        for mut handle in self.servers.drain(..) {
            if self.config.server.stop_on_exit {
                println!("[SERVER] Stopping {}...", handle.label());
                if let Err(e) = handle.terminate().await {
                    warn!("Failed to stop {}: {}", handle.label(), e);
                }
            } else {
                handle.release();
            }
        }
    }
}
