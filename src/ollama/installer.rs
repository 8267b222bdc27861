use colored::Colorize;
use tracing::{info, warn};

use super::detector::is_available;
use super::server::{start_server, HealthCheck};
use super::Platform;
use crate::app::Config;
use crate::constants::HOMEBREW_BINARY;
use crate::process::{run_checked, CommandRunner, CommandSpec, ProcessHandle, StdioMode};
use crate::utils::BootstrapError;

/// Strategy that ended up installing the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    Homebrew,
    InstallScript,
    Archive,
}

/// Result of a successful installation
#[derive(Debug)]
pub struct InstallReport {
    pub method: InstallMethod,
    /// Server started by the archive fallback, if any
    pub server: Option<ProcessHandle>,
}

impl InstallReport {
    fn new(method: InstallMethod) -> Self {
        Self {
            method,
            server: None,
        }
    }
}

/// Installs the runtime with the strategy matching the host platform
pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    health: &'a dyn HealthCheck,
    config: &'a Config,
}

impl<'a> Installer<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        health: &'a dyn HealthCheck,
        config: &'a Config,
    ) -> Self {
        Self {
            runner,
            health,
            config,
        }
    }

    /// Make one installation attempt for `platform`
    pub async fn install(&self, platform: Platform) -> Result<InstallReport, BootstrapError> {
        info!("Installing runtime for {:?}", platform);
        match platform {
            Platform::MacOs => self.install_macos().await,
            Platform::Ubuntu => self.install_ubuntu().await,
            Platform::OtherLinux => {
                println!("This Linux distribution is not explicitly supported.");
                Err(BootstrapError::UnsupportedPlatform(platform))
            }
            Platform::Unsupported => {
                println!("This tool only supports macOS or Ubuntu at the moment.");
                Err(BootstrapError::UnsupportedPlatform(platform))
            }
        }
    }

    async fn install_macos(&self) -> Result<InstallReport, BootstrapError> {
        if !is_available(self.runner, HOMEBREW_BINARY).await {
            println!("{}", "[ERROR] Homebrew not found.".red());
            return Err(BootstrapError::InstallFailed {
                reason: "Homebrew is required to install Ollama on macOS".to_string(),
            });
        }

        println!("[INSTALL] Attempting to install Ollama using Homebrew...");
        let spec = CommandSpec::new(HOMEBREW_BINARY)
            .args(["install", self.config.install.homebrew_formula.as_str()])
            .stdio(StdioMode::Inherit);

        if let Err(e) = run_checked(self.runner, &spec).await {
            println!("{}", "[ERROR] Failed to install Ollama via Homebrew.".red());
            return Err(e);
        }

        Ok(InstallReport::new(InstallMethod::Homebrew))
    }

    async fn install_ubuntu(&self) -> Result<InstallReport, BootstrapError> {
        println!("[INSTALL] Attempting to install Ollama on Ubuntu...");

        match self.install_with_script().await {
            Ok(()) => return Ok(InstallReport::new(InstallMethod::InstallScript)),
            Err(e) => {
                warn!("Install script failed: {}", e);
                println!(
                    "[WARNING] Automatic installation via the install script failed, attempting manual install..."
                );
            }
        }

        match self.install_from_archive().await {
            Ok(server) => Ok(InstallReport {
                method: InstallMethod::Archive,
                server,
            }),
            Err(e) => {
                println!("{}", "[ERROR] Failed to manually install Ollama.".red());
                Err(e)
            }
        }
    }

    /// Fetch the install script once and execute the fetched bytes
    async fn install_with_script(&self) -> Result<(), BootstrapError> {
        let fetch = CommandSpec::new("curl").args(["-fsSL", self.config.install.script_url.as_str()]);
        let script = run_checked(self.runner, &fetch).await?;

        let execute = CommandSpec::new("sh")
            .stdin(script.stdout)
            .stdio(StdioMode::Inherit);
        run_checked(self.runner, &execute).await?;
        Ok(())
    }

    /// Download the release archive, extract it and bring the server up
    async fn install_from_archive(&self) -> Result<Option<ProcessHandle>, BootstrapError> {
        let install = &self.config.install;
        let archive_url = install.archive_url.as_deref().ok_or_else(|| {
            BootstrapError::InstallFailed {
                reason: format!(
                    "no release archive is published for {} hosts",
                    std::env::consts::ARCH
                ),
            }
        })?;
        let archive = install.archive_file.to_string_lossy().into_owned();

        println!("[DOWNLOADING] {}", archive_url);
        let download = CommandSpec::new("curl")
            .args(["-L", archive_url, "-o", archive.as_str()])
            .stdio(StdioMode::Inherit);
        run_checked(self.runner, &download).await?;

        let extract_dir = install.extract_dir.to_string_lossy().into_owned();
        println!("[INSTALL] Extracting into {} (requires sudo)...", extract_dir);
        let extract = CommandSpec::new("sudo")
            .args(["tar", "-C", extract_dir.as_str(), "-xzf", archive.as_str()])
            .stdio(StdioMode::Inherit);
        run_checked(self.runner, &extract).await?;

        start_server(
            self.runner,
            self.health,
            &self.config.runtime,
            &self.config.server,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ServerConfig;
    use crate::ollama::server::MockHealthCheck;
    use crate::process::fake::{missing, FakeRunner};
    use crate::process::{CommandOutput, MockCommandRunner};
    use pretty_assertions::assert_eq;

    fn test_config() -> Config {
        let mut config = Config {
            server: ServerConfig {
                startup_attempts: 2,
                check_interval_ms: 1,
                ..ServerConfig::default()
            },
            ..Config::default()
        };
        config.install.archive_url =
            Some("https://ollama.com/download/ollama-linux-amd64.tgz".to_string());
        config
    }

    fn healthy() -> MockHealthCheck {
        let mut health = MockHealthCheck::new();
        health.expect_is_ready().returning(|| true);
        health
    }

    #[tokio::test]
    async fn test_macos_without_homebrew_only_checks_brew() {
        let config = test_config();
        let mut health = MockHealthCheck::new();
        health.expect_is_ready().never();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .withf(|spec| spec.program == "brew" && spec.args == ["--version"])
            .times(1)
            .returning(|spec| missing(spec));
        runner.expect_spawn().never();

        let err = Installer::new(&runner, &health, &config)
            .install(Platform::MacOs)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::InstallFailed { .. }));
    }

    #[tokio::test]
    async fn test_macos_homebrew_install() {
        let config = test_config();
        let health = healthy();
        let runner = FakeRunner::new(|_, _| Ok(CommandOutput::success("")));

        let report = Installer::new(&runner, &health, &config)
            .install(Platform::MacOs)
            .await
            .unwrap();

        assert_eq!(report.method, InstallMethod::Homebrew);
        let calls: Vec<String> = runner.calls().iter().map(|c| c.to_string()).collect();
        assert_eq!(calls, vec!["brew --version", "brew install ollama/tap/ollama"]);
    }

    #[tokio::test]
    async fn test_macos_homebrew_failure() {
        let config = test_config();
        let health = healthy();
        let runner = FakeRunner::new(|spec, _| {
            if spec.is("brew", Some("install")) {
                Ok(CommandOutput::failure(1, "Error: no bottle available"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });

        let err = Installer::new(&runner, &health, &config)
            .install(Platform::MacOs)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::CommandFailed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_ubuntu_script_fetched_once_and_piped_to_sh() {
        let config = test_config();
        let health = healthy();
        let runner = FakeRunner::new(|spec, _| {
            if spec.program == "curl" {
                Ok(CommandOutput::success("#!/bin/sh\necho installing\n"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });

        let report = Installer::new(&runner, &health, &config)
            .install(Platform::Ubuntu)
            .await
            .unwrap();

        assert_eq!(report.method, InstallMethod::InstallScript);
        assert!(report.server.is_none());

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to_string(), "curl -fsSL https://ollama.com/install.sh");
        assert_eq!(calls[1].program, "sh");
        assert!(calls[1].args.is_empty());
        assert_eq!(
            calls[1].stdin.as_deref(),
            Some(&b"#!/bin/sh\necho installing\n"[..])
        );
        assert!(runner.spawned().is_empty());
    }

    #[tokio::test]
    async fn test_ubuntu_falls_back_to_archive() {
        let mut config = test_config();
        config.install.archive_url =
            Some("https://ollama.com/download/ollama-linux-amd64.tgz".to_string());
        config.install.archive_file = "ollama-linux-amd64.tgz".into();
        let mut health = MockHealthCheck::new();
        let mut checks = 0;
        health.expect_is_ready().returning(move || {
            checks += 1;
            checks > 1
        });
        let runner = FakeRunner::new(|spec, _| {
            if spec.is("sh", None) {
                Ok(CommandOutput::failure(1, "unsupported init system"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });

        let report = Installer::new(&runner, &health, &config)
            .install(Platform::Ubuntu)
            .await
            .unwrap();

        assert_eq!(report.method, InstallMethod::Archive);
        assert!(report.server.is_some());
        let calls: Vec<String> = runner.calls().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            calls,
            vec![
                "curl -fsSL https://ollama.com/install.sh",
                "sh",
                "curl -L https://ollama.com/download/ollama-linux-amd64.tgz -o ollama-linux-amd64.tgz",
                "sudo tar -C /usr -xzf ollama-linux-amd64.tgz",
            ]
        );
        assert_eq!(runner.spawned()[0].to_string(), "ollama serve");
    }

    #[tokio::test]
    async fn test_ubuntu_archive_failure_is_terminal() {
        let config = test_config();
        let health = healthy();
        let runner = FakeRunner::new(|spec, _| {
            if spec.program == "curl" {
                Ok(CommandOutput::failure(6, "Could not resolve host"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });

        let err = Installer::new(&runner, &health, &config)
            .install(Platform::Ubuntu)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::CommandFailed { code: Some(6), .. }));
        // failed script fetch skips `sh`, failed download skips extraction
        assert_eq!(runner.count("sh", None), 0);
        assert_eq!(runner.count("sudo", Some("tar")), 0);
        assert!(runner.spawned().is_empty());
    }

    #[tokio::test]
    async fn test_no_archive_for_architecture() {
        let mut config = test_config();
        config.install.archive_url = None;
        let health = healthy();
        let runner = FakeRunner::new(|spec, _| {
            if spec.is("sh", None) {
                Ok(CommandOutput::failure(1, "unsupported"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });

        let err = Installer::new(&runner, &health, &config)
            .install(Platform::Ubuntu)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::InstallFailed { reason } if reason.contains("no release archive")));
        assert_eq!(runner.count("curl", Some("-L")), 0);
        assert_eq!(runner.count("sudo", Some("tar")), 0);
        assert!(runner.spawned().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_platforms_run_nothing() {
        let config = test_config();
        let mut health = MockHealthCheck::new();
        health.expect_is_ready().never();

        for platform in [Platform::OtherLinux, Platform::Unsupported] {
            let mut runner = MockCommandRunner::new();
            runner.expect_output().never();
            runner.expect_spawn().never();

            let err = Installer::new(&runner, &health, &config)
                .install(platform)
                .await
                .unwrap_err();
            assert!(matches!(err, BootstrapError::UnsupportedPlatform(p) if p == platform));
        }
    }
}
