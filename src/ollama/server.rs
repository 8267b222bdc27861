use async_trait::async_trait;
use colored::Colorize;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::app::{RuntimeConfig, ServerConfig};
use crate::constants::{HEALTH_ENDPOINT, HEALTH_REQUEST_TIMEOUT_MS};
use crate::process::{CommandRunner, CommandSpec, ProcessHandle, ProcessState, StdioMode};
use crate::utils::BootstrapError;

/// Readiness check for the runtime's HTTP service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn is_ready(&self) -> bool;
}

/// Checks `GET <base_url>/api/version`
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    url: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

impl HttpHealthCheck {
    pub fn new(base_url: &str) -> Self {
        Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), HEALTH_ENDPOINT),
            timeout: Duration::from_millis(HEALTH_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self) -> Option<reqwest::Response> {
        let client = match reqwest::Client::builder().timeout(self.timeout).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Cannot build HTTP client: {}", e);
                return None;
            }
        };

        match client.get(&self.url).send().await {
            Ok(resp) => Some(resp),
            Err(e) => {
                debug!("{} unreachable: {}", self.url, e);
                None
            }
        }
    }

    /// Version reported by a running server
    pub async fn version(&self) -> Option<String> {
        let resp = self.get().await?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<VersionResponse>()
            .await
            .ok()
            .map(|body| body.version)
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn is_ready(&self) -> bool {
        match self.get().await {
            Some(resp) => resp.status().is_success(),
            None => false,
        }
    }
}

/// Start `<runtime> serve` and wait until the service answers
///
/// The child is told to listen on the configured address, the same one the
/// health check looks. Returns `None` when a server was already reachable
/// and nothing was spawned.
pub async fn start_server(
    runner: &dyn CommandRunner,
    health: &dyn HealthCheck,
    runtime: &RuntimeConfig,
    settings: &ServerConfig,
) -> Result<Option<ProcessHandle>, BootstrapError> {
    if health.is_ready().await {
        info!("Runtime server already running");
        return Ok(None);
    }

    println!(
        "[SERVER] Starting `{} serve` on {}...",
        runtime.binary,
        runtime.listen_address()
    );
    let spec = CommandSpec::new(&runtime.binary)
        .arg("serve")
        .env("OLLAMA_HOST", runtime.listen_address())
        .stdio(StdioMode::Discard);
    let mut handle = runner.spawn(&spec).await?;

    wait_until_ready(&mut handle, health, settings).await?;
    println!("{}", "[OK] Runtime server is ready".green());
    Ok(Some(handle))
}

async fn wait_until_ready(
    handle: &mut ProcessHandle,
    health: &dyn HealthCheck,
    settings: &ServerConfig,
) -> Result<(), BootstrapError> {
    let interval = Duration::from_millis(settings.check_interval_ms);

    for attempt in 1..=settings.startup_attempts {
        tokio::time::sleep(interval).await;

        if health.is_ready().await {
            debug!("{} ready after {} checks", handle.label(), attempt);
            return Ok(());
        }
        let state = match handle.state() {
            Ok(state) => state,
            Err(e) => {
                if let Err(kill_err) = handle.terminate().await {
                    warn!("Failed to stop {}: {}", handle.label(), kill_err);
                }
                return Err(BootstrapError::IoError(e));
            }
        };
        if let ProcessState::Exited(code) = state {
            return Err(BootstrapError::ServerExited { code });
        }
        debug!(
            "{} not ready ({}/{})",
            handle.label(),
            attempt,
            settings.startup_attempts
        );
    }

    handle.terminate().await?;
    Err(BootstrapError::ServerNotReady {
        attempts: settings.startup_attempts,
    })
}

/// Make sure the service is reachable before talking to it
pub async fn ensure_server(
    runner: &dyn CommandRunner,
    health: &dyn HealthCheck,
    runtime: &RuntimeConfig,
    settings: &ServerConfig,
) -> Result<Option<ProcessHandle>, BootstrapError> {
    if settings.auto_start {
        return start_server(runner, health, runtime, settings).await;
    }

    if !health.is_ready().await {
        warn!("Runtime server is not reachable and auto start is disabled");
        println!(
            "[WARNING] The {} server is not running at {}. Start it with: {} serve",
            runtime.binary,
            runtime.base_url(),
            runtime.binary
        );
    }
    Ok(None)
}
