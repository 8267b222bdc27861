use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    ARCHIVE_EXTRACT_DIR, ARCHIVE_URL_PREFIX, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST,
    DEFAULT_OLLAMA_PORT, HOMEBREW_FORMULA, INSTALL_SCRIPT_URL, OS_RELEASE_PATH, RUNTIME_BINARY,
    SERVER_CHECK_INTERVAL_MS, SERVER_MAX_STARTUP_ATTEMPTS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model to pull and run
    #[serde(default)]
    pub model: ModelConfig,

    /// Runtime binary and service address
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Installation sources
    #[serde(default)]
    pub install: InstallConfig,

    /// Background server supervision
    #[serde(default)]
    pub server: ServerConfig,
}

/// Model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier passed to `pull` and `run`
    pub name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Executable name or path of the runtime
    pub binary: String,
    /// Host the runtime's HTTP service listens on
    pub host: String,
    /// Port the runtime's HTTP service listens on
    pub port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_ollama_host(std::env::var("OLLAMA_HOST").ok().as_deref())
    }
}

impl RuntimeConfig {
    /// Defaults that agree with the address `ollama serve` picks from `OLLAMA_HOST`
    pub fn from_ollama_host(ollama_host: Option<&str>) -> Self {
        let (host, port) = match ollama_host {
            Some(value) if !value.trim().is_empty() => parse_ollama_host(value),
            _ => (DEFAULT_OLLAMA_HOST.to_string(), DEFAULT_OLLAMA_PORT),
        };
        Self {
            binary: RUNTIME_BINARY.to_string(),
            host,
            port,
        }
    }

    /// Address the server is told to listen on, in `OLLAMA_HOST` form
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL clients use to reach the server
    pub fn base_url(&self) -> String {
        // A wildcard bind is reachable through loopback
        let host = match self.host.as_str() {
            "0.0.0.0" | "[::]" => DEFAULT_OLLAMA_HOST,
            host => host,
        };
        format!("http://{}:{}", host, self.port)
    }
}

/// Split an `OLLAMA_HOST` value (`host`, `host:port`, `http://host:port/`) into host and port
fn parse_ollama_host(value: &str) -> (String, u16) {
    let value = value.trim();
    let value = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"))
        .unwrap_or(value)
        .trim_end_matches('/');

    let (host, port) = match value.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, port),
            Err(_) => (value, DEFAULT_OLLAMA_PORT),
        },
        None => (value, DEFAULT_OLLAMA_PORT),
    };

    let host = if host.is_empty() { DEFAULT_OLLAMA_HOST } else { host };
    (host.to_string(), port)
}

/// Installation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Homebrew formula installed on macOS
    pub homebrew_formula: String,
    /// Remote install script piped to `sh` on Ubuntu
    pub script_url: String,
    /// Binary archive used when the install script fails; `None` when no
    /// release archive exists for this architecture
    pub archive_url: Option<String>,
    /// Where the archive is downloaded to (left on disk)
    pub archive_file: PathBuf,
    /// Directory the archive is extracted into
    pub extract_dir: PathBuf,
    /// Release-info file used to identify the Linux distribution
    pub os_release_path: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        let arch = archive_arch(std::env::consts::ARCH);
        Self {
            homebrew_formula: HOMEBREW_FORMULA.to_string(),
            script_url: INSTALL_SCRIPT_URL.to_string(),
            archive_url: arch.map(|arch| format!("{}{}.tgz", ARCHIVE_URL_PREFIX, arch)),
            archive_file: PathBuf::from(format!("ollama-linux-{}.tgz", arch.unwrap_or("unknown"))),
            extract_dir: PathBuf::from(ARCHIVE_EXTRACT_DIR),
            os_release_path: PathBuf::from(OS_RELEASE_PATH),
        }
    }
}

/// Map a Rust target architecture onto the naming used by release archives
fn archive_arch(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("amd64"),
        "aarch64" => Some("arm64"),
        _ => None,
    }
}

/// Server supervision configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Start `serve` before pulling when the service is not reachable
    pub auto_start: bool,
    /// Readiness checks before giving up on a started server
    pub startup_attempts: usize,
    /// Delay between readiness checks
    pub check_interval_ms: u64,
    /// Terminate a server started by this run when the run ends
    pub stop_on_exit: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            startup_attempts: SERVER_MAX_STARTUP_ATTEMPTS,
            check_interval_ms: SERVER_CHECK_INTERVAL_MS,
            stop_on_exit: false,
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    layered(&config_files())
        .merge(Env::prefixed("SMOLRUN_").split("__"))
        .extract()
        .context("Failed to load configuration")
}

/// Load configuration from a single explicit file
pub fn load_config_file(path: &Path) -> Result<Config> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&toml_str)
        .with_context(|| format!("Failed to parse config from {}", path.display()))
}

/// Global then local config file locations, in merge order
pub fn config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(config_dir) = get_config_dir() {
        files.push(config_dir.join("config.toml"));
    }
    files.push(PathBuf::from(".smolrun/config.toml"));
    files
}

/// Files that actually contributed to the configuration in use
///
/// An explicit `--config` file replaces the file layers entirely.
pub fn loaded_config_files(explicit: Option<&Path>, candidates: &[PathBuf]) -> Vec<PathBuf> {
    match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => candidates.iter().filter(|file| file.exists()).cloned().collect(),
    }
}

/// Defaults overlaid by every existing file, later files winning
fn layered(files: &[PathBuf]) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }
    figment
}

/// Get the configuration directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "smolrun") {
        Some(proj_dirs.config_dir().to_path_buf())
    } else {
        // Fallback to home directory
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(|home| PathBuf::from(home).join(".config").join("smolrun"))
    }
}
