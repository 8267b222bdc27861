/// Constants module to avoid magic numbers in the codebase

// Runtime
pub const RUNTIME_BINARY: &str = "ollama";
pub const DEFAULT_MODEL: &str = "smollm:135m";
pub const VERSION_FLAG: &str = "--version";

// Network Configuration
pub const DEFAULT_OLLAMA_HOST: &str = "127.0.0.1";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const HEALTH_ENDPOINT: &str = "/api/version";

// Timeouts
pub const HEALTH_REQUEST_TIMEOUT_MS: u64 = 500;
pub const SERVER_CHECK_INTERVAL_MS: u64 = 1000;
pub const SERVER_MAX_STARTUP_ATTEMPTS: usize = 10;

// Installation sources
pub const HOMEBREW_BINARY: &str = "brew";
pub const HOMEBREW_FORMULA: &str = "ollama/tap/ollama";
pub const INSTALL_SCRIPT_URL: &str = "https://ollama.com/install.sh";
pub const ARCHIVE_URL_PREFIX: &str = "https://ollama.com/download/ollama-linux-";
pub const ARCHIVE_EXTRACT_DIR: &str = "/usr";
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

// Manual install documentation
pub const MANUAL_INSTALL_URL: &str = "https://ollama.com/download";
pub const DOCS_URL: &str = "https://github.com/ollama/ollama/blob/main/docs/linux.md";

// Prompt
pub const PROMPT_LABEL: &str = "Please enter your prompt: ";
