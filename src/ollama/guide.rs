use colored::Colorize;

use super::Platform;
use crate::constants::{DOCS_URL, MANUAL_INSTALL_URL};

/// Manual installation steps for a platform
pub fn manual_install_steps(platform: Platform) -> Vec<String> {
    match platform {
        Platform::MacOs => vec![
            "[INSTALL] macOS: brew install ollama".to_string(),
            format!("[DOWNLOAD] Download: {}/mac", MANUAL_INSTALL_URL),
        ],
        Platform::Ubuntu | Platform::OtherLinux => vec![
            "[INSTALL] Linux: curl -fsSL https://ollama.com/install.sh | sh".to_string(),
            format!("[DOWNLOAD] Manual install: {}", DOCS_URL),
        ],
        Platform::Unsupported => vec![format!("[DOWNLOAD] Download: {}", MANUAL_INSTALL_URL)],
    }
}

/// Print installation guidance after automatic installation was not possible
pub fn print_manual_install(platform: Platform) {
    println!("{}", "Please install Ollama manually:".yellow());
    for step in manual_install_steps(platform) {
        println!("   {}", step);
    }
    println!("Then run smolrun again.");
}
