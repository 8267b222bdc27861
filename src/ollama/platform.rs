use std::fmt;
use std::path::Path;
use tracing::debug;

/// Installation target selected from the host operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Ubuntu,
    OtherLinux,
    Unsupported,
}

impl Platform {
    /// Detect the platform of the running host
    pub fn detect(os_release_path: &Path) -> Self {
        Self::detect_for(std::env::consts::OS, os_release_path)
    }

    /// Detect the platform for `os`, reading the release file only on Linux
    pub fn detect_for(os: &str, os_release_path: &Path) -> Self {
        let release_info = if os == "linux" {
            match std::fs::read_to_string(os_release_path) {
                Ok(contents) => Some(contents),
                Err(e) => {
                    debug!("Cannot read {}: {}", os_release_path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        Self::classify(os, release_info.as_deref())
    }

    /// Pure classification from an OS identifier and optional release info
    pub fn classify(os: &str, release_info: Option<&str>) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" => match release_info {
                Some(info) if info.to_lowercase().contains("ubuntu") => Platform::Ubuntu,
                _ => Platform::OtherLinux,
            },
            _ => Platform::Unsupported,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::MacOs => "macOS",
            Platform::Ubuntu => "Ubuntu",
            Platform::OtherLinux => "this Linux distribution",
            Platform::Unsupported => "this operating system",
        };
        f.write_str(name)
    }
}
