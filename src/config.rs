//! Host configuration.
//!
//! Loaded from `config.toml` in the platform config directory:
//!
//! ```toml
//! addon_dir = "/usr/share/addonhost/addon"
//! module_dir = "/usr/lib/addonhost"
//! ui = "kimpanel"
//! log_level = "debug"
//! ```

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Addon host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory scanned for addon descriptors
    pub addon_dir: PathBuf,
    /// Directory for resolving relative addon library paths
    pub module_dir: Option<PathBuf>,
    /// Preferred UI addon; overrides the UI addons' own enabled flags
    pub ui: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            addon_dir: config_dir().join("addon"),
            module_dir: None,
            ui: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded host config");
        Ok(config)
    }

    /// Load the default config file, or defaults if it does not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Path of the default config file.
    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE_NAME)
    }
}

/// Platform config directory for the host, or `.addonhost` if none exists.
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("", "", "addonhost")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".addonhost"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = HostConfig::default();
        assert!(config.addon_dir.ends_with("addon"));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.ui.is_none());
        assert!(config.module_dir.is_none());
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "ui = \"kimpanel\"\n").unwrap();

        let config = HostConfig::load(&path).unwrap();
        assert_eq!(config.ui.as_deref(), Some("kimpanel"));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.addon_dir.ends_with("addon"));
    }

    #[test]
    fn load_full_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "addon_dir = \"/srv/addon\"\nmodule_dir = \"/srv/lib\"\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let config = HostConfig::load(&path).unwrap();
        assert_eq!(config.addon_dir, PathBuf::from("/srv/addon"));
        assert_eq!(config.module_dir, Some(PathBuf::from("/srv/lib")));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn load_reports_bad_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "ui = [").unwrap();
        let err = HostConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = HostConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
