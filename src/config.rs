//! Configuration file parser for ~/.config/sample-grid/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde but logged as a warning, since they are
//! usually typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but is out of range.
    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the dataset server.
    pub server_url: String,

    /// Items per page. Must match the server's page size.
    pub page_size: u32,

    /// Cards per grid row.
    pub columns: usize,

    /// Double-click window in milliseconds.
    pub double_click_ms: u64,

    /// Dataset poll interval in seconds. 0 = never poll.
    pub poll_interval_secs: u64,

    /// Theme variant name ("dark" or "light").
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5151".to_string(),
            page_size: crate::feed::DEFAULT_PAGE_SIZE,
            columns: 4,
            double_click_ms: crate::gesture::DEFAULT_WINDOW.as_millis() as u64,
            poll_interval_secs: 5,
            theme: "dark".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "server_url",
        "page_size",
        "columns",
        "double_click_ms",
        "poll_interval_secs",
        "theme",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Zero page size, columns or window → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            server = %config.server_url,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reject values the grid cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.columns == 0 {
            return Err(ConfigError::Invalid {
                key: "columns",
                reason: "must be at least 1".into(),
            });
        }
        if self.double_click_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "double_click_ms",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn double_click_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.double_click_ms)
    }

    /// `None` when polling is disabled.
    pub fn poll_interval(&self) -> Option<std::time::Duration> {
        (self.poll_interval_secs > 0)
            .then(|| std::time::Duration::from_secs(self.poll_interval_secs))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("sample_grid_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_url, "http://127.0.0.1:5151");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.columns, 4);
        assert_eq!(config.double_click_ms, 300);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.theme, "dark");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/sample_grid_test_nonexistent_config.toml");
        assert_eq!(Config::load(path).unwrap(), Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "columns = 6\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.columns, 6);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.theme, "dark");
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let path = write_config(
            "full",
            r#"
server_url = "http://data.local:8080/grid"
page_size = 50
columns = 3
double_click_ms = 250
poll_interval_secs = 0
theme = "light"
"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.server_url, "http://data.local:8080/grid");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.columns, 3);
        assert_eq!(config.double_click_window().as_millis(), 250);
        assert!(config.poll_interval().is_none());
        assert_eq!(config.theme, "light");
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "theme = \"dark\"\nmystery = 42\n");
        assert_eq!(Config::load(&path).unwrap().theme, "dark");
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "page_size = \"twenty\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        cleanup(&path);
    }

    #[test]
    fn test_zero_values_rejected() {
        for (name, content, key) in [
            ("zero_page", "page_size = 0\n", "page_size"),
            ("zero_cols", "columns = 0\n", "columns"),
            ("zero_window", "double_click_ms = 0\n", "double_click_ms"),
        ] {
            let path = write_config(name, content);
            match Config::load(&path) {
                Err(ConfigError::Invalid { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected Invalid for {key}, got {other:?}"),
            }
            cleanup(&path);
        }
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_poll_interval_enabled_by_default() {
        assert_eq!(
            Config::default().poll_interval(),
            Some(std::time::Duration::from_secs(5))
        );
    }
}
