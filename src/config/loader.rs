//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::types::{Mode, NotifierConfig};

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
    /// The single path was given by the user and must exist.
    explicit: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .interview-notify.toml
        search_paths.push(PathBuf::from(".interview-notify.toml"));

        // 2. User config directory: ~/.config/interview-notify/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("interview-notify").join("config.toml"));
        }

        Self {
            search_paths,
            explicit: false,
        }
    }

    /// Create a config loader for a file the user named. The file must exist.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
            explicit: true,
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// an explicitly named file cannot be read.
    pub fn load(&self) -> Result<NotifierConfig, ConfigError> {
        if self.explicit {
            if let Some(path) = self.search_paths.first() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(NotifierConfig::default())
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &Path) -> Result<NotifierConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("\"{0}\" mode not implemented")]
    UnsupportedMode(Mode),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_loader_default_paths() {
        let loader = ConfigLoader::new();
        assert!(!loader.search_paths().is_empty());
        assert!(loader.search_paths()[0].ends_with(".interview-notify.toml"));
    }

    #[test]
    fn test_config_loader_returns_defaults_when_no_file() {
        let loader = ConfigLoader {
            search_paths: vec![PathBuf::from("/nonexistent/path.toml")],
            explicit: false,
        };
        let config = loader.load().unwrap();
        assert_eq!(config, NotifierConfig::default());
        assert!(loader.find_config_file().is_none());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        let err = loader.load().unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::ReadError { path, source }
                if path == &PathBuf::from("/nonexistent/path.toml")
                    && source.kind() == std::io::ErrorKind::NotFound
        ));
        assert!(err.to_string().contains("/nonexistent/path.toml"));
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            nick = "alice"
            bot_nicks = ["Gatekeeper", "Doorman"]
            check_bot_nicks = false
            log_dirs = ["/irc/#red-invites"]
            rate_limit_secs = 30
            notification_log = "/tmp/notify.log"
            telemetry = true

            [ntfy]
            topic = "alice-alerts"

            [analytics]
            enabled = true
        "#;

        let config: NotifierConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.nick, "alice");
        assert_eq!(config.bot_nicks.len(), 2);
        assert!(!config.check_bot_nicks);
        assert_eq!(config.log_dirs, vec![PathBuf::from("/irc/#red-invites")]);
        assert_eq!(config.rate_limit_secs, 30);
        assert_eq!(config.notification_log, Some(PathBuf::from("/tmp/notify.log")));
        assert!(config.telemetry);
        assert_eq!(config.ntfy.topic, "alice-alerts");
        assert_eq!(config.ntfy.server, "https://ntfy.sh/");
        assert!(config.analytics.enabled);
        assert!(config.analytics.database.is_none());
        assert_eq!(config.mode, Mode::Red);
    }

    #[test]
    fn test_parse_mode() {
        let config: NotifierConfig = toml::from_str(r#"mode = "ops""#).unwrap();
        assert_eq!(config.mode, Mode::Ops);
        assert!(toml::from_str::<NotifierConfig>(r#"mode = "blue""#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "nick = \"bob\"").unwrap();

        let config = ConfigLoader::with_path(file.path().to_path_buf())
            .load()
            .unwrap();
        assert_eq!(config.nick, "bob");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "nick = [").unwrap();

        let result = ConfigLoader::with_path(file.path().to_path_buf()).load();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
