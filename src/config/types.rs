//! Configuration types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::DetectorConfig;
use crate::notification::{Destination, DEFAULT_SERVER};

use super::loader::ConfigError;

/// Interview mode. Only `red` has triggers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Red,
    Ops,
}

impl Mode {
    /// Returns the lowercase mode name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Ops => "ops",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NtfyConfig {
    /// Topic notifications are posted to.
    pub topic: String,
    /// ntfy server base URL.
    pub server: String,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            server: DEFAULT_SERVER.to_string(),
        }
    }
}

/// Statistics tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Database path, defaults to the user data directory.
    pub database: Option<PathBuf>,
}

/// Notifier configuration, from file and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotifierConfig {
    /// Your IRC nick.
    pub nick: String,
    pub bot_nicks: Vec<String>,
    /// Only honour interview and kick triggers from bots.
    pub check_bot_nicks: bool,
    /// Directories holding IRC logs, one channel each.
    pub log_dirs: Vec<PathBuf>,
    pub mode: Mode,
    /// Seconds between two notifications of one non-critical category.
    pub rate_limit_secs: u64,
    /// Append-only record of every accepted notification.
    pub notification_log: Option<PathBuf>,
    pub ntfy: NtfyConfig,
    pub analytics: AnalyticsConfig,
    /// Send an anonymous start-up ping.
    pub telemetry: bool,
    pub scan_interval_ms: u64,
    pub tail_interval_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            nick: String::new(),
            bot_nicks: vec!["Gatekeeper".to_string()],
            check_bot_nicks: true,
            log_dirs: Vec::new(),
            mode: Mode::default(),
            rate_limit_secs: 60,
            notification_log: None,
            ntfy: NtfyConfig::default(),
            analytics: AnalyticsConfig::default(),
            telemetry: false,
            scan_interval_ms: 500,
            tail_interval_ms: 100,
        }
    }
}

impl NotifierConfig {
    /// Check the configuration is complete and supported.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nick.trim().is_empty() {
            return Err(ConfigError::MissingField("nick"));
        }
        if self.ntfy.topic.trim().is_empty() {
            return Err(ConfigError::MissingField("ntfy.topic"));
        }
        if self.log_dirs.is_empty() {
            return Err(ConfigError::MissingField("log_dirs"));
        }
        if self.bot_nicks.iter().all(|nick| nick.trim().is_empty()) {
            return Err(ConfigError::MissingField("bot_nicks"));
        }
        if self.mode != Mode::Red {
            return Err(ConfigError::UnsupportedMode(self.mode));
        }
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.tail_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tail_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Detector settings.
    #[must_use]
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            nick: self.nick.clone(),
            bot_nicks: self.bot_nicks.clone(),
            check_bot_nicks: self.check_bot_nicks,
        }
    }

    /// Default notification destination.
    #[must_use]
    pub fn destination(&self) -> Destination {
        Destination::new(self.ntfy.server.clone(), self.ntfy.topic.clone())
    }

    #[must_use]
    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    #[must_use]
    pub fn tail_interval(&self) -> Duration {
        Duration::from_millis(self.tail_interval_ms)
    }
}
