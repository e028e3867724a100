//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `dashboard.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - FeedConfig: Where the thingspeak feed lives (base url, channel).
//!     - PollingConfig: Optional scheduled refresh (0 = manual only).
//!     - ServerConfig: Dashboard bind address.
//!     - LoggingConfig: Log level and per-row logging.
//!     - NormalizationConfig: Strict or lenient handling of bad fields.
//!
//!     every section is optional; a missing section takes its defaults.
//!
//! ==============================================================================

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::feed::{DEFAULT_BASE_URL, DEFAULT_CHANNEL_ID};
use crate::normalize::NormalizePolicy;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub feed: FeedConfig,
    pub polling: PollingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub normalization: NormalizationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub channel_id: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), channel_id: DEFAULT_CHANNEL_ID }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PollingConfig {
    /// scheduled refresh period; 0 leaves refresh manual
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// log every held row after a refresh
    pub show_rows: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_rows: true }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NormalizationConfig {
    pub policy: NormalizePolicy,
}

impl DashboardConfig {
    /// read and parse one dashboard.toml
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Load the first config file found, or defaults when there is none
    ///
    /// a file that exists but does not parse is an error rather than a
    /// silent fallback. returns the path that was used, if any.
    pub fn load_or_default() -> anyhow::Result<(Self, Option<PathBuf>)> {
        let paths = [
            PathBuf::from("config").join("dashboard.toml"),
            PathBuf::from("..").join("config").join("dashboard.toml"),
        ];

        for path in paths {
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(
            base_url = %self.feed.base_url,
            channel_id = self.feed.channel_id,
            policy = ?self.normalization.policy,
            interval_seconds = self.polling.interval_seconds,
            bind = %self.server.bind,
            level = %self.logging.level,
            "dashboard configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_takes_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.feed.base_url, "https://api.thingspeak.com");
        assert_eq!(config.feed.channel_id, 1596152);
        assert_eq!(config.polling.interval_seconds, 0);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.normalization.policy, NormalizePolicy::Strict);
    }

    #[test]
    fn partial_sections_override_only_what_they_name() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [feed]
            base_url = "http://mirror.local"

            [polling]
            interval_seconds = 60

            [normalization]
            policy = "lenient"
            "#,
        )
        .unwrap();
        assert_eq!(config.feed.base_url, "http://mirror.local");
        assert_eq!(config.feed.channel_id, 1596152);
        assert_eq!(config.polling.interval_seconds, 60);
        assert_eq!(config.normalization.policy, NormalizePolicy::Lenient);
        assert!(config.logging.show_rows);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let parsed: Result<DashboardConfig, _> = toml::from_str("[normalization]\npolicy = \"sloppy\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = DashboardConfig::load("does/not/exist.toml").unwrap_err();
        assert_eq!(err.to_string(), "reading config file does/not/exist.toml");
    }

    #[test]
    fn load_names_file_that_fails_to_parse() {
        let path = std::env::temp_dir().join(format!("airq-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[polling]\ninterval_seconds = \"soon\"").unwrap();
        let err = DashboardConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().starts_with("parsing config file"));
    }
}
