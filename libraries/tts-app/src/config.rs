//! Page configuration
//!
//! Injected by the server as a JSON object (`window.config`); every field
//! is optional.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub base_path: String,

    #[serde(default)]
    pub default_voice: String,

    #[serde(default)]
    pub default_rate: i32,

    #[serde(default)]
    pub default_pitch: i32,

    #[serde(default)]
    pub default_format: String,

    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    #[serde(default = "default_char_warning_threshold")]
    pub char_warning_threshold: usize,

    #[serde(default = "default_char_danger_threshold")]
    pub char_danger_threshold: usize,

    #[serde(default = "default_metrics_interval_ms")]
    pub metrics_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            default_voice: String::new(),
            default_rate: 0,
            default_pitch: 0,
            default_format: String::new(),
            search_debounce_ms: default_search_debounce_ms(),
            char_warning_threshold: default_char_warning_threshold(),
            char_danger_threshold: default_char_danger_threshold(),
            metrics_interval_ms: default_metrics_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Parse the injected configuration object
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(AppError::Config(format!(
                "basePath must start with '/', got {:?}",
                self.base_path
            )));
        }

        if self.base_path.ends_with('/') {
            return Err(AppError::Config(
                "basePath must not end with '/'".to_string(),
            ));
        }

        if self.char_warning_threshold >= self.char_danger_threshold {
            return Err(AppError::Config(format!(
                "charWarningThreshold ({}) must be below charDangerThreshold ({})",
                self.char_warning_threshold, self.char_danger_threshold
            )));
        }

        if self.metrics_interval_ms == 0 {
            return Err(AppError::Config(
                "metricsIntervalMs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_search_debounce_ms() -> u64 {
    300
}

fn default_char_warning_threshold() -> usize {
    4000
}

fn default_char_danger_threshold() -> usize {
    4500
}

fn default_metrics_interval_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.char_danger_threshold, 4500);
    }

    #[test]
    fn parses_injected_fields() {
        let config = AppConfig::from_json(
            r#"{"basePath":"/tts","defaultVoice":"en-US-JennyNeural","defaultRate":10,"defaultFormat":"audio-24khz-48kbitrate-mono-mp3"}"#,
        )
        .unwrap();
        assert_eq!(config.base_path, "/tts");
        assert_eq!(config.default_voice, "en-US-JennyNeural");
        assert_eq!(config.default_rate, 10);
        assert_eq!(config.default_pitch, 0);
    }

    #[test]
    fn rejects_bad_base_path() {
        assert!(matches!(
            AppConfig::from_json(r#"{"basePath":"tts"}"#),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"basePath":"/tts/"}"#),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let config = AppConfig {
            char_warning_threshold: 5000,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(AppConfig::from_json("{"), Err(AppError::Json(_))));
    }
}
