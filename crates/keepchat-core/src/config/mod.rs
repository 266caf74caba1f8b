use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{defaults, endpoints};

/// Persisted client configuration (`config.toml`).
///
/// Keys this version does not know about are kept in `extra` and written back
/// unchanged, so a newer release can add settings without an older one
/// dropping them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default, alias = "last_model", skip_serializing_if = "Option::is_none")]
    pub last_used_model: Option<String>,
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,
    #[serde(default = "default_stream_responses")]
    pub stream_responses: bool,
    #[serde(default = "default_confirm_clear")]
    pub confirm_clear: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

fn default_max_history_length() -> usize {
    defaults::MAX_HISTORY_LENGTH
}

fn default_stream_responses() -> bool {
    defaults::STREAM_RESPONSES
}

fn default_confirm_clear() -> bool {
    defaults::CONFIRM_CLEAR
}

fn default_request_timeout_secs() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_used_model: None,
            max_history_length: defaults::MAX_HISTORY_LENGTH,
            stream_responses: defaults::STREAM_RESPONSES,
            confirm_clear: defaults::CONFIRM_CLEAR,
            ollama_url: None,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            created_at: None,
            extra: toml::Table::new(),
        }
    }
}

impl Config {
    /// Defaults stamped with a creation time, as written on first run.
    pub fn initial() -> Self {
        Self {
            created_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url
            .as_deref()
            .unwrap_or(endpoints::OLLAMA_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Replace out-of-range values with defaults. Returns a description of
    /// each correction.
    pub fn normalize(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();
        if self.max_history_length == 0 {
            self.max_history_length = defaults::MAX_HISTORY_LENGTH;
            fixes.push(format!(
                "max_history_length must be greater than 0, using {}",
                defaults::MAX_HISTORY_LENGTH
            ));
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = defaults::REQUEST_TIMEOUT_SECS;
            fixes.push(format!(
                "request_timeout_secs must be greater than 0, using {}",
                defaults::REQUEST_TIMEOUT_SECS
            ));
        }
        if let Some(model) = &self.last_used_model {
            if model.trim().is_empty() {
                self.last_used_model = None;
            }
        }
        fixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_history_length, 100);
        assert!(config.last_used_model.is_none());
        assert!(config.stream_responses);
        assert!(config.confirm_clear);
        assert_eq!(config.ollama_url(), "http://localhost:11434");
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = toml::from_str("last_used_model = \"llama3\"").unwrap();
        assert_eq!(config.last_used_model.as_deref(), Some("llama3"));
        assert_eq!(config.max_history_length, 100);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_last_model_alias() {
        let config: Config = toml::from_str("last_model = \"mistral\"").unwrap();
        assert_eq!(config.last_used_model.as_deref(), Some("mistral"));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let source = "max_history_length = 20\ntheme = \"dark\"\n\n[ui]\nwrap = true\n";
        let config: Config = toml::from_str(source).unwrap();
        assert_eq!(config.extra.get("theme").and_then(|v| v.as_str()), Some("dark"));

        let written = toml::to_string_pretty(&config).unwrap();
        let reloaded: Config = toml::from_str(&written).unwrap();
        assert_eq!(reloaded, config);
        assert_eq!(
            reloaded.extra["ui"].get("wrap").and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn test_normalize_rejects_zero_history() {
        let mut config = Config {
            max_history_length: 0,
            last_used_model: Some("  ".into()),
            ..Config::default()
        };
        let fixes = config.normalize();
        assert_eq!(fixes.len(), 1);
        assert_eq!(config.max_history_length, 100);
        assert!(config.last_used_model.is_none());
    }
}
