//! Configuration management for Folio
//!
//! Every value has a default; `Config::from_env` overrides them from
//! `FOLIO_*` environment variables (the binary loads `.env` first).

use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::document::TEXT_TIMEOUT_SECS;

/// Marker attribute used when the configured one is not a valid name
pub const DEFAULT_INDEX_ATTRIBUTE: &str = "data-search-index";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub navigation: NavigationConfig,
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Match case exactly instead of case-insensitively
    pub case_sensitive: bool,
    /// Distinct pages extracted concurrently during a scan
    pub max_concurrent_extractions: usize,
    /// Per-page extraction timeout
    pub extraction_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    /// Delay between dispatching a jump and emphasizing the target page
    pub settle_delay_ms: u64,
    /// How long the target page stays emphasized
    pub emphasis_ms: u64,
}

/// CSS hooks used when emitting highlight markup
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightConfig {
    /// Overlay class for a match
    pub match_class: String,
    /// Overlay class for the current match
    pub current_class: String,
    /// In-place marker class
    pub marker_class: String,
    /// Extra in-place marker class for the current match
    pub marker_current_class: String,
    /// Data attribute carrying the 1-based match ordinal
    pub index_attribute: String,
    /// Font family when a run does not name one
    pub fallback_font_family: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_concurrent_extractions: 4,
            extraction_timeout_secs: TEXT_TIMEOUT_SECS,
        }
    }
}

impl SearchConfig {
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            emphasis_ms: 2000,
        }
    }
}

impl NavigationConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn emphasis(&self) -> Duration {
        Duration::from_millis(self.emphasis_ms)
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            match_class: "highlight".to_string(),
            current_class: "highlight-current".to_string(),
            marker_class: "search-highlight".to_string(),
            marker_current_class: "search-current".to_string(),
            index_attribute: DEFAULT_INDEX_ATTRIBUTE.to_string(),
            fallback_font_family: "sans-serif".to_string(),
        }
    }
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            search: SearchConfig {
                case_sensitive: parse_var("FOLIO_CASE_SENSITIVE", defaults.search.case_sensitive)?,
                max_concurrent_extractions: parse_var(
                    "FOLIO_MAX_CONCURRENT_EXTRACTIONS",
                    defaults.search.max_concurrent_extractions,
                )?
                .max(1),
                extraction_timeout_secs: parse_var(
                    "FOLIO_EXTRACTION_TIMEOUT_SECS",
                    defaults.search.extraction_timeout_secs,
                )?,
            },
            navigation: NavigationConfig {
                settle_delay_ms: parse_var(
                    "FOLIO_SETTLE_DELAY_MS",
                    defaults.navigation.settle_delay_ms,
                )?,
                emphasis_ms: parse_var("FOLIO_EMPHASIS_MS", defaults.navigation.emphasis_ms)?,
            },
            highlight: defaults.highlight,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
