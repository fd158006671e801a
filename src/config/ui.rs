//! Presentation tunables loaded from TOML files
//!
//! Every deployment of the chat surface can adjust:
//! - How fast assistant answers are revealed
//! - When the transcript counts as "scrolled to the bottom"
//! - Which sources are listed and how they link to documents
//! - Branding labels and the answer disclaimer
//!
//! # Example
//!
//! ```toml
//! [reveal]
//! speed_ms = 300
//! initial_delay_ms = 500
//!
//! [scroll]
//! bottom_tolerance_px = 50.0
//!
//! [branding]
//! bot_name = "NDMC BOT"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root presentation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Progressive answer reveal
    #[serde(default)]
    pub reveal: RevealConfig,

    /// Auto-scroll arbitration
    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Citation source display
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Labels and disclaimer
    #[serde(default)]
    pub branding: BrandingConfig,
}

impl UiConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: UiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the reveal and scroll machinery cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reveal.speed_ms == 0 {
            return Err(ConfigError::Validation(
                "reveal.speed_ms must be greater than zero".into(),
            ));
        }
        if !(self.scroll.bottom_tolerance_px >= 0.0) {
            return Err(ConfigError::Validation(
                "scroll.bottom_tolerance_px must not be negative".into(),
            ));
        }
        for (name, value) in [
            ("sources.min_relevance", self.sources.min_relevance),
            ("sources.high_relevance", self.sources.high_relevance),
            ("sources.medium_relevance", self.sources.medium_relevance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Reveal timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Interval between two revealed lines
    #[serde(default = "default_speed_ms")]
    pub speed_ms: u64,

    /// Pause before the first line appears
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Show a cursor after the last revealed line while revealing
    #[serde(default = "default_true")]
    pub cursor: bool,

    #[serde(default = "default_cursor_char")]
    pub cursor_char: String,
}

fn default_speed_ms() -> u64 {
    300
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_cursor_char() -> String {
    "▋".to_string()
}

fn default_true() -> bool {
    true
}

impl RevealConfig {
    pub fn speed(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            speed_ms: default_speed_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            cursor: true,
            cursor_char: default_cursor_char(),
        }
    }
}

/// Auto-scroll settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Distance from the bottom (in pixels or rows) still treated as "at bottom"
    #[serde(default = "default_tolerance")]
    pub bottom_tolerance_px: f64,

    /// Delay before scrolling to a new user message
    #[serde(default = "default_user_delay_ms")]
    pub user_delay_ms: u64,

    /// Delay before scrolling to a new assistant message
    #[serde(default = "default_assistant_delay_ms")]
    pub assistant_delay_ms: u64,

    /// Request smooth scrolling from the viewport
    #[serde(default = "default_true")]
    pub smooth: bool,
}

fn default_tolerance() -> f64 {
    50.0
}

fn default_user_delay_ms() -> u64 {
    100
}

fn default_assistant_delay_ms() -> u64 {
    800
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            bottom_tolerance_px: default_tolerance(),
            user_delay_ms: default_user_delay_ms(),
            assistant_delay_ms: default_assistant_delay_ms(),
            smooth: true,
        }
    }
}

/// Source listing and citation links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Sources below this relevance are not listed
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    /// Relevance above which a source is highlighted as a strong match
    #[serde(default = "default_high_relevance")]
    pub high_relevance: f64,

    /// Relevance above which a source is shown as a fair match
    #[serde(default = "default_medium_relevance")]
    pub medium_relevance: f64,

    /// URL path under which source documents are served
    #[serde(default = "default_pdf_base_path")]
    pub pdf_base_path: String,

    /// Extension appended to identifiers that have none
    #[serde(default = "default_extension")]
    pub default_extension: String,
}

fn default_min_relevance() -> f64 {
    0.5
}

fn default_high_relevance() -> f64 {
    0.7
}

fn default_medium_relevance() -> f64 {
    0.4
}

fn default_pdf_base_path() -> String {
    "/pdfs".to_string()
}

fn default_extension() -> String {
    "pdf".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            min_relevance: default_min_relevance(),
            high_relevance: default_high_relevance(),
            medium_relevance: default_medium_relevance(),
            pdf_base_path: default_pdf_base_path(),
            default_extension: default_extension(),
        }
    }
}

/// Labels shown around messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    #[serde(default = "default_user_label")]
    pub user_label: String,

    /// Notice attached below every assistant answer
    #[serde(default = "default_disclaimer")]
    pub disclaimer: Option<String>,

    /// Official portal linked from the disclaimer
    #[serde(default = "default_disclaimer_url")]
    pub disclaimer_url: Option<String>,
}

fn default_bot_name() -> String {
    "JAC BOT".to_string()
}

fn default_user_label() -> String {
    "You".to_string()
}

fn default_disclaimer() -> Option<String> {
    Some(
        "Information displayed may not reflect the most current data. \
         For official and up-to-date information, please visit the official portal directly."
            .to_string(),
    )
}

fn default_disclaimer_url() -> Option<String> {
    Some("https://jacchd.admissions.nic.in/".to_string())
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            user_label: default_user_label(),
            disclaimer: default_disclaimer(),
            disclaimer_url: default_disclaimer_url(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
