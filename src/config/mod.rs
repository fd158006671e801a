//! Application configuration

pub mod ui;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use ui::{
    BrandingConfig, ConfigError, RevealConfig, ScrollConfig, SourcesConfig, UiConfig,
};

/// Backend host used when no base URL is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the question-answering backend.
    pub backend_base_url: String,
    /// Directory served under `/pdfs`.
    pub pdf_dir: PathBuf,
    /// Optional TOML file with presentation tunables.
    pub ui_config_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            backend_base_url: env::var("API_URL")
                .or_else(|_| env::var("NEXT_PUBLIC_API_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into()),
            pdf_dir: env::var("PDF_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./public/pdfs")),
            ui_config_path: env::var("JACBOT_UI_CONFIG").ok().map(PathBuf::from),
        })
    }

    /// Override the backend host, e.g. from a command-line argument.
    pub fn with_backend_base_url(mut self, url: impl Into<String>) -> Self {
        self.backend_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load the presentation tunables, falling back to defaults when no file is configured.
    pub fn load_ui(&self) -> Result<UiConfig, ConfigError> {
        match &self.ui_config_path {
            Some(path) => UiConfig::from_file(path),
            None => Ok(UiConfig::default()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            backend_base_url: DEFAULT_BACKEND_URL.into(),
            pdf_dir: PathBuf::from("./public/pdfs"),
            ui_config_path: None,
        }
    }
}
