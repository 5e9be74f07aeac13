use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use inkcalc_core::{CalcError, VisionModel};
use inkcalc_logging::LogOptions;
use inkcalc_understanding::vision::DEFAULT_GEMINI_MODEL;
use inkcalc_understanding::GeminiVision;

/// InkCalc runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Gemini API key
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Override for the Gemini API base URL
    pub gemini_base_url: Option<String>,
    /// Deployment environment ("dev" enables development mode)
    pub env: Option<String>,
    /// Log level
    pub log_level: String,
    /// Directory for rolling NDJSON logs
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8900,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: None,
            env: None,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let env = lookup("ENV").filter(|v| !v.is_empty());
        let dev = env.as_deref() == Some("dev");
        Self {
            bind_address: lookup("SERVER_URL").unwrap_or(defaults.bind_address),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: lookup("GEMINI_BASE_URL"),
            log_level: lookup("RUST_LOG")
                .unwrap_or_else(|| if dev { "debug" } else { "info" }.to_string()),
            log_dir: lookup("INKCALC_LOG_DIR").map(PathBuf::from),
            env,
        }
    }

    /// Development mode: verbose, human-readable logs.
    pub fn is_dev(&self) -> bool {
        self.env.as_deref() == Some("dev")
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: self.log_level.clone(),
            json: !self.is_dev(),
            log_dir: self.log_dir.clone(),
        }
    }

    /// Build the shared vision model client. Requires `GEMINI_API_KEY`.
    pub fn vision_model(&self) -> Result<Arc<dyn VisionModel>, CalcError> {
        let api_key = self
            .gemini_api_key
            .as_ref()
            .ok_or_else(|| CalcError::Config("GEMINI_API_KEY is not set".into()))?;

        let mut vision = GeminiVision::new(api_key).with_model(&self.gemini_model);
        if let Some(url) = &self.gemini_base_url {
            vision = vision.with_base_url(url);
        }
        Ok(Arc::new(vision))
    }
}
