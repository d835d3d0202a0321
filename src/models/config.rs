use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Recognition locale used when none is configured (Russian traineddata)
pub const DEFAULT_LANGUAGE: &str = "rus";

/// Address of the local OCR server
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:39835";

/// OCR engine backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// OCR server reached over HTTP
    Http,
    /// In-process Tesseract (requires the `tesseract` feature)
    Tesseract,
}

impl Default for EngineBackend {
    fn default() -> Self {
        Self::Http
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub backend: EngineBackend,
    pub server_url: String,
    pub timeout_secs: u64,
    /// Directory holding `*.traineddata`; system default when unset
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::Http,
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: 30,
            tessdata_dir: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` wins when set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub language: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reject settings no engine could start with
    pub fn validate(&self) -> Result<(), String> {
        if self.language.trim().is_empty() {
            return Err("Language code must not be empty".to_string());
        }

        if self.engine.timeout_secs == 0 {
            return Err("Engine timeout must be at least one second".to_string());
        }

        if self.engine.backend == EngineBackend::Http {
            reqwest::Url::parse(&self.engine.server_url)
                .map_err(|e| format!("Invalid server URL '{}': {}", self.engine.server_url, e))?;
        }

        Ok(())
    }
}
