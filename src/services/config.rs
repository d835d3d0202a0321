use crate::error::{OcrError, Result};
use crate::models::config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ocr-reader";
const CONFIG_FILE: &str = "config.json";

/// Configuration manager for reader settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the platform config directory
    ///
    /// The directory itself is only created on `save`.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| OcrError::Config("failed to determine config directory".to_string()))?
            .join(APP_DIR);

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            config_dir,
        })
    }

    /// Manager for an explicit config file, e.g. from `--config`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            config_dir,
            config_path,
        }
    }

    /// Save configuration to disk
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        config.validate().map_err(OcrError::Config)?;

        if !self.config_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.config_dir)?;
        }

        // Pretty print, the file is meant to be edited by hand
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json)?;

        tracing::debug!(path = %self.config_path.display(), "config saved");
        Ok(())
    }

    /// Load configuration from disk
    ///
    /// A missing file yields the defaults. A file that parses but fails
    /// validation is rejected.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.config_exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            OcrError::Config(format!(
                "failed to parse {}: {}",
                self.config_path.display(),
                e
            ))
        })?;
        config.validate().map_err(OcrError::Config)?;

        Ok(config)
    }

    /// Write the defaults unless a config file already exists
    ///
    /// Returns whether a file was written.
    pub fn init(&self) -> Result<bool> {
        if self.config_exists() {
            return Ok(false);
        }
        self.save(&AppConfig::default())?;
        Ok(true)
    }

    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
