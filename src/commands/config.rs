use super::ConfigAction;
use crate::error::Result;
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;
use std::path::PathBuf;

/// Manager for `--config` if given, otherwise the platform default
pub fn config_manager(path: Option<PathBuf>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

/// Load configuration, falling back to defaults when no file exists
pub fn load_config(manager: &ConfigManager) -> Result<AppConfig> {
    manager.load()
}

/// Run a `config` subcommand and return what should be printed
pub fn run(manager: &ConfigManager, action: ConfigAction) -> Result<String> {
    match action {
        ConfigAction::Show => Ok(serde_json::to_string_pretty(&manager.load()?)?),
        ConfigAction::Path => Ok(manager.config_file_path().display().to_string()),
        ConfigAction::Init => {
            let path = manager.config_file_path().display();
            if manager.init()? {
                tracing::info!(path = %path, "config file written");
                Ok(format!("Wrote default config to {}", path))
            } else {
                Ok(format!("Config already exists at {}", path))
            }
        }
    }
}
