//! Configuration management for the skyblock server.
//!
//! The TOML file carries one section per engine component plus `[logging]`.
//! Every field has a default, so an empty or partial file is valid.

use island_engine::{
    EngineConfig, InvitationSettings, IslandSettings, PersistenceSettings, ScoreSettings,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub islands: IslandSettings,
    #[serde(default)]
    pub invitations: InvitationSettings,
    #[serde(default)]
    pub scoring: ScoreSettings,
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration file is written at
    /// `path` and the defaults are returned.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// The engine's view of this configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            islands: self.islands.clone(),
            invitations: self.invitations.clone(),
            scoring: self.scoring.clone(),
            persistence: self.persistence.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.to_engine_config().validate()?;

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LOG_LEVELS:?}",
                &self.logging.level
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.islands.world, "skyblock_world");
        assert_eq!(config.invitations.expiry_secs, 30);
        assert_eq!(config.scoring.interval_ms, 5000);
        assert_eq!(config.persistence.autosave_interval_secs, 300);
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_writes_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path)
            .await
            .expect("default config");
        assert_eq!(config.islands.max_per_row, 10);
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path)
            .await
            .expect("written config parses");
        assert_eq!(reloaded.islands.radius_chunks, config.islands.radius_chunks);
        assert_eq!(reloaded.persistence.data_file, config.persistence.data_file);
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        let toml_content = r#"
[islands]
radius_chunks = 2.0
max_per_row = 4

[scoring.weights]
DIAMOND_BLOCK = 10.0
IRON_BLOCK = 2.5

[persistence]
data_file = "data/islands.json"
allow_empty_on_load_failure = true

[logging]
level = "debug"
"#;
        tokio::fs::write(&path, toml_content)
            .await
            .expect("write config");

        let config = AppConfig::load_from_file(&path).await.expect("parse");
        assert_eq!(config.islands.radius_chunks, 2.0);
        assert_eq!(config.islands.max_per_row, 4);
        assert_eq!(config.islands.buffer_chunks, 1);
        assert_eq!(config.scoring.weight_of("DIAMOND_BLOCK"), 10.0);
        assert_eq!(config.scoring.weight_of("DIRT"), 0.01);
        assert_eq!(config.persistence.data_file, PathBuf::from("data/islands.json"));
        assert!(config.persistence.allow_empty_on_load_failure);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_delegates_to_engine() {
        let mut config = AppConfig::default();
        config.islands.max_per_row = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.persistence.autosave_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
