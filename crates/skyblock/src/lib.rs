//! # Skyblock Island Server - Main Entry Point
//!
//! Hosts the island engine with an in-memory world and an operator console.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! skyblock
//!
//! # Custom configuration and data file
//! skyblock --config production.toml --data /var/lib/skyblock/island-data.json
//!
//! # JSON logging for production
//! skyblock --json-logs --log-level debug
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! SIGINT and SIGTERM (Ctrl+C on Windows) stop the background jobs and write a
//! final save. A second signal exits immediately.

use tracing::error;

mod app;
mod cli;
mod config;
pub mod console;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Parses arguments, sets up logging and runs the application.
///
/// Exits the process with code 1 when startup or the run fails.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the file before the full load in Application::new
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    let mut logging = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::LoggingSettings;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args_for(dir: &TempDir) -> CliArgs {
        CliArgs {
            config_path: dir.path().join("config.toml"),
            data_file: Some(dir.path().join("island-data.json")),
            log_level: Some("debug".to_string()),
            json_logs: false,
        }
    }

    #[tokio::test]
    async fn test_application_creation_writes_default_config() {
        let dir = TempDir::new().expect("temp dir");
        let args = args_for(&dir);

        let app = Application::new(args.clone()).await;
        assert!(app.is_ok());
        assert!(args.config_path.exists());
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_config() {
        let dir = TempDir::new().expect("temp dir");
        let args = args_for(&dir);
        tokio::fs::write(&args.config_path, "[islands]\nmax_per_row = 0\n")
            .await
            .expect("write config");

        assert!(Application::new(args).await.is_err());
    }

    #[tokio::test]
    async fn test_application_refuses_corrupt_data_file() {
        let dir = TempDir::new().expect("temp dir");
        let args = args_for(&dir);
        let data_file: PathBuf = args.data_file.clone().expect("data override");
        tokio::fs::write(&data_file, "[{\"broken\": ")
            .await
            .expect("write data");

        let app = Application::new(args).await.expect("config is valid");
        assert!(app.run().await.is_err());
    }
}
