//! Main application logic and lifecycle management.
//!
//! [`Application`] wires the engine to the in-memory world and the operator
//! console, runs the background jobs and performs the phased shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    console::{self, ConsoleGateway},
    logging::display_banner,
    signals::{setup_signal_handlers, wait_for_signal},
};
use island_engine::{
    spawn_autosave_task, spawn_score_task, IslandEngine, MemoryTerrain, SaveOutcome, ShutdownState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long background jobs get to notice the shutdown signal.
const JOB_STOP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Application {
    config: AppConfig,
    engine: IslandEngine,
    gateway: Arc<ConsoleGateway>,
}

impl Application {
    /// Loads configuration, applies CLI overrides, validates settings and
    /// builds the engine. Island data is not read until [`Application::run`].
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(data_file) = args.data_file {
            config.persistence.data_file = data_file;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let gateway = Arc::new(ConsoleGateway::new(&config.islands));
        let engine = IslandEngine::new(
            config.to_engine_config(),
            Arc::new(MemoryTerrain::new()),
            gateway.clone(),
        );

        Ok(Self {
            config,
            engine,
            gateway,
        })
    }

    /// Loads the islands, serves until a shutdown signal or console `stop`,
    /// then stops the jobs and writes a final save.
    ///
    /// A data file that exists but cannot be read aborts startup unless
    /// `persistence.allow_empty_on_load_failure` is set.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Skyblock Island Server");
        self.log_configuration_summary();

        let loaded = self.engine.load().await.map_err(|e| {
            error!(
                "❌ Refusing to start: {} could not be loaded: {}",
                self.config.persistence.data_file.display(),
                e
            );
            e
        })?;
        info!(
            "🏝️ Loaded {} islands from {}",
            loaded,
            self.config.persistence.data_file.display()
        );

        let shutdown_state = ShutdownState::new();
        let score_handle = spawn_score_task(self.engine.clone(), shutdown_state.clone());
        let autosave_handle = spawn_autosave_task(self.engine.clone(), shutdown_state.clone());
        let console_handle = tokio::spawn(console::run(
            self.engine.clone(),
            self.gateway.clone(),
            shutdown_state.clone(),
        ));

        info!("✅ Skyblock server is now running!");
        info!("🛑 Press Ctrl+C or type `stop` to gracefully shutdown");

        tokio::select! {
            result = setup_signal_handlers(&shutdown_state) => result?,
            _ = shutdown_state.wait() => {}
        }

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        shutdown_state.initiate_shutdown();
        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        info!("📡 Phase 1: Stopping background jobs...");
        console_handle.abort();
        stop_job("score", score_handle).await;
        stop_job("autosave", autosave_handle).await;

        info!("💾 Phase 2: Writing final save...");
        match self.engine.save(true).await {
            Ok(SaveOutcome::Saved { islands }) => info!("✅ Saved {} islands", islands),
            Ok(SaveOutcome::Skipped) => info!("✅ Nothing to save"),
            Err(e) => {
                error!("❌ Final save failed: {}", e);
                return Err(e.into());
            }
        }
        shutdown_state.complete_shutdown();

        info!("✅ Skyblock server shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        let islands = &self.config.islands;
        info!("📋 Configuration Summary:");
        info!("  🌍 Island world: {} | Lobby: {}", islands.world, islands.lobby_world);
        info!(
            "  📐 Radius: {} chunks ({} blocks) | Buffer: {} chunks | {} per row",
            islands.radius_chunks,
            islands.radius_blocks(),
            islands.buffer_chunks,
            islands.max_per_row
        );
        info!("  ✉️ Invitation expiry: {}s", self.config.invitations.expiry_secs);
        info!("  📊 Score interval: {}ms", self.config.scoring.interval_ms);
        info!(
            "  💾 Data file: {} | Autosave every {}s",
            self.config.persistence.data_file.display(),
            self.config.persistence.autosave_interval_secs
        );
    }
}

async fn stop_job(name: &str, handle: JoinHandle<()>) {
    match tokio::time::timeout(JOB_STOP_TIMEOUT, handle).await {
        Ok(Ok(())) => info!("✅ {} job stopped", name),
        Ok(Err(e)) => error!("❌ {} job failed: {}", name, e),
        Err(_) => warn!("⏰ {} job did not stop within {:?}", name, JOB_STOP_TIMEOUT),
    }
}
