//! # Island Engine
//!
//! [`IslandEngine`] is the service object every collaborator talks to. It owns
//! the shared registry, the invitation book, presence tracking, the score
//! engine and the store, plus the two external seams ([`TerrainService`] and
//! [`PlayerGateway`]). It is cheap to clone; clones share all state.
//!
//! Command-facing operations live in [`crate::handlers`] as `impl IslandEngine`
//! blocks. Each one validates first, reports any [`IslandError`] to the
//! requesting player and returns it, and only then mutates.

use crate::config::{EngineConfig, IslandSettings};
use crate::error::{IslandError, PersistenceError};
use crate::gateway::PlayerGateway;
use crate::invitation::InvitationManager;
use crate::locator::PresenceTracker;
use crate::persistence::{IslandStore, SaveOutcome};
use crate::registry::{IslandRegistry, IslandTable};
use crate::score::ScoreEngine;
use crate::terrain::{IslandBounds, TerrainService};
use crate::types::{BlockPos, PlayerId};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct IslandEngine {
    config: Arc<EngineConfig>,
    registry: IslandRegistry,
    invitations: InvitationManager,
    presence: PresenceTracker,
    scores: ScoreEngine,
    store: IslandStore,
    terrain: Arc<dyn TerrainService>,
    players: Arc<dyn PlayerGateway>,
}

impl IslandEngine {
    /// Builds an engine with an empty registry. Call [`IslandEngine::load`]
    /// before serving players.
    pub fn new(
        config: EngineConfig,
        terrain: Arc<dyn TerrainService>,
        players: Arc<dyn PlayerGateway>,
    ) -> Self {
        let registry = IslandRegistry::new(config.islands.clone());
        let invitations = InvitationManager::new(config.invitations.expiry());
        let scores = ScoreEngine::new(
            config.islands.clone(),
            config.scoring.clone(),
            Arc::clone(&terrain),
        );
        let store = IslandStore::new(config.persistence.data_file.clone());

        Self {
            config: Arc::new(config),
            registry,
            invitations,
            presence: PresenceTracker::new(),
            scores,
            store,
            terrain,
            players,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self) -> &IslandSettings {
        &self.config.islands
    }

    pub fn registry(&self) -> &IslandRegistry {
        &self.registry
    }

    pub fn invitations(&self) -> &InvitationManager {
        &self.invitations
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn scores(&self) -> &ScoreEngine {
        &self.scores
    }

    pub fn store(&self) -> &IslandStore {
        &self.store
    }

    pub fn terrain(&self) -> &Arc<dyn TerrainService> {
        &self.terrain
    }

    pub fn players(&self) -> &Arc<dyn PlayerGateway> {
        &self.players
    }

    /// Loads the island document into the registry.
    ///
    /// A missing file starts an empty registry. Any other failure is returned
    /// unless `persistence.allow_empty_on_load_failure` is set, in which case
    /// it is logged and the registry starts empty.
    pub async fn load(&self) -> Result<usize, PersistenceError> {
        let settings = self.settings().clone();
        let restored = match self.store.load(&settings).await {
            Ok(loaded) => IslandTable::restore(settings, loaded.active, loaded.archived),
            Err(e) => Err(e),
        };

        match restored {
            Ok(table) => {
                let count = table.len();
                self.registry.replace(table).await;
                Ok(count)
            }
            Err(e) if self.config.persistence.allow_empty_on_load_failure => {
                error!(
                    "❌ Failed to load {}: {} - starting with no islands",
                    self.store.path().display(),
                    e
                );
                self.registry
                    .replace(IslandTable::new(self.settings().clone()))
                    .await;
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Saves the registry. Without `force`, nothing is written when no island
    /// changed since the last successful save.
    pub async fn save(&self, force: bool) -> Result<SaveOutcome, PersistenceError> {
        self.store.save(&self.registry, force).await
    }

    /// Save used right after create and restart. Failures are logged and the
    /// islands stay dirty for the next autosave.
    pub(crate) async fn save_inline(&self) {
        match self.save(false).await {
            Ok(SaveOutcome::Saved { islands }) => info!("💾 Saved {} islands", islands),
            Ok(SaveOutcome::Skipped) => {}
            Err(e) => warn!("⚠️ Inline save failed, retrying on next autosave: {}", e),
        }
    }

    /// Sends the error text to `player` when `result` is an error.
    pub(crate) fn report<T>(&self, player: PlayerId, result: Result<T, IslandError>) -> Result<T, IslandError> {
        if let Err(e) = &result {
            self.players.send_message(player, &e.to_string());
        }
        result
    }

    pub(crate) fn tell(&self, player: PlayerId, message: &str) {
        self.players.send_message(player, message);
    }

    pub(crate) fn name_of(&self, player: PlayerId) -> String {
        self.players.name_of(player)
    }

    /// Bedrock block of the island centred at `center`.
    pub(crate) fn anchor(&self, center: (i32, i32)) -> BlockPos {
        BlockPos::new(center.0, self.settings().base_height, center.1)
    }

    /// Wipes and rebuilds the terrain of the island centred at `center`.
    pub(crate) fn rebuild_terrain(&self, center: (i32, i32)) {
        let settings = self.settings();
        let bounds = IslandBounds::around(center, settings);
        self.terrain.clear_region(&settings.world, &bounds);
        self.terrain
            .build_starter_island(&settings.world, self.anchor(center));
    }
}
