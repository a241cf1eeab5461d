//! Engine configuration types and defaults.
//!
//! Every tunable constant of the island engine lives here: island geometry,
//! spawn offsets, invitation expiry, scoring weights and persistence intervals.
//! All fields carry serde defaults so a partial TOML section is enough.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Number of blocks along one edge of a chunk.
pub const BLOCKS_PER_CHUNK: i32 = 16;

fn default_island_world() -> String {
    "skyblock_world".to_string()
}
fn default_lobby_world() -> String {
    "world".to_string()
}
fn default_radius_chunks() -> f32 {
    3.5
}
fn default_buffer_chunks() -> u32 {
    1
}
fn default_max_per_row() -> u32 {
    10
}
fn default_base_height() -> i32 {
    100
}
fn default_min_y() -> i32 {
    -64
}
fn default_max_y() -> i32 {
    320
}
fn default_spawn_offset() -> SpawnOffset {
    SpawnOffset {
        x: 2.5,
        y: 5.0,
        z: 0.5,
        yaw: 90.0,
        pitch: 0.0,
    }
}

fn default_expiry_secs() -> u64 {
    30
}

fn default_score_interval_ms() -> u64 {
    5_000 // 100 ticks
}
fn default_block_weight() -> f64 {
    0.01
}
fn default_top_count() -> usize {
    10
}

fn default_data_file() -> PathBuf {
    PathBuf::from("island-data.json")
}
fn default_autosave_interval_secs() -> u64 {
    300
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub islands: IslandSettings,
    #[serde(default)]
    pub invitations: InvitationSettings,
    #[serde(default)]
    pub scoring: ScoreSettings,
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

/// Island geometry and placement.
///
/// `radius_chunks` and `buffer_chunks` drive the placement grid. Changing them
/// after islands exist moves every future island but never an existing one,
/// since centers are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslandSettings {
    /// World that holds every island
    #[serde(default = "default_island_world")]
    pub world: String,
    /// World players are sent to when kicked, banned or reset
    #[serde(default = "default_lobby_world")]
    pub lobby_world: String,
    /// Island radius in chunks (may be fractional)
    #[serde(default = "default_radius_chunks")]
    pub radius_chunks: f32,
    /// Empty chunks reserved between neighbouring islands
    #[serde(default = "default_buffer_chunks")]
    pub buffer_chunks: u32,
    /// Islands per placement row
    #[serde(default = "default_max_per_row")]
    pub max_per_row: u32,
    /// Height of the starter island's bedrock block
    #[serde(default = "default_base_height")]
    pub base_height: i32,
    /// Lowest scanned block layer (inclusive)
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    /// Highest scanned block layer (exclusive)
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    /// Default spawn/warp offset from the island center
    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: SpawnOffset,
}

/// Offset of the default spawn point from the island's bedrock block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

/// Invitation timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationSettings {
    /// Seconds before a pending invitation expires
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
}

/// Scoring cycle and material weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSettings {
    /// Milliseconds between full score cycles
    #[serde(default = "default_score_interval_ms")]
    pub interval_ms: u64,
    /// Weight of any material missing from `weights`
    #[serde(default = "default_block_weight")]
    pub default_weight: f64,
    /// Per-material weights keyed by material name
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Number of islands listed by the top-islands report
    #[serde(default = "default_top_count")]
    pub top_count: usize,
}

/// Where and how often island data is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Seconds between autosave cycles
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    /// Start with an empty registry instead of refusing to start when the
    /// data file exists but cannot be read
    #[serde(default)]
    pub allow_empty_on_load_failure: bool,
}

impl Default for IslandSettings {
    fn default() -> Self {
        Self {
            world: default_island_world(),
            lobby_world: default_lobby_world(),
            radius_chunks: default_radius_chunks(),
            buffer_chunks: default_buffer_chunks(),
            max_per_row: default_max_per_row(),
            base_height: default_base_height(),
            min_y: default_min_y(),
            max_y: default_max_y(),
            spawn_offset: default_spawn_offset(),
        }
    }
}

impl Default for InvitationSettings {
    fn default() -> Self {
        Self {
            expiry_secs: default_expiry_secs(),
        }
    }
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_score_interval_ms(),
            default_weight: default_block_weight(),
            weights: BTreeMap::new(),
            top_count: default_top_count(),
        }
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            autosave_interval_secs: default_autosave_interval_secs(),
            allow_empty_on_load_failure: false,
        }
    }
}

impl IslandSettings {
    /// Island radius in whole blocks. Locator and scan bounds both use this.
    pub fn radius_blocks(&self) -> i32 {
        (self.radius_chunks * BLOCKS_PER_CHUNK as f32) as i32
    }
}

impl InvitationSettings {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

impl ScoreSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn weight_of(&self, material: &str) -> f64 {
        self.weights
            .get(material)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

impl PersistenceSettings {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

impl EngineConfig {
    /// Checks the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let islands = &self.islands;
        if !(islands.radius_chunks > 0.0) || !islands.radius_chunks.is_finite() {
            return Err("islands.radius_chunks must be a positive number".to_string());
        }
        if islands.radius_blocks() < 1 {
            return Err("islands.radius_chunks must cover at least one block".to_string());
        }
        // Placement only guarantees separation with at least one buffer chunk.
        if islands.buffer_chunks == 0 {
            return Err("islands.buffer_chunks must be at least 1".to_string());
        }
        if islands.max_per_row == 0 {
            return Err("islands.max_per_row must be greater than 0".to_string());
        }
        if islands.min_y >= islands.max_y {
            return Err("islands.min_y must be less than islands.max_y".to_string());
        }
        if islands.world.is_empty() || islands.lobby_world.is_empty() {
            return Err("islands.world and islands.lobby_world cannot be empty".to_string());
        }
        if islands.world == islands.lobby_world {
            return Err("islands.world must differ from islands.lobby_world".to_string());
        }
        if self.invitations.expiry_secs == 0 {
            return Err("invitations.expiry_secs must be greater than 0".to_string());
        }
        if self.scoring.interval_ms == 0 {
            return Err("scoring.interval_ms must be greater than 0".to_string());
        }
        if self.scoring.default_weight < 0.0 || self.scoring.weights.values().any(|w| *w < 0.0) {
            return Err("scoring weights cannot be negative".to_string());
        }
        if self.persistence.autosave_interval_secs == 0 {
            return Err("persistence.autosave_interval_secs must be greater than 0".to_string());
        }
        if self.persistence.data_file.as_os_str().is_empty() {
            return Err("persistence.data_file cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.islands.radius_blocks(), 56);
        assert_eq!(config.islands.max_per_row, 10);
        assert_eq!(config.invitations.expiry_secs, 30);
        assert_eq!(config.scoring.top_count, 10);
        assert_eq!(config.persistence.data_file, PathBuf::from("island-data.json"));
    }

    #[test]
    fn test_validation_rejects_bad_geometry() {
        let mut config = EngineConfig::default();
        config.islands.buffer_chunks = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.islands.radius_chunks = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.islands.min_y = 10;
        config.islands.max_y = 10;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.islands.lobby_world = config.islands.world.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_lookup_falls_back_to_default() {
        let mut scoring = ScoreSettings::default();
        scoring.weights.insert("DIAMOND_BLOCK".to_string(), 5.0);
        assert_eq!(scoring.weight_of("DIAMOND_BLOCK"), 5.0);
        assert_eq!(scoring.weight_of("DIRT"), 0.01);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"islands": {"radius_chunks": 2.0}}"#)
            .expect("partial config should parse");
        assert_eq!(config.islands.radius_chunks, 2.0);
        assert_eq!(config.islands.buffer_chunks, 1);
        assert_eq!(config.invitations.expiry_secs, 30);
    }
}
