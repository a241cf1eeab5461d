//! # Island Document Persistence
//!
//! The island collection is stored as one JSON array of island records. Each
//! record is an explicit, versioned struct mapped field by field to and from
//! [`Island`], so transient state (dirty flag, scores) can never leak into the
//! file and renaming a Rust field never silently changes the format.
//!
//! Saves are crash-safe: the document is written to a sibling temporary file
//! and renamed over the data file, so a crash mid-write leaves the previous
//! document intact. Saves are serialized so only one writer owns the
//! temporary file and snapshots reach the disk in the order they were taken.

use crate::config::IslandSettings;
use crate::error::PersistenceError;
use crate::island::{default_spawn, Island, IslandFriend};
use crate::registry::{IslandRegistry, TableSnapshot};
use crate::types::{IslandIndex, Location, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Current record schema version.
pub const RECORD_VERSION: u32 = 1;

fn default_version() -> u32 {
    RECORD_VERSION
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A spawn or warp point as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub spawn_world: String,
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub spawn_z: f64,
    #[serde(default)]
    pub spawn_yaw: f32,
    #[serde(default)]
    pub spawn_pitch: f32,
}

impl From<&Location> for LocationRecord {
    fn from(location: &Location) -> Self {
        Self {
            spawn_world: location.world.clone(),
            spawn_x: location.x,
            spawn_y: location.y,
            spawn_z: location.z,
            spawn_yaw: location.yaw,
            spawn_pitch: location.pitch,
        }
    }
}

impl From<LocationRecord> for Location {
    fn from(record: LocationRecord) -> Self {
        Location::new(record.spawn_world, record.spawn_x, record.spawn_y, record.spawn_z)
            .facing(record.spawn_yaw, record.spawn_pitch)
    }
}

/// Party member entry. Older documents list bare identity strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FriendRecord {
    Detailed {
        friend: String,
        #[serde(default)]
        permissions: Vec<String>,
    },
    Plain(String),
}

impl FriendRecord {
    fn identity(&self) -> &str {
        match self {
            FriendRecord::Detailed { friend, .. } => friend,
            FriendRecord::Plain(friend) => friend,
        }
    }

    fn permissions(self) -> Vec<String> {
        match self {
            FriendRecord::Detailed { permissions, .. } => permissions,
            FriendRecord::Plain(_) => Vec::new(),
        }
    }
}

/// One island as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub x: i32,
    pub z: i32,
    #[serde(default)]
    pub name: Option<String>,
    pub index: IslandIndex,
    pub owner: String,
    #[serde(default)]
    pub friends: Vec<FriendRecord>,
    #[serde(default)]
    pub ban_list: Vec<String>,
    #[serde(default)]
    pub greeting_message: Option<String>,
    #[serde(default)]
    pub farewell_message: Option<String>,
    #[serde(default)]
    pub island_spawn: Option<LocationRecord>,
    #[serde(default)]
    pub island_warp: Option<LocationRecord>,
    #[serde(rename = "isLocked", default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub archived: bool,
}

impl IslandRecord {
    pub fn from_island(island: &Island, archived: bool) -> Self {
        Self {
            version: RECORD_VERSION,
            x: island.center.0,
            z: island.center.1,
            name: Some(island.name.clone()),
            index: island.index,
            owner: island.owner.to_string(),
            friends: island
                .friends
                .iter()
                .map(|friend| FriendRecord::Detailed {
                    friend: friend.player.to_string(),
                    permissions: friend.permissions.clone(),
                })
                .collect(),
            ban_list: island.ban_list.iter().map(PlayerId::to_string).collect(),
            greeting_message: Some(island.greeting.clone()),
            farewell_message: Some(island.farewell.clone()),
            island_spawn: Some(LocationRecord::from(&island.spawn)),
            island_warp: Some(LocationRecord::from(&island.warp)),
            is_locked: island.locked,
            archived,
        }
    }

    /// Rebuilds a clean island. Missing texts and points fall back to the
    /// defaults a new island would get; membership overlaps are repaired so
    /// the owner is never a friend or banned and no friend is banned.
    pub fn into_island(self, settings: &IslandSettings) -> Result<Island, PersistenceError> {
        let index = self.index;
        if self.version > RECORD_VERSION {
            return Err(invalid(index, format!("unsupported record version {}", self.version)));
        }
        let owner = parse_player(index, "owner", &self.owner)?;

        let mut friends: Vec<IslandFriend> = Vec::with_capacity(self.friends.len());
        for record in self.friends {
            let player = parse_player(index, "friend", record.identity())?;
            if player == owner || friends.iter().any(|f| f.player == player) {
                warn!("⚠️ Island {}: dropping duplicate or owner friend entry {}", index, player);
                continue;
            }
            friends.push(IslandFriend::with_permissions(player, record.permissions()));
        }

        let mut ban_list: Vec<PlayerId> = Vec::with_capacity(self.ban_list.len());
        for raw in &self.ban_list {
            let player = parse_player(index, "ban_list", raw)?;
            if player == owner || friends.iter().any(|f| f.player == player) || ban_list.contains(&player) {
                warn!("⚠️ Island {}: dropping conflicting ban entry {}", index, player);
                continue;
            }
            ban_list.push(player);
        }

        let center = (self.x, self.z);
        let name = self.name.unwrap_or_else(|| format!("Island {index}"));
        let spawn = self
            .island_spawn
            .map(Location::from)
            .unwrap_or_else(|| default_spawn(center, settings));
        let warp = self.island_warp.map(Location::from).unwrap_or_else(|| spawn.clone());

        Ok(Island {
            index,
            center,
            greeting: self
                .greeting_message
                .unwrap_or_else(|| format!("Welcome to {name}")),
            farewell: self
                .farewell_message
                .unwrap_or_else(|| format!("Now leaving {name}")),
            name,
            owner,
            friends,
            ban_list,
            spawn,
            warp,
            locked: self.is_locked,
            dirty: false,
            edits: 0,
            score: 0.0,
            score_breakdown: BTreeMap::new(),
        })
    }
}

fn invalid(index: IslandIndex, reason: String) -> PersistenceError {
    PersistenceError::InvalidRecord { index, reason }
}

fn parse_player(index: IslandIndex, field: &str, raw: &str) -> Result<PlayerId, PersistenceError> {
    PlayerId::from_str(raw).map_err(|e| invalid(index, format!("{field} '{raw}' is not a player id: {e}")))
}

/// Islands read from a document.
#[derive(Debug, Default)]
pub struct LoadedIslands {
    pub active: Vec<Island>,
    pub archived: Vec<Island>,
}

/// Serializes a snapshot into the document text.
pub fn encode(snapshot: &TableSnapshot) -> Result<String, PersistenceError> {
    let records: Vec<IslandRecord> = snapshot
        .islands
        .iter()
        .map(|island| IslandRecord::from_island(island, false))
        .chain(
            snapshot
                .archived
                .iter()
                .map(|island| IslandRecord::from_island(island, true)),
        )
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Parses a document into islands.
pub fn decode(text: &str, settings: &IslandSettings) -> Result<LoadedIslands, PersistenceError> {
    let records: Vec<IslandRecord> = serde_json::from_str(text)?;
    let mut loaded = LoadedIslands::default();
    for record in records {
        let archived = record.archived;
        let island = record.into_island(settings)?;
        if archived {
            loaded.archived.push(island);
        } else {
            loaded.active.push(island);
        }
    }
    Ok(loaded)
}

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last successful save
    Skipped,
    Saved { islands: usize },
}

/// Reads and writes the island document at a fixed path.
#[derive(Debug, Clone)]
pub struct IslandStore {
    path: PathBuf,
    save_lock: Arc<Mutex<()>>,
}

impl IslandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Loads the document. A missing file is a first start and yields no islands.
    pub async fn load(&self, settings: &IslandSettings) -> Result<LoadedIslands, PersistenceError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("📄 No island data at {}, starting fresh", self.path.display());
                return Ok(LoadedIslands::default());
            }
            Err(e) => return Err(e.into()),
        };
        let loaded = decode(&text, settings)?;
        info!(
            "📄 Loaded {} islands ({} archived) from {}",
            loaded.active.len(),
            loaded.archived.len(),
            self.path.display()
        );
        Ok(loaded)
    }

    /// Writes a snapshot to disk through a temporary file.
    ///
    /// Callers must hold the save lock; use [`IslandStore::save`] instead.
    async fn write(&self, snapshot: &TableSnapshot) -> Result<(), PersistenceError> {
        let document = encode(snapshot)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, document.as_bytes()).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!("💾 Wrote {} bytes to {}", document.len(), self.path.display());
        Ok(())
    }

    /// Saves the registry. Unless `force` is set the write is skipped when
    /// nothing changed. Dirty flags are only cleared after the rename succeeded.
    ///
    /// The save lock is held from snapshot to `mark_saved`, so an older
    /// snapshot can never overwrite a newer one.
    pub async fn save(&self, registry: &IslandRegistry, force: bool) -> Result<SaveOutcome, PersistenceError> {
        let _guard = self.save_lock.lock().await;
        let snapshot = {
            let table = registry.read().await;
            if !force && !table.needs_save() {
                return Ok(SaveOutcome::Skipped);
            }
            table.snapshot()
        };
        self.write(&snapshot).await?;
        registry.write().await.mark_saved(&snapshot);
        Ok(SaveOutcome::Saved {
            islands: snapshot.islands.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IslandTable;
    use tempfile::TempDir;

    fn populated_table() -> (IslandTable, PlayerId, PlayerId, PlayerId) {
        let mut table = IslandTable::new(IslandSettings::default());
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let banned = PlayerId::new();
        let island = table.create(owner, "Alex");
        island.add_friend(friend).expect("friend");
        island.grant_permission(friend, "build").expect("grant");
        island.ban(banned).expect("ban");
        island.lock().expect("lock");
        island.set_greeting("Hi there");
        island.set_spawn(Location::new("skyblock_world", 80.5, 106.0, 70.5).facing(45.0, 10.0));
        island.score = 12.5;
        (table, owner, friend, banned)
    }

    #[test]
    fn test_record_uses_document_keys() {
        let (table, owner, _, _) = populated_table();
        let text = encode(&table.snapshot()).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        let record = &value[0];

        assert_eq!(record["index"], 0);
        assert_eq!(record["x"], 72);
        assert_eq!(record["owner"], owner.to_string());
        assert_eq!(record["isLocked"], true);
        assert_eq!(record["island_spawn"]["spawn_yaw"], 45.0);
        assert_eq!(record["friends"][0]["permissions"][0], "build");
        assert!(record.get("score").is_none());
        assert!(record.get("dirty").is_none());
        assert!(record.get("archived").is_none());
    }

    #[test]
    fn test_document_reproduces_persisted_fields() {
        let (table, owner, friend, banned) = populated_table();
        let original = table.get_by_index(0).cloned().expect("island");
        let loaded = decode(&encode(&table.snapshot()).expect("encode"), &IslandSettings::default())
            .expect("decode");
        let island = &loaded.active[0];

        assert_eq!(island.owner(), owner);
        assert!(island.is_friend(friend));
        assert!(island.friend(friend).map(|f| f.has("build")).unwrap_or(false));
        assert!(island.is_banned(banned));
        assert_eq!(island.name(), original.name());
        assert_eq!(island.greeting(), "Hi there");
        assert_eq!(island.farewell(), original.farewell());
        assert_eq!(island.spawn(), original.spawn());
        assert_eq!(island.warp(), original.warp());
        assert!(island.is_locked());
        assert_eq!(island.center(), original.center());
        // transient state does not survive
        assert_eq!(island.score(), 0.0);
        assert!(!island.is_dirty());
    }

    #[test]
    fn test_decode_accepts_plain_friend_ids_and_missing_fields() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let text = format!(
            r#"[{{"x": 200, "z": 72, "index": 1, "owner": "{owner}", "friends": ["{friend}"]}}]"#
        );
        let loaded = decode(&text, &IslandSettings::default()).expect("decode");
        let island = &loaded.active[0];

        assert!(island.is_friend(friend));
        assert_eq!(island.name(), "Island 1");
        assert_eq!(island.greeting(), "Welcome to Island 1");
        assert_eq!((island.spawn().x, island.spawn().y), (202.5, 105.0));
        assert_eq!(island.warp(), island.spawn());
        assert!(!island.is_locked());
    }

    #[test]
    fn test_decode_repairs_membership_overlaps() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let text = format!(
            r#"[{{"x": 72, "z": 72, "index": 0, "owner": "{owner}",
                 "friends": ["{owner}", "{friend}"], "ban_list": ["{friend}", "{owner}"]}}]"#
        );
        let loaded = decode(&text, &IslandSettings::default()).expect("decode");
        let island = &loaded.active[0];

        assert_eq!(island.friends().len(), 1);
        assert!(island.is_friend(friend));
        assert!(island.ban_list().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_owner() {
        let text = r#"[{"x": 72, "z": 72, "index": 3, "owner": "nobody"}]"#;
        let result = decode(text, &IslandSettings::default());
        assert!(matches!(
            result,
            Err(PersistenceError::InvalidRecord { index: 3, .. })
        ));
        assert!(matches!(
            decode("{not json", &IslandSettings::default()),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_archived_flag_round_trips() {
        let (mut table, _, _, _) = populated_table();
        table.archive(0);
        let loaded = decode(&encode(&table.snapshot()).expect("encode"), &IslandSettings::default())
            .expect("decode");
        assert!(loaded.active.is_empty());
        assert_eq!(loaded.archived.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let store = IslandStore::new(dir.path().join("island-data.json"));
        let loaded = store.load(&IslandSettings::default()).await.expect("load");
        assert!(loaded.active.is_empty() && loaded.archived.is_empty());
    }

    #[tokio::test]
    async fn test_save_writes_atomically_and_clears_dirty() {
        let dir = TempDir::new().expect("temp dir");
        let store = IslandStore::new(dir.path().join("data").join("island-data.json"));
        let (table, _, _, _) = populated_table();
        let registry = IslandRegistry::from_table(table);

        let outcome = store.save(&registry, false).await.expect("save");
        assert_eq!(outcome, SaveOutcome::Saved { islands: 1 });
        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
        assert!(!registry.read().await.needs_save());

        // nothing changed, so autosave skips
        assert_eq!(store.save(&registry, false).await.expect("save"), SaveOutcome::Skipped);

        let loaded = store.load(&IslandSettings::default()).await.expect("load");
        assert_eq!(loaded.active.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_never_collide() {
        let dir = TempDir::new().expect("temp dir");
        let store = IslandStore::new(dir.path().join("island-data.json"));
        let mut table = IslandTable::new(IslandSettings::default());
        for _ in 0..100 {
            table.create(PlayerId::new(), "Steve");
        }
        let registry = Arc::new(IslandRegistry::from_table(table));

        for round in 0..10 {
            let mut handles = Vec::new();
            for _ in 0..8 {
                let store = store.clone();
                let registry = registry.clone();
                handles.push(tokio::spawn(async move { store.save(&registry, true).await }));
            }
            // an edit racing the saves is either written or left dirty
            registry
                .write()
                .await
                .get_mut(0)
                .expect("island 0")
                .set_greeting(format!("round {round}"));

            for handle in handles {
                let outcome = handle.await.expect("save task").expect("save");
                assert_eq!(outcome, SaveOutcome::Saved { islands: 100 });
            }
        }

        if registry.read().await.needs_save() {
            store.save(&registry, false).await.expect("final save");
        }
        assert!(!store.temp_path().exists());
        let loaded = store.load(&IslandSettings::default()).await.expect("load");
        assert_eq!(loaded.active.len(), 100);
        let first = loaded.active.iter().find(|i| i.index() == 0).expect("island 0");
        assert_eq!(first.greeting(), "round 9");
    }
}
