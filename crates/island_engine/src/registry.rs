//! Authoritative in-memory island collection.
//!
//! [`IslandTable`] holds the active islands keyed by index, the archive of
//! islands whose owner joined another party, and the next free index. It is
//! plain synchronous data; [`IslandRegistry`] shares it behind a tokio
//! `RwLock` so every player-triggered mutation runs under the write lock while
//! the background jobs take cloned snapshots under the read lock.

use crate::config::IslandSettings;
use crate::error::PersistenceError;
use crate::island::Island;
use crate::locator;
use crate::placement::PlacementAllocator;
use crate::score::{rank_order, ScoreCard};
use crate::types::{IslandIndex, Location, PlayerId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Point-in-time copy of the table, taken for saving.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub islands: Vec<Island>,
    pub archived: Vec<Island>,
    pub structure_edits: u64,
}

#[derive(Debug)]
pub struct IslandTable {
    islands: BTreeMap<IslandIndex, Island>,
    archived: BTreeMap<IslandIndex, Island>,
    next_index: IslandIndex,
    // bumped on create/remove/archive, which a per-island dirty flag cannot capture
    structure_edits: u64,
    saved_structure_edits: u64,
    allocator: PlacementAllocator,
    settings: IslandSettings,
}

impl IslandTable {
    pub fn new(settings: IslandSettings) -> Self {
        Self {
            islands: BTreeMap::new(),
            archived: BTreeMap::new(),
            next_index: 0,
            structure_edits: 0,
            saved_structure_edits: 0,
            allocator: PlacementAllocator::from_settings(&settings),
            settings,
        }
    }

    /// Rebuilds a table from loaded islands. Restored islands are clean and the
    /// next index continues after the highest index seen, archived ones included.
    pub fn restore(
        settings: IslandSettings,
        active: Vec<Island>,
        archived: Vec<Island>,
    ) -> Result<Self, PersistenceError> {
        let mut table = Self::new(settings);
        for (mut island, is_archived) in active
            .into_iter()
            .map(|island| (island, false))
            .chain(archived.into_iter().map(|island| (island, true)))
        {
            let index = island.index();
            if table.islands.contains_key(&index) || table.archived.contains_key(&index) {
                return Err(PersistenceError::DuplicateIndex(index));
            }
            island.dirty = false;
            table.next_index = table.next_index.max(index + 1);
            if is_archived {
                table.archived.insert(index, island);
            } else {
                table.islands.insert(index, island);
            }
        }
        info!(
            "🏝️ Restored {} islands ({} archived), next index {}",
            table.islands.len(),
            table.archived.len(),
            table.next_index
        );
        Ok(table)
    }

    pub fn settings(&self) -> &IslandSettings {
        &self.settings
    }

    pub fn next_index(&self) -> IslandIndex {
        self.next_index
    }

    /// Registers a new island for `owner` at the next free index.
    ///
    /// Terrain is not touched here.
    pub fn create(&mut self, owner: PlayerId, owner_name: &str) -> &mut Island {
        let index = self.next_index;
        self.next_index += 1;
        let center = self.allocator.allocate(index);
        let island = Island::new(index, center, owner, owner_name, &self.settings);
        self.structure_edits += 1;
        debug!("🏝️ Allocated island {} at {:?} for {}", index, center, owner);
        self.islands.entry(index).or_insert(island)
    }

    pub fn get_by_index(&self, index: IslandIndex) -> Option<&Island> {
        self.islands.get(&index)
    }

    /// Active or archived island with this index.
    pub fn find_any(&self, index: IslandIndex) -> Option<&Island> {
        self.islands.get(&index).or_else(|| self.archived.get(&index))
    }

    pub fn get_mut(&mut self, index: IslandIndex) -> Option<&mut Island> {
        self.islands.get_mut(&index)
    }

    pub fn get_by_owner(&self, owner: PlayerId) -> Option<&Island> {
        self.islands.values().find(|island| island.is_owner(owner))
    }

    /// Island the player owns or is a friend on.
    pub fn get_by_member(&self, player: PlayerId) -> Option<&Island> {
        self.islands.values().find(|island| island.is_member(player))
    }

    pub fn owned_mut(&mut self, owner: PlayerId) -> Option<&mut Island> {
        self.islands.values_mut().find(|island| island.is_owner(owner))
    }

    pub fn member_mut(&mut self, player: PlayerId) -> Option<&mut Island> {
        self.islands.values_mut().find(|island| island.is_member(player))
    }

    pub fn owned_index(&self, owner: PlayerId) -> Option<IslandIndex> {
        self.get_by_owner(owner).map(Island::index)
    }

    pub fn member_index(&self, player: PlayerId) -> Option<IslandIndex> {
        self.get_by_member(player).map(Island::index)
    }

    /// Active islands in index order.
    pub fn all(&self) -> impl Iterator<Item = &Island> {
        self.islands.values()
    }

    pub fn archived(&self) -> impl Iterator<Item = &Island> {
        self.archived.values()
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Drops an island from the active set without keeping a record.
    pub fn remove(&mut self, index: IslandIndex) -> Option<Island> {
        let removed = self.islands.remove(&index)?;
        self.structure_edits += 1;
        Some(removed)
    }

    /// Moves an island from the active set into the archive.
    pub fn archive(&mut self, index: IslandIndex) -> Option<&Island> {
        let mut island = self.islands.remove(&index)?;
        island.mark_dirty();
        self.structure_edits += 1;
        info!("📦 Archived island {} ({})", index, island.name());
        Some(self.archived.entry(index).or_insert(island))
    }

    /// Active island whose horizontal radius strictly contains `location`.
    pub fn island_at(&self, location: &Location) -> Option<&Island> {
        locator::island_at(self.islands.values(), location, &self.settings)
    }

    pub fn centers(&self) -> Vec<(IslandIndex, (i32, i32))> {
        self.islands
            .values()
            .map(|island| (island.index(), island.center()))
            .collect()
    }

    /// Writes freshly computed scores back. Islands that disappeared since the
    /// cycle started are skipped.
    pub fn apply_scores(&mut self, cards: Vec<(IslandIndex, ScoreCard)>) -> usize {
        let mut updated = 0;
        for (index, card) in cards {
            if let Some(island) = self.islands.get_mut(&index) {
                island.apply_score(card);
                updated += 1;
            }
        }
        updated
    }

    /// Active islands ordered by score, highest first.
    pub fn ranking(&self) -> Vec<(IslandIndex, f64)> {
        rank_order(self.islands.values().map(|island| (island.index(), island.score())))
    }

    /// Whether anything changed since the last successful save.
    pub fn needs_save(&self) -> bool {
        self.structure_edits != self.saved_structure_edits
            || self.islands.values().any(Island::is_dirty)
            || self.archived.values().any(Island::is_dirty)
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            islands: self.islands.values().cloned().collect(),
            archived: self.archived.values().cloned().collect(),
            structure_edits: self.structure_edits,
        }
    }

    /// Records a successful save of `snapshot`. Islands edited after the
    /// snapshot was taken stay dirty.
    pub fn mark_saved(&mut self, snapshot: &TableSnapshot) {
        for saved in &snapshot.islands {
            if let Some(island) = self.islands.get_mut(&saved.index()) {
                island.mark_saved(saved.edits());
            }
        }
        for saved in &snapshot.archived {
            if let Some(island) = self.archived.get_mut(&saved.index()) {
                island.mark_saved(saved.edits());
            }
        }
        if snapshot.structure_edits > self.saved_structure_edits {
            self.saved_structure_edits = snapshot.structure_edits;
        }
    }
}

/// Shared handle to the island table.
#[derive(Debug, Clone)]
pub struct IslandRegistry {
    table: Arc<RwLock<IslandTable>>,
}

impl IslandRegistry {
    pub fn new(settings: IslandSettings) -> Self {
        Self::from_table(IslandTable::new(settings))
    }

    pub fn from_table(table: IslandTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, IslandTable> {
        self.table.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, IslandTable> {
        self.table.write().await
    }

    /// Replaces the whole table, used when loading from storage.
    pub async fn replace(&self, table: IslandTable) {
        *self.table.write().await = table;
    }

    pub async fn snapshot(&self) -> TableSnapshot {
        self.table.read().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> IslandTable {
        IslandTable::new(IslandSettings::default())
    }

    #[test]
    fn test_create_assigns_sequential_indices() {
        let mut table = table();
        let first = PlayerId::new();
        let second = PlayerId::new();

        let island = table.create(first, "Alex");
        assert_eq!(island.index(), 0);
        assert_eq!(island.center(), (72, 72));
        assert!(island.is_dirty());

        let island = table.create(second, "Sam");
        assert_eq!(island.index(), 1);
        assert_eq!(island.center(), (200, 72));
        assert_eq!(table.next_index(), 2);
    }

    #[test]
    fn test_member_lookup_covers_owner_and_friends() {
        let mut table = table();
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let index = table.create(owner, "Alex").index();
        if let Some(island) = table.get_mut(index) {
            island.add_friend(friend).expect("add friend");
        }

        assert_eq!(table.member_index(owner), Some(index));
        assert_eq!(table.member_index(friend), Some(index));
        assert_eq!(table.owned_index(friend), None);

        if let Some(island) = table.get_mut(index) {
            island.ban(friend).expect("ban");
        }
        assert_eq!(table.member_index(friend), None);

        table.remove(index);
        assert_eq!(table.member_index(owner), None);
    }

    #[test]
    fn test_indices_are_never_reused() {
        let mut table = table();
        let index = table.create(PlayerId::new(), "Alex").index();
        table.archive(index);
        assert!(table.get_by_index(index).is_none());
        assert_eq!(table.archived().count(), 1);

        let next = table.create(PlayerId::new(), "Sam").index();
        assert_eq!(next, index + 1);
    }

    #[test]
    fn test_restore_continues_after_highest_index() {
        let settings = IslandSettings::default();
        let active = vec![Island::new(4, (72, 72), PlayerId::new(), "Alex", &settings)];
        let archived = vec![Island::new(9, (200, 72), PlayerId::new(), "Sam", &settings)];
        let table = IslandTable::restore(settings, active, archived).expect("restore");

        assert_eq!(table.next_index(), 10);
        assert!(table.all().all(|island| !island.is_dirty()));
        assert!(!table.needs_save());
    }

    #[test]
    fn test_restore_rejects_duplicate_indices() {
        let settings = IslandSettings::default();
        let active = vec![
            Island::new(1, (72, 72), PlayerId::new(), "Alex", &settings),
            Island::new(1, (72, 72), PlayerId::new(), "Sam", &settings),
        ];
        let result = IslandTable::restore(settings, active, Vec::new());
        assert!(matches!(result, Err(PersistenceError::DuplicateIndex(1))));
    }

    #[test]
    fn test_mark_saved_keeps_later_edits_dirty() {
        let mut table = table();
        let first = table.create(PlayerId::new(), "Alex").index();
        let second = table.create(PlayerId::new(), "Sam").index();
        let snapshot = table.snapshot();

        if let Some(island) = table.get_mut(second) {
            island.set_greeting("edited during save");
        }
        table.mark_saved(&snapshot);

        assert!(!table.get_by_index(first).map(Island::is_dirty).unwrap_or(true));
        assert!(table.get_by_index(second).map(Island::is_dirty).unwrap_or(false));
        assert!(table.needs_save());
    }

    #[test]
    fn test_apply_scores_skips_removed_islands() {
        let mut table = table();
        let kept = table.create(PlayerId::new(), "Alex").index();
        let gone = table.create(PlayerId::new(), "Sam").index();
        table.remove(gone);

        let card = ScoreCard {
            score: 3.0,
            breakdown: BTreeMap::new(),
        };
        let updated = table.apply_scores(vec![(kept, card.clone()), (gone, card)]);
        assert_eq!(updated, 1);
        assert_eq!(table.ranking(), vec![(kept, 3.0)]);
    }

    #[tokio::test]
    async fn test_registry_snapshot_is_detached() {
        let registry = IslandRegistry::new(IslandSettings::default());
        let index = registry.write().await.create(PlayerId::new(), "Alex").index();
        let snapshot = registry.snapshot().await;

        if let Some(island) = registry.write().await.get_mut(index) {
            island.set_name("Renamed");
        }
        assert_eq!(snapshot.islands[0].name(), "Alex's Island");
    }
}
