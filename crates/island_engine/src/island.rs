//! # Island Data Model
//!
//! An [`Island`] is a bounded region of the island world with one owner, a
//! party of friends, a ban list and lock state. Persisted fields only change
//! through methods that also mark the island dirty, so the autosave job can
//! tell what still needs writing.
//!
//! Ownership and membership mutators live in [`crate::access`]; this module
//! holds the record itself, its defaults and the owner-settable settings.

use crate::config::IslandSettings;
use crate::score::ScoreCard;
use crate::terrain::IslandBounds;
use crate::types::{IslandIndex, Location, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A party member together with the named permissions the owner granted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandFriend {
    pub player: PlayerId,
    pub permissions: Vec<String>,
}

impl IslandFriend {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions(player: PlayerId, permissions: Vec<String>) -> Self {
        Self {
            player,
            permissions,
        }
    }

    /// Returns `false` if the permission was already present.
    pub fn grant(&mut self, permission: &str) -> bool {
        if self.has(permission) {
            return false;
        }
        self.permissions.push(permission.to_string());
        true
    }

    /// Returns `false` if the permission was not present.
    pub fn revoke(&mut self, permission: &str) -> bool {
        let before = self.permissions.len();
        self.permissions.retain(|p| p != permission);
        before != self.permissions.len()
    }

    pub fn has(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// A single player island.
#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    pub(crate) index: IslandIndex,
    pub(crate) center: (i32, i32),
    pub(crate) name: String,
    pub(crate) greeting: String,
    pub(crate) farewell: String,
    pub(crate) owner: PlayerId,
    pub(crate) friends: Vec<IslandFriend>,
    pub(crate) ban_list: Vec<PlayerId>,
    pub(crate) spawn: Location,
    pub(crate) warp: Location,
    pub(crate) locked: bool,

    // Transient state, never persisted
    pub(crate) dirty: bool,
    pub(crate) edits: u64,
    pub(crate) score: f64,
    pub(crate) score_breakdown: BTreeMap<String, f64>,
}

impl Island {
    /// Builds a brand-new island for `owner` with default name, messages,
    /// spawn and warp. New islands start dirty.
    pub fn new(
        index: IslandIndex,
        center: (i32, i32),
        owner: PlayerId,
        owner_name: &str,
        settings: &IslandSettings,
    ) -> Self {
        let spawn = default_spawn(center, settings);
        let mut island = Self {
            index,
            center,
            name: String::new(),
            greeting: String::new(),
            farewell: String::new(),
            owner,
            friends: Vec::new(),
            ban_list: Vec::new(),
            warp: spawn.clone(),
            spawn,
            locked: false,
            dirty: false,
            edits: 0,
            score: 0.0,
            score_breakdown: BTreeMap::new(),
        };
        island.reset(owner_name, settings);
        island
    }

    /// Resets every owner-settable field to its default. Index, center and
    /// owner are kept.
    pub fn reset(&mut self, owner_name: &str, settings: &IslandSettings) {
        self.name = format!("{owner_name}'s Island");
        self.greeting = format!("Welcome to {}", self.name);
        self.farewell = format!("Now leaving {}", self.name);
        self.friends.clear();
        self.ban_list.clear();
        self.spawn = default_spawn(self.center, settings);
        self.warp = self.spawn.clone();
        self.locked = false;
        self.score = 0.0;
        self.score_breakdown.clear();
        self.mark_dirty();
    }

    pub fn index(&self) -> IslandIndex {
        self.index
    }

    pub fn center(&self) -> (i32, i32) {
        self.center
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn farewell(&self) -> &str {
        &self.farewell
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn friends(&self) -> &[IslandFriend] {
        &self.friends
    }

    pub fn ban_list(&self) -> &[PlayerId] {
        &self.ban_list
    }

    pub fn spawn(&self) -> &Location {
        &self.spawn
    }

    pub fn warp(&self) -> &Location {
        &self.warp
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Monotonic counter of persisted-field edits, used to decide whether a
    /// save captured the island's latest state.
    pub fn edits(&self) -> u64 {
        self.edits
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn score_breakdown(&self) -> &BTreeMap<String, f64> {
        &self.score_breakdown
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.mark_dirty();
    }

    pub fn set_greeting(&mut self, message: impl Into<String>) {
        self.greeting = message.into();
        self.mark_dirty();
    }

    pub fn set_farewell(&mut self, message: impl Into<String>) {
        self.farewell = message.into();
        self.mark_dirty();
    }

    pub fn set_spawn(&mut self, location: Location) {
        self.spawn = location;
        self.mark_dirty();
    }

    pub fn set_warp(&mut self, location: Location) {
        self.warp = location;
        self.mark_dirty();
    }

    /// Horizontal block bounds of the island, spanning the configured height range.
    pub fn bounds(&self, settings: &IslandSettings) -> IslandBounds {
        IslandBounds::around(self.center, settings)
    }

    /// True when `location` is in the island world and strictly inside the
    /// island's radius on the horizontal plane.
    pub fn contains(&self, location: &Location, settings: &IslandSettings) -> bool {
        if location.world != settings.world {
            return false;
        }
        let radius = settings.radius_blocks() as f64;
        location.horizontal_distance_squared(self.center.0 as f64, self.center.1 as f64)
            < radius * radius
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
        self.edits += 1;
    }

    /// Clears the dirty flag if nothing changed since `edits` was observed.
    pub(crate) fn mark_saved(&mut self, edits: u64) {
        if self.edits == edits {
            self.dirty = false;
        }
    }

    pub(crate) fn apply_score(&mut self, card: ScoreCard) {
        self.score = card.score;
        self.score_breakdown = card.breakdown;
    }
}

/// The spawn and warp every island starts with.
pub fn default_spawn(center: (i32, i32), settings: &IslandSettings) -> Location {
    let offset = settings.spawn_offset;
    Location::new(
        settings.world.clone(),
        center.0 as f64 + offset.x,
        settings.base_height as f64 + offset.y,
        center.1 as f64 + offset.z,
    )
    .facing(offset.yaw, offset.pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_island_defaults() {
        let settings = IslandSettings::default();
        let owner = PlayerId::new();
        let island = Island::new(0, (72, 72), owner, "Steve", &settings);

        assert_eq!(island.name(), "Steve's Island");
        assert_eq!(island.greeting(), "Welcome to Steve's Island");
        assert_eq!(island.farewell(), "Now leaving Steve's Island");
        assert_eq!(island.owner(), owner);
        assert!(island.friends().is_empty());
        assert!(island.ban_list().is_empty());
        assert!(!island.locked);
        assert!(island.is_dirty());

        let spawn = island.spawn();
        assert_eq!(spawn.world, "skyblock_world");
        assert_eq!((spawn.x, spawn.y, spawn.z), (74.5, 105.0, 72.5));
        assert_eq!((spawn.yaw, spawn.pitch), (90.0, 0.0));
        assert_eq!(island.warp(), island.spawn());
    }

    #[test]
    fn test_contains_uses_strict_horizontal_radius() {
        let settings = IslandSettings::default();
        let island = Island::new(0, (72, 72), PlayerId::new(), "Steve", &settings);

        assert!(island.contains(&Location::new("skyblock_world", 72.0, -40.0, 72.0), &settings));
        assert!(island.contains(&Location::new("skyblock_world", 127.9, 300.0, 72.0), &settings));
        // exactly on the radius is outside
        assert!(!island.contains(&Location::new("skyblock_world", 128.0, 100.0, 72.0), &settings));
        assert!(!island.contains(&Location::new("world", 72.0, 100.0, 72.0), &settings));
    }

    #[test]
    fn test_mark_saved_respects_later_edits() {
        let settings = IslandSettings::default();
        let mut island = Island::new(0, (72, 72), PlayerId::new(), "Steve", &settings);
        let observed = island.edits();
        island.set_greeting("Hello");
        island.mark_saved(observed);
        assert!(island.is_dirty());

        island.mark_saved(island.edits());
        assert!(!island.is_dirty());
    }

    #[test]
    fn test_friend_permissions() {
        let mut friend = IslandFriend::new(PlayerId::new());
        assert!(friend.grant("build"));
        assert!(!friend.grant("build"));
        assert!(friend.has("build"));
        assert!(friend.revoke("build"));
        assert!(!friend.revoke("build"));
        assert!(!friend.has("build"));
    }
}
