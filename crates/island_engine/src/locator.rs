//! Point-in-island queries and per-player presence tracking.
//!
//! Lookups are a linear scan over the active islands. An island matches when
//! the horizontal distance from its center is strictly below the radius.

use crate::config::IslandSettings;
use crate::island::Island;
use crate::types::{IslandIndex, Location, PlayerId};
use dashmap::DashMap;
use std::sync::Arc;

/// First island whose radius contains `location`.
pub fn island_at<'a>(
    islands: impl IntoIterator<Item = &'a Island>,
    location: &Location,
    settings: &IslandSettings,
) -> Option<&'a Island> {
    islands
        .into_iter()
        .find(|island| island.contains(location, settings))
}

/// Island boundary crossing produced by a single movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crossing {
    pub left: Option<IslandIndex>,
    pub entered: Option<IslandIndex>,
}

impl Crossing {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.entered.is_none()
    }
}

/// Remembers which island each player was last seen on.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    last_seen: Arc<DashMap<PlayerId, IslandIndex>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the island the player is now on and reports what changed.
    pub fn update(&self, player: PlayerId, current: Option<IslandIndex>) -> Crossing {
        let previous = match current {
            Some(index) => self.last_seen.insert(player, index),
            None => self.last_seen.remove(&player).map(|(_, index)| index),
        };
        if previous == current {
            return Crossing::default();
        }
        Crossing {
            left: previous,
            entered: current,
        }
    }

    pub fn current(&self, player: PlayerId) -> Option<IslandIndex> {
        self.last_seen.get(&player).map(|entry| *entry)
    }

    /// Forgets a player, e.g. when they disconnect.
    pub fn forget(&self, player: PlayerId) {
        self.last_seen.remove(&player);
    }
}

/// Block interactions that are restricted to the player's own island.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockAction {
    Break,
    Place,
    OpenContainer,
    UseWorkstation,
    UseFurnace,
    UseLever,
    UseDoor,
    UseButton,
    UseSign,
    UseBed,
    UseItem,
}

impl BlockAction {
    /// Phrase completing "You can't ... outside your island!".
    pub fn phrase(self) -> &'static str {
        match self {
            BlockAction::Break => "break blocks",
            BlockAction::Place => "place blocks",
            BlockAction::OpenContainer => "open containers",
            BlockAction::UseWorkstation => "use workstations",
            BlockAction::UseFurnace => "use furnaces",
            BlockAction::UseLever => "use levers",
            BlockAction::UseDoor => "interact with doors or gates",
            BlockAction::UseButton => "interact with buttons",
            BlockAction::UseSign => "interact with signs",
            BlockAction::UseBed => "interact with beds",
            BlockAction::UseItem => "use this",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_island_at_finds_containing_island() {
        let settings = IslandSettings::default();
        let islands = vec![
            Island::new(0, (72, 72), PlayerId::new(), "Alex", &settings),
            Island::new(1, (200, 72), PlayerId::new(), "Sam", &settings),
        ];

        let at = |x: f64, z: f64| {
            island_at(&islands, &Location::new("skyblock_world", x, 100.0, z), &settings)
                .map(Island::index)
        };
        assert_eq!(at(72.0, 72.0), Some(0));
        assert_eq!(at(190.0, 60.0), Some(1));
        // the gap between the two islands
        assert_eq!(at(136.0, 72.0), None);
        // the square's corner lies outside the circular radius
        assert_eq!(at(72.0 + 50.0, 72.0 + 50.0), None);
    }

    #[test]
    fn test_presence_reports_crossings_once() {
        let tracker = PresenceTracker::new();
        let player = PlayerId::new();

        assert_eq!(
            tracker.update(player, Some(0)),
            Crossing { left: None, entered: Some(0) }
        );
        assert!(tracker.update(player, Some(0)).is_empty());
        assert_eq!(
            tracker.update(player, Some(1)),
            Crossing { left: Some(0), entered: Some(1) }
        );
        assert_eq!(
            tracker.update(player, None),
            Crossing { left: Some(1), entered: None }
        );
        assert!(tracker.update(player, None).is_empty());
        assert_eq!(tracker.current(player), None);
    }

    #[test]
    fn test_block_action_phrases() {
        assert_eq!(BlockAction::Break.phrase(), "break blocks");
        assert_eq!(BlockAction::UseDoor.phrase(), "interact with doors or gates");
    }
}
