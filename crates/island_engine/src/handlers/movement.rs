//! World listener hooks: movement, teleports, block interactions and respawns.
//!
//! The server calls these for every matching world event. They never mutate
//! islands; they only track which island a player stands on, send greeting
//! and farewell texts and decide whether the event may proceed.

use crate::engine::IslandEngine;
use crate::error::IslandError;
use crate::island::Island;
use crate::locator::BlockAction;
use crate::registry::IslandTable;
use crate::types::{Location, PlayerId};
use tracing::debug;

/// Outcome of a movement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveVerdict {
    Allowed,
    /// The player was refused entry and sent to the lobby
    Expelled,
}

/// Why `player` may not stand on `island`, if anything.
fn entry_refusal(island: &Island, player: PlayerId) -> Option<IslandError> {
    if island.is_banned(player) {
        Some(IslandError::Banned(island.name().to_string()))
    } else if island.is_locked() && !island.is_member(player) {
        Some(IslandError::Locked)
    } else {
        None
    }
}

impl IslandEngine {
    /// Sends the farewell of the island left and the greeting of the island
    /// entered, if the player crossed an island boundary.
    fn announce_crossing(&self, table: &IslandTable, player: PlayerId, current: Option<&Island>) {
        let crossing = self.presence().update(player, current.map(Island::index));
        if let Some(left) = crossing.left.and_then(|index| table.find_any(index)) {
            self.tell(player, left.farewell());
        }
        if let Some(entered) = current.filter(|_| crossing.entered.is_some()) {
            self.tell(player, entered.greeting());
        }
    }

    /// Movement hook. Banned or locked-out players are sent to the lobby.
    pub async fn on_player_move(&self, player: PlayerId, to: &Location) -> MoveVerdict {
        let refusal = {
            let table = self.registry().read().await;
            let current = table.island_at(to);
            let refusal = current.and_then(|island| entry_refusal(island, player));
            if refusal.is_none() {
                self.announce_crossing(&table, player, current);
            }
            refusal
        };

        match refusal {
            Some(reason) => {
                self.tell(player, &reason.to_string());
                self.players().send_to_lobby(player);
                self.presence().forget(player);
                debug!("🚫 {} expelled: {}", player, reason);
                MoveVerdict::Expelled
            }
            None => MoveVerdict::Allowed,
        }
    }

    /// Teleport hook. Destinations in the island world must lie on an island
    /// the player may enter; the refusal is sent to the player.
    pub async fn check_teleport(&self, player: PlayerId, to: &Location) -> Result<(), IslandError> {
        let verdict = {
            let table = self.registry().read().await;
            let current = table.island_at(to);
            let verdict = if to.world == self.settings().world {
                match current {
                    None => Err(IslandError::NotAnIsland),
                    Some(island) => entry_refusal(island, player).map_or(Ok(()), Err),
                }
            } else {
                Ok(())
            };
            if verdict.is_ok() {
                self.announce_crossing(&table, player, current);
            }
            verdict
        };
        self.report(player, verdict)
    }

    /// Block break, place and use hook. Outside the lobby world players may
    /// only touch blocks on their own island unless they are operators.
    pub async fn check_block_action(
        &self,
        player: PlayerId,
        target: &Location,
        action: BlockAction,
        operator: bool,
    ) -> Result<(), IslandError> {
        if operator {
            return Ok(());
        }
        let in_lobby = self
            .players()
            .location_of(player)
            .map(|here| here.world == self.settings().lobby_world)
            .unwrap_or(false);
        if in_lobby {
            return Ok(());
        }

        let allowed = self
            .registry()
            .read()
            .await
            .get_by_member(player)
            .map(|island| island.contains(target, self.settings()))
            .unwrap_or(false);
        let verdict = if allowed {
            Ok(())
        } else {
            Err(IslandError::OutsideIsland(action.phrase()))
        };
        self.report(player, verdict)
    }

    /// Where the player respawns: their island spawn, if they have an island.
    pub async fn respawn_location(&self, player: PlayerId) -> Option<Location> {
        self.registry()
            .read()
            .await
            .get_by_member(player)
            .map(|island| island.spawn().clone())
    }

    /// Disconnect hook.
    pub fn player_quit(&self, player: PlayerId) {
        self.presence().forget(player);
    }
}
