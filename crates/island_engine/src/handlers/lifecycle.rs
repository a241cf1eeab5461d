//! Island creation, reset and the owner-settable spawn and warp points.

use crate::engine::IslandEngine;
use crate::error::IslandError;
use crate::types::{IslandIndex, Location, PlayerId};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IslandPoint {
    Spawn,
    Warp,
}

impl IslandPoint {
    fn label(self) -> &'static str {
        match self {
            IslandPoint::Spawn => "spawn",
            IslandPoint::Warp => "warp",
        }
    }

    fn missing_island(self) -> &'static str {
        match self {
            IslandPoint::Spawn => "You do not have an island to set the spawn for.",
            IslandPoint::Warp => "You do not have an island to set the warp for.",
        }
    }
}

impl IslandEngine {
    /// Creates, builds and saves a fresh island for `player`, then teleports
    /// them to its spawn.
    pub async fn create_island(&self, player: PlayerId) -> Result<IslandIndex, IslandError> {
        let owner_name = self.name_of(player);
        let created = {
            let mut table = self.registry().write().await;
            match table.get_by_member(player).map(|island| island.is_owner(player)) {
                Some(true) => Err(IslandError::AlreadyOwnsIsland),
                Some(false) => Err(IslandError::AlreadyMember),
                None => {
                    let island = table.create(player, &owner_name);
                    Ok((island.index(), island.center(), island.spawn().clone()))
                }
            }
        };
        let (index, center, spawn) = self.report(player, created)?;

        self.rebuild_terrain(center);
        self.players().teleport(player, &spawn);
        info!("🏝️ {} created island {} at {:?}", owner_name, index, center);

        self.save_inline().await;
        Ok(index)
    }

    /// Teleports the player to the spawn of the island they belong to.
    pub async fn teleport_to_island(&self, player: PlayerId) -> Result<(), IslandError> {
        let spawn = self
            .registry()
            .read()
            .await
            .get_by_member(player)
            .map(|island| island.spawn().clone())
            .ok_or(IslandError::NoIsland("You do not have an island to teleport to."));
        let spawn = self.report(player, spawn)?;
        self.players().teleport(player, &spawn);
        Ok(())
    }

    /// Wipes the owner's island back to a fresh starter island.
    ///
    /// Online members standing in the island world are sent to the lobby and
    /// every online member has their state reset. Party, bans, lock, texts,
    /// spawn and warp all return to their defaults.
    pub async fn restart_island(&self, player: PlayerId) -> Result<(), IslandError> {
        let owner_name = self.name_of(player);
        let restarted = {
            let mut table = self.registry().write().await;
            let settings = self.settings().clone();
            match table.member_mut(player) {
                None => Err(IslandError::NoIsland("You do not have an island to restart.")),
                Some(island) if !island.is_owner(player) => Err(IslandError::NotOwnerRestart),
                Some(island) => {
                    let friends: Vec<PlayerId> =
                        island.friends().iter().map(|friend| friend.player).collect();
                    island.reset(&owner_name, &settings);
                    Ok((island.index(), island.center(), island.spawn().clone(), friends))
                }
            }
        };
        let (index, center, spawn, friends) = self.report(player, restarted)?;

        let world = self.settings().world.clone();
        for member in std::iter::once(player).chain(friends) {
            if !self.players().is_online(member) {
                continue;
            }
            let in_island_world = self
                .players()
                .location_of(member)
                .map(|location| location.world == world)
                .unwrap_or(false);
            if in_island_world {
                self.players().send_to_lobby(member);
            }
            self.players().reset_player_state(member);
            if member == player {
                self.tell(member, "Your island has been reset. Use /island home to teleport to your new island.");
            } else {
                self.tell(member, "The island has been reset. Please wait for the owner to invite you back or create your own island.");
            }
        }

        self.rebuild_terrain(center);
        self.players().teleport(player, &spawn);
        info!("🔄 {} restarted island {}", owner_name, index);

        self.save_inline().await;
        Ok(())
    }

    /// Moves the island spawn to the player's current location.
    pub async fn set_island_spawn(&self, player: PlayerId) -> Result<(), IslandError> {
        self.set_point(player, IslandPoint::Spawn).await?;
        self.tell(player, "Island spawn point set to your current location.");
        Ok(())
    }

    /// Moves the island warp to the player's current location.
    pub async fn set_island_warp(&self, player: PlayerId) -> Result<(), IslandError> {
        self.set_point(player, IslandPoint::Warp).await?;
        self.tell(player, "Island warp point set to your current location.");
        Ok(())
    }

    async fn set_point(&self, player: PlayerId, point: IslandPoint) -> Result<(), IslandError> {
        let location: Option<Location> = self.players().location_of(player);
        let result = {
            let mut table = self.registry().write().await;
            match table.member_mut(player) {
                None => Err(IslandError::NoIsland(point.missing_island())),
                Some(island) => match location {
                    Some(here) if island.contains(&here, self.settings()) => {
                        match point {
                            IslandPoint::Spawn => island.set_spawn(here),
                            IslandPoint::Warp => island.set_warp(here),
                        }
                        Ok(())
                    }
                    _ => Err(IslandError::NotOnIsland(point.label())),
                },
            }
        };
        self.report(player, result)
    }
}
