//! Warps and teleporting to party members.

use crate::engine::IslandEngine;
use crate::error::IslandError;
use crate::types::PlayerId;

impl IslandEngine {
    /// Teleports `player` to the warp of their own island, or of the island
    /// `target_name` belongs to.
    ///
    /// Banned players are always refused; a locked warp only admits members.
    pub async fn warp_teleport(&self, player: PlayerId, target_name: Option<&str>) -> Result<(), IslandError> {
        let warp = async {
            let (target, display) = match target_name {
                None => (player, self.name_of(player)),
                Some(name) => {
                    let target = self
                        .players()
                        .known_player(name)
                        .ok_or_else(|| IslandError::NoWarpIsland(name.to_string()))?;
                    (target, name.to_string())
                }
            };
            let table = self.registry().read().await;
            let island = table
                .get_by_member(target)
                .ok_or_else(|| IslandError::NoWarpIsland(display.clone()))?;
            if island.is_banned(player) {
                return Err(IslandError::Banned(island.name().to_string()));
            }
            if island.is_locked() && !island.is_member(player) {
                return Err(IslandError::WarpClosed(display));
            }
            Ok::<_, IslandError>(island.warp().clone())
        }
        .await;
        let warp = self.report(player, warp)?;
        self.players().teleport(player, &warp);
        Ok(())
    }

    /// Teleports `player` to a party member who is standing on their island.
    pub async fn teleport_to_friend(&self, player: PlayerId, friend_name: Option<&str>) -> Result<(), IslandError> {
        let destination = async {
            let name = friend_name.ok_or(IslandError::Usage("/island teleport <friend>"))?;
            let table = self.registry().read().await;
            let island = table
                .get_by_member(player)
                .ok_or(IslandError::NoIsland("You do not have an island to use this command on."))?;
            let friend = self
                .players()
                .online_player(name)
                .ok_or_else(|| IslandError::PlayerOffline(name.to_string()))?;
            if friend == player || !island.is_member(friend) {
                return Err(IslandError::FriendNoAccess(name.to_string()));
            }
            let location = self
                .players()
                .location_of(friend)
                .ok_or_else(|| IslandError::PlayerOffline(name.to_string()))?;
            if location.world != self.settings().world {
                return Err(IslandError::FriendInOtherWorld(name.to_string()));
            }
            if !island.contains(&location, self.settings()) {
                return Err(IslandError::FriendNotOnIsland(name.to_string()));
            }
            Ok::<_, IslandError>(location)
        }
        .await;
        let destination = self.report(player, destination)?;
        self.players().teleport(player, &destination);
        Ok(())
    }
}
