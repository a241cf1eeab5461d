//! Owner-settable island settings: greeting, farewell, name, warp lock and biome.

use crate::access::AccessError;
use crate::engine::IslandEngine;
use crate::error::IslandError;
use crate::island::Island;
use crate::types::{Biome, PlayerId};
use tracing::info;

const NO_ISLAND: &str = "You do not have an island to use this command on.";

impl IslandEngine {
    /// Applies `edit` to the island the player belongs to.
    async fn edit_island<T>(
        &self,
        player: PlayerId,
        missing: &'static str,
        edit: impl FnOnce(&mut Island) -> Result<T, IslandError>,
    ) -> Result<T, IslandError> {
        let result = {
            let mut table = self.registry().write().await;
            match table.member_mut(player) {
                Some(island) => edit(island),
                None => Err(IslandError::NoIsland(missing)),
            }
        };
        self.report(player, result)
    }

    /// Sets the message shown when someone enters the island.
    pub async fn set_greeting(&self, player: PlayerId, message: &str) -> Result<(), IslandError> {
        let message = message.trim();
        self.edit_island(player, NO_ISLAND, |island| {
            if message.is_empty() {
                return Err(IslandError::Usage("/island setgreeting <message>"));
            }
            island.set_greeting(message);
            Ok(())
        })
        .await?;
        self.tell(player, &format!("Island greeting set to: {message}"));
        Ok(())
    }

    /// Sets the message shown when someone leaves the island.
    pub async fn set_farewell(&self, player: PlayerId, message: &str) -> Result<(), IslandError> {
        let message = message.trim();
        self.edit_island(player, NO_ISLAND, |island| {
            if message.is_empty() {
                return Err(IslandError::Usage("/island setfarewell <message>"));
            }
            island.set_farewell(message);
            Ok(())
        })
        .await?;
        self.tell(player, &format!("Island farewell set to: {message}"));
        Ok(())
    }

    /// Renames the island. Greeting and farewell keep their current text.
    pub async fn set_island_name(&self, player: PlayerId, name: &str) -> Result<(), IslandError> {
        let name = name.trim();
        self.edit_island(player, NO_ISLAND, |island| {
            if name.is_empty() {
                return Err(IslandError::Usage("/island setname <name>"));
            }
            island.set_name(name);
            Ok(())
        })
        .await?;
        self.tell(player, &format!("Island name set to {name}."));
        Ok(())
    }

    pub async fn lock_warp(&self, player: PlayerId) -> Result<(), IslandError> {
        self.edit_island(player, NO_ISLAND, |island| {
            island.lock().map_err(|_: AccessError| IslandError::AlreadyLocked)
        })
        .await?;
        self.tell(player, "Island warp is now locked.");
        Ok(())
    }

    pub async fn unlock_warp(&self, player: PlayerId) -> Result<(), IslandError> {
        self.edit_island(player, NO_ISLAND, |island| {
            island.unlock().map_err(|_: AccessError| IslandError::AlreadyUnlocked)
        })
        .await?;
        self.tell(player, "Island warp is now unlocked.");
        Ok(())
    }

    /// Flips the warp lock. Returns the new state.
    pub async fn toggle_warp_lock(&self, player: PlayerId) -> Result<bool, IslandError> {
        let locked = self
            .edit_island(player, NO_ISLAND, |island| Ok(island.toggle_lock()))
            .await?;
        let state = if locked { "locked" } else { "unlocked" };
        self.tell(player, &format!("Island warp is now {state}."));
        Ok(locked)
    }

    /// Applies one of the selectable biomes to the whole island volume.
    pub async fn set_island_biome(&self, player: PlayerId, biome_name: Option<&str>) -> Result<Biome, IslandError> {
        let chosen = async {
            let raw = biome_name.ok_or(IslandError::Usage("/island setbiome <biome>"))?;
            let bounds = {
                let table = self.registry().read().await;
                table
                    .get_by_member(player)
                    .map(|island| island.bounds(self.settings()))
                    .ok_or(IslandError::NoIsland("You do not have an island to set the biome for."))?
            };
            let biome = raw
                .parse::<Biome>()
                .map_err(|_| IslandError::UnknownBiome(Biome::available()))?;
            Ok::<_, IslandError>((biome, bounds))
        }
        .await;
        let (biome, bounds) = self.report(player, chosen)?;

        self.terrain().set_biome(&self.settings().world, &bounds, biome);
        self.tell(
            player,
            &format!("Your island biome has been set to {}.", biome.display_name()),
        );
        info!("🌿 {} set biome {} over {} blocks", self.name_of(player), biome, bounds.volume());
        Ok(biome)
    }
}
