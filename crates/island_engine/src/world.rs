//! In-memory voxel world.
//!
//! [`MemoryTerrain`] is a sparse block store implementing [`TerrainService`].
//! Only non-air blocks are stored. It backs the standalone server binary and
//! the engine's tests.

use crate::terrain::{IslandBounds, TerrainService};
use crate::types::{Biome, BlockPos, Material};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct WorldBlocks {
    blocks: DashMap<BlockPos, Material>,
    biomes: DashMap<(i32, i32), Biome>,
}

/// Thread-safe sparse voxel storage keyed by world name.
#[derive(Debug, Default, Clone)]
pub struct MemoryTerrain {
    worlds: Arc<DashMap<String, Arc<WorldBlocks>>>,
}

impl MemoryTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    fn world(&self, name: &str) -> Option<Arc<WorldBlocks>> {
        self.worlds.get(name).map(|entry| Arc::clone(entry.value()))
    }

    fn world_or_create(&self, name: &str) -> Arc<WorldBlocks> {
        if let Some(world) = self.world(name) {
            return world;
        }
        Arc::clone(
            self.worlds
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(WorldBlocks::default()))
                .value(),
        )
    }

    /// Number of stored (non-air) blocks in a world.
    pub fn block_count(&self, world: &str) -> usize {
        self.world(world).map(|w| w.blocks.len()).unwrap_or(0)
    }

    pub fn biome_at(&self, world: &str, x: i32, z: i32) -> Option<Biome> {
        self.world(world)
            .and_then(|w| w.biomes.get(&(x, z)).map(|biome| *biome))
    }
}

impl TerrainService for MemoryTerrain {
    fn block_at(&self, world: &str, pos: BlockPos) -> Material {
        self.world(world)
            .and_then(|w| w.blocks.get(&pos).map(|m| m.clone()))
            .unwrap_or_else(Material::air)
    }

    fn set_block(&self, world: &str, pos: BlockPos, material: Material) {
        let blocks = self.world_or_create(world);
        if material.is_air() {
            blocks.blocks.remove(&pos);
        } else {
            blocks.blocks.insert(pos, material);
        }
    }

    fn clear_region(&self, world: &str, bounds: &IslandBounds) {
        if let Some(blocks) = self.world(world) {
            let before = blocks.blocks.len();
            blocks.blocks.retain(|pos, _| !bounds.contains(*pos));
            debug!(
                "🧹 Cleared {} blocks in {} between ({}, {}) and ({}, {})",
                before - blocks.blocks.len(),
                world,
                bounds.min_x,
                bounds.min_z,
                bounds.max_x,
                bounds.max_z
            );
        }
    }

    fn build_starter_island(&self, world: &str, center: BlockPos) {
        for (pos, material) in starter_island(center) {
            self.set_block(world, pos, Material::new(material));
        }
    }

    fn set_biome(&self, world: &str, bounds: &IslandBounds, biome: Biome) {
        let blocks = self.world_or_create(world);
        for x in bounds.min_x..bounds.max_x {
            for z in bounds.min_z..bounds.max_z {
                blocks.biomes.insert((x, z), biome);
            }
        }
    }
}

/// Block layout of a fresh island: a bedrock anchor, four tapering soil layers
/// with a sand core, a grass top, a small oak and a chest.
fn starter_island(center: BlockPos) -> Vec<(BlockPos, &'static str)> {
    let mut layout = vec![(center, "BEDROCK")];
    let at = |dx: i32, dy: i32, dz: i32| BlockPos::new(center.x + dx, center.y + dy, center.z + dz);

    for layer in 1i32..=4 {
        let reach = layer - 1;
        for dx in -layer..=layer {
            for dz in -layer..=layer {
                let chebyshev = dx.abs().max(dz.abs());
                let on_axis = dx == 0 || dz == 0;
                let included = if layer == 4 {
                    chebyshev <= 3 && !(dx.abs() == 3 && dz.abs() == 3)
                } else {
                    chebyshev <= reach || (on_axis && chebyshev == layer)
                };
                if !included {
                    continue;
                }
                let material = match (layer, dx, dz) {
                    (4, _, _) => "GRASS_BLOCK",
                    (_, 0, 0) => "SAND",
                    _ => "DIRT",
                };
                layout.push((at(dx, layer, dz), material));
            }
        }
    }

    for dy in 5..=8 {
        layout.push((at(-2, dy, -2), "OAK_LOG"));
    }
    for dx in -4i32..=0 {
        for dz in -4i32..=0 {
            for dy in 7..=9 {
                let edge = (dx + 2).abs() == 2 && (dz + 2).abs() == 2;
                if (dx, dz) == (-2, -2) && dy < 9 || edge && dy == 9 {
                    continue;
                }
                layout.push((at(dx, dy, dz), "OAK_LEAVES"));
            }
        }
    }
    layout.push((at(1, 5, -2), "CHEST"));
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IslandSettings;

    #[test]
    fn test_set_and_read_blocks() {
        let terrain = MemoryTerrain::new();
        let pos = BlockPos::new(1, 2, 3);
        assert!(terrain.block_at("skyblock_world", pos).is_air());

        terrain.set_block("skyblock_world", pos, Material::new("STONE"));
        assert_eq!(terrain.block_at("skyblock_world", pos), Material::new("STONE"));
        assert!(terrain.block_at("world", pos).is_air());

        terrain.set_block("skyblock_world", pos, Material::air());
        assert_eq!(terrain.block_count("skyblock_world"), 0);
    }

    #[test]
    fn test_starter_island_is_anchored_on_bedrock() {
        let terrain = MemoryTerrain::new();
        let center = BlockPos::new(72, 100, 72);
        terrain.build_starter_island("skyblock_world", center);

        assert_eq!(terrain.block_at("skyblock_world", center), Material::new("BEDROCK"));
        assert_eq!(
            terrain.block_at("skyblock_world", BlockPos::new(72, 101, 72)),
            Material::new("SAND")
        );
        assert_eq!(
            terrain.block_at("skyblock_world", BlockPos::new(75, 104, 70)),
            Material::new("GRASS_BLOCK")
        );
        // grass corners are cut
        assert!(terrain
            .block_at("skyblock_world", BlockPos::new(75, 104, 75))
            .is_air());
    }

    #[test]
    fn test_clear_region_only_touches_bounds() {
        let terrain = MemoryTerrain::new();
        let settings = IslandSettings::default();
        terrain.build_starter_island("skyblock_world", BlockPos::new(72, 100, 72));
        terrain.build_starter_island("skyblock_world", BlockPos::new(200, 100, 72));
        let per_island = terrain.block_count("skyblock_world") / 2;

        terrain.clear_region("skyblock_world", &IslandBounds::around((72, 72), &settings));
        assert_eq!(terrain.block_count("skyblock_world"), per_island);
    }

    #[test]
    fn test_set_biome_covers_columns() {
        let terrain = MemoryTerrain::new();
        let settings = IslandSettings {
            radius_chunks: 0.5,
            ..IslandSettings::default()
        };
        let bounds = IslandBounds::around((0, 0), &settings);
        terrain.set_biome("skyblock_world", &bounds, Biome::Desert);
        assert_eq!(terrain.biome_at("skyblock_world", -8, 7), Some(Biome::Desert));
        assert_eq!(terrain.biome_at("skyblock_world", 8, 0), None);
    }
}
