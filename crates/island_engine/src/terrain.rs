//! Terrain access seam.
//!
//! The engine never touches world storage directly. It reads and writes
//! blocks, clears regions, stamps the starter island and applies biomes
//! through a [`TerrainService`] supplied at startup.

use crate::config::IslandSettings;
use crate::types::{Biome, BlockPos, Material};

/// Axis-aligned block volume covered by one island.
///
/// Minimum bounds are inclusive, maximum bounds exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IslandBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl IslandBounds {
    /// The square of side `2 * radius` around `center`, over the configured height range.
    pub fn around(center: (i32, i32), settings: &IslandSettings) -> Self {
        let radius = settings.radius_blocks();
        Self {
            min_x: center.0 - radius,
            max_x: center.0 + radius,
            min_y: settings.min_y,
            max_y: settings.max_y,
            min_z: center.1 - radius,
            max_z: center.1 + radius,
        }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        (self.min_x..self.max_x).contains(&pos.x)
            && (self.min_y..self.max_y).contains(&pos.y)
            && (self.min_z..self.max_z).contains(&pos.z)
    }

    /// Number of block positions inside the bounds.
    pub fn volume(&self) -> u64 {
        let span = |min: i32, max: i32| (max - min).max(0) as u64;
        span(self.min_x, self.max_x) * span(self.min_y, self.max_y) * span(self.min_z, self.max_z)
    }
}

/// Block-level world access used by the engine.
///
/// Implementations must be safe to call from the score job's worker threads
/// while the logic path builds or clears other islands.
pub trait TerrainService: Send + Sync {
    /// Material at a position; unloaded or empty positions report air.
    fn block_at(&self, world: &str, pos: BlockPos) -> Material;

    fn set_block(&self, world: &str, pos: BlockPos, material: Material);

    /// Removes every block (and non-player entity) inside `bounds`.
    fn clear_region(&self, world: &str, bounds: &IslandBounds);

    /// Stamps the starter island whose bedrock block sits at `center`.
    fn build_starter_island(&self, world: &str, center: BlockPos);

    /// Applies `biome` to every column inside `bounds`.
    fn set_biome(&self, world: &str, bounds: &IslandBounds, biome: Biome);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_around_center() {
        let settings = IslandSettings::default();
        let bounds = IslandBounds::around((72, 72), &settings);
        assert_eq!((bounds.min_x, bounds.max_x), (16, 128));
        assert_eq!((bounds.min_z, bounds.max_z), (16, 128));
        assert_eq!((bounds.min_y, bounds.max_y), (-64, 320));
        assert!(bounds.contains(BlockPos::new(16, -64, 127)));
        assert!(!bounds.contains(BlockPos::new(128, 0, 72)));
        assert_eq!(bounds.volume(), 112 * 112 * 384);
    }
}
