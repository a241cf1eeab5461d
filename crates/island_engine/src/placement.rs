//! Deterministic island placement.
//!
//! Islands are packed into rows of `max_per_row` cells. Every cell is
//! `2 * radius + buffer` chunks wide, so an island's center depends only on
//! its index and never on creation order or on which islands still exist.

use crate::config::{IslandSettings, BLOCKS_PER_CHUNK};
use crate::types::IslandIndex;

/// Maps island indices to world block coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementAllocator {
    radius_chunks: f32,
    buffer_chunks: u32,
    max_per_row: u32,
}

impl PlacementAllocator {
    pub fn new(radius_chunks: f32, buffer_chunks: u32, max_per_row: u32) -> Self {
        Self {
            radius_chunks,
            buffer_chunks,
            max_per_row: max_per_row.max(1),
        }
    }

    pub fn from_settings(settings: &IslandSettings) -> Self {
        Self::new(
            settings.radius_chunks,
            settings.buffer_chunks,
            settings.max_per_row,
        )
    }

    /// Returns the `(x, z)` block center of the island with the given index.
    pub fn allocate(&self, index: IslandIndex) -> (i32, i32) {
        let col = index % self.max_per_row;
        let row = index / self.max_per_row;
        (
            chunks_to_blocks(self.cell_offset(col)) + BLOCKS_PER_CHUNK / 2,
            chunks_to_blocks(self.cell_offset(row)) + BLOCKS_PER_CHUNK / 2,
        )
    }

    fn cell_offset(&self, cell: u32) -> f32 {
        let cell = cell as f32;
        (cell + 1.0) * self.buffer_chunks as f32 + (cell * 2.0 + 1.0) * self.radius_chunks
    }
}

/// Whole chunks to blocks. The fractional part of the chunk count is dropped first.
pub fn chunks_to_blocks(chunks: f32) -> i32 {
    (chunks as i32) * BLOCKS_PER_CHUNK
}
