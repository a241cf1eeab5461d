//! # Island Scoring
//!
//! Every scoring cycle rescans the full volume of every active island and
//! replaces its score and per-material breakdown wholesale. Scans read the
//! terrain through [`TerrainService`] only, so they run on rayon worker threads
//! inside `spawn_blocking` while the logic path keeps serving players.
//!
//! Results are written back only for islands still registered when the cycle
//! finishes; an island created mid-cycle is picked up by the next one.

use crate::config::{IslandSettings, ScoreSettings};
use crate::registry::IslandRegistry;
use crate::terrain::{IslandBounds, TerrainService};
use crate::types::{BlockPos, IslandIndex};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Score of one island and the contribution of each material to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCard {
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

impl ScoreCard {
    /// Materials ordered by contribution, largest first, at most `limit` entries.
    pub fn top_materials(&self, limit: usize) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self
            .breakdown
            .iter()
            .map(|(material, value)| (material.as_str(), *value))
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        entries.truncate(limit);
        entries
    }
}

/// Voxel-volume scorer.
#[derive(Clone)]
pub struct ScoreEngine {
    islands: IslandSettings,
    scoring: ScoreSettings,
    terrain: Arc<dyn TerrainService>,
}

impl ScoreEngine {
    pub fn new(islands: IslandSettings, scoring: ScoreSettings, terrain: Arc<dyn TerrainService>) -> Self {
        Self {
            islands,
            scoring,
            terrain,
        }
    }

    /// Scans every block of the island centred at `center`.
    pub fn score_island(&self, center: (i32, i32)) -> ScoreCard {
        let bounds = IslandBounds::around(center, &self.islands);
        let world = self.islands.world.as_str();
        let mut card = ScoreCard::default();

        for x in bounds.min_x..bounds.max_x {
            for z in bounds.min_z..bounds.max_z {
                for y in bounds.min_y..bounds.max_y {
                    let material = self.terrain.block_at(world, BlockPos::new(x, y, z));
                    if material.is_air() {
                        continue;
                    }
                    let weight = self.scoring.weight_of(material.name());
                    card.score += weight;
                    *card.breakdown.entry(material.0).or_insert(0.0) += weight;
                }
            }
        }
        card
    }

    /// Scores a batch of islands in parallel.
    pub fn score_all(&self, centers: &[(IslandIndex, (i32, i32))]) -> Vec<(IslandIndex, ScoreCard)> {
        centers
            .par_iter()
            .map(|(index, center)| (*index, self.score_island(*center)))
            .collect()
    }

    /// Runs one full scoring cycle against the registry.
    ///
    /// Returns the number of islands whose score was updated.
    pub async fn run_cycle(&self, registry: &IslandRegistry) -> Result<usize, tokio::task::JoinError> {
        let centers = registry.read().await.centers();
        if centers.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let engine = self.clone();
        let cards = tokio::task::spawn_blocking(move || engine.score_all(&centers)).await?;

        let updated = registry.write().await.apply_scores(cards);
        debug!(
            "📊 Score cycle updated {} islands in {:?}",
            updated,
            started.elapsed()
        );
        Ok(updated)
    }

    /// Rescans a single island immediately, used by the island info report.
    pub async fn rescore(&self, registry: &IslandRegistry, index: IslandIndex) -> Option<ScoreCard> {
        let center = registry.read().await.get_by_index(index)?.center();
        let engine = self.clone();
        let card = tokio::task::spawn_blocking(move || engine.score_island(center))
            .await
            .ok()?;
        registry
            .write()
            .await
            .apply_scores(vec![(index, card.clone())]);
        info!("📊 Rescored island {} on demand: {:.2}", index, card.score);
        Some(card)
    }
}

/// Orders islands by score, highest first. Equal scores keep index order.
pub fn rank_order(scores: impl IntoIterator<Item = (IslandIndex, f64)>) -> Vec<(IslandIndex, f64)> {
    let mut ordered: Vec<(IslandIndex, f64)> = scores.into_iter().collect();
    ordered.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ordered
}

/// 1-based position of `index` in the ranking, if it is ranked at all.
pub fn rank_of(ordered: &[(IslandIndex, f64)], index: IslandIndex) -> Option<usize> {
    ordered
        .iter()
        .position(|(candidate, _)| *candidate == index)
        .map(|position| position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Material;
    use crate::world::MemoryTerrain;

    fn compact_settings() -> IslandSettings {
        IslandSettings {
            radius_chunks: 0.5,
            min_y: 90,
            max_y: 120,
            ..IslandSettings::default()
        }
    }

    #[test]
    fn test_score_counts_non_air_blocks() {
        let terrain = MemoryTerrain::new();
        let settings = compact_settings();
        for y in 100..103 {
            terrain.set_block(&settings.world, BlockPos::new(0, y, 0), Material::new("DIRT"));
        }
        terrain.set_block(&settings.world, BlockPos::new(1, 100, 1), Material::new("DIAMOND_BLOCK"));
        // outside the island square
        terrain.set_block(&settings.world, BlockPos::new(8, 100, 0), Material::new("DIRT"));

        let mut scoring = ScoreSettings::default();
        scoring.weights.insert("DIAMOND_BLOCK".to_string(), 10.0);
        let engine = ScoreEngine::new(settings, scoring, Arc::new(terrain));

        let card = engine.score_island((0, 0));
        assert!((card.score - 10.03).abs() < 1e-9);
        assert!((card.breakdown["DIRT"] - 0.03).abs() < 1e-9);
        assert_eq!(card.breakdown["DIAMOND_BLOCK"], 10.0);
        assert_eq!(card.top_materials(1), vec![("DIAMOND_BLOCK", 10.0)]);
    }

    #[test]
    fn test_empty_island_scores_zero() {
        let engine = ScoreEngine::new(
            compact_settings(),
            ScoreSettings::default(),
            Arc::new(MemoryTerrain::new()),
        );
        let card = engine.score_island((500, 500));
        assert_eq!(card.score, 0.0);
        assert!(card.breakdown.is_empty());
    }

    #[test]
    fn test_rank_order_breaks_ties_by_index() {
        let ordered = rank_order(vec![(0, 1.0), (1, 5.0), (2, 1.0), (3, 7.5)]);
        assert_eq!(
            ordered.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
            vec![3, 1, 0, 2]
        );
        assert_eq!(rank_of(&ordered, 0), Some(3));
        assert_eq!(rank_of(&ordered, 9), None);
    }
}
