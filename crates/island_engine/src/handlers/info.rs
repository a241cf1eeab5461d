//! Read-only reports: party listing, island info and the top islands.
//!
//! Each report is sent line by line to the requester and also returned.

use crate::engine::IslandEngine;
use crate::error::IslandError;
use crate::score::rank_of;
use crate::types::{Material, PlayerId};

impl IslandEngine {
    fn send_lines(&self, player: PlayerId, lines: &[String]) {
        for line in lines {
            self.tell(player, line);
        }
    }

    /// Lists the name, owner and friends of the player's island.
    pub async fn show_island_party(&self, player: PlayerId) -> Result<Vec<String>, IslandError> {
        let party = {
            let table = self.registry().read().await;
            table
                .get_by_member(player)
                .map(|island| {
                    (
                        island.name().to_string(),
                        island.owner(),
                        island.friends().iter().map(|f| f.player).collect::<Vec<_>>(),
                    )
                })
                .ok_or(IslandError::NoIsland(
                    "You do not have an island to view party information for.",
                ))
        };
        let (name, owner, friends) = self.report(player, party)?;

        let mut lines = vec![
            format!("Island: {name}"),
            format!("Owner: {}", self.name_of(owner)),
            "Friends: ".to_string(),
        ];
        lines.extend(friends.into_iter().map(|friend| format!("* {}", self.name_of(friend))));
        self.send_lines(player, &lines);
        Ok(lines)
    }

    /// Rescores the island of `target_name` (or the requester's own island)
    /// and reports its rank, score and largest material contributions.
    pub async fn show_island_info(
        &self,
        requester: PlayerId,
        target_name: Option<&str>,
    ) -> Result<Vec<String>, IslandError> {
        let located = async {
            let (target, display) = match target_name {
                None => (requester, self.name_of(requester)),
                Some(name) => {
                    let target = self
                        .players()
                        .known_player(name)
                        .ok_or_else(|| IslandError::PlayerHasNoIsland(name.to_string()))?;
                    (target, name.to_string())
                }
            };
            self.registry()
                .read()
                .await
                .member_index(target)
                .ok_or(IslandError::PlayerHasNoIsland(display))
        }
        .await;
        let index = self.report(requester, located)?;

        let card = self.scores().rescore(self.registry(), index).await.unwrap_or_default();
        let (name, rank, total) = {
            let table = self.registry().read().await;
            let name = table
                .get_by_index(index)
                .map(|island| island.name().to_string())
                .unwrap_or_default();
            let rank = rank_of(&table.ranking(), index).unwrap_or(0);
            (name, rank, table.len())
        };

        let mut lines = vec![
            format!("Island: {name}"),
            format!("Rank: {rank}/{total}"),
            format!("Score: {:.2}", card.score),
        ];
        lines.extend(
            card.top_materials(self.config().scoring.top_count)
                .into_iter()
                .map(|(material, value)| {
                    format!("* {}: {:.2}", Material::new(material).display_name(), value)
                }),
        );
        self.send_lines(requester, &lines);
        Ok(lines)
    }

    /// Lists the highest scoring islands from the latest score cycle.
    pub async fn send_top_islands(&self, requester: PlayerId) -> Result<Vec<String>, IslandError> {
        let ranked = {
            let table = self.registry().read().await;
            if table.is_empty() {
                Err(IslandError::NoIslands)
            } else {
                let top: Vec<(String, f64)> = table
                    .ranking()
                    .into_iter()
                    .take(self.config().scoring.top_count)
                    .filter_map(|(index, score)| {
                        table
                            .get_by_index(index)
                            .map(|island| (island.name().to_string(), score))
                    })
                    .collect();
                Ok(top)
            }
        };
        let top = self.report(requester, ranked)?;

        let mut lines = vec![format!("Top {} Islands:", top.len())];
        lines.extend(
            top.iter()
                .enumerate()
                .map(|(position, (name, score))| format!("{}. {} - {:.2}", position + 1, name, score)),
        );
        self.send_lines(requester, &lines);
        Ok(lines)
    }
}
