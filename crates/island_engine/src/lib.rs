//! # Island Engine
//!
//! Lifecycle and access control for per-player sky islands: creation on a
//! non-overlapping placement grid, party membership through expiring
//! invitations, bans and warp locks, periodic terrain scoring, and crash-safe
//! persistence of every island to a single JSON document.
//!
//! ## Architecture Overview
//!
//! - **Registry** ([`registry`]): the island table behind one async lock,
//!   with lookups by index, owner and member
//! - **Access** ([`access`]): party, ban and lock rules as methods on [`Island`]
//! - **Invitations** ([`invitation`]): one pending invitation per player,
//!   superseded by newer ones and expired by generation
//! - **Scoring** ([`score`]): parallel terrain scans weighted per material
//! - **Persistence** ([`persistence`]): tolerant JSON records, atomic writes
//! - **Handlers** ([`handlers`]): every player-facing operation, implemented on
//!   [`IslandEngine`]
//! - **Seams** ([`terrain`], [`gateway`]): the world and the players, supplied
//!   by the hosting server
//!
//! ## Quick Start Example
//!
//! ```rust,no_run
//! use island_engine::*;
//! use std::sync::Arc;
//!
//! # struct Console;
//! # impl gateway::PlayerGateway for Console {
//! #     fn online_player(&self, _: &str) -> Option<PlayerId> { None }
//! #     fn known_player(&self, _: &str) -> Option<PlayerId> { None }
//! #     fn name_of(&self, player: PlayerId) -> String { player.to_string() }
//! #     fn is_online(&self, _: PlayerId) -> bool { false }
//! #     fn location_of(&self, _: PlayerId) -> Option<Location> { None }
//! #     fn send_message(&self, _: PlayerId, _: &str) {}
//! #     fn teleport(&self, _: PlayerId, _: &Location) {}
//! #     fn send_to_lobby(&self, _: PlayerId) {}
//! #     fn reset_player_state(&self, _: PlayerId) {}
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = IslandEngine::new(
//!         EngineConfig::default(),
//!         Arc::new(MemoryTerrain::new()),
//!         Arc::new(Console),
//!     );
//!     engine.load().await?;
//!
//!     let shutdown = ShutdownState::new();
//!     let scores = spawn_score_task(engine.clone(), shutdown.clone());
//!     let autosave = spawn_autosave_task(engine.clone(), shutdown.clone());
//!
//!     let owner = PlayerId::new();
//!     let index = engine.create_island(owner).await?;
//!     println!("Created island {index}");
//!
//!     shutdown.initiate_shutdown();
//!     let _ = tokio::join!(scores, autosave);
//!     engine.save(true).await?;
//!     Ok(())
//! }
//! ```


pub mod access;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod invitation;
pub mod island;
pub mod locator;
pub mod persistence;
pub mod placement;
pub mod registry;
pub mod score;
pub mod shutdown;
pub mod tasks;
pub mod terrain;
pub mod types;
pub mod world;

pub use access::{AccessError, BanOutcome};
pub use config::{
    EngineConfig, InvitationSettings, IslandSettings, PersistenceSettings, ScoreSettings,
    SpawnOffset,
};
pub use engine::IslandEngine;
pub use error::{IslandError, PersistenceError};
pub use gateway::PlayerGateway;
pub use handlers::MoveVerdict;
pub use invitation::{InvitationManager, PendingInvitation};
pub use island::{Island, IslandFriend};
pub use locator::{BlockAction, Crossing, PresenceTracker};
pub use persistence::{IslandStore, SaveOutcome};
pub use placement::PlacementAllocator;
pub use registry::{IslandRegistry, IslandTable};
pub use score::{ScoreCard, ScoreEngine};
pub use shutdown::ShutdownState;
pub use tasks::{spawn_autosave_task, spawn_score_task};
pub use terrain::{IslandBounds, TerrainService};
pub use types::{Biome, BlockPos, IslandIndex, Location, Material, PlayerId};
pub use world::MemoryTerrain;
