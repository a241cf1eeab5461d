//! # Command and Event Handlers
//!
//! Every operation the command layer and the world listener can trigger,
//! implemented as `impl IslandEngine` blocks grouped by concern:
//!
//! - [`lifecycle`] - create, home, restart, spawn and warp points
//! - [`party`] - invitations, kick, ban, unban, promote, leave, permissions
//! - [`settings`] - greeting, farewell, name, warp lock, biome
//! - [`travel`] - warps and teleporting to a party member
//! - [`info`] - party listing, island info and the top list
//! - [`movement`] - enter/exit tracking and movement, teleport and block gating
//!
//! Operations that take a player name receive it as `Option<&str>`; `None`
//! means the argument was missing and yields the usage reply.

pub mod info;
pub mod lifecycle;
pub mod movement;
pub mod party;
pub mod settings;
pub mod travel;

pub use movement::MoveVerdict;
