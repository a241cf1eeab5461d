//! Player access seam.
//!
//! Everything the engine needs to know or do about a player beyond their
//! identity goes through [`PlayerGateway`]: name resolution, presence,
//! messaging, teleporting and resetting their personal state. The server
//! layer provides the implementation; tests use a recording double.

use crate::types::{Location, PlayerId};

pub trait PlayerGateway: Send + Sync {
    /// Resolves the name of a player who is currently online.
    fn online_player(&self, name: &str) -> Option<PlayerId>;

    /// Resolves the name of any player the server has seen, online or not.
    fn known_player(&self, name: &str) -> Option<PlayerId>;

    /// Display name; falls back to the identity string for unknown players.
    fn name_of(&self, player: PlayerId) -> String;

    fn is_online(&self, player: PlayerId) -> bool;

    /// Current location of an online player.
    fn location_of(&self, player: PlayerId) -> Option<Location>;

    /// Sends a plain text message. Silently dropped for offline players.
    fn send_message(&self, player: PlayerId, message: &str);

    fn teleport(&self, player: PlayerId, destination: &Location);

    /// Moves the player to the lobby world's spawn point.
    fn send_to_lobby(&self, player: PlayerId);

    /// Clears inventory, experience, health, hunger and challenge progress.
    fn reset_player_state(&self, player: PlayerId);
}
