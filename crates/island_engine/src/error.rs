//! Error types for the island engine.
//!
//! [`IslandError`] covers every validation failure a player can trigger. Its
//! `Display` text is the exact message sent back to the requesting player, so
//! the wording here is part of the engine's observable behaviour.
//! [`PersistenceError`] covers loading and saving the island document.

use crate::types::IslandIndex;
use thiserror::Error;

/// Player-facing validation failures.
///
/// Returning one of these always means the operation was aborted before any
/// island state was touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IslandError {
    #[error("Invalid syntax. Usage: {0}")]
    Usage(&'static str),

    /// Requester has no island for the attempted action. The text names the action.
    #[error("{0}")]
    NoIsland(&'static str),

    #[error("Player {0} is not online.")]
    PlayerOffline(String),

    #[error("{0} could not be found.")]
    UnknownPlayer(String),

    #[error("{0} does not have an island.")]
    PlayerHasNoIsland(String),

    #[error("You already have an island. Use /island restart to reset your island.")]
    AlreadyOwnsIsland,

    #[error("You must leave this island before creating a new one. Use /island leave to leave this island.")]
    AlreadyMember,

    #[error("You cannot restart an island that you do not own. Use /island leave to leave this island and /island create to make a new one.")]
    NotOwnerRestart,

    #[error("You must be on your island to set the {0} point.")]
    NotOnIsland(&'static str),

    #[error("You cannot invite yourself to your own island.")]
    InviteSelf,

    #[error("Player {0} is already a party member.")]
    AlreadyFriend(String),

    #[error("Player {0} is not an island party member.")]
    NotFriend(String),

    #[error("You cannot ban yourself from the island.")]
    BanSelf,

    #[error("{0} is already banned from the island.")]
    AlreadyBanned(String),

    #[error("{0} is not banned from the island.")]
    NotBanned(String),

    #[error("Island warp is already locked.")]
    AlreadyLocked,

    #[error("Island warp is already unlocked.")]
    AlreadyUnlocked,

    #[error("You do not have any pending island invitations.")]
    NoPendingInvitation,

    #[error("The island you were invited to no longer exists.")]
    InvitationIslandGone,

    #[error("You cannot leave an island that you own. Use /is promote to transfer leadership. Or use /is restart to restart.")]
    OwnerCannotLeave,

    #[error("Invalid biome. Available biomes: {0}")]
    UnknownBiome(String),

    #[error("{0} does not have an island to warp to.")]
    NoWarpIsland(String),

    #[error("{0}'s island warp is not open.")]
    WarpClosed(String),

    #[error("You are barred from entering {0}.")]
    Banned(String),

    #[error("This island is locked. You cannot enter.")]
    Locked,

    #[error("You cannot teleport to this location.")]
    NotAnIsland,

    #[error("Player {0} does not have access to this island.")]
    FriendNoAccess(String),

    #[error("Player {0} is not in the same world as your island.")]
    FriendInOtherWorld(String),

    #[error("Player {0} is not on the island.")]
    FriendNotOnIsland(String),

    /// Block action attempted outside the player's own island.
    #[error("You can't {0} outside your island!")]
    OutsideIsland(&'static str),

    #[error("No islands have been created yet.")]
    NoIslands,
}

/// Failures while reading or writing the island document.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed island document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid island record {index}: {reason}")]
    InvalidRecord { index: IslandIndex, reason: String },

    #[error("Duplicate island index {0} in document")]
    DuplicateIndex(IslandIndex),

    #[error("Background save task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_player_facing_text() {
        assert_eq!(
            IslandError::NoPendingInvitation.to_string(),
            "You do not have any pending island invitations."
        );
        assert_eq!(
            IslandError::WarpClosed("Alex".into()).to_string(),
            "Alex's island warp is not open."
        );
        assert_eq!(
            IslandError::Usage("/island ban <player>").to_string(),
            "Invalid syntax. Usage: /island ban <player>"
        );
        assert_eq!(
            IslandError::OutsideIsland("break blocks").to_string(),
            "You can't break blocks outside your island!"
        );
    }

    #[test]
    fn test_persistence_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PersistenceError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
