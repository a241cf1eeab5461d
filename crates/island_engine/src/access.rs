//! Ownership, party, ban and lock rules for a single island.
//!
//! Predicates never mutate. Every mutator checks its precondition first and
//! returns an [`AccessError`] without touching the island when it does not
//! hold; on success the island is marked dirty.
//!
//! Invariants kept here:
//! - the owner is never a friend and never banned
//! - friends and the ban list are disjoint

use crate::island::{Island, IslandFriend};
use crate::types::PlayerId;
use thiserror::Error;

/// Why an access mutation was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    #[error("player already belongs to the party")]
    AlreadyFriend,
    #[error("player is not a party member")]
    NotFriend,
    #[error("player is already banned")]
    AlreadyBanned,
    #[error("player is not banned")]
    NotBanned,
    #[error("island is already locked")]
    AlreadyLocked,
    #[error("island is already unlocked")]
    AlreadyUnlocked,
    #[error("the owner cannot be targeted")]
    TargetIsOwner,
}

/// Result of a successful ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanOutcome {
    /// The banned player was a party member and has been removed first
    pub was_friend: bool,
}

impl Island {
    pub fn is_owner(&self, player: PlayerId) -> bool {
        self.owner == player
    }

    pub fn is_friend(&self, player: PlayerId) -> bool {
        self.friends.iter().any(|f| f.player == player)
    }

    /// Owner or friend.
    pub fn is_member(&self, player: PlayerId) -> bool {
        self.is_owner(player) || self.is_friend(player)
    }

    pub fn is_banned(&self, player: PlayerId) -> bool {
        self.ban_list.contains(&player)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether `player` may arrive on the island through a teleport or warp.
    pub fn admits(&self, player: PlayerId) -> bool {
        !self.is_banned(player) && (!self.locked || self.is_member(player))
    }

    pub fn friend(&self, player: PlayerId) -> Option<&IslandFriend> {
        self.friends.iter().find(|f| f.player == player)
    }

    pub fn add_friend(&mut self, player: PlayerId) -> Result<(), AccessError> {
        if self.is_owner(player) {
            return Err(AccessError::TargetIsOwner);
        }
        if self.is_friend(player) {
            return Err(AccessError::AlreadyFriend);
        }
        // joining the party lifts any ban so the two sets stay disjoint
        self.ban_list.retain(|banned| *banned != player);
        self.friends.push(IslandFriend::new(player));
        self.mark_dirty();
        Ok(())
    }

    pub fn remove_friend(&mut self, player: PlayerId) -> Result<IslandFriend, AccessError> {
        let position = self
            .friends
            .iter()
            .position(|f| f.player == player)
            .ok_or(AccessError::NotFriend)?;
        let removed = self.friends.remove(position);
        self.mark_dirty();
        Ok(removed)
    }

    /// Bans `player`, kicking them from the party first if needed.
    pub fn ban(&mut self, player: PlayerId) -> Result<BanOutcome, AccessError> {
        if self.is_owner(player) {
            return Err(AccessError::TargetIsOwner);
        }
        if self.is_banned(player) {
            return Err(AccessError::AlreadyBanned);
        }
        let was_friend = self.remove_friend(player).is_ok();
        self.ban_list.push(player);
        self.mark_dirty();
        Ok(BanOutcome { was_friend })
    }

    /// Lifts a ban. Friendship is not restored.
    pub fn unban(&mut self, player: PlayerId) -> Result<(), AccessError> {
        if !self.is_banned(player) {
            return Err(AccessError::NotBanned);
        }
        self.ban_list.retain(|banned| *banned != player);
        self.mark_dirty();
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), AccessError> {
        if self.locked {
            return Err(AccessError::AlreadyLocked);
        }
        self.locked = true;
        self.mark_dirty();
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), AccessError> {
        if !self.locked {
            return Err(AccessError::AlreadyUnlocked);
        }
        self.locked = false;
        self.mark_dirty();
        Ok(())
    }

    /// Flips the lock and returns the new state.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.mark_dirty();
        self.locked
    }

    /// Hands ownership to an existing friend. The previous owner stays on as
    /// a friend without permissions.
    pub fn promote(&mut self, new_owner: PlayerId) -> Result<PlayerId, AccessError> {
        if self.is_owner(new_owner) {
            return Err(AccessError::TargetIsOwner);
        }
        self.remove_friend(new_owner)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        self.friends.push(IslandFriend::new(previous));
        self.mark_dirty();
        Ok(previous)
    }

    /// Grants a named permission to a friend. Returns `Ok(false)` if they already had it.
    pub fn grant_permission(&mut self, player: PlayerId, permission: &str) -> Result<bool, AccessError> {
        let friend = self
            .friends
            .iter_mut()
            .find(|f| f.player == player)
            .ok_or(AccessError::NotFriend)?;
        let granted = friend.grant(permission);
        if granted {
            self.mark_dirty();
        }
        Ok(granted)
    }

    /// Revokes a named permission. Returns `Ok(false)` if the friend did not have it.
    pub fn revoke_permission(&mut self, player: PlayerId, permission: &str) -> Result<bool, AccessError> {
        let friend = self
            .friends
            .iter_mut()
            .find(|f| f.player == player)
            .ok_or(AccessError::NotFriend)?;
        let revoked = friend.revoke(permission);
        if revoked {
            self.mark_dirty();
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IslandSettings;

    fn island_for(owner: PlayerId) -> Island {
        let mut island = Island::new(0, (72, 72), owner, "Owner", &IslandSettings::default());
        island.dirty = false;
        island
    }

    #[test]
    fn test_membership_predicates() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let stranger = PlayerId::new();
        let mut island = island_for(owner);
        island.add_friend(friend).expect("add friend");

        assert!(island.is_owner(owner) && island.is_member(owner));
        assert!(island.is_friend(friend) && island.is_member(friend));
        assert!(!island.is_member(stranger));
        assert!(!island.is_friend(owner));
        assert!(island.is_dirty());
    }

    #[test]
    fn test_add_friend_rejects_owner_and_duplicates() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let mut island = island_for(owner);

        assert_eq!(island.add_friend(owner), Err(AccessError::TargetIsOwner));
        island.add_friend(friend).expect("first add");
        assert_eq!(island.add_friend(friend), Err(AccessError::AlreadyFriend));
        assert_eq!(island.friends().len(), 1);
    }

    #[test]
    fn test_ban_kicks_friend_first() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let mut island = island_for(owner);
        island.add_friend(friend).expect("add friend");

        let outcome = island.ban(friend).expect("ban");
        assert!(outcome.was_friend);
        assert!(!island.is_friend(friend));
        assert!(island.is_banned(friend));

        assert_eq!(island.ban(friend), Err(AccessError::AlreadyBanned));
        assert_eq!(island.ban(owner), Err(AccessError::TargetIsOwner));
    }

    #[test]
    fn test_unban_does_not_restore_friendship() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let mut island = island_for(owner);
        island.add_friend(friend).expect("add friend");
        island.ban(friend).expect("ban");

        island.unban(friend).expect("unban");
        assert!(!island.is_banned(friend));
        assert!(!island.is_friend(friend));
        assert_eq!(island.unban(friend), Err(AccessError::NotBanned));
    }

    #[test]
    fn test_lock_is_idempotent_checked() {
        let mut island = island_for(PlayerId::new());
        assert_eq!(island.unlock(), Err(AccessError::AlreadyUnlocked));
        assert!(!island.is_dirty());

        island.lock().expect("lock");
        assert!(island.is_locked());
        assert_eq!(island.lock(), Err(AccessError::AlreadyLocked));

        assert!(!island.toggle_lock());
        assert!(island.toggle_lock());
    }

    #[test]
    fn test_admits_respects_ban_and_lock() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let stranger = PlayerId::new();
        let mut island = island_for(owner);
        island.add_friend(friend).expect("add friend");

        assert!(island.admits(stranger));
        island.lock().expect("lock");
        assert!(!island.admits(stranger));
        assert!(island.admits(friend));
        assert!(island.admits(owner));

        island.unlock().expect("unlock");
        island.ban(stranger).expect("ban");
        assert!(!island.admits(stranger));
    }

    #[test]
    fn test_promote_swaps_owner() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let stranger = PlayerId::new();
        let mut island = island_for(owner);

        assert_eq!(island.promote(stranger), Err(AccessError::NotFriend));
        assert_eq!(island.owner(), owner);

        island.add_friend(friend).expect("add friend");
        let previous = island.promote(friend).expect("promote");
        assert_eq!(previous, owner);
        assert_eq!(island.owner(), friend);
        assert!(!island.is_friend(friend));
        assert!(island.is_friend(owner));
    }

    #[test]
    fn test_permissions_require_membership() {
        let owner = PlayerId::new();
        let friend = PlayerId::new();
        let mut island = island_for(owner);

        assert_eq!(island.grant_permission(friend, "build"), Err(AccessError::NotFriend));
        island.add_friend(friend).expect("add friend");
        assert_eq!(island.grant_permission(friend, "build"), Ok(true));
        assert_eq!(island.grant_permission(friend, "build"), Ok(false));
        assert!(island.friend(friend).map(|f| f.has("build")).unwrap_or(false));
        assert_eq!(island.revoke_permission(friend, "build"), Ok(true));
    }
}
