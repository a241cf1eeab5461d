//! Pending island invitations.
//!
//! Each player holds at most one pending invitation. Offering a new one
//! replaces the old one and hands out a fresh generation number; the expiry
//! callback scheduled for an invitation only fires if the generation it was
//! scheduled with is still the one stored for that player.

use crate::types::{IslandIndex, PlayerId};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInvitation {
    pub island: IslandIndex,
    pub inviter: PlayerId,
    pub generation: u64,
    pub expires_at: DateTime<Utc>,
}

impl PendingInvitation {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone)]
pub struct InvitationManager {
    pending: Arc<DashMap<PlayerId, PendingInvitation>>,
    generations: Arc<AtomicU64>,
    expiry: Duration,
}

impl InvitationManager {
    pub fn new(expiry: Duration) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(1)),
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Stores an invitation for `target`, replacing any earlier one.
    pub fn offer(&self, target: PlayerId, island: IslandIndex, inviter: PlayerId) -> PendingInvitation {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let invitation = PendingInvitation {
            island,
            inviter,
            generation,
            expires_at: Utc::now() + TimeDelta::from_std(self.expiry).unwrap_or(TimeDelta::zero()),
        };
        if let Some(previous) = self.pending.insert(target, invitation.clone()) {
            debug!(
                "✉️ Invitation for {} to island {} superseded by island {}",
                target, previous.island, island
            );
        }
        invitation
    }

    pub fn pending(&self, target: PlayerId) -> Option<PendingInvitation> {
        self.pending.get(&target).map(|entry| entry.value().clone())
    }

    /// Removes and returns the pending invitation, resolving it.
    pub fn take(&self, target: PlayerId) -> Option<PendingInvitation> {
        self.pending.remove(&target).map(|(_, invitation)| invitation)
    }

    /// Removes the invitation only if it is still the one with `generation`.
    /// Used by both expiry and acceptance, so a superseded invitation can
    /// never be resolved.
    pub fn resolve(&self, target: PlayerId, generation: u64) -> Option<PendingInvitation> {
        self.pending
            .remove_if(&target, |_, invitation| invitation.generation == generation)
            .map(|(_, invitation)| invitation)
    }

    /// Drops every invitation pointing at `island`.
    pub fn revoke_island(&self, island: IslandIndex) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, invitation| invitation.island != island);
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_offer_supersedes_previous() {
        let invitations = InvitationManager::new(Duration::from_secs(30));
        let target = PlayerId::new();
        let first = invitations.offer(target, 0, PlayerId::new());
        let second = invitations.offer(target, 1, PlayerId::new());

        assert_ne!(first.generation, second.generation);
        assert_eq!(invitations.len(), 1);
        assert_eq!(invitations.pending(target).map(|i| i.island), Some(1));

        // the first invitation's expiry is stale now
        assert!(invitations.resolve(target, first.generation).is_none());
        assert!(invitations.pending(target).is_some());

        assert_eq!(invitations.resolve(target, second.generation), Some(second));
        assert!(invitations.is_empty());
    }

    #[test]
    fn test_take_resolves_once() {
        let invitations = InvitationManager::new(Duration::from_secs(30));
        let target = PlayerId::new();
        let offered = invitations.offer(target, 3, PlayerId::new());

        assert_eq!(invitations.take(target), Some(offered.clone()));
        assert!(invitations.take(target).is_none());
        assert!(invitations.resolve(target, offered.generation).is_none());
    }

    #[test]
    fn test_expiry_timestamp() {
        let invitations = InvitationManager::new(Duration::from_secs(30));
        let offered = invitations.offer(PlayerId::new(), 0, PlayerId::new());
        assert!(!offered.is_expired_at(Utc::now()));
        assert!(offered.is_expired_at(Utc::now() + TimeDelta::seconds(31)));
    }

    #[test]
    fn test_remaining_time_counts_down_to_zero() {
        let invitations = InvitationManager::new(Duration::from_secs(30));
        let offered = invitations.offer(PlayerId::new(), 0, PlayerId::new());

        let halfway = offered.expires_at - TimeDelta::seconds(12);
        assert_eq!(offered.remaining_at(halfway), Duration::from_secs(12));
        assert_eq!(offered.remaining_at(offered.expires_at), Duration::ZERO);
        assert_eq!(
            offered.remaining_at(offered.expires_at + TimeDelta::seconds(5)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_revoke_island_drops_matching_invitations() {
        let invitations = InvitationManager::new(Duration::from_secs(30));
        invitations.offer(PlayerId::new(), 2, PlayerId::new());
        invitations.offer(PlayerId::new(), 2, PlayerId::new());
        invitations.offer(PlayerId::new(), 5, PlayerId::new());

        assert_eq!(invitations.revoke_island(2), 2);
        assert_eq!(invitations.len(), 1);
    }
}
