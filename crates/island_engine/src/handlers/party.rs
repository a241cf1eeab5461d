//! Party management: invitations, kick, ban, unban, promote, leave and
//! per-friend permissions.

use crate::access::AccessError;
use crate::engine::IslandEngine;
use crate::error::IslandError;
use crate::types::{IslandIndex, PlayerId};
use chrono::Utc;
use tracing::{debug, info, warn};

impl IslandEngine {
    /// Invites an online player to the inviter's island.
    ///
    /// A banned target is pardoned first. Any earlier invitation the target
    /// held is replaced, and the new one expires after the configured delay.
    pub async fn invite(&self, inviter: PlayerId, target_name: Option<&str>) -> Result<(), IslandError> {
        let offered = async {
            let name = target_name.ok_or(IslandError::Usage("/island invite <player>"))?;
            let target = self
                .players()
                .online_player(name)
                .ok_or_else(|| IslandError::PlayerOffline(name.to_string()))?;

            let mut table = self.registry().write().await;
            let island = table
                .owned_mut(inviter)
                .ok_or(IslandError::NoIsland("You do not have an island to invite players to."))?;
            if target == inviter {
                return Err(IslandError::InviteSelf);
            }
            if island.is_friend(target) {
                return Err(IslandError::AlreadyFriend(name.to_string()));
            }
            let pardoned = island.unban(target).is_ok();
            let invitation = self.invitations().offer(target, island.index(), inviter);
            Ok::<_, IslandError>((
                target,
                name.to_string(),
                island.name().to_string(),
                invitation,
                pardoned,
            ))
        }
        .await;
        let (target, name, island_name, invitation, pardoned) = self.report(inviter, offered)?;

        if pardoned {
            self.tell(inviter, &format!("{name} has been pardoned and may re-enter the island."));
            self.tell(target, &format!("You have been pardoned and may re-enter {island_name}."));
        }
        self.tell(
            target,
            &format!("You have been invited to join {island_name}. Use /is accept to join or /is reject to ignore."),
        );
        self.tell(
            target,
            &format!(
                "This invitation will expire in {} seconds.",
                invitation.remaining_at(Utc::now()).as_secs_f64().ceil()
            ),
        );
        self.tell(inviter, &format!("Invitation sent to {name}."));

        self.schedule_expiry(target, invitation.generation);
        Ok(())
    }

    fn schedule_expiry(&self, target: PlayerId, generation: u64) {
        let engine = self.clone();
        let delay = self.invitations().expiry();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.expire_invitation(target, generation).await;
        });
    }

    /// Expiry callback. Does nothing unless the invitation with `generation`
    /// is still the one pending for `target`. Returns whether it expired.
    pub async fn expire_invitation(&self, target: PlayerId, generation: u64) -> bool {
        let Some(invitation) = self.invitations().resolve(target, generation) else {
            debug!("✉️ Stale expiry for {} (generation {}) ignored", target, generation);
            return false;
        };
        let (island_name, owner) = self.invitation_parties(invitation.island, invitation.inviter).await;

        self.tell(target, &format!("The invitation to join {island_name} has expired."));
        self.tell(
            owner,
            &format!("Your invitation to {} has expired.", self.name_of(target)),
        );
        true
    }

    /// Accepts the pending invitation.
    ///
    /// An island the player owns is archived and its friends released; a
    /// party the player belongs to is left. The player's state is reset and
    /// they are teleported to the new island's spawn.
    ///
    /// An invitation past its deadline is expired here even if the expiry
    /// task has not run yet. The invitation is only consumed once the
    /// target island is known to still exist.
    pub async fn accept_invitation(&self, player: PlayerId) -> Result<IslandIndex, IslandError> {
        let joined = async {
            let invitation = self
                .invitations()
                .pending(player)
                .ok_or(IslandError::NoPendingInvitation)?;
            if invitation.is_expired_at(Utc::now()) {
                self.expire_invitation(player, invitation.generation).await;
                return Err(IslandError::NoPendingInvitation);
            }

            let mut table = self.registry().write().await;
            let joining = table
                .get_by_index(invitation.island)
                .ok_or(IslandError::InvitationIslandGone)?;
            let already_member = joining.is_member(player);
            // a newer offer may have replaced this one since the peek
            self.invitations()
                .resolve(player, invitation.generation)
                .ok_or(IslandError::NoPendingInvitation)?;

            let mut closed: Option<(String, Vec<PlayerId>)> = None;
            if !already_member {
                let current = table
                    .get_by_member(player)
                    .map(|island| (island.index(), island.is_owner(player)));
                match current {
                    Some((index, true)) => {
                        if let Some(island) = table.archive(index) {
                            let released = island.friends().iter().map(|f| f.player).collect();
                            closed = Some((island.name().to_string(), released));
                        }
                        self.invitations().revoke_island(index);
                    }
                    Some((index, false)) => {
                        if let Some(island) = table.get_mut(index) {
                            island.remove_friend(player).ok();
                        }
                    }
                    None => {}
                }
                if let Some(island) = table.get_mut(invitation.island) {
                    if let Err(e) = island.add_friend(player) {
                        warn!("⚠️ Could not add {} to island {}: {}", player, invitation.island, e);
                    }
                }
            }

            let island = table
                .get_by_index(invitation.island)
                .ok_or(IslandError::InvitationIslandGone)?;
            Ok::<_, IslandError>((
                island.index(),
                island.name().to_string(),
                island.owner(),
                island.spawn().clone(),
                already_member,
                closed,
            ))
        }
        .await;
        let (index, island_name, owner, spawn, already_member, closed) = self.report(player, joined)?;
        let player_name = self.name_of(player);

        if let Some((closed_name, released)) = closed {
            for friend in released {
                self.tell(
                    friend,
                    &format!("{closed_name} has been closed because its owner joined another island."),
                );
            }
        }
        if !already_member {
            self.players().reset_player_state(player);
        }
        self.tell(player, &format!("You have joined {island_name}."));
        self.tell(owner, &format!("{player_name} has joined your island."));
        self.players().teleport(player, &spawn);

        info!("🤝 {} joined island {}", player_name, index);
        Ok(index)
    }

    /// Rejects the pending invitation.
    pub async fn reject_invitation(&self, player: PlayerId) -> Result<(), IslandError> {
        let invitation = self.invitations().take(player).ok_or(IslandError::NoPendingInvitation);
        let invitation = self.report(player, invitation)?;
        let (island_name, owner) = self.invitation_parties(invitation.island, invitation.inviter).await;

        self.tell(player, &format!("You have rejected the invitation to join {island_name}."));
        self.tell(
            owner,
            &format!(
                "{} has rejected the invitation to join your island.",
                self.name_of(player)
            ),
        );
        Ok(())
    }

    /// Name and current owner of an invitation's island. Falls back to the
    /// inviter when the island is gone.
    async fn invitation_parties(&self, index: IslandIndex, inviter: PlayerId) -> (String, PlayerId) {
        self.registry()
            .read()
            .await
            .find_any(index)
            .map(|island| (island.name().to_string(), island.owner()))
            .unwrap_or_else(|| ("the island".to_string(), inviter))
    }

    /// Removes an online party member from the owner's island.
    pub async fn kick(&self, owner: PlayerId, target_name: Option<&str>) -> Result<(), IslandError> {
        let kicked = async {
            let name = target_name.ok_or(IslandError::Usage("/island kick <player>"))?;
            let target = self
                .players()
                .online_player(name)
                .ok_or_else(|| IslandError::PlayerOffline(name.to_string()))?;

            let mut table = self.registry().write().await;
            let island = table
                .owned_mut(owner)
                .ok_or(IslandError::NoIsland("You do not have an island to kick players from."))?;
            island
                .remove_friend(target)
                .map_err(|_| IslandError::NotFriend(name.to_string()))?;
            Ok::<_, IslandError>((target, name.to_string()))
        }
        .await;
        let (target, name) = self.report(owner, kicked)?;
        self.expel(owner, target, &name);
        Ok(())
    }

    /// Side effects of removing someone from a party against their will.
    fn expel(&self, owner: PlayerId, target: PlayerId, target_name: &str) {
        self.players().reset_player_state(target);
        self.tell(owner, &format!("Player {target_name} has been kicked from the island."));
        self.tell(
            target,
            &format!("You have been kicked from the island by {}.", self.name_of(owner)),
        );
        self.players().send_to_lobby(target);
    }

    /// Bans a player from the owner's island, removing them from the party first.
    pub async fn ban(&self, owner: PlayerId, target_name: Option<&str>) -> Result<(), IslandError> {
        let banned = async {
            let name = target_name.ok_or(IslandError::Usage("/island ban <player>"))?;
            let mut table = self.registry().write().await;
            let island = table
                .owned_mut(owner)
                .ok_or(IslandError::NoIsland("You do not own an island to ban players from."))?;
            let target = self
                .players()
                .known_player(name)
                .ok_or_else(|| IslandError::UnknownPlayer(name.to_string()))?;
            if target == owner {
                return Err(IslandError::BanSelf);
            }
            let outcome = island.ban(target).map_err(|e| match e {
                AccessError::TargetIsOwner => IslandError::BanSelf,
                _ => IslandError::AlreadyBanned(name.to_string()),
            })?;
            Ok::<_, IslandError>((target, name.to_string(), outcome.was_friend))
        }
        .await;
        let (target, name, was_friend) = self.report(owner, banned)?;

        let online = self.players().is_online(target);
        if was_friend && online {
            self.expel(owner, target, &name);
        }
        self.tell(owner, &format!("{name} has been banned from the island."));
        if online {
            self.tell(
                target,
                &format!("You have been banned from the island by {}.", self.name_of(owner)),
            );
        }
        Ok(())
    }

    /// Lifts a ban. The player does not get their party membership back.
    pub async fn unban(&self, owner: PlayerId, target_name: Option<&str>) -> Result<(), IslandError> {
        let pardoned = async {
            let name = target_name.ok_or(IslandError::Usage("/island unban <player>"))?;
            let mut table = self.registry().write().await;
            let island = table
                .owned_mut(owner)
                .ok_or(IslandError::NoIsland("You do not own an island to pardon players from."))?;
            let target = self
                .players()
                .known_player(name)
                .ok_or_else(|| IslandError::UnknownPlayer(name.to_string()))?;
            island
                .unban(target)
                .map_err(|_| IslandError::NotBanned(name.to_string()))?;
            Ok::<_, IslandError>((target, name.to_string(), island.name().to_string()))
        }
        .await;
        let (target, name, island_name) = self.report(owner, pardoned)?;

        self.tell(owner, &format!("{name} has been pardoned and may re-enter the island."));
        if self.players().is_online(target) {
            self.tell(target, &format!("You have been pardoned and may re-enter {island_name}."));
        }
        Ok(())
    }

    /// Hands island ownership to a party member.
    pub async fn promote(&self, owner: PlayerId, target_name: Option<&str>) -> Result<(), IslandError> {
        let promoted = async {
            let name = target_name.ok_or(IslandError::Usage("/island promote <player>"))?;
            let mut table = self.registry().write().await;
            let island = table
                .owned_mut(owner)
                .ok_or(IslandError::NoIsland("You do not have an island to promote players in."))?;
            let not_friend = || IslandError::NotFriend(name.to_string());
            let target = self.players().known_player(name).ok_or_else(not_friend)?;
            island.promote(target).map_err(|_| not_friend())?;
            Ok::<_, IslandError>((target, name.to_string(), island.index()))
        }
        .await;
        let (target, name, index) = self.report(owner, promoted)?;

        self.tell(owner, &format!("You have promoted {name} to island leader."));
        self.tell(
            target,
            &format!("You have been promoted to island leader by {}.", self.name_of(owner)),
        );
        info!("👑 Island {} now led by {}", index, name);
        Ok(())
    }

    /// Leaves the party the player belongs to. Owners cannot leave.
    pub async fn leave_island(&self, player: PlayerId) -> Result<(), IslandError> {
        let left = async {
            let mut table = self.registry().write().await;
            let island = table
                .member_mut(player)
                .ok_or(IslandError::NoIsland("You do not have an island to leave."))?;
            if island.is_owner(player) {
                return Err(IslandError::OwnerCannotLeave);
            }
            island
                .remove_friend(player)
                .map_err(|_| IslandError::NoIsland("You do not have an island to leave."))?;
            Ok::<_, IslandError>(island.name().to_string())
        }
        .await;
        let island_name = self.report(player, left)?;

        self.players().reset_player_state(player);
        self.tell(player, &format!("You have left {island_name}."));
        self.players().send_to_lobby(player);
        Ok(())
    }

    /// Grants (`grant = true`) or revokes a named permission on a party member.
    ///
    /// Returns whether the permission set changed.
    pub async fn set_friend_permission(
        &self,
        owner: PlayerId,
        target_name: Option<&str>,
        permission: Option<&str>,
        grant: bool,
    ) -> Result<bool, IslandError> {
        let changed = async {
            let usage = IslandError::Usage("/island permission <grant|revoke> <player> <permission>");
            let (name, permission) = match (target_name, permission.map(str::trim)) {
                (Some(name), Some(permission)) if !permission.is_empty() => (name, permission),
                _ => return Err(usage),
            };
            let mut table = self.registry().write().await;
            let island = table
                .owned_mut(owner)
                .ok_or(IslandError::NoIsland("You do not have an island to manage permissions on."))?;
            let target = self
                .players()
                .known_player(name)
                .ok_or_else(|| IslandError::UnknownPlayer(name.to_string()))?;
            let result = if grant {
                island.grant_permission(target, permission)
            } else {
                island.revoke_permission(target, permission)
            };
            let changed = result.map_err(|_| IslandError::NotFriend(name.to_string()))?;
            Ok::<_, IslandError>((name.to_string(), permission.to_string(), changed))
        }
        .await;
        let (name, permission, changed) = self.report(owner, changed)?;

        let reply = match (grant, changed) {
            (true, true) => format!("Granted {permission} to {name}."),
            (true, false) => format!("{name} already has {permission}."),
            (false, true) => format!("Revoked {permission} from {name}."),
            (false, false) => format!("{name} does not have {permission}."),
        };
        self.tell(owner, &reply);
        Ok(changed)
    }

    /// Owners hold every permission; friends hold what was granted to them.
    pub async fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        let table = self.registry().read().await;
        match table.get_by_member(player) {
            Some(island) if island.is_owner(player) => true,
            Some(island) => island.friend(player).map(|f| f.has(permission)).unwrap_or(false),
            None => false,
        }
    }
}
