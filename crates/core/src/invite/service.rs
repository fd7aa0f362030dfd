//! Invite workflow operations.

use chrono::{Duration, Utc};

use kidbank_shared::types::{InviteId, ProfileId};
use kidbank_shared::{DomainError, DomainResult, Mailer};

use crate::domain::{ChildInvite, InviteStatus, ParentInvite, Profile, RelationshipType, Role};
use crate::family::FamilyService;
use crate::invite::{token, INVITE_TTL_DAYS};
use crate::storage::{ChildInviteRepository, ParentInviteRepository, ProfileRepository};

/// Why a token resolution refused to accept an invite.
enum Refusal {
    /// The invite is in a terminal state.
    AlreadyProcessed(InviteStatus),
    /// The invite is pending but past its expiry.
    Expired,
}

/// Checks whether an invite can still be accepted. A terminal status is
/// reported as such even when the invite is also past its expiry.
fn refusal(status: InviteStatus, expires_at: chrono::DateTime<Utc>) -> Option<Refusal> {
    if status != InviteStatus::Pending {
        return Some(Refusal::AlreadyProcessed(status));
    }
    if expires_at < Utc::now() {
        return Some(Refusal::Expired);
    }
    None
}

/// Parent and child invitation workflows.
pub struct InviteService<'a> {
    parent_invites: &'a dyn ParentInviteRepository,
    child_invites: &'a dyn ChildInviteRepository,
    profiles: &'a dyn ProfileRepository,
    family: FamilyService<'a>,
    mailer: &'a dyn Mailer,
    frontend_url: &'a str,
}

impl<'a> InviteService<'a> {
    /// Creates an invite service over the given collaborators.
    pub fn new(
        parent_invites: &'a dyn ParentInviteRepository,
        child_invites: &'a dyn ChildInviteRepository,
        profiles: &'a dyn ProfileRepository,
        family: FamilyService<'a>,
        mailer: &'a dyn Mailer,
        frontend_url: &'a str,
    ) -> Self {
        Self {
            parent_invites,
            child_invites,
            profiles,
            family,
            mailer,
            frontend_url,
        }
    }

    /// Invites another adult to join the inviter's family as a parent.
    ///
    /// The invite is anchored to the inviter's first child (the
    /// representative child); acceptance fans out to the rest.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on `"Parent"` if the inviter is missing or not a
    /// parent, and `InvalidOperation` if the inviter has no children.
    pub async fn create_parent_invite(
        &self,
        inviter_id: ProfileId,
        email: &str,
    ) -> DomainResult<ParentInvite> {
        let inviter = self
            .profiles
            .find(inviter_id)
            .await?
            .filter(|p| p.role == Role::Parent)
            .ok_or_else(|| DomainError::not_found("Parent", inviter_id))?;

        let children = self.family.get_children(inviter_id).await?;
        let Some(representative) = children.first() else {
            return Err(DomainError::InvalidOperation(
                "Inviter has no children to share".to_string(),
            ));
        };

        let now = Utc::now();
        let invite = self
            .parent_invites
            .insert(ParentInvite {
                id: InviteId::new(),
                token: token::generate(),
                child_id: representative.id,
                inviter_id,
                email: email.to_string(),
                status: InviteStatus::Pending,
                expires_at: now + Duration::days(INVITE_TTL_DAYS),
                created_at: now,
            })
            .await?;

        let accept_link = format!("{}/invites/accept?token={}", self.frontend_url, invite.token);
        let child_names: Vec<String> = children.iter().map(|c| c.name.clone()).collect();
        if let Err(err) = self
            .mailer
            .send_parent_invite(email, &accept_link, &inviter.name, &child_names)
            .await
        {
            tracing::warn!(error = %err, invite_id = %invite.id, "failed to send parent invite email");
        }

        Ok(invite)
    }

    /// Accepts a parent invite: links the accepting parent to the
    /// representative child, then fans out to every other child of the
    /// inviter so the joining parent sees the whole family.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the token or accepting profile is unknown and
    /// `InvalidOperation` if the invite is expired or already processed, or
    /// if the accepting profile is not a parent.
    pub async fn accept_parent_invite(
        &self,
        invite_token: &str,
        accepting_parent_id: ProfileId,
    ) -> DomainResult<bool> {
        let invite = self
            .parent_invites
            .find_by_token(invite_token)
            .await?
            .ok_or_else(|| DomainError::not_found("ParentInvite", invite_token))?;
        match refusal(invite.status, invite.expires_at) {
            Some(Refusal::AlreadyProcessed(status)) => {
                return Err(DomainError::InvalidOperation(format!(
                    "Invite already {status}"
                )));
            }
            Some(Refusal::Expired) => {
                self.parent_invites
                    .update_status(invite.id, InviteStatus::Expired)
                    .await?;
                return Err(DomainError::InvalidOperation(
                    "Invite has expired".to_string(),
                ));
            }
            None => {}
        }

        let accepting = self
            .profiles
            .find(accepting_parent_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", accepting_parent_id))?;
        if accepting.role != Role::Parent {
            return Err(DomainError::InvalidOperation(
                "Accepting profile must be a parent".to_string(),
            ));
        }

        self.family
            .add_relationship(accepting_parent_id, invite.child_id, RelationshipType::Parent)
            .await?;
        for child in self.family.get_children(invite.inviter_id).await? {
            self.family
                .add_relationship(accepting_parent_id, child.id, RelationshipType::Parent)
                .await?;
        }

        self.parent_invites
            .update_status(invite.id, InviteStatus::Accepted)
            .await?;
        Ok(true)
    }

    /// Cancels a pending parent invite. Only the inviter may cancel.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the token is unknown, `PermissionDenied` if the
    /// actor is not the inviter and `InvalidOperation` if the invite is no
    /// longer pending.
    pub async fn cancel_parent_invite(
        &self,
        invite_token: &str,
        actor: ProfileId,
    ) -> DomainResult<ParentInvite> {
        let invite = self
            .parent_invites
            .find_by_token(invite_token)
            .await?
            .ok_or_else(|| DomainError::not_found("ParentInvite", invite_token))?;
        if invite.inviter_id != actor {
            return Err(DomainError::PermissionDenied(
                "Only the inviter can cancel an invite".to_string(),
            ));
        }
        if invite.status != InviteStatus::Pending {
            return Err(DomainError::InvalidOperation(format!(
                "Invite already {}",
                invite.status
            )));
        }
        self.parent_invites
            .update_status(invite.id, InviteStatus::Cancelled)
            .await
    }

    /// Invites a parent-managed child to create their own login.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on `"Child"` if the child profile is missing and
    /// `InvalidOperation` if the profile is not a child or already has a
    /// linked login.
    pub async fn invite_child_to_auth(
        &self,
        child_id: ProfileId,
        email: &str,
    ) -> DomainResult<ChildInvite> {
        let child = self
            .profiles
            .find(child_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Child", child_id))?;
        if child.role != Role::Child {
            return Err(DomainError::InvalidOperation(
                "Profile is not a child".to_string(),
            ));
        }
        if child.auth_user_id.is_some() {
            return Err(DomainError::InvalidOperation(
                "Child already has a linked login".to_string(),
            ));
        }

        let now = Utc::now();
        let invite = self
            .child_invites
            .insert(ChildInvite {
                id: InviteId::new(),
                token: token::generate(),
                child_id,
                email: email.to_string(),
                status: InviteStatus::Pending,
                expires_at: now + Duration::days(INVITE_TTL_DAYS),
                created_at: now,
            })
            .await?;

        let accept_link = format!("{}/invites/child?token={}", self.frontend_url, invite.token);
        if let Err(err) = self
            .mailer
            .send_child_invite(email, &accept_link, &child.name)
            .await
        {
            tracing::warn!(error = %err, invite_id = %invite.id, "failed to send child invite email");
        }

        Ok(invite)
    }

    /// Accepts a child invite and migrates the provisional child profile
    /// onto the profile created for `auth_user_id` by the identity provider.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the token is unknown or no profile exists for
    /// the login, and `InvalidOperation` if the invite is expired or already
    /// processed or the login's email does not match the invite's.
    pub async fn accept_child_invite(
        &self,
        invite_token: &str,
        auth_user_id: &str,
    ) -> DomainResult<Profile> {
        let invite = self
            .child_invites
            .find_by_token(invite_token)
            .await?
            .ok_or_else(|| DomainError::not_found("ChildInvite", invite_token))?;
        match refusal(invite.status, invite.expires_at) {
            Some(Refusal::AlreadyProcessed(status)) => {
                return Err(DomainError::InvalidOperation(format!(
                    "Invite already {status}"
                )));
            }
            Some(Refusal::Expired) => {
                self.child_invites
                    .update_status(invite.id, InviteStatus::Expired)
                    .await?;
                return Err(DomainError::InvalidOperation(
                    "Invite has expired".to_string(),
                ));
            }
            None => {}
        }

        let new_profile = self
            .profiles
            .find_by_auth_user_id(auth_user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", auth_user_id))?;
        let profile_email = new_profile.email.clone().unwrap_or_default();
        if !profile_email.eq_ignore_ascii_case(&invite.email) {
            return Err(DomainError::InvalidOperation(format!(
                "Invite email {} does not match account email {profile_email}",
                invite.email
            )));
        }

        let migrated = self
            .profiles
            .migrate_identity(invite.child_id, new_profile.id)
            .await?;
        self.child_invites
            .update_status(invite.id, InviteStatus::Accepted)
            .await?;
        Ok(migrated)
    }
}
