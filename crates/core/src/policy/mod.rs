//! Authorization decision logic.
//!
//! Every profile- or money-mutating operation that is not self-service runs
//! through [`AccessPolicy`] before any write happens. The rules:
//!
//! - A profile may always act on its own accounts and its own profile.
//! - A parent may act on an account or profile of a child it has a family
//!   relationship with.
//! - A child may never act on another profile's data.
//!
//! Violations surface as `PermissionDenied`, never `NotFound`, so callers
//! can tell "does not exist" apart from "exists but not yours".

use kidbank_shared::types::ProfileId;
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{Account, Profile, Role};
use crate::storage::{FamilyRelationshipRepository, ProfileRepository};

/// Decides whether an actor may read or mutate a target owned by another
/// profile, given the actor's role and whether a parent-child relationship
/// exists between them. Self-access is decided before this is consulted.
#[must_use]
pub const fn parent_may_act(actor_role: Role, related: bool) -> bool {
    matches!(actor_role, Role::Parent) && related
}

/// Authorization checks backed by profile and relationship facts.
#[derive(Clone, Copy)]
pub struct AccessPolicy<'a> {
    profiles: &'a dyn ProfileRepository,
    relationships: &'a dyn FamilyRelationshipRepository,
}

impl<'a> AccessPolicy<'a> {
    /// Creates a policy over the given fact sources.
    pub fn new(
        profiles: &'a dyn ProfileRepository,
        relationships: &'a dyn FamilyRelationshipRepository,
    ) -> Self {
        Self {
            profiles,
            relationships,
        }
    }

    /// Ensures `actor` may read or mutate `account`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the actor profile does not exist and
    /// `PermissionDenied` if the actor is neither the owner nor a related
    /// parent.
    pub async fn ensure_account_access(
        &self,
        actor: ProfileId,
        account: &Account,
    ) -> DomainResult<()> {
        self.ensure_owner_access(actor, account.owner_id).await
    }

    /// Ensures `actor` may act on data owned by `owner_id`: either they are
    /// the same profile, or the actor is a parent related to the owner.
    ///
    /// # Errors
    ///
    /// As [`Self::ensure_account_access`].
    pub async fn ensure_owner_access(
        &self,
        actor: ProfileId,
        owner_id: ProfileId,
    ) -> DomainResult<()> {
        if actor == owner_id {
            return Ok(());
        }
        let actor_profile = self.require_actor(actor).await?;
        let related = self.relationships.find_pair(actor, owner_id).await?.is_some();
        if parent_may_act(actor_profile.role, related) {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(
                "Not authorized to access this account".to_string(),
            ))
        }
    }

    /// Ensures `actor` may edit `target`'s profile.
    ///
    /// A profile may edit itself; a parent may edit a profile only if that
    /// profile is a child it has a relationship with.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the actor profile does not exist and
    /// `PermissionDenied` on any rule violation.
    pub async fn ensure_profile_edit(
        &self,
        actor: ProfileId,
        target: &Profile,
    ) -> DomainResult<()> {
        if actor == target.id {
            return Ok(());
        }
        let actor_profile = self.require_actor(actor).await?;
        let related = self.relationships.find_pair(actor, target.id).await?.is_some();
        if target.role == Role::Child && parent_may_act(actor_profile.role, related) {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(
                "Not authorized to edit this profile".to_string(),
            ))
        }
    }

    async fn require_actor(&self, actor: ProfileId) -> DomainResult<Profile> {
        self.profiles
            .find(actor)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{
        account, child_profile, parent_profile, seed_profile, seed_relationship,
    };

    #[test]
    fn test_parent_may_act_matrix() {
        assert!(parent_may_act(Role::Parent, true));
        assert!(!parent_may_act(Role::Parent, false));
        assert!(!parent_may_act(Role::Child, true));
        assert!(!parent_may_act(Role::Child, false));
    }

    #[tokio::test]
    async fn test_owner_always_has_account_access() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = account(child.id, 0);

        let policy = AccessPolicy::new(&store, &store);
        policy.ensure_account_access(child.id, &acct).await.unwrap();
    }

    #[tokio::test]
    async fn test_related_parent_has_account_access() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        seed_relationship(&store, parent.id, child.id).await;
        let acct = account(child.id, 0);

        let policy = AccessPolicy::new(&store, &store);
        policy.ensure_account_access(parent.id, &acct).await.unwrap();
    }

    #[tokio::test]
    async fn test_unrelated_parent_is_denied_not_not_found() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = account(child.id, 0);

        let policy = AccessPolicy::new(&store, &store);
        let err = policy
            .ensure_account_access(parent.id, &acct)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_child_may_not_act_on_sibling() {
        let store = MemoryStore::new();
        let a = seed_profile(&store, child_profile("Mio")).await;
        let b = seed_profile(&store, child_profile("Ren")).await;
        // Even an explicit relationship row cannot grant a child access.
        seed_relationship(&store, a.id, b.id).await;
        let acct = account(b.id, 0);

        let policy = AccessPolicy::new(&store, &store);
        let err = policy.ensure_account_access(a.id, &acct).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_parent_may_not_edit_other_parent() {
        let store = MemoryStore::new();
        let a = seed_profile(&store, parent_profile("Aya")).await;
        let b = seed_profile(&store, parent_profile("Ken")).await;
        seed_relationship(&store, a.id, b.id).await;

        let policy = AccessPolicy::new(&store, &store);
        let err = policy.ensure_profile_edit(a.id, &b).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }
}
