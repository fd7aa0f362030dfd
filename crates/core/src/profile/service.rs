//! Profile operations.

use chrono::Utc;

use kidbank_shared::types::{AccountId, ProfileId};
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{Account, Profile, RelationshipType, Role, TransactionKind};
use crate::family::FamilyService;
use crate::policy::AccessPolicy;
use crate::storage::{
    AccountRepository, NewTransaction, ProfileRepository, RecurringDepositRepository,
};

/// Currency assigned to newly created child accounts.
const DEFAULT_CURRENCY: &str = "JPY";

/// Profile management, parent/child authorized.
pub struct ProfileService<'a> {
    profiles: &'a dyn ProfileRepository,
    accounts: &'a dyn AccountRepository,
    rules: &'a dyn RecurringDepositRepository,
    family: FamilyService<'a>,
    policy: AccessPolicy<'a>,
}

impl<'a> ProfileService<'a> {
    /// Creates a profile service over the given collaborators.
    pub fn new(
        profiles: &'a dyn ProfileRepository,
        accounts: &'a dyn AccountRepository,
        rules: &'a dyn RecurringDepositRepository,
        family: FamilyService<'a>,
        policy: AccessPolicy<'a>,
    ) -> Self {
        Self {
            profiles,
            accounts,
            rules,
            family,
            policy,
        }
    }

    /// Fetches a profile by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile does not exist.
    pub async fn get(&self, profile_id: ProfileId) -> DomainResult<Profile> {
        self.profiles
            .find(profile_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", profile_id))
    }

    /// Fetches the profile linked to an external identity, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn get_by_auth_user_id(&self, auth_user_id: &str) -> DomainResult<Option<Profile>> {
        self.profiles.find_by_auth_user_id(auth_user_id).await
    }

    /// Lists the children of a parent.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn get_children(&self, parent_id: ProfileId) -> DomainResult<Vec<Profile>> {
        self.family.get_children(parent_id).await
    }

    /// Links a freshly signed-up identity to a parent-managed child profile
    /// whose email matches. Returns the linked profile, or `None` when no
    /// unlinked profile carries that email; already-linked profiles are
    /// never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn auto_link_on_signup(
        &self,
        auth_user_id: &str,
        email: &str,
    ) -> DomainResult<Option<Profile>> {
        let Some(mut profile) = self.profiles.find_unlinked_by_email(email).await? else {
            return Ok(None);
        };
        profile.auth_user_id = Some(auth_user_id.to_string());
        profile.updated_at = Utc::now();
        self.profiles.update(profile).await.map(Some)
    }

    /// Updates a profile's display name and avatar. Fields passed as `None`
    /// are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the profile is missing and `PermissionDenied`
    /// if the actor may not edit it.
    pub async fn update_profile(
        &self,
        actor: ProfileId,
        profile_id: ProfileId,
        name: Option<String>,
        avatar_url: Option<String>,
    ) -> DomainResult<Profile> {
        let mut profile = self.get(profile_id).await?;
        self.policy.ensure_profile_edit(actor, &profile).await?;

        if let Some(name) = name {
            profile.name = name;
        }
        if let Some(avatar_url) = avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
        profile.updated_at = Utc::now();
        self.profiles.update(profile).await
    }

    /// Creates a parent-managed child: a profile with no linked identity, a
    /// starter account and a relationship to the creating parent. A positive
    /// `initial_balance` is recorded as an opening deposit so the ledger
    /// still accounts for every unit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on `"Parent"` if the creator is missing or not a
    /// parent.
    pub async fn create_child(
        &self,
        parent_id: ProfileId,
        name: &str,
        initial_balance: i64,
        email: Option<String>,
    ) -> DomainResult<(Profile, Account)> {
        self.profiles
            .find(parent_id)
            .await?
            .filter(|p| p.role == Role::Parent)
            .ok_or_else(|| DomainError::not_found("Parent", parent_id))?;

        let now = Utc::now();
        let child = self
            .profiles
            .insert(Profile {
                id: ProfileId::new(),
                auth_user_id: None,
                email,
                name: name.to_string(),
                role: Role::Child,
                avatar_url: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        let mut account = self
            .accounts
            .insert(Account {
                id: AccountId::new(),
                owner_id: child.id,
                balance: 0,
                currency: DEFAULT_CURRENCY.to_string(),
                goal_name: None,
                goal_amount: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        if initial_balance > 0 {
            self.accounts
                .apply(
                    account.id,
                    initial_balance,
                    NewTransaction {
                        kind: TransactionKind::Deposit,
                        amount: initial_balance,
                        description: Some("Initial balance".to_string()),
                    },
                )
                .await?;
            account.balance = initial_balance;
        }
        self.family
            .add_relationship(parent_id, child.id, RelationshipType::Parent)
            .await?;

        Ok((child, account))
    }

    /// Deletes a child profile and everything it owns: accounts (with their
    /// transactions and withdrawal requests), recurring deposit rules, and
    /// family relationship rows.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on `"Child"` if the child is missing,
    /// `PermissionDenied` if the actor may not edit the child and
    /// `InvalidOperation` if the target is not a child profile.
    pub async fn delete_child(&self, actor: ProfileId, child_id: ProfileId) -> DomainResult<()> {
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
        self.policy.ensure_profile_edit(actor, &child).await?;

        for account in self.accounts.find_by_owner(child_id).await? {
            if let Some(rule) = self.rules.find_by_account(account.id).await? {
                self.rules.delete(rule.id).await?;
            }
            self.accounts.delete(account.id).await?;
        }
        for parent in self.family.get_parents(child_id).await? {
            self.family.remove_relationship(parent.id, child_id).await?;
        }
        self.profiles.delete(child_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{
        child_profile, parent_profile, recurring_rule, seed_profile, seed_rule,
    };

    fn service<'a>(store: &'a MemoryStore) -> ProfileService<'a> {
        ProfileService::new(
            store,
            store,
            store,
            FamilyService::new(store, store),
            AccessPolicy::new(store, store),
        )
    }

    #[tokio::test]
    async fn test_create_child_provisions_profile_account_relationship() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let svc = service(&store);

        let (child, account) = svc.create_child(parent.id, "Mio", 0, None).await.unwrap();
        assert_eq!(child.role, Role::Child);
        assert_eq!(child.auth_user_id, None);
        assert_eq!(account.owner_id, child.id);
        assert_eq!(account.balance, 0);
        assert_eq!(account.currency, DEFAULT_CURRENCY);

        let family = FamilyService::new(&store, &store);
        assert!(family.has_relationship(parent.id, child.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_child_records_opening_deposit() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let svc = service(&store);

        let (child, account) = svc
            .create_child(parent.id, "Mio", 2500, Some("mio@example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(child.email.as_deref(), Some("mio@example.com"));
        assert_eq!(account.balance, 2500);

        let history = crate::storage::TransactionRepository::list_for_account(&store, account.id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Deposit);
        assert_eq!(history[0].amount, 2500);
        assert_eq!(history[0].description.as_deref(), Some("Initial balance"));
    }

    #[tokio::test]
    async fn test_create_child_requires_parent() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let svc = service(&store);

        let err = svc.create_child(child.id, "Ren", 0, None).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { resource: "Parent", .. }));
    }

    #[tokio::test]
    async fn test_auto_link_on_signup_attaches_identity_by_email() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let svc = service(&store);
        let (child, _) = svc
            .create_child(parent.id, "Mio", 0, Some("mio@example.com".to_string()))
            .await
            .unwrap();

        let linked = svc
            .auto_link_on_signup("auth-mio", "mio@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(linked.id, child.id);
        assert_eq!(linked.auth_user_id.as_deref(), Some("auth-mio"));

        // Second signup with the same email finds nothing: the profile is
        // no longer unlinked.
        let again = svc
            .auto_link_on_signup("auth-other", "mio@example.com")
            .await
            .unwrap();
        assert!(again.is_none());

        let stored = ProfileRepository::find(&store, child.id).await.unwrap().unwrap();
        assert_eq!(stored.auth_user_id.as_deref(), Some("auth-mio"));
    }

    #[tokio::test]
    async fn test_auto_link_on_signup_without_match_is_none() {
        let store = MemoryStore::new();
        seed_profile(&store, parent_profile("Aya")).await;
        let svc = service(&store);

        let linked = svc
            .auto_link_on_signup("auth-x", "nobody@example.com")
            .await
            .unwrap();
        assert!(linked.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_policy_gated() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let outsider = seed_profile(&store, parent_profile("Ken")).await;
        let svc = service(&store);
        let (child, _) = svc.create_child(parent.id, "Mio", 0, None).await.unwrap();

        let updated = svc
            .update_profile(parent.id, child.id, Some("Mio-chan".to_string()), None)
            .await
            .unwrap();
        assert_eq!(updated.name, "Mio-chan");

        let err = svc
            .update_profile(outsider.id, child.id, Some("X".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_delete_child_cascades() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let svc = service(&store);
        let (child, account) = svc.create_child(parent.id, "Mio", 0, None).await.unwrap();
        seed_rule(&store, recurring_rule(account.id, 1000, 15)).await;

        svc.delete_child(parent.id, child.id).await.unwrap();

        assert!(ProfileRepository::find(&store, child.id).await.unwrap().is_none());
        assert!(AccountRepository::find(&store, account.id).await.unwrap().is_none());
        assert!(RecurringDepositRepository::find_by_account(&store, account.id)
            .await
            .unwrap()
            .is_none());
        let family = FamilyService::new(&store, &store);
        assert!(!family.has_relationship(parent.id, child.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_child_rejects_parents_and_strangers() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let other_parent = seed_profile(&store, parent_profile("Ken")).await;
        let svc = service(&store);
        let (child, _) = svc.create_child(parent.id, "Mio", 0, None).await.unwrap();

        let err = svc.delete_child(parent.id, other_parent.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));

        let err = svc.delete_child(other_parent.id, child.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }
}
