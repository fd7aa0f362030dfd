//! Shared fixtures for service tests.
//!
//! `MemoryStore` implements every repository trait, so plain method calls on
//! it are ambiguous (`insert` exists on several traits). The seed helpers
//! here pin the trait via fully qualified calls so tests stay readable.

use chrono::{Duration, Utc};

use kidbank_shared::types::{AccountId, InviteId, ProfileId, RecurringDepositId, RelationshipId};

use crate::domain::{
    Account, ChildInvite, FamilyRelationship, InviteStatus, ParentInvite, Profile,
    RecurringDeposit, RelationshipType, Role,
};
use crate::storage::memory::MemoryStore;
use crate::storage::{
    AccountRepository, ChildInviteRepository, FamilyRelationshipRepository, ParentInviteRepository,
    ProfileRepository, RecurringDepositRepository,
};

pub(crate) fn parent_profile(name: &str) -> Profile {
    let now = Utc::now();
    Profile {
        id: ProfileId::new(),
        auth_user_id: Some(format!("auth-{name}")),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        name: name.to_string(),
        role: Role::Parent,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn child_profile(name: &str) -> Profile {
    let now = Utc::now();
    Profile {
        id: ProfileId::new(),
        auth_user_id: None,
        email: None,
        name: name.to_string(),
        role: Role::Child,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn account(owner_id: ProfileId, balance: i64) -> Account {
    let now = Utc::now();
    Account {
        id: AccountId::new(),
        owner_id,
        balance,
        currency: "JPY".to_string(),
        goal_name: None,
        goal_amount: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn relationship(parent_id: ProfileId, child_id: ProfileId) -> FamilyRelationship {
    FamilyRelationship {
        id: RelationshipId::new(),
        parent_id,
        child_id,
        relationship_type: RelationshipType::Parent,
        created_at: Utc::now(),
    }
}

pub(crate) fn recurring_rule(account_id: AccountId, amount: i64, day: u8) -> RecurringDeposit {
    let now = Utc::now();
    RecurringDeposit {
        id: RecurringDepositId::new(),
        account_id,
        amount,
        day_of_month: day,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn parent_invite(
    inviter_id: ProfileId,
    child_id: ProfileId,
    email: &str,
) -> ParentInvite {
    let now = Utc::now();
    ParentInvite {
        id: InviteId::new(),
        token: crate::invite::token::generate(),
        child_id,
        inviter_id,
        email: email.to_string(),
        status: InviteStatus::Pending,
        expires_at: now + Duration::days(7),
        created_at: now,
    }
}

pub(crate) fn child_invite(child_id: ProfileId, email: &str) -> ChildInvite {
    let now = Utc::now();
    ChildInvite {
        id: InviteId::new(),
        token: crate::invite::token::generate(),
        child_id,
        email: email.to_string(),
        status: InviteStatus::Pending,
        expires_at: now + Duration::days(7),
        created_at: now,
    }
}

pub(crate) async fn seed_profile(store: &MemoryStore, profile: Profile) -> Profile {
    ProfileRepository::insert(store, profile).await.unwrap()
}

pub(crate) async fn seed_account(store: &MemoryStore, acct: Account) -> Account {
    AccountRepository::insert(store, acct).await.unwrap()
}

pub(crate) async fn seed_relationship(store: &MemoryStore, parent_id: ProfileId, child_id: ProfileId) {
    FamilyRelationshipRepository::insert(store, relationship(parent_id, child_id))
        .await
        .unwrap();
}

pub(crate) async fn seed_rule(store: &MemoryStore, rule: RecurringDeposit) -> RecurringDeposit {
    RecurringDepositRepository::insert(store, rule).await.unwrap()
}

pub(crate) async fn seed_parent_invite(store: &MemoryStore, invite: ParentInvite) -> ParentInvite {
    ParentInviteRepository::insert(store, invite).await.unwrap()
}

pub(crate) async fn seed_child_invite(store: &MemoryStore, invite: ChildInvite) -> ChildInvite {
    ChildInviteRepository::insert(store, invite).await.unwrap()
}

pub(crate) async fn balance_of(store: &MemoryStore, id: AccountId) -> i64 {
    AccountRepository::find(store, id)
        .await
        .unwrap()
        .unwrap()
        .balance
}
