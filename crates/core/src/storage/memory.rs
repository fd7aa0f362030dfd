//! In-memory implementation of the storage traits.
//!
//! A single [`MemoryStore`] implements every repository trait behind one
//! mutex, so the composite operations (`apply`, `migrate_identity`) are
//! naturally atomic. Service tests run against this store; it also backs
//! local experimentation without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use kidbank_shared::types::{
    AccountId, InviteId, ProfileId, RecurringDepositId, RequestId, TransactionId,
};
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{
    Account, ChildInvite, FamilyRelationship, InviteStatus, ParentInvite, Profile,
    RecurringDeposit, RecurringDepositExecution, RequestStatus, Role, Transaction,
    WithdrawalRequest,
};
use crate::storage::{
    AccountRepository, ChildInviteRepository, FamilyRelationshipRepository, NewTransaction,
    ParentInviteRepository, ProfileRepository, RecurringDepositExecutionRepository,
    RecurringDepositRepository, TransactionRepository, WithdrawalRequestRepository,
};

#[derive(Debug, Default)]
struct Inner {
    profiles: HashMap<ProfileId, Profile>,
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    withdrawal_requests: Vec<WithdrawalRequest>,
    recurring_deposits: HashMap<RecurringDepositId, RecurringDeposit>,
    executions: Vec<RecurringDepositExecution>,
    relationships: Vec<FamilyRelationship>,
    parent_invites: Vec<ParentInvite>,
    child_invites: Vec<ChildInvite>,
}

/// In-memory store implementing all repository traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned mutex only means some other test panicked mid-write;
        // the data is still usable, so recover the guard.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find(&self, id: ProfileId) -> DomainResult<Option<Profile>> {
        Ok(self.lock().profiles.get(&id).cloned())
    }

    async fn find_by_auth_user_id(&self, auth_user_id: &str) -> DomainResult<Option<Profile>> {
        Ok(self
            .lock()
            .profiles
            .values()
            .find(|p| p.auth_user_id.as_deref() == Some(auth_user_id))
            .cloned())
    }

    async fn find_unlinked_by_email(&self, email: &str) -> DomainResult<Option<Profile>> {
        Ok(self
            .lock()
            .profiles
            .values()
            .find(|p| p.auth_user_id.is_none() && p.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert(&self, profile: Profile) -> DomainResult<Profile> {
        self.lock().profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update(&self, profile: Profile) -> DomainResult<Profile> {
        let mut inner = self.lock();
        if !inner.profiles.contains_key(&profile.id) {
            return Err(DomainError::not_found("Profile", profile.id));
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, id: ProfileId) -> DomainResult<bool> {
        Ok(self.lock().profiles.remove(&id).is_some())
    }

    async fn migrate_identity(&self, old: ProfileId, new: ProfileId) -> DomainResult<Profile> {
        let mut inner = self.lock();

        let old_profile = inner
            .profiles
            .get(&old)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Profile", old))?;
        let mut new_profile = inner
            .profiles
            .get(&new)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Profile", new))?;

        for account in inner.accounts.values_mut() {
            if account.owner_id == old {
                account.owner_id = new;
            }
        }

        // Repoint relationship rows, dropping any that would duplicate an
        // existing (parent, new) pair.
        let existing_parents: Vec<ProfileId> = inner
            .relationships
            .iter()
            .filter(|r| r.child_id == new)
            .map(|r| r.parent_id)
            .collect();
        inner.relationships.retain(|r| {
            !(r.child_id == old && existing_parents.contains(&r.parent_id))
        });
        for relationship in &mut inner.relationships {
            if relationship.child_id == old {
                relationship.child_id = new;
            }
        }

        new_profile.name = old_profile.name;
        new_profile.role = Role::Child;
        new_profile.updated_at = Utc::now();
        inner.profiles.insert(new, new_profile.clone());
        inner.profiles.remove(&old);

        Ok(new_profile)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find(&self, id: AccountId) -> DomainResult<Option<Account>> {
        Ok(self.lock().accounts.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: ProfileId) -> DomainResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .lock()
            .accounts
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn insert(&self, account: Account) -> DomainResult<Account> {
        self.lock().accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, account: Account) -> DomainResult<Account> {
        let mut inner = self.lock();
        let existing = inner
            .accounts
            .get(&account.id)
            .ok_or_else(|| DomainError::not_found("Account", account.id))?;
        // Balance only moves through `apply`.
        let mut stored = account;
        stored.balance = existing.balance;
        inner.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: AccountId) -> DomainResult<bool> {
        let mut inner = self.lock();
        let removed = inner.accounts.remove(&id).is_some();
        if removed {
            inner.transactions.retain(|t| t.account_id != id);
            inner.withdrawal_requests.retain(|r| r.account_id != id);
        }
        Ok(removed)
    }

    async fn apply(
        &self,
        account_id: AccountId,
        delta: i64,
        record: NewTransaction,
    ) -> DomainResult<Transaction> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| DomainError::not_found("Account", account_id))?;

        let new_balance = account.balance + delta;
        if new_balance < 0 {
            return Err(DomainError::InvalidAmount {
                amount: record.amount,
                reason: format!(
                    "Insufficient balance. Current: {}, Required: {}",
                    account.balance, record.amount
                ),
            });
        }

        let now = Utc::now();
        account.balance = new_balance;
        account.updated_at = now;

        let transaction = Transaction {
            id: TransactionId::new(),
            account_id,
            kind: record.kind,
            amount: record.amount,
            description: record.description,
            created_at: now,
        };
        inner.transactions.push(transaction.clone());
        Ok(transaction)
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn list_for_account(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> DomainResult<Vec<Transaction>> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WithdrawalRequestRepository for MemoryStore {
    async fn find(&self, id: RequestId) -> DomainResult<Option<WithdrawalRequest>> {
        Ok(self
            .lock()
            .withdrawal_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn insert(&self, request: WithdrawalRequest) -> DomainResult<WithdrawalRequest> {
        self.lock().withdrawal_requests.push(request.clone());
        Ok(request)
    }

    async fn update_status(
        &self,
        id: RequestId,
        status: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<WithdrawalRequest> {
        let mut inner = self.lock();
        let request = inner
            .withdrawal_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::not_found("WithdrawalRequest", id))?;
        request.status = status;
        request.updated_at = updated_at;
        Ok(request.clone())
    }

    async fn pending_for_parent(
        &self,
        parent_id: ProfileId,
    ) -> DomainResult<Vec<WithdrawalRequest>> {
        let inner = self.lock();
        let child_ids: Vec<ProfileId> = inner
            .relationships
            .iter()
            .filter(|r| r.parent_id == parent_id)
            .map(|r| r.child_id)
            .collect();
        let account_ids: Vec<AccountId> = inner
            .accounts
            .values()
            .filter(|a| child_ids.contains(&a.owner_id))
            .map(|a| a.id)
            .collect();
        Ok(inner
            .withdrawal_requests
            .iter()
            .rev()
            .filter(|r| r.status == RequestStatus::Pending && account_ids.contains(&r.account_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecurringDepositRepository for MemoryStore {
    async fn find_by_account(
        &self,
        account_id: AccountId,
    ) -> DomainResult<Option<RecurringDeposit>> {
        Ok(self
            .lock()
            .recurring_deposits
            .values()
            .find(|r| r.account_id == account_id)
            .cloned())
    }

    async fn insert(&self, rule: RecurringDeposit) -> DomainResult<RecurringDeposit> {
        self.lock().recurring_deposits.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn update(&self, rule: RecurringDeposit) -> DomainResult<RecurringDeposit> {
        let mut inner = self.lock();
        if !inner.recurring_deposits.contains_key(&rule.id) {
            return Err(DomainError::not_found("RecurringDeposit", rule.id));
        }
        inner.recurring_deposits.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn delete(&self, id: RecurringDepositId) -> DomainResult<bool> {
        Ok(self.lock().recurring_deposits.remove(&id).is_some())
    }

    async fn active_for_day(&self, day: u8) -> DomainResult<Vec<RecurringDeposit>> {
        let mut rules: Vec<RecurringDeposit> = self
            .lock()
            .recurring_deposits
            .values()
            .filter(|r| r.is_active && r.day_of_month == day)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.created_at);
        Ok(rules)
    }
}

#[async_trait]
impl RecurringDepositExecutionRepository for MemoryStore {
    async fn insert(
        &self,
        execution: RecurringDepositExecution,
    ) -> DomainResult<RecurringDepositExecution> {
        self.lock().executions.push(execution.clone());
        Ok(execution)
    }

    async fn has_success_in_month(
        &self,
        rule_id: RecurringDepositId,
        year: i32,
        month: u32,
    ) -> DomainResult<bool> {
        Ok(self.lock().executions.iter().any(|e| {
            e.recurring_deposit_id == rule_id
                && e.status == crate::domain::ExecutionStatus::Success
                && e.executed_at.year() == year
                && e.executed_at.month() == month
        }))
    }

    async fn list_for_rule(
        &self,
        rule_id: RecurringDepositId,
    ) -> DomainResult<Vec<RecurringDepositExecution>> {
        Ok(self
            .lock()
            .executions
            .iter()
            .rev()
            .filter(|e| e.recurring_deposit_id == rule_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FamilyRelationshipRepository for MemoryStore {
    async fn find_pair(
        &self,
        parent_id: ProfileId,
        child_id: ProfileId,
    ) -> DomainResult<Option<FamilyRelationship>> {
        Ok(self
            .lock()
            .relationships
            .iter()
            .find(|r| r.parent_id == parent_id && r.child_id == child_id)
            .cloned())
    }

    async fn insert(&self, relationship: FamilyRelationship) -> DomainResult<FamilyRelationship> {
        self.lock().relationships.push(relationship.clone());
        Ok(relationship)
    }

    async fn delete_pair(&self, parent_id: ProfileId, child_id: ProfileId) -> DomainResult<bool> {
        let mut inner = self.lock();
        let before = inner.relationships.len();
        inner
            .relationships
            .retain(|r| !(r.parent_id == parent_id && r.child_id == child_id));
        Ok(inner.relationships.len() < before)
    }

    async fn parents_of(&self, child_id: ProfileId) -> DomainResult<Vec<FamilyRelationship>> {
        Ok(self
            .lock()
            .relationships
            .iter()
            .filter(|r| r.child_id == child_id)
            .cloned()
            .collect())
    }

    async fn children_of(&self, parent_id: ProfileId) -> DomainResult<Vec<FamilyRelationship>> {
        Ok(self
            .lock()
            .relationships
            .iter()
            .filter(|r| r.parent_id == parent_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ParentInviteRepository for MemoryStore {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<ParentInvite>> {
        Ok(self
            .lock()
            .parent_invites
            .iter()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn insert(&self, invite: ParentInvite) -> DomainResult<ParentInvite> {
        self.lock().parent_invites.push(invite.clone());
        Ok(invite)
    }

    async fn update_status(
        &self,
        id: InviteId,
        status: InviteStatus,
    ) -> DomainResult<ParentInvite> {
        let mut inner = self.lock();
        let invite = inner
            .parent_invites
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DomainError::not_found("ParentInvite", id))?;
        invite.status = status;
        Ok(invite.clone())
    }
}

#[async_trait]
impl ChildInviteRepository for MemoryStore {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<ChildInvite>> {
        Ok(self
            .lock()
            .child_invites
            .iter()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn insert(&self, invite: ChildInvite) -> DomainResult<ChildInvite> {
        self.lock().child_invites.push(invite.clone());
        Ok(invite)
    }

    async fn update_status(&self, id: InviteId, status: InviteStatus) -> DomainResult<ChildInvite> {
        let mut inner = self.lock();
        let invite = inner
            .child_invites
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DomainError::not_found("ChildInvite", id))?;
        invite.status = status;
        Ok(invite.clone())
    }
}
