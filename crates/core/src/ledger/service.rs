//! Ledger operations on accounts and transactions.

use chrono::Utc;

use kidbank_shared::types::{AccountId, ProfileId};
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{Account, Transaction, TransactionKind};
use crate::ledger::balance;
use crate::policy::AccessPolicy;
use crate::storage::{
    AccountRepository, FamilyRelationshipRepository, NewTransaction, TransactionRepository,
};

/// Default page size for transaction history.
pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;

/// Account balance and transaction operations.
#[derive(Clone, Copy)]
pub struct LedgerService<'a> {
    accounts: &'a dyn AccountRepository,
    transactions: &'a dyn TransactionRepository,
    relationships: &'a dyn FamilyRelationshipRepository,
    policy: AccessPolicy<'a>,
}

impl<'a> LedgerService<'a> {
    /// Creates a ledger service over the given repositories.
    pub fn new(
        accounts: &'a dyn AccountRepository,
        transactions: &'a dyn TransactionRepository,
        relationships: &'a dyn FamilyRelationshipRepository,
        policy: AccessPolicy<'a>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            relationships,
            policy,
        }
    }

    /// Deposits `amount` into the account, on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing, `PermissionDenied` if
    /// the actor may not act on it and `InvalidAmount` if `amount <= 0`.
    pub async fn deposit(
        &self,
        actor: ProfileId,
        account_id: AccountId,
        amount: i64,
        description: Option<String>,
    ) -> DomainResult<Transaction> {
        let account = self.require_account(account_id).await?;
        self.policy.ensure_account_access(actor, &account).await?;
        self.post(account_id, TransactionKind::Deposit, amount, description)
            .await
    }

    /// Withdraws `amount` from the account, on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// As [`Self::deposit`], plus `InvalidAmount` naming the current balance
    /// and the requested amount if the account would be overdrawn.
    pub async fn withdraw(
        &self,
        actor: ProfileId,
        account_id: AccountId,
        amount: i64,
        description: Option<String>,
    ) -> DomainResult<Transaction> {
        let account = self.require_account(account_id).await?;
        self.policy.ensure_account_access(actor, &account).await?;
        self.post(account_id, TransactionKind::Withdraw, amount, description)
            .await
    }

    /// Posts a transaction without an actor check. Used by workflows that
    /// have already authorized the mutation (withdrawal approval, the
    /// recurring deposit batch).
    pub(crate) async fn post(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: i64,
        description: Option<String>,
    ) -> DomainResult<Transaction> {
        balance::ensure_positive(amount)?;
        let delta = balance::signed_amount(kind, amount);
        self.accounts
            .apply(
                account_id,
                delta,
                NewTransaction {
                    kind,
                    amount,
                    description,
                },
            )
            .await
    }

    /// Lists transactions for an account, most recent first. An unknown
    /// account yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the actor may not read the account.
    pub async fn list_transactions(
        &self,
        actor: ProfileId,
        account_id: AccountId,
        limit: Option<usize>,
    ) -> DomainResult<Vec<Transaction>> {
        let Some(account) = self.accounts.find(account_id).await? else {
            return Ok(Vec::new());
        };
        self.policy.ensure_account_access(actor, &account).await?;
        self.transactions
            .list_for_account(account_id, limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT))
            .await
    }

    /// Updates the savings goal. Setting both fields to `None` clears it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing, `PermissionDenied` if
    /// the actor may not act on it and `InvalidAmount` if `goal_amount` is
    /// negative.
    pub async fn update_goal(
        &self,
        actor: ProfileId,
        account_id: AccountId,
        goal_name: Option<String>,
        goal_amount: Option<i64>,
    ) -> DomainResult<Account> {
        let mut account = self.require_account(account_id).await?;
        self.policy.ensure_account_access(actor, &account).await?;
        if let Some(goal) = goal_amount {
            if goal < 0 {
                return Err(DomainError::InvalidAmount {
                    amount: goal,
                    reason: "Goal amount must not be negative".to_string(),
                });
            }
        }
        account.goal_name = goal_name;
        account.goal_amount = goal_amount;
        account.updated_at = Utc::now();
        self.accounts.update(account).await
    }

    /// Lists the accounts owned by `owner_id`, on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless the actor is the owner or a parent
    /// related to the owner.
    pub async fn accounts_for(
        &self,
        actor: ProfileId,
        owner_id: ProfileId,
    ) -> DomainResult<Vec<Account>> {
        self.policy.ensure_owner_access(actor, owner_id).await?;
        self.accounts.find_by_owner(owner_id).await
    }

    /// Lists every account owned by any child of `parent_id`, the family
    /// dashboard view.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn family_accounts(&self, parent_id: ProfileId) -> DomainResult<Vec<Account>> {
        let edges = self.relationships.children_of(parent_id).await?;
        let mut accounts = Vec::new();
        for edge in edges {
            accounts.extend(self.accounts.find_by_owner(edge.child_id).await?);
        }
        Ok(accounts)
    }

    async fn require_account(&self, account_id: AccountId) -> DomainResult<Account> {
        self.accounts
            .find(account_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Account", account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{
        account, balance_of, child_profile, parent_profile, seed_account, seed_profile,
        seed_relationship,
    };

    fn ledger<'a>(store: &'a MemoryStore) -> LedgerService<'a> {
        LedgerService::new(store, store, store, AccessPolicy::new(store, store))
    }

    #[tokio::test]
    async fn test_deposit_updates_balance_and_appends_transaction() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = ledger(&store);

        let txn = svc
            .deposit(child.id, acct.id, 500, Some("Birthday".to_string()))
            .await
            .unwrap();

        assert_eq!(txn.kind, TransactionKind::Deposit);
        assert_eq!(txn.amount, 500);
        assert_eq!(balance_of(&store, acct.id).await, 500);
    }

    #[tokio::test]
    async fn test_withdraw_scenario_insufficient_balance() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 10_000)).await;
        let svc = ledger(&store);

        let txn = svc.withdraw(child.id, acct.id, 3000, None).await.unwrap();
        assert_eq!(txn.kind, TransactionKind::Withdraw);
        assert_eq!(txn.amount, 3000);
        assert_eq!(balance_of(&store, acct.id).await, 7000);

        let err = svc.withdraw(child.id, acct.id, 8000, None).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("7000"));
        assert!(message.contains("8000"));
        // The failed attempt must not alter the balance.
        assert_eq!(balance_of(&store, acct.id).await, 7000);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_are_rejected() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 1000)).await;
        let svc = ledger(&store);

        for amount in [0, -500] {
            let err = svc.deposit(child.id, acct.id, amount, None).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidAmount { .. }));
            let err = svc.withdraw(child.id, acct.id, amount, None).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidAmount { .. }));
        }
        assert_eq!(balance_of(&store, acct.id).await, 1000);
    }

    #[tokio::test]
    async fn test_deposit_into_missing_account_is_not_found() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let svc = ledger(&store);

        let err = svc
            .deposit(child.id, AccountId::new(), 500, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unrelated_parent_cannot_deposit() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = ledger(&store);

        let err = svc.deposit(parent.id, acct.id, 500, None).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
        assert_eq!(balance_of(&store, acct.id).await, 0);
    }

    #[tokio::test]
    async fn test_list_transactions_most_recent_first_with_limit() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = ledger(&store);

        for i in 1..=3 {
            svc.deposit(child.id, acct.id, i * 100, Some(format!("d{i}")))
                .await
                .unwrap();
        }

        let all = svc.list_transactions(child.id, acct.id, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].amount, 300);
        assert_eq!(all[2].amount, 100);

        let limited = svc
            .list_transactions(child.id, acct.id, Some(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].amount, 300);
    }

    #[tokio::test]
    async fn test_list_transactions_unknown_account_is_empty() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let svc = ledger(&store);

        let listed = svc
            .list_transactions(child.id, AccountId::new(), None)
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_update_goal_and_clear() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = ledger(&store);

        let updated = svc
            .update_goal(child.id, acct.id, Some("Bike".to_string()), Some(20_000))
            .await
            .unwrap();
        assert_eq!(updated.goal_name.as_deref(), Some("Bike"));
        assert_eq!(updated.goal_amount, Some(20_000));

        let cleared = svc.update_goal(child.id, acct.id, None, None).await.unwrap();
        assert_eq!(cleared.goal_name, None);
        assert_eq!(cleared.goal_amount, None);

        let err = svc
            .update_goal(child.id, acct.id, Some("Bike".to_string()), Some(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_family_accounts_spans_children() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let a = seed_profile(&store, child_profile("Mio")).await;
        let b = seed_profile(&store, child_profile("Ren")).await;
        seed_relationship(&store, parent.id, a.id).await;
        seed_relationship(&store, parent.id, b.id).await;
        seed_account(&store, account(a.id, 100)).await;
        seed_account(&store, account(b.id, 200)).await;
        // Not in the family.
        let other = seed_profile(&store, child_profile("Yui")).await;
        seed_account(&store, account(other.id, 999)).await;

        let svc = ledger(&store);
        let accounts = svc.family_accounts(parent.id).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|acct| acct.balance != 999));
    }
}
