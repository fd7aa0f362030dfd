//! Recurring deposit rule management.

use chrono::Utc;

use kidbank_shared::types::{AccountId, ProfileId, RecurringDepositId};
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{RecurringDeposit, RecurringDepositExecution};
use crate::policy::AccessPolicy;
use crate::storage::{
    AccountRepository, RecurringDepositExecutionRepository, RecurringDepositRepository,
};

/// Rule CRUD, parent/child authorized.
pub struct RecurringDepositService<'a> {
    rules: &'a dyn RecurringDepositRepository,
    executions: &'a dyn RecurringDepositExecutionRepository,
    accounts: &'a dyn AccountRepository,
    policy: AccessPolicy<'a>,
}

impl<'a> RecurringDepositService<'a> {
    /// Creates a recurring deposit service over the given repositories.
    pub fn new(
        rules: &'a dyn RecurringDepositRepository,
        executions: &'a dyn RecurringDepositExecutionRepository,
        accounts: &'a dyn AccountRepository,
        policy: AccessPolicy<'a>,
    ) -> Self {
        Self {
            rules,
            executions,
            accounts,
            policy,
        }
    }

    /// Returns the account's rule, if any.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing and `PermissionDenied`
    /// if the actor may not act on it.
    pub async fn get(
        &self,
        actor: ProfileId,
        account_id: AccountId,
    ) -> DomainResult<Option<RecurringDeposit>> {
        self.authorize(actor, account_id).await?;
        self.rules.find_by_account(account_id).await
    }

    /// Creates the account's rule, or updates it in place if one already
    /// exists. At most one rule per account; repeated calls keep the rule id
    /// stable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount <= 0` or `day_of_month` is outside
    /// 1..=31, plus the authorization errors of [`Self::get`].
    pub async fn create_or_update(
        &self,
        actor: ProfileId,
        account_id: AccountId,
        amount: i64,
        day_of_month: u8,
        is_active: bool,
    ) -> DomainResult<RecurringDeposit> {
        if amount <= 0 {
            return Err(DomainError::InvalidAmount {
                amount,
                reason: "Amount must be positive".to_string(),
            });
        }
        if !(1..=31).contains(&day_of_month) {
            return Err(DomainError::InvalidAmount {
                amount: i64::from(day_of_month),
                reason: "Day of month must be between 1 and 31".to_string(),
            });
        }
        self.authorize(actor, account_id).await?;

        let now = Utc::now();
        if let Some(mut rule) = self.rules.find_by_account(account_id).await? {
            rule.amount = amount;
            rule.day_of_month = day_of_month;
            rule.is_active = is_active;
            rule.updated_at = now;
            self.rules.update(rule).await
        } else {
            self.rules
                .insert(RecurringDeposit {
                    id: RecurringDepositId::new(),
                    account_id,
                    amount,
                    day_of_month,
                    is_active,
                    created_at: now,
                    updated_at: now,
                })
                .await
        }
    }

    /// Deletes the account's rule.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account has no rule, plus the authorization
    /// errors of [`Self::get`].
    pub async fn delete(&self, actor: ProfileId, account_id: AccountId) -> DomainResult<()> {
        self.authorize(actor, account_id).await?;
        let rule = self
            .rules
            .find_by_account(account_id)
            .await?
            .ok_or_else(|| DomainError::not_found("RecurringDeposit", account_id))?;
        self.rules.delete(rule.id).await?;
        Ok(())
    }

    /// Lists the execution audit trail for the account's rule, most recent
    /// first. An account without a rule yields an empty list.
    ///
    /// # Errors
    ///
    /// As [`Self::get`].
    pub async fn history(
        &self,
        actor: ProfileId,
        account_id: AccountId,
    ) -> DomainResult<Vec<RecurringDepositExecution>> {
        self.authorize(actor, account_id).await?;
        match self.rules.find_by_account(account_id).await? {
            Some(rule) => self.executions.list_for_rule(rule.id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn authorize(&self, actor: ProfileId, account_id: AccountId) -> DomainResult<()> {
        let account = self
            .accounts
            .find(account_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Account", account_id))?;
        self.policy.ensure_account_access(actor, &account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{
        account, child_profile, parent_profile, seed_account, seed_profile, seed_relationship,
    };

    fn service<'a>(store: &'a MemoryStore) -> RecurringDepositService<'a> {
        RecurringDepositService::new(store, store, store, AccessPolicy::new(store, store))
    }

    #[tokio::test]
    async fn test_create_then_update_keeps_rule_id() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        seed_relationship(&store, parent.id, child.id).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = service(&store);

        let created = svc
            .create_or_update(parent.id, acct.id, 5000, 15, true)
            .await
            .unwrap();
        assert_eq!(created.amount, 5000);
        assert_eq!(created.day_of_month, 15);

        let updated = svc
            .create_or_update(parent.id, acct.id, 9000, 20, true)
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 9000);
        assert_eq!(updated.day_of_month, 20);
    }

    #[tokio::test]
    async fn test_validation_of_amount_and_day() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = service(&store);

        for (amount, day) in [(0, 15), (-100, 15), (5000, 0), (5000, 32)] {
            let err = svc
                .create_or_update(child.id, acct.id, amount, day, true)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidAmount { .. }));
        }
    }

    #[tokio::test]
    async fn test_unrelated_actor_is_denied() {
        let store = MemoryStore::new();
        let outsider = seed_profile(&store, parent_profile("Ken")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = service(&store);

        let err = svc
            .create_or_update(outsider.id, acct.id, 5000, 15, true)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_rule_is_not_found() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 0)).await;
        let svc = service(&store);

        let err = svc.delete(child.id, acct.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        svc.create_or_update(child.id, acct.id, 5000, 15, true)
            .await
            .unwrap();
        svc.delete(child.id, acct.id).await.unwrap();
        assert!(svc.get(child.id, acct.id).await.unwrap().is_none());
    }
}
