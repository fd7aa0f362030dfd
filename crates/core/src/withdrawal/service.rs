//! Withdrawal request operations.

use chrono::Utc;

use kidbank_shared::types::{AccountId, ProfileId, RequestId};
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{RequestStatus, TransactionKind, WithdrawalRequest};
use crate::ledger::balance;
use crate::ledger::LedgerService;
use crate::storage::{AccountRepository, WithdrawalRequestRepository};

/// Withdrawal request workflow. Callers are expected to be authorized by
/// the transport layer; approval and rejection act on the request alone.
#[derive(Clone, Copy)]
pub struct WithdrawalService<'a> {
    requests: &'a dyn WithdrawalRequestRepository,
    accounts: &'a dyn AccountRepository,
    ledger: LedgerService<'a>,
}

impl<'a> WithdrawalService<'a> {
    /// Creates a withdrawal service over the given repositories.
    pub fn new(
        requests: &'a dyn WithdrawalRequestRepository,
        accounts: &'a dyn AccountRepository,
        ledger: LedgerService<'a>,
    ) -> Self {
        Self {
            requests,
            accounts,
            ledger,
        }
    }

    /// Creates a pending withdrawal request.
    ///
    /// The balance is checked here for early rejection and checked again at
    /// approval time, since it may have changed in between.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing and `InvalidAmount` if
    /// the amount is non-positive or exceeds the current balance.
    pub async fn create(
        &self,
        account_id: AccountId,
        amount: i64,
        description: Option<String>,
    ) -> DomainResult<WithdrawalRequest> {
        let account = self
            .accounts
            .find(account_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Account", account_id))?;
        balance::ensure_positive(amount)?;
        balance::ensure_withdrawable(account.balance, amount)?;

        let now = Utc::now();
        self.requests
            .insert(WithdrawalRequest {
                id: RequestId::new(),
                account_id,
                amount,
                description,
                status: RequestStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Lists pending requests on accounts owned by any child of the parent,
    /// most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn pending_for_parent(
        &self,
        parent_id: ProfileId,
    ) -> DomainResult<Vec<WithdrawalRequest>> {
        self.requests.pending_for_parent(parent_id).await
    }

    /// Approves a pending request and posts the withdrawal to the ledger.
    ///
    /// If the ledger rejects the withdrawal (the balance may have dropped
    /// since the request was created) the request transitions to rejected
    /// and the ledger error propagates unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request is missing, `InvalidOperation`
    /// naming the current status if it is not pending, or the ledger error
    /// on a failed withdrawal.
    pub async fn approve(&self, request_id: RequestId) -> DomainResult<WithdrawalRequest> {
        let request = self.require_pending(request_id).await?;

        match self
            .ledger
            .post(
                request.account_id,
                TransactionKind::Withdraw,
                request.amount,
                request.description.clone(),
            )
            .await
        {
            Ok(_) => {
                self.requests
                    .update_status(request_id, RequestStatus::Approved, Utc::now())
                    .await
            }
            Err(err) => {
                self.requests
                    .update_status(request_id, RequestStatus::Rejected, Utc::now())
                    .await?;
                Err(err)
            }
        }
    }

    /// Rejects a pending request. No ledger effect.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request is missing and `InvalidOperation`
    /// naming the current status if it is not pending.
    pub async fn reject(&self, request_id: RequestId) -> DomainResult<WithdrawalRequest> {
        self.require_pending(request_id).await?;
        self.requests
            .update_status(request_id, RequestStatus::Rejected, Utc::now())
            .await
    }

    async fn require_pending(&self, request_id: RequestId) -> DomainResult<WithdrawalRequest> {
        let request = self
            .requests
            .find(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("WithdrawalRequest", request_id))?;
        if request.status != RequestStatus::Pending {
            return Err(DomainError::InvalidOperation(format!(
                "Request already {}",
                request.status
            )));
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AccessPolicy;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{
        account, balance_of, child_profile, parent_profile, seed_account, seed_profile,
        seed_relationship,
    };

    fn service<'a>(store: &'a MemoryStore) -> WithdrawalService<'a> {
        let ledger = LedgerService::new(store, store, store, AccessPolicy::new(store, store));
        WithdrawalService::new(store, store, ledger)
    }

    #[tokio::test]
    async fn test_create_and_approve() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 5000)).await;
        let svc = service(&store);

        let request = svc
            .create(acct.id, 2000, Some("Game".to_string()))
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let approved = svc.approve(request.id).await.unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(balance_of(&store, acct.id).await, 3000);
    }

    #[tokio::test]
    async fn test_create_rejects_overdraft_early() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 1000)).await;
        let svc = service(&store);

        let err = svc.create(acct.id, 2000, None).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount { .. }));
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("2000"));
    }

    #[tokio::test]
    async fn test_approve_on_dropped_balance_rejects_request_and_raises() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 5000)).await;
        let svc = service(&store);

        let request = svc.create(acct.id, 4000, None).await.unwrap();

        // Balance drops below the requested amount before approval.
        let ledger = LedgerService::new(&store, &store, &store, AccessPolicy::new(&store, &store));
        ledger.withdraw(child.id, acct.id, 3000, None).await.unwrap();

        let err = svc.approve(request.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount { .. }));
        assert!(err.to_string().contains("2000"));
        assert!(err.to_string().contains("4000"));

        // Rejected, not left pending, and no ledger effect.
        let stored = WithdrawalRequestRepository::find(&store, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);
        assert_eq!(balance_of(&store, acct.id).await, 2000);
    }

    #[tokio::test]
    async fn test_terminal_requests_cannot_be_reprocessed() {
        let store = MemoryStore::new();
        let child = seed_profile(&store, child_profile("Mio")).await;
        let acct = seed_account(&store, account(child.id, 5000)).await;
        let svc = service(&store);

        let request = svc.create(acct.id, 1000, None).await.unwrap();
        svc.reject(request.id).await.unwrap();

        let err = svc.approve(request.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
        assert!(err.to_string().contains("rejected"));

        let err = svc.reject(request.id).await.unwrap_err();
        assert!(err.to_string().contains("rejected"));

        // The failed approve must not have touched the balance.
        assert_eq!(balance_of(&store, acct.id).await, 5000);
    }

    #[tokio::test]
    async fn test_approve_missing_request_is_not_found() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let err = svc.approve(RequestId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_pending_for_parent_spans_children_only() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let other = seed_profile(&store, child_profile("Yui")).await;
        seed_relationship(&store, parent.id, child.id).await;
        let acct = seed_account(&store, account(child.id, 5000)).await;
        let other_acct = seed_account(&store, account(other.id, 5000)).await;
        let svc = service(&store);

        let mine = svc.create(acct.id, 1000, None).await.unwrap();
        svc.create(other_acct.id, 1000, None).await.unwrap();

        let pending = svc.pending_for_parent(parent.id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, mine.id);
    }
}
