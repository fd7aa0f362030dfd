//! Per-request service construction.
//!
//! There is no service registry. Each request (or batch iteration) builds a
//! [`ServiceContext`] over borrowed collaborators and asks it for the
//! services it needs; every service is a thin bundle of references, so
//! construction is free.

use kidbank_shared::Mailer;

use crate::family::FamilyService;
use crate::invite::InviteService;
use crate::ledger::LedgerService;
use crate::policy::AccessPolicy;
use crate::profile::ProfileService;
use crate::recurring::{RecurringDepositScheduler, RecurringDepositService};
use crate::storage::{
    AccountRepository, ChildInviteRepository, FamilyRelationshipRepository, ParentInviteRepository,
    ProfileRepository, RecurringDepositExecutionRepository, RecurringDepositRepository,
    TransactionRepository, WithdrawalRequestRepository,
};
use crate::withdrawal::WithdrawalService;

/// Borrowed collaborators for one request or batch iteration.
#[derive(Clone, Copy)]
pub struct ServiceContext<'a> {
    /// Profile repository.
    pub profiles: &'a dyn ProfileRepository,
    /// Account repository.
    pub accounts: &'a dyn AccountRepository,
    /// Transaction history repository.
    pub transactions: &'a dyn TransactionRepository,
    /// Withdrawal request repository.
    pub withdrawal_requests: &'a dyn WithdrawalRequestRepository,
    /// Recurring deposit rule repository.
    pub recurring_deposits: &'a dyn RecurringDepositRepository,
    /// Recurring deposit execution audit repository.
    pub executions: &'a dyn RecurringDepositExecutionRepository,
    /// Family relationship repository.
    pub relationships: &'a dyn FamilyRelationshipRepository,
    /// Parent invite repository.
    pub parent_invites: &'a dyn ParentInviteRepository,
    /// Child invite repository.
    pub child_invites: &'a dyn ChildInviteRepository,
    /// Outgoing mail notifier.
    pub mailer: &'a dyn Mailer,
    /// Base URL embedded in invite accept links.
    pub frontend_url: &'a str,
}

impl<'a> ServiceContext<'a> {
    /// Builds a context over a store that implements every repository trait,
    /// the common case for both the database store and the in-memory fake.
    pub fn from_store<S>(store: &'a S, mailer: &'a dyn Mailer, frontend_url: &'a str) -> Self
    where
        S: ProfileRepository
            + AccountRepository
            + TransactionRepository
            + WithdrawalRequestRepository
            + RecurringDepositRepository
            + RecurringDepositExecutionRepository
            + FamilyRelationshipRepository
            + ParentInviteRepository
            + ChildInviteRepository,
    {
        Self {
            profiles: store,
            accounts: store,
            transactions: store,
            withdrawal_requests: store,
            recurring_deposits: store,
            executions: store,
            relationships: store,
            parent_invites: store,
            child_invites: store,
            mailer,
            frontend_url,
        }
    }

    /// Authorization policy.
    #[must_use]
    pub fn policy(&self) -> AccessPolicy<'a> {
        AccessPolicy::new(self.profiles, self.relationships)
    }

    /// Family graph service.
    #[must_use]
    pub fn family(&self) -> FamilyService<'a> {
        FamilyService::new(self.profiles, self.relationships)
    }

    /// Ledger engine.
    #[must_use]
    pub fn ledger(&self) -> LedgerService<'a> {
        LedgerService::new(
            self.accounts,
            self.transactions,
            self.relationships,
            self.policy(),
        )
    }

    /// Withdrawal request workflow.
    #[must_use]
    pub fn withdrawals(&self) -> WithdrawalService<'a> {
        WithdrawalService::new(self.withdrawal_requests, self.accounts, self.ledger())
    }

    /// Invite workflows.
    #[must_use]
    pub fn invites(&self) -> InviteService<'a> {
        InviteService::new(
            self.parent_invites,
            self.child_invites,
            self.profiles,
            self.family(),
            self.mailer,
            self.frontend_url,
        )
    }

    /// Recurring deposit rule management.
    #[must_use]
    pub fn recurring(&self) -> RecurringDepositService<'a> {
        RecurringDepositService::new(
            self.recurring_deposits,
            self.executions,
            self.accounts,
            self.policy(),
        )
    }

    /// Recurring deposit batch scheduler.
    #[must_use]
    pub fn scheduler(&self) -> RecurringDepositScheduler<'a> {
        RecurringDepositScheduler::new(self.recurring_deposits, self.executions, self.ledger())
    }

    /// Profile management.
    #[must_use]
    pub fn profile(&self) -> ProfileService<'a> {
        ProfileService::new(
            self.profiles,
            self.accounts,
            self.recurring_deposits,
            self.family(),
            self.policy(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidbank_shared::LogMailer;

    use crate::domain::RequestStatus;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{balance_of, parent_profile, seed_profile};

    /// End-to-end: create a child, deposit allowance, request and approve a
    /// withdrawal, all through one context.
    #[tokio::test]
    async fn test_full_flow_through_context() {
        let store = MemoryStore::new();
        let mailer = LogMailer;
        let ctx = ServiceContext::from_store(&store, &mailer, "https://kidbank.example");

        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let (child, account) = ctx.profile().create_child(parent.id, "Mio", 0, None).await.unwrap();

        ctx.ledger()
            .deposit(parent.id, account.id, 10_000, Some("Allowance".to_string()))
            .await
            .unwrap();

        let request = ctx
            .withdrawals()
            .create(account.id, 3000, Some("Game".to_string()))
            .await
            .unwrap();
        let pending = ctx.withdrawals().pending_for_parent(parent.id).await.unwrap();
        assert_eq!(pending.len(), 1);

        let approved = ctx.withdrawals().approve(request.id).await.unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(balance_of(&store, account.id).await, 7000);

        let history = ctx
            .ledger()
            .list_transactions(child.id, account.id, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }
}
