//! Storage traits.
//!
//! One trait per entity, CRUD-by-id plus the handful of targeted queries the
//! workflows need. The traits are implemented twice: against real storage in
//! `kidbank-db` and against [`memory::MemoryStore`] for tests.
//!
//! Two operations are composite on purpose: [`AccountRepository::apply`]
//! commits a balance change together with its transaction row, and
//! [`ProfileRepository::migrate_identity`] moves a provisional child profile
//! onto an authenticated one across accounts and relationships. Both must be
//! all-or-nothing in any implementation; splitting them into separate calls
//! would let a crash leave the ledger and its history out of sync.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kidbank_shared::types::{AccountId, InviteId, ProfileId, RecurringDepositId, RequestId};
use kidbank_shared::DomainResult;

use crate::domain::{
    Account, ChildInvite, FamilyRelationship, InviteStatus, ParentInvite, Profile,
    RecurringDeposit, RecurringDepositExecution, RequestStatus, Transaction, TransactionKind,
    WithdrawalRequest,
};

/// Input for appending a ledger transaction via [`AccountRepository::apply`].
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Transaction type.
    pub kind: TransactionKind,
    /// Positive amount in the smallest currency unit.
    pub amount: i64,
    /// Free-form description.
    pub description: Option<String>,
}

/// Profile data access.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile by ID.
    async fn find(&self, id: ProfileId) -> DomainResult<Option<Profile>>;

    /// Finds a profile by its external identity reference.
    async fn find_by_auth_user_id(&self, auth_user_id: &str) -> DomainResult<Option<Profile>>;

    /// Finds an identity-less profile by email.
    async fn find_unlinked_by_email(&self, email: &str) -> DomainResult<Option<Profile>>;

    /// Inserts a new profile.
    async fn insert(&self, profile: Profile) -> DomainResult<Profile>;

    /// Updates an existing profile. Fails with `NotFound` if missing.
    async fn update(&self, profile: Profile) -> DomainResult<Profile>;

    /// Deletes a profile. Returns whether a row was removed.
    async fn delete(&self, id: ProfileId) -> DomainResult<bool>;

    /// Atomically merges the provisional profile `old` into the
    /// authenticated profile `new`: reassigns every account owned by `old`
    /// to `new`, repoints every family relationship referencing `old`,
    /// copies the display name from `old` onto `new`, marks `new` as a
    /// child, and deletes the `old` row. Returns the migrated profile.
    async fn migrate_identity(&self, old: ProfileId, new: ProfileId) -> DomainResult<Profile>;
}

/// Account data access. The only writer of `balance`.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Finds an account by ID.
    async fn find(&self, id: AccountId) -> DomainResult<Option<Account>>;

    /// Lists all accounts owned by a profile.
    async fn find_by_owner(&self, owner_id: ProfileId) -> DomainResult<Vec<Account>>;

    /// Inserts a new account.
    async fn insert(&self, account: Account) -> DomainResult<Account>;

    /// Updates an existing account (goal fields, `updated_at`). The balance
    /// must never be written through this method; use [`Self::apply`].
    async fn update(&self, account: Account) -> DomainResult<Account>;

    /// Deletes an account together with its transactions and withdrawal
    /// requests. Returns whether a row was removed.
    async fn delete(&self, id: AccountId) -> DomainResult<bool>;

    /// Atomically applies `delta` to the account balance and appends the
    /// transaction record. Implementations must serialize concurrent calls
    /// on the same account and fail with `InvalidAmount` if the resulting
    /// balance would be negative.
    async fn apply(
        &self,
        account_id: AccountId,
        delta: i64,
        record: NewTransaction,
    ) -> DomainResult<Transaction>;
}

/// Transaction history access. Rows are appended only through
/// [`AccountRepository::apply`]; this trait is read-only.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Lists transactions for an account, most recent first, bounded by
    /// `limit`. Unknown accounts yield an empty list.
    async fn list_for_account(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> DomainResult<Vec<Transaction>>;
}

/// Withdrawal request data access.
#[async_trait]
pub trait WithdrawalRequestRepository: Send + Sync {
    /// Finds a request by ID.
    async fn find(&self, id: RequestId) -> DomainResult<Option<WithdrawalRequest>>;

    /// Inserts a new request.
    async fn insert(&self, request: WithdrawalRequest) -> DomainResult<WithdrawalRequest>;

    /// Updates a request's status and `updated_at` stamp.
    async fn update_status(
        &self,
        id: RequestId,
        status: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<WithdrawalRequest>;

    /// Lists pending requests on accounts owned by any child related to
    /// `parent_id`, most recent first.
    async fn pending_for_parent(&self, parent_id: ProfileId)
        -> DomainResult<Vec<WithdrawalRequest>>;
}

/// Recurring deposit rule data access.
#[async_trait]
pub trait RecurringDepositRepository: Send + Sync {
    /// Finds the rule for an account, if any. At most one exists.
    async fn find_by_account(&self, account_id: AccountId)
        -> DomainResult<Option<RecurringDeposit>>;

    /// Inserts a new rule.
    async fn insert(&self, rule: RecurringDeposit) -> DomainResult<RecurringDeposit>;

    /// Updates an existing rule.
    async fn update(&self, rule: RecurringDeposit) -> DomainResult<RecurringDeposit>;

    /// Deletes a rule. Returns whether a row was removed.
    async fn delete(&self, id: RecurringDepositId) -> DomainResult<bool>;

    /// Lists active rules whose `day_of_month` matches `day`.
    async fn active_for_day(&self, day: u8) -> DomainResult<Vec<RecurringDeposit>>;
}

/// Recurring deposit execution audit access. Append-only.
#[async_trait]
pub trait RecurringDepositExecutionRepository: Send + Sync {
    /// Appends an execution record.
    async fn insert(
        &self,
        execution: RecurringDepositExecution,
    ) -> DomainResult<RecurringDepositExecution>;

    /// Returns true iff a `success` execution exists for the rule in the
    /// given year and month. The once-per-month idempotency guard.
    async fn has_success_in_month(
        &self,
        rule_id: RecurringDepositId,
        year: i32,
        month: u32,
    ) -> DomainResult<bool>;

    /// Lists execution records for a rule, most recent first.
    async fn list_for_rule(
        &self,
        rule_id: RecurringDepositId,
    ) -> DomainResult<Vec<RecurringDepositExecution>>;
}

/// Family relationship data access.
#[async_trait]
pub trait FamilyRelationshipRepository: Send + Sync {
    /// Finds the relationship row for a (parent, child) pair.
    async fn find_pair(
        &self,
        parent_id: ProfileId,
        child_id: ProfileId,
    ) -> DomainResult<Option<FamilyRelationship>>;

    /// Inserts a new relationship row.
    async fn insert(&self, relationship: FamilyRelationship) -> DomainResult<FamilyRelationship>;

    /// Deletes the relationship row for a pair. Returns whether a row was
    /// removed.
    async fn delete_pair(&self, parent_id: ProfileId, child_id: ProfileId) -> DomainResult<bool>;

    /// Lists relationship rows where `child_id` matches.
    async fn parents_of(&self, child_id: ProfileId) -> DomainResult<Vec<FamilyRelationship>>;

    /// Lists relationship rows where `parent_id` matches.
    async fn children_of(&self, parent_id: ProfileId) -> DomainResult<Vec<FamilyRelationship>>;
}

/// Parent invite data access.
#[async_trait]
pub trait ParentInviteRepository: Send + Sync {
    /// Finds an invite by its token.
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<ParentInvite>>;

    /// Inserts a new invite.
    async fn insert(&self, invite: ParentInvite) -> DomainResult<ParentInvite>;

    /// Updates an invite's status.
    async fn update_status(&self, id: InviteId, status: InviteStatus)
        -> DomainResult<ParentInvite>;
}

/// Child invite data access.
#[async_trait]
pub trait ChildInviteRepository: Send + Sync {
    /// Finds an invite by its token.
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<ChildInvite>>;

    /// Inserts a new invite.
    async fn insert(&self, invite: ChildInvite) -> DomainResult<ChildInvite>;

    /// Updates an invite's status.
    async fn update_status(&self, id: InviteId, status: InviteStatus) -> DomainResult<ChildInvite>;
}
