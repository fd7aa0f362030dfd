//! Domain entities and enums.
//!
//! Amounts are integers in the smallest currency unit. Enums are genuine Rust
//! enums in the domain; string encoding happens only at the storage boundary
//! via `parse`/`as_str`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kidbank_shared::types::{
    AccountId, ExecutionId, InviteId, ProfileId, RecurringDepositId, RelationshipId, RequestId,
    TransactionId,
};

/// Profile role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A parent or guardian who manages children's accounts.
    Parent,
    /// A child whose accounts are managed by one or more parents.
    Child,
}

impl Role {
    /// Parse a role from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(Self::Parent),
            "child" => Some(Self::Child),
            _ => None,
        }
    }

    /// Returns the storage representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }
}

/// Ledger transaction type. Deposits and rewards increase the balance,
/// withdrawals decrease it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money paid into the account.
    Deposit,
    /// Money taken out of the account.
    Withdraw,
    /// A bonus credited to the account.
    Reward,
}

impl TransactionKind {
    /// Parse a transaction kind from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            "reward" => Some(Self::Reward),
            _ => None,
        }
    }

    /// Returns the storage representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Reward => "reward",
        }
    }
}

/// Withdrawal request status. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting a parent's decision.
    Pending,
    /// Approved; the withdrawal was posted to the ledger.
    Approved,
    /// Rejected; no ledger effect.
    Rejected,
}

impl RequestStatus {
    /// Parse a request status from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the storage representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invite status, shared by parent and child invites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    /// Waiting for the invitee.
    Pending,
    /// Accepted; the invite is consumed.
    Accepted,
    /// Expired before acceptance.
    Expired,
    /// Cancelled by the inviter.
    Cancelled,
}

impl InviteStatus {
    /// Parse an invite status from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "expired" => Some(Self::Expired),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns the storage representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// A biological or adoptive parent.
    Parent,
    /// A legal guardian.
    Guardian,
}

impl RelationshipType {
    /// Parse a relationship type from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(Self::Parent),
            "guardian" => Some(Self::Guardian),
            _ => None,
        }
    }

    /// Returns the storage representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Guardian => "guardian",
        }
    }
}

/// Recurring deposit execution outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The deposit was posted.
    Success,
    /// Skipped because the rule already ran this month.
    Skipped,
    /// The deposit attempt failed.
    Failed,
}

impl ExecutionStatus {
    /// Parse an execution status from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "skipped" => Some(Self::Skipped),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns the storage representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// A user profile. A child profile may exist with no linked identity
/// (parent-managed) or be linked 1:1 to exactly one external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier.
    pub id: ProfileId,
    /// Opaque reference handed out by the external identity provider.
    /// `None` until the person authenticates.
    pub auth_user_id: Option<String>,
    /// Contact email, if known.
    pub email: Option<String>,
    /// Display name.
    pub name: String,
    /// Role in the family.
    pub role: Role,
    /// Avatar reference.
    pub avatar_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A savings account owned by exactly one profile.
///
/// Invariant: `balance` always equals the signed sum of the account's
/// transactions in creation order, and is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning profile.
    pub owner_id: ProfileId,
    /// Current balance in the smallest currency unit.
    pub balance: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Savings goal name, if set.
    pub goal_name: Option<String>,
    /// Savings goal amount, non-negative when present.
    pub goal_amount: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// An immutable ledger transaction. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// The account this transaction belongs to.
    pub account_id: AccountId,
    /// Transaction type.
    pub kind: TransactionKind,
    /// Positive amount in the smallest currency unit.
    pub amount: i64,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A child-initiated withdrawal request awaiting parental approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Unique identifier.
    pub id: RequestId,
    /// The account to withdraw from.
    pub account_id: AccountId,
    /// Positive amount in the smallest currency unit.
    pub amount: i64,
    /// Free-form description.
    pub description: Option<String>,
    /// Current state; terminal once non-pending.
    pub status: RequestStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A recurring monthly deposit rule. At most one rule per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringDeposit {
    /// Unique identifier.
    pub id: RecurringDepositId,
    /// The account to deposit into.
    pub account_id: AccountId,
    /// Positive amount in the smallest currency unit.
    pub amount: i64,
    /// Day of month the rule fires (1-31).
    pub day_of_month: u8,
    /// Whether the rule is active.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record for one recurring deposit run. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringDepositExecution {
    /// Unique identifier.
    pub id: ExecutionId,
    /// The rule that was processed.
    pub recurring_deposit_id: RecurringDepositId,
    /// The resulting transaction, on success.
    pub transaction_id: Option<TransactionId>,
    /// Outcome of the run.
    pub status: ExecutionStatus,
    /// The rule amount at execution time.
    pub amount: i64,
    /// The rule day-of-month at execution time.
    pub day_of_month: u8,
    /// Failure or skip reason, if any.
    pub error_message: Option<String>,
    /// When the run happened.
    pub executed_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A parent-child edge in the family graph. Many-to-many: a child may have
/// multiple parents and a parent multiple children. At most one row per
/// (parent, child) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRelationship {
    /// Unique identifier.
    pub id: RelationshipId,
    /// The parent profile.
    pub parent_id: ProfileId,
    /// The child profile.
    pub child_id: ProfileId,
    /// Kind of relationship.
    pub relationship_type: RelationshipType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An invitation for another adult to join a family as a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInvite {
    /// Unique identifier.
    pub id: InviteId,
    /// Single-use opaque token embedded in the accept link.
    pub token: String,
    /// The inviter's first child at creation time (the representative child).
    pub child_id: ProfileId,
    /// The inviting parent.
    pub inviter_id: ProfileId,
    /// Invitee email address.
    pub email: String,
    /// Invite state.
    pub status: InviteStatus,
    /// Hard expiry, creation time plus seven days.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An invitation for a parent-managed child to create their own login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildInvite {
    /// Unique identifier.
    pub id: InviteId,
    /// Single-use opaque token embedded in the accept link.
    pub token: String,
    /// The provisional child profile to migrate on acceptance.
    pub child_id: ProfileId,
    /// Invitee email address.
    pub email: String,
    /// Invite state.
    pub status: InviteStatus,
    /// Hard expiry, creation time plus seven days.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("parent", Role::Parent)]
    #[case("child", Role::Child)]
    fn test_role_roundtrip(#[case] s: &str, #[case] role: Role) {
        assert_eq!(Role::parse(s), Some(role));
        assert_eq!(role.as_str(), s);
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse("Parent"), None);
    }

    #[rstest]
    #[case("deposit", TransactionKind::Deposit)]
    #[case("withdraw", TransactionKind::Withdraw)]
    #[case("reward", TransactionKind::Reward)]
    fn test_transaction_kind_roundtrip(#[case] s: &str, #[case] kind: TransactionKind) {
        assert_eq!(TransactionKind::parse(s), Some(kind));
        assert_eq!(kind.as_str(), s);
    }

    #[rstest]
    #[case("pending", RequestStatus::Pending)]
    #[case("approved", RequestStatus::Approved)]
    #[case("rejected", RequestStatus::Rejected)]
    fn test_request_status_roundtrip(#[case] s: &str, #[case] status: RequestStatus) {
        assert_eq!(RequestStatus::parse(s), Some(status));
        assert_eq!(status.as_str(), s);
        assert_eq!(status.to_string(), s);
    }

    #[rstest]
    #[case("pending", InviteStatus::Pending)]
    #[case("accepted", InviteStatus::Accepted)]
    #[case("expired", InviteStatus::Expired)]
    #[case("cancelled", InviteStatus::Cancelled)]
    fn test_invite_status_roundtrip(#[case] s: &str, #[case] status: InviteStatus) {
        assert_eq!(InviteStatus::parse(s), Some(status));
        assert_eq!(status.as_str(), s);
    }

    #[rstest]
    #[case("success", ExecutionStatus::Success)]
    #[case("skipped", ExecutionStatus::Skipped)]
    #[case("failed", ExecutionStatus::Failed)]
    fn test_execution_status_roundtrip(#[case] s: &str, #[case] status: ExecutionStatus) {
        assert_eq!(ExecutionStatus::parse(s), Some(status));
        assert_eq!(status.as_str(), s);
    }

    #[rstest]
    #[case("parent", RelationshipType::Parent)]
    #[case("guardian", RelationshipType::Guardian)]
    fn test_relationship_type_roundtrip(#[case] s: &str, #[case] rt: RelationshipType) {
        assert_eq!(RelationshipType::parse(s), Some(rt));
        assert_eq!(rt.as_str(), s);
    }
}
