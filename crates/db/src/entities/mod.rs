//! `SeaORM` entity definitions.
//!
//! Enums and flags are stored as text and decoded into domain enums at the
//! repository boundary; amounts are integers in the smallest currency unit.

pub mod accounts;
pub mod child_invites;
pub mod family_relationships;
pub mod parent_invites;
pub mod profiles;
pub mod recurring_deposit_executions;
pub mod recurring_deposits;
pub mod transactions;
pub mod withdrawal_requests;
