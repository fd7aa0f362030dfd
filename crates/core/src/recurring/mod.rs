//! Recurring deposit rules and the daily batch logic.
//!
//! At most one rule per account. The batch runs once a day: for every active
//! rule matching today's day-of-month it posts a deposit, guarded by a
//! once-per-month idempotency check backed by the execution audit trail.

pub mod scheduler;
pub mod service;

pub use scheduler::{BatchSummary, RecurringDepositScheduler, RuleOutcome};
pub use service::RecurringDepositService;
