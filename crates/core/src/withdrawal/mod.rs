//! Child-initiated withdrawal request workflow.
//!
//! State machine over `{pending, approved, rejected}`; `pending` is the only
//! non-terminal state. Approval posts the withdrawal to the ledger; if that
//! fails the request is rejected instead of being left pending.

pub mod service;

pub use service::WithdrawalService;
