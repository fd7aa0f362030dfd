//! Account balances and the append-only transaction ledger.
//!
//! The ledger engine is the only writer of `Account::balance`. Every
//! mutation recomputes the balance as `old_balance ± amount` and commits it
//! together with the transaction row through
//! [`crate::storage::AccountRepository::apply`].

pub mod balance;
pub mod service;

#[cfg(test)]
mod balance_props;

pub use service::{LedgerService, DEFAULT_TRANSACTION_LIMIT};
