//! Core business logic for Kidbank.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and workflows live here;
//! persistence is reached only through the storage traits in [`storage`].
//!
//! # Modules
//!
//! - `domain` - Domain entities and enums
//! - `storage` - Storage traits plus the in-memory fake
//! - `policy` - Authorization decision logic
//! - `family` - Parent/child relationship graph
//! - `ledger` - Account balances and the append-only transaction ledger
//! - `withdrawal` - Child-initiated withdrawal request workflow
//! - `invite` - Parent and child invitation workflows
//! - `recurring` - Recurring deposit rules and the daily batch logic
//! - `profile` - Profile management

pub mod context;
pub mod domain;
pub mod family;
pub mod invite;
pub mod ledger;
pub mod policy;
pub mod profile;
pub mod recurring;
pub mod storage;
pub mod withdrawal;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::ServiceContext;
