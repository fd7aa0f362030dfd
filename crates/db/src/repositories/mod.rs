//! Repository implementations of the `kidbank-core` storage traits.
//!
//! All traits are implemented on a single [`SeaOrmStore`], one file per
//! entity. The store borrows its connection and is generic over it, so the
//! scheduler can run a whole batch inside one outer database transaction
//! while request-scoped callers use the pooled connection directly. The
//! composite operations (`apply`, `migrate_identity`) open an inner
//! transaction, which becomes a savepoint when already inside one.

pub mod account;
pub mod family_relationship;
pub mod invite;
pub mod profile;
pub mod recurring_deposit;
pub mod transaction;
pub mod withdrawal_request;

use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};

use kidbank_shared::DomainError;

/// Store implementing every storage trait against `SeaORM`.
#[derive(Debug, Clone, Copy)]
pub struct SeaOrmStore<'a, C> {
    conn: &'a C,
}

impl<'a, C> SeaOrmStore<'a, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    /// Creates a store over a connection or an open transaction.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub(crate) const fn conn(&self) -> &'a C {
        self.conn
    }
}

/// Maps a database error onto the domain error taxonomy.
pub(crate) fn db_err(err: DbErr) -> DomainError {
    DomainError::Storage(err.to_string())
}
