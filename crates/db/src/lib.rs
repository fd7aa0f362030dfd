//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions mirroring the domain model
//! - Repository implementations of the `kidbank-core` storage traits
//!
//! [`SeaOrmStore`] is generic over the connection, so the same repository
//! code runs against the pooled connection for request-scoped operations and
//! against an outer database transaction for the recurring deposit batch.

pub mod entities;
pub mod repositories;

pub use repositories::SeaOrmStore;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use kidbank_shared::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);
    Database::connect(options).await
}
