//! Transaction history repository. Read-only; rows are appended by
//! [`AccountRepository::apply`](kidbank_core::storage::AccountRepository::apply).

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

use kidbank_core::domain::{Transaction, TransactionKind};
use kidbank_core::storage::TransactionRepository;
use kidbank_shared::types::{AccountId, TransactionId};
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::transactions;
use crate::repositories::{db_err, SeaOrmStore};

pub(crate) fn to_domain(model: transactions::Model) -> DomainResult<Transaction> {
    let kind = TransactionKind::parse(&model.kind).ok_or_else(|| {
        DomainError::Storage(format!(
            "invalid transaction type in transaction {}: {}",
            model.id, model.kind
        ))
    })?;
    Ok(Transaction {
        id: TransactionId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        kind,
        amount: model.amount,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl<C> TransactionRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn list_for_account(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> DomainResult<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit as u64)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_domain)
            .collect()
    }
}
