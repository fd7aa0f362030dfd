//! Withdrawal request repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};

use kidbank_core::domain::{RequestStatus, WithdrawalRequest};
use kidbank_core::storage::WithdrawalRequestRepository;
use kidbank_shared::types::{AccountId, ProfileId, RequestId};
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::{accounts, family_relationships, withdrawal_requests};
use crate::repositories::{db_err, SeaOrmStore};

fn to_domain(model: withdrawal_requests::Model) -> DomainResult<WithdrawalRequest> {
    let status = RequestStatus::parse(&model.status).ok_or_else(|| {
        DomainError::Storage(format!(
            "invalid status in withdrawal request {}: {}",
            model.id, model.status
        ))
    })?;
    Ok(WithdrawalRequest {
        id: RequestId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        amount: model.amount,
        description: model.description,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl<C> WithdrawalRequestRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find(&self, id: RequestId) -> DomainResult<Option<WithdrawalRequest>> {
        withdrawal_requests::Entity::find_by_id(id.into_inner())
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(to_domain)
            .transpose()
    }

    async fn insert(&self, request: WithdrawalRequest) -> DomainResult<WithdrawalRequest> {
        let model = withdrawal_requests::ActiveModel {
            id: Set(request.id.into_inner()),
            account_id: Set(request.account_id.into_inner()),
            amount: Set(request.amount),
            description: Set(request.description.clone()),
            status: Set(request.status.as_str().to_string()),
            created_at: Set(request.created_at.into()),
            updated_at: Set(request.updated_at.into()),
        }
        .insert(self.conn())
        .await
        .map_err(db_err)?;
        to_domain(model)
    }

    async fn update_status(
        &self,
        id: RequestId,
        status: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<WithdrawalRequest> {
        let row = withdrawal_requests::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.as_str().to_string()),
            updated_at: Set(updated_at.into()),
            ..Default::default()
        };
        let model = row.update(self.conn()).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => DomainError::not_found("WithdrawalRequest", id),
            other => db_err(other),
        })?;
        to_domain(model)
    }

    async fn pending_for_parent(
        &self,
        parent_id: ProfileId,
    ) -> DomainResult<Vec<WithdrawalRequest>> {
        let child_ids: Vec<sea_orm::prelude::Uuid> = family_relationships::Entity::find()
            .filter(family_relationships::Column::ParentId.eq(parent_id.into_inner()))
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|edge| edge.child_id)
            .collect();
        if child_ids.is_empty() {
            return Ok(Vec::new());
        }

        let account_ids: Vec<sea_orm::prelude::Uuid> = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.is_in(child_ids))
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|account| account.id)
            .collect();
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        withdrawal_requests::Entity::find()
            .filter(withdrawal_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .filter(withdrawal_requests::Column::AccountId.is_in(account_ids))
            .order_by_desc(withdrawal_requests::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_domain)
            .collect()
    }
}
