//! Account repository, including the atomic balance update.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use kidbank_core::domain::{Account, Transaction};
use kidbank_core::storage::{AccountRepository, NewTransaction};
use kidbank_shared::types::{AccountId, ProfileId, TransactionId};
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::{accounts, transactions, withdrawal_requests};
use crate::repositories::{db_err, transaction, SeaOrmStore};

pub(crate) fn to_domain(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        owner_id: ProfileId::from_uuid(model.owner_id),
        balance: model.balance,
        currency: model.currency,
        goal_name: model.goal_name,
        goal_amount: model.goal_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        owner_id: Set(account.owner_id.into_inner()),
        balance: Set(account.balance),
        currency: Set(account.currency.clone()),
        goal_name: Set(account.goal_name.clone()),
        goal_amount: Set(account.goal_amount),
        created_at: Set(account.created_at.into()),
        updated_at: Set(account.updated_at.into()),
    }
}

#[async_trait]
impl<C> AccountRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find(&self, id: AccountId) -> DomainResult<Option<Account>> {
        Ok(accounts::Entity::find_by_id(id.into_inner())
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(to_domain))
    }

    async fn find_by_owner(&self, owner_id: ProfileId) -> DomainResult<Vec<Account>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_domain)
            .collect())
    }

    async fn insert(&self, account: Account) -> DomainResult<Account> {
        let model = to_active(&account)
            .insert(self.conn())
            .await
            .map_err(db_err)?;
        Ok(to_domain(model))
    }

    async fn update(&self, account: Account) -> DomainResult<Account> {
        // The balance only moves through `apply`; leave the column alone.
        let row = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            currency: Set(account.currency.clone()),
            goal_name: Set(account.goal_name.clone()),
            goal_amount: Set(account.goal_amount),
            updated_at: Set(account.updated_at.into()),
            ..Default::default()
        };
        let model = row.update(self.conn()).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => DomainError::not_found("Account", account.id),
            other => db_err(other),
        })?;
        Ok(to_domain(model))
    }

    async fn delete(&self, id: AccountId) -> DomainResult<bool> {
        let txn = self.conn().begin().await.map_err(db_err)?;
        transactions::Entity::delete_many()
            .filter(transactions::Column::AccountId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        withdrawal_requests::Entity::delete_many()
            .filter(withdrawal_requests::Column::AccountId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let result = accounts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn apply(
        &self,
        account_id: AccountId,
        delta: i64,
        record: NewTransaction,
    ) -> DomainResult<Transaction> {
        let txn = self.conn().begin().await.map_err(db_err)?;

        // Row lock serializes concurrent balance changes on the account.
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Account", account_id))?;

        let new_balance = account.balance + delta;
        if new_balance < 0 {
            return Err(DomainError::InvalidAmount {
                amount: record.amount,
                reason: format!(
                    "Insufficient balance. Current: {}, Required: {}",
                    account.balance, record.amount
                ),
            });
        }

        let now = Utc::now();
        let mut row: accounts::ActiveModel = account.into();
        row.balance = Set(new_balance);
        row.updated_at = Set(now.into());
        row.update(&txn).await.map_err(db_err)?;

        let inserted = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            account_id: Set(account_id.into_inner()),
            kind: Set(record.kind.as_str().to_string()),
            amount: Set(record.amount),
            description: Set(record.description),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        transaction::to_domain(inserted)
    }
}
