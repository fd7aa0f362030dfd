//! Recurring deposit rule and execution audit repositories.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use kidbank_core::domain::{ExecutionStatus, RecurringDeposit, RecurringDepositExecution};
use kidbank_core::storage::{RecurringDepositExecutionRepository, RecurringDepositRepository};
use kidbank_shared::types::{AccountId, ExecutionId, RecurringDepositId, TransactionId};
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::{recurring_deposit_executions, recurring_deposits};
use crate::repositories::{db_err, SeaOrmStore};

fn day_of_month(raw: i16, id: sea_orm::prelude::Uuid) -> DomainResult<u8> {
    u8::try_from(raw)
        .map_err(|_| DomainError::Storage(format!("invalid day of month in rule {id}: {raw}")))
}

fn rule_to_domain(model: recurring_deposits::Model) -> DomainResult<RecurringDeposit> {
    Ok(RecurringDeposit {
        id: RecurringDepositId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        amount: model.amount,
        day_of_month: day_of_month(model.day_of_month, model.id)?,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn rule_to_active(rule: &RecurringDeposit) -> recurring_deposits::ActiveModel {
    recurring_deposits::ActiveModel {
        id: Set(rule.id.into_inner()),
        account_id: Set(rule.account_id.into_inner()),
        amount: Set(rule.amount),
        day_of_month: Set(i16::from(rule.day_of_month)),
        is_active: Set(rule.is_active),
        created_at: Set(rule.created_at.into()),
        updated_at: Set(rule.updated_at.into()),
    }
}

fn execution_to_domain(
    model: recurring_deposit_executions::Model,
) -> DomainResult<RecurringDepositExecution> {
    let status = ExecutionStatus::parse(&model.status).ok_or_else(|| {
        DomainError::Storage(format!(
            "invalid status in execution {}: {}",
            model.id, model.status
        ))
    })?;
    Ok(RecurringDepositExecution {
        id: ExecutionId::from_uuid(model.id),
        recurring_deposit_id: RecurringDepositId::from_uuid(model.recurring_deposit_id),
        transaction_id: model.transaction_id.map(TransactionId::from_uuid),
        status,
        amount: model.amount,
        day_of_month: day_of_month(model.day_of_month, model.id)?,
        error_message: model.error_message,
        executed_at: model.executed_at.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl<C> RecurringDepositRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find_by_account(
        &self,
        account_id: AccountId,
    ) -> DomainResult<Option<RecurringDeposit>> {
        recurring_deposits::Entity::find()
            .filter(recurring_deposits::Column::AccountId.eq(account_id.into_inner()))
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(rule_to_domain)
            .transpose()
    }

    async fn insert(&self, rule: RecurringDeposit) -> DomainResult<RecurringDeposit> {
        let model = rule_to_active(&rule)
            .insert(self.conn())
            .await
            .map_err(db_err)?;
        rule_to_domain(model)
    }

    async fn update(&self, rule: RecurringDeposit) -> DomainResult<RecurringDeposit> {
        let id = rule.id;
        let model = rule_to_active(&rule)
            .update(self.conn())
            .await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => DomainError::not_found("RecurringDeposit", id),
                other => db_err(other),
            })?;
        rule_to_domain(model)
    }

    async fn delete(&self, id: RecurringDepositId) -> DomainResult<bool> {
        let result = recurring_deposits::Entity::delete_by_id(id.into_inner())
            .exec(self.conn())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn active_for_day(&self, day: u8) -> DomainResult<Vec<RecurringDeposit>> {
        recurring_deposits::Entity::find()
            .filter(recurring_deposits::Column::IsActive.eq(true))
            .filter(recurring_deposits::Column::DayOfMonth.eq(i16::from(day)))
            .order_by_asc(recurring_deposits::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(rule_to_domain)
            .collect()
    }
}

#[async_trait]
impl<C> RecurringDepositExecutionRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn insert(
        &self,
        execution: RecurringDepositExecution,
    ) -> DomainResult<RecurringDepositExecution> {
        let model = recurring_deposit_executions::ActiveModel {
            id: Set(execution.id.into_inner()),
            recurring_deposit_id: Set(execution.recurring_deposit_id.into_inner()),
            transaction_id: Set(execution.transaction_id.map(TransactionId::into_inner)),
            status: Set(execution.status.as_str().to_string()),
            amount: Set(execution.amount),
            day_of_month: Set(i16::from(execution.day_of_month)),
            error_message: Set(execution.error_message.clone()),
            executed_at: Set(execution.executed_at.into()),
            created_at: Set(execution.created_at.into()),
        }
        .insert(self.conn())
        .await
        .map_err(db_err)?;
        execution_to_domain(model)
    }

    async fn has_success_in_month(
        &self,
        rule_id: RecurringDepositId,
        year: i32,
        month: u32,
    ) -> DomainResult<bool> {
        let start = Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| DomainError::Storage(format!("invalid month: {year}-{month}")))?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let end = Utc
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| DomainError::Storage(format!("invalid month: {next_year}-{next_month}")))?;

        let count = recurring_deposit_executions::Entity::find()
            .filter(
                recurring_deposit_executions::Column::RecurringDepositId.eq(rule_id.into_inner()),
            )
            .filter(
                recurring_deposit_executions::Column::Status.eq(ExecutionStatus::Success.as_str()),
            )
            .filter(recurring_deposit_executions::Column::ExecutedAt.gte(start))
            .filter(recurring_deposit_executions::Column::ExecutedAt.lt(end))
            .count(self.conn())
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn list_for_rule(
        &self,
        rule_id: RecurringDepositId,
    ) -> DomainResult<Vec<RecurringDepositExecution>> {
        recurring_deposit_executions::Entity::find()
            .filter(
                recurring_deposit_executions::Column::RecurringDepositId.eq(rule_id.into_inner()),
            )
            .order_by_desc(recurring_deposit_executions::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(execution_to_domain)
            .collect()
    }
}
