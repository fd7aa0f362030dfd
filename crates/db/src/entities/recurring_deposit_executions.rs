//! `SeaORM` Entity for `recurring_deposit_executions` table. Append-only
//! audit trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_deposit_executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recurring_deposit_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub status: String,
    pub amount: i64,
    pub day_of_month: i16,
    pub error_message: Option<String>,
    pub executed_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recurring_deposits::Entity",
        from = "Column::RecurringDepositId",
        to = "super::recurring_deposits::Column::Id"
    )]
    RecurringDeposits,
}

impl Related<super::recurring_deposits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringDeposits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
