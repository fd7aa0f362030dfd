//! `SeaORM` Entity for `parent_invites` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "parent_invites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub token: String,
    pub child_id: Uuid,
    pub inviter_id: Uuid,
    pub email: String,
    pub status: String,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::InviterId",
        to = "super::profiles::Column::Id"
    )]
    Inviter,
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::ChildId",
        to = "super::profiles::Column::Id"
    )]
    Child,
}

impl ActiveModelBehavior for ActiveModel {}
