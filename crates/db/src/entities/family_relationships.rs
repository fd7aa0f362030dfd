//! `SeaORM` Entity for `family_relationships` table. One row per
//! (parent, child) pair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "family_relationships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub relationship_type: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::ParentId",
        to = "super::profiles::Column::Id"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::ChildId",
        to = "super::profiles::Column::Id"
    )]
    Child,
}

impl ActiveModelBehavior for ActiveModel {}
