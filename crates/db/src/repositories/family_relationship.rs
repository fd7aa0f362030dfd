//! Family relationship repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use kidbank_core::domain::{FamilyRelationship, RelationshipType};
use kidbank_core::storage::FamilyRelationshipRepository;
use kidbank_shared::types::{ProfileId, RelationshipId};
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::family_relationships;
use crate::repositories::{db_err, SeaOrmStore};

fn to_domain(model: family_relationships::Model) -> DomainResult<FamilyRelationship> {
    let relationship_type = RelationshipType::parse(&model.relationship_type).ok_or_else(|| {
        DomainError::Storage(format!(
            "invalid relationship type in relationship {}: {}",
            model.id, model.relationship_type
        ))
    })?;
    Ok(FamilyRelationship {
        id: RelationshipId::from_uuid(model.id),
        parent_id: ProfileId::from_uuid(model.parent_id),
        child_id: ProfileId::from_uuid(model.child_id),
        relationship_type,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl<C> FamilyRelationshipRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find_pair(
        &self,
        parent_id: ProfileId,
        child_id: ProfileId,
    ) -> DomainResult<Option<FamilyRelationship>> {
        family_relationships::Entity::find()
            .filter(family_relationships::Column::ParentId.eq(parent_id.into_inner()))
            .filter(family_relationships::Column::ChildId.eq(child_id.into_inner()))
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(to_domain)
            .transpose()
    }

    async fn insert(&self, relationship: FamilyRelationship) -> DomainResult<FamilyRelationship> {
        let model = family_relationships::ActiveModel {
            id: Set(relationship.id.into_inner()),
            parent_id: Set(relationship.parent_id.into_inner()),
            child_id: Set(relationship.child_id.into_inner()),
            relationship_type: Set(relationship.relationship_type.as_str().to_string()),
            created_at: Set(relationship.created_at.into()),
        }
        .insert(self.conn())
        .await
        .map_err(db_err)?;
        to_domain(model)
    }

    async fn delete_pair(&self, parent_id: ProfileId, child_id: ProfileId) -> DomainResult<bool> {
        let result = family_relationships::Entity::delete_many()
            .filter(family_relationships::Column::ParentId.eq(parent_id.into_inner()))
            .filter(family_relationships::Column::ChildId.eq(child_id.into_inner()))
            .exec(self.conn())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn parents_of(&self, child_id: ProfileId) -> DomainResult<Vec<FamilyRelationship>> {
        family_relationships::Entity::find()
            .filter(family_relationships::Column::ChildId.eq(child_id.into_inner()))
            .order_by_asc(family_relationships::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn children_of(&self, parent_id: ProfileId) -> DomainResult<Vec<FamilyRelationship>> {
        family_relationships::Entity::find()
            .filter(family_relationships::Column::ParentId.eq(parent_id.into_inner()))
            .order_by_asc(family_relationships::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_domain)
            .collect()
    }
}
