//! Profile repository, including the atomic identity migration.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use kidbank_core::domain::{Profile, Role};
use kidbank_core::storage::ProfileRepository;
use kidbank_shared::types::ProfileId;
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::{accounts, family_relationships, profiles};
use crate::repositories::{db_err, SeaOrmStore};

fn to_domain(model: profiles::Model) -> DomainResult<Profile> {
    let role = Role::parse(&model.role).ok_or_else(|| {
        DomainError::Storage(format!("invalid role in profile {}: {}", model.id, model.role))
    })?;
    Ok(Profile {
        id: ProfileId::from_uuid(model.id),
        auth_user_id: model.auth_user_id,
        email: model.email,
        name: model.name,
        role,
        avatar_url: model.avatar_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn to_active(profile: &Profile) -> profiles::ActiveModel {
    profiles::ActiveModel {
        id: Set(profile.id.into_inner()),
        auth_user_id: Set(profile.auth_user_id.clone()),
        email: Set(profile.email.clone()),
        name: Set(profile.name.clone()),
        role: Set(profile.role.as_str().to_string()),
        avatar_url: Set(profile.avatar_url.clone()),
        created_at: Set(profile.created_at.into()),
        updated_at: Set(profile.updated_at.into()),
    }
}

#[async_trait]
impl<C> ProfileRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find(&self, id: ProfileId) -> DomainResult<Option<Profile>> {
        profiles::Entity::find_by_id(id.into_inner())
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_auth_user_id(&self, auth_user_id: &str) -> DomainResult<Option<Profile>> {
        profiles::Entity::find()
            .filter(profiles::Column::AuthUserId.eq(auth_user_id))
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(to_domain)
            .transpose()
    }

    async fn find_unlinked_by_email(&self, email: &str) -> DomainResult<Option<Profile>> {
        profiles::Entity::find()
            .filter(profiles::Column::AuthUserId.is_null())
            .filter(profiles::Column::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(to_domain)
            .transpose()
    }

    async fn insert(&self, profile: Profile) -> DomainResult<Profile> {
        let model = to_active(&profile)
            .insert(self.conn())
            .await
            .map_err(db_err)?;
        to_domain(model)
    }

    async fn update(&self, profile: Profile) -> DomainResult<Profile> {
        let id = profile.id;
        let model = to_active(&profile)
            .update(self.conn())
            .await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => DomainError::not_found("Profile", id),
                other => db_err(other),
            })?;
        to_domain(model)
    }

    async fn delete(&self, id: ProfileId) -> DomainResult<bool> {
        let result = profiles::Entity::delete_by_id(id.into_inner())
            .exec(self.conn())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn migrate_identity(&self, old: ProfileId, new: ProfileId) -> DomainResult<Profile> {
        let txn = self.conn().begin().await.map_err(db_err)?;

        let old_model = profiles::Entity::find_by_id(old.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Profile", old))?;
        let new_model = profiles::Entity::find_by_id(new.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Profile", new))?;

        accounts::Entity::update_many()
            .col_expr(accounts::Column::OwnerId, Expr::value(new.into_inner()))
            .filter(accounts::Column::OwnerId.eq(old.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        // Repoint relationship rows; a row that would duplicate an existing
        // (parent, new) pair is dropped instead.
        let existing_parents: Vec<sea_orm::prelude::Uuid> = family_relationships::Entity::find()
            .filter(family_relationships::Column::ChildId.eq(new.into_inner()))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|row| row.parent_id)
            .collect();
        let edges = family_relationships::Entity::find()
            .filter(family_relationships::Column::ChildId.eq(old.into_inner()))
            .all(&txn)
            .await
            .map_err(db_err)?;
        for edge in edges {
            if existing_parents.contains(&edge.parent_id) {
                family_relationships::Entity::delete_by_id(edge.id)
                    .exec(&txn)
                    .await
                    .map_err(db_err)?;
            } else {
                let mut row: family_relationships::ActiveModel = edge.into();
                row.child_id = Set(new.into_inner());
                row.update(&txn).await.map_err(db_err)?;
            }
        }

        let mut migrated: profiles::ActiveModel = new_model.into();
        migrated.name = Set(old_model.name.clone());
        migrated.role = Set(Role::Child.as_str().to_string());
        migrated.updated_at = Set(Utc::now().into());
        let migrated = migrated.update(&txn).await.map_err(db_err)?;

        profiles::Entity::delete_by_id(old.into_inner())
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        to_domain(migrated)
    }
}
