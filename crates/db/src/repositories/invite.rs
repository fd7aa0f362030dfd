//! Parent and child invite repositories.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use kidbank_core::domain::{ChildInvite, InviteStatus, ParentInvite};
use kidbank_core::storage::{ChildInviteRepository, ParentInviteRepository};
use kidbank_shared::types::{InviteId, ProfileId};
use kidbank_shared::{DomainError, DomainResult};

use crate::entities::{child_invites, parent_invites};
use crate::repositories::{db_err, SeaOrmStore};

fn parse_status(raw: &str, id: sea_orm::prelude::Uuid) -> DomainResult<InviteStatus> {
    InviteStatus::parse(raw)
        .ok_or_else(|| DomainError::Storage(format!("invalid status in invite {id}: {raw}")))
}

fn parent_to_domain(model: parent_invites::Model) -> DomainResult<ParentInvite> {
    Ok(ParentInvite {
        id: InviteId::from_uuid(model.id),
        token: model.token,
        child_id: ProfileId::from_uuid(model.child_id),
        inviter_id: ProfileId::from_uuid(model.inviter_id),
        email: model.email,
        status: parse_status(&model.status, model.id)?,
        expires_at: model.expires_at.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn child_to_domain(model: child_invites::Model) -> DomainResult<ChildInvite> {
    Ok(ChildInvite {
        id: InviteId::from_uuid(model.id),
        token: model.token,
        child_id: ProfileId::from_uuid(model.child_id),
        email: model.email,
        status: parse_status(&model.status, model.id)?,
        expires_at: model.expires_at.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl<C> ParentInviteRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<ParentInvite>> {
        parent_invites::Entity::find()
            .filter(parent_invites::Column::Token.eq(token))
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(parent_to_domain)
            .transpose()
    }

    async fn insert(&self, invite: ParentInvite) -> DomainResult<ParentInvite> {
        let model = parent_invites::ActiveModel {
            id: Set(invite.id.into_inner()),
            token: Set(invite.token.clone()),
            child_id: Set(invite.child_id.into_inner()),
            inviter_id: Set(invite.inviter_id.into_inner()),
            email: Set(invite.email.clone()),
            status: Set(invite.status.as_str().to_string()),
            expires_at: Set(invite.expires_at.into()),
            created_at: Set(invite.created_at.into()),
        }
        .insert(self.conn())
        .await
        .map_err(db_err)?;
        parent_to_domain(model)
    }

    async fn update_status(
        &self,
        id: InviteId,
        status: InviteStatus,
    ) -> DomainResult<ParentInvite> {
        let row = parent_invites::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.as_str().to_string()),
            ..Default::default()
        };
        let model = row.update(self.conn()).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => DomainError::not_found("ParentInvite", id),
            other => db_err(other),
        })?;
        parent_to_domain(model)
    }
}

#[async_trait]
impl<C> ChildInviteRepository for SeaOrmStore<'_, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<ChildInvite>> {
        child_invites::Entity::find()
            .filter(child_invites::Column::Token.eq(token))
            .one(self.conn())
            .await
            .map_err(db_err)?
            .map(child_to_domain)
            .transpose()
    }

    async fn insert(&self, invite: ChildInvite) -> DomainResult<ChildInvite> {
        let model = child_invites::ActiveModel {
            id: Set(invite.id.into_inner()),
            token: Set(invite.token.clone()),
            child_id: Set(invite.child_id.into_inner()),
            email: Set(invite.email.clone()),
            status: Set(invite.status.as_str().to_string()),
            expires_at: Set(invite.expires_at.into()),
            created_at: Set(invite.created_at.into()),
        }
        .insert(self.conn())
        .await
        .map_err(db_err)?;
        child_to_domain(model)
    }

    async fn update_status(&self, id: InviteId, status: InviteStatus) -> DomainResult<ChildInvite> {
        let row = child_invites::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.as_str().to_string()),
            ..Default::default()
        };
        let model = row.update(self.conn()).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => DomainError::not_found("ChildInvite", id),
            other => db_err(other),
        })?;
        child_to_domain(model)
    }
}
