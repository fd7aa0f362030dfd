//! Family graph operations.

use chrono::Utc;

use kidbank_shared::types::{ProfileId, RelationshipId};
use kidbank_shared::DomainResult;

use crate::domain::{FamilyRelationship, Profile, RelationshipType};
use crate::storage::{FamilyRelationshipRepository, ProfileRepository};

/// Lookup and mutation of parent-child edges.
#[derive(Clone, Copy)]
pub struct FamilyService<'a> {
    profiles: &'a dyn ProfileRepository,
    relationships: &'a dyn FamilyRelationshipRepository,
}

impl<'a> FamilyService<'a> {
    /// Creates a family service over the given repositories.
    pub fn new(
        profiles: &'a dyn ProfileRepository,
        relationships: &'a dyn FamilyRelationshipRepository,
    ) -> Self {
        Self {
            profiles,
            relationships,
        }
    }

    /// Lists the parent profiles of a child. Edges whose parent profile no
    /// longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn get_parents(&self, child_id: ProfileId) -> DomainResult<Vec<Profile>> {
        let edges = self.relationships.parents_of(child_id).await?;
        let mut parents = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(profile) = self.profiles.find(edge.parent_id).await? {
                parents.push(profile);
            }
        }
        Ok(parents)
    }

    /// Lists the child profiles of a parent, in edge creation order. Edges
    /// whose child profile no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn get_children(&self, parent_id: ProfileId) -> DomainResult<Vec<Profile>> {
        let edges = self.relationships.children_of(parent_id).await?;
        let mut children = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(profile) = self.profiles.find(edge.child_id).await? {
                children.push(profile);
            }
        }
        Ok(children)
    }

    /// Returns true if a (parent, child) edge exists.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn has_relationship(
        &self,
        parent_id: ProfileId,
        child_id: ProfileId,
    ) -> DomainResult<bool> {
        Ok(self.relationships.find_pair(parent_id, child_id).await?.is_some())
    }

    /// Adds a (parent, child) edge. Idempotent: if the pair already exists
    /// the existing row is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn add_relationship(
        &self,
        parent_id: ProfileId,
        child_id: ProfileId,
        relationship_type: RelationshipType,
    ) -> DomainResult<FamilyRelationship> {
        if let Some(existing) = self.relationships.find_pair(parent_id, child_id).await? {
            return Ok(existing);
        }
        self.relationships
            .insert(FamilyRelationship {
                id: RelationshipId::new(),
                parent_id,
                child_id,
                relationship_type,
                created_at: Utc::now(),
            })
            .await
    }

    /// Removes a (parent, child) edge. Returns whether an edge was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn remove_relationship(
        &self,
        parent_id: ProfileId,
        child_id: ProfileId,
    ) -> DomainResult<bool> {
        self.relationships.delete_pair(parent_id, child_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::testutil::{child_profile, parent_profile, seed_profile};

    #[tokio::test]
    async fn test_add_relationship_is_idempotent() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let family = FamilyService::new(&store, &store);

        let first = family
            .add_relationship(parent.id, child.id, RelationshipType::Parent)
            .await
            .unwrap();
        let second = family
            .add_relationship(parent.id, child.id, RelationshipType::Parent)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(family.get_children(parent.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_parents_and_children() {
        let store = MemoryStore::new();
        let mom = seed_profile(&store, parent_profile("Aya")).await;
        let dad = seed_profile(&store, parent_profile("Ken")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let family = FamilyService::new(&store, &store);

        family
            .add_relationship(mom.id, child.id, RelationshipType::Parent)
            .await
            .unwrap();
        family
            .add_relationship(dad.id, child.id, RelationshipType::Guardian)
            .await
            .unwrap();

        let parents = family.get_parents(child.id).await.unwrap();
        assert_eq!(parents.len(), 2);
        assert_eq!(family.get_children(mom.id).await.unwrap().len(), 1);
        assert!(family.has_relationship(dad.id, child.id).await.unwrap());
        assert!(!family.has_relationship(child.id, mom.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_relationship() {
        let store = MemoryStore::new();
        let parent = seed_profile(&store, parent_profile("Aya")).await;
        let child = seed_profile(&store, child_profile("Mio")).await;
        let family = FamilyService::new(&store, &store);

        family
            .add_relationship(parent.id, child.id, RelationshipType::Parent)
            .await
            .unwrap();
        assert!(family.remove_relationship(parent.id, child.id).await.unwrap());
        assert!(!family.remove_relationship(parent.id, child.id).await.unwrap());
        assert!(!family.has_relationship(parent.id, child.id).await.unwrap());
    }
}
