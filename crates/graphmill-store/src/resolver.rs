//! Referential resolver
//!
//! Maps validated candidates onto persisted, identity-bearing records,
//! idempotently. The uniqueness policy is lookup-before-create keyed on the
//! case-folded name (not a storage-level constraint), so all resolver
//! calls must come from a single writer.

use std::sync::Arc;

use graphmill_core::{
    normalize, EntityCandidate, EntityRecord, GraphmillError, RelationshipCandidate,
    RelationshipRecord, RelationshipTypeRecord, Result,
};

use crate::RecordStore;

/// Resolves candidates against a record store.
pub struct Resolver {
    store: Arc<dyn RecordStore>,
}

impl Resolver {
    /// Create a resolver over a store handle.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Look up an entity by case-insensitive name, creating it if absent.
    ///
    /// On a hit the stored record is returned unchanged: the type is not
    /// updated, so the first write wins for an entity's type.
    pub async fn resolve_entity(&self, name: &str, entity_type: &str) -> Result<EntityRecord> {
        let name = normalize(name);

        if let Some(existing) = self
            .store
            .find_entities(Some(&name), None)
            .await?
            .into_iter()
            .next()
        {
            return Ok(existing);
        }

        tracing::debug!(%name, "creating entity");
        self.store.create_entity(&name, &normalize(entity_type)).await
    }

    /// Look up a relationship type by case-insensitive name, creating it if
    /// absent.
    pub async fn resolve_relationship_type(&self, name: &str) -> Result<RelationshipTypeRecord> {
        let name = normalize(name);

        if let Some(existing) = self.store.find_relationship_type(&name).await? {
            return Ok(existing);
        }

        tracing::debug!(%name, "creating relationship type");
        self.store.create_relationship_type(&name).await
    }

    /// Record a relationship between two already-resolved entity names.
    ///
    /// Both names must resolve: the validator only passes through
    /// relationships whose endpoints are in the batch's known-entity set,
    /// so a miss here is a contract violation, not model noise. The
    /// relationship record itself is created unconditionally: recording
    /// the same logical relationship across two batches creates two
    /// records.
    pub async fn record_relationship(
        &self,
        source_name: &str,
        target_name: &str,
        type_name: &str,
    ) -> Result<RelationshipRecord> {
        let source = self.lookup_entity(source_name).await?;
        let target = self.lookup_entity(target_name).await?;
        let relationship_type = self.resolve_relationship_type(type_name).await?;

        self.store
            .create_relationship(source.id, target.id, relationship_type.id)
            .await
    }

    /// Resolve a batch of entity candidates, in order.
    pub async fn resolve_entities(
        &self,
        candidates: &[EntityCandidate],
    ) -> Result<Vec<EntityRecord>> {
        let mut records = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            records.push(
                self.resolve_entity(&candidate.name, &candidate.entity_type)
                    .await?,
            );
        }
        Ok(records)
    }

    /// Record a batch of relationship candidates, in order.
    pub async fn record_relationships(
        &self,
        candidates: &[RelationshipCandidate],
    ) -> Result<Vec<RelationshipRecord>> {
        let mut records = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            records.push(
                self.record_relationship(&candidate.source, &candidate.target, &candidate.relation)
                    .await?,
            );
        }
        Ok(records)
    }

    async fn lookup_entity(&self, name: &str) -> Result<EntityRecord> {
        let name = normalize(name);

        self.store
            .find_entities(Some(&name), None)
            .await?
            .into_iter()
            .next()
            .ok_or(GraphmillError::UnknownEntity(name))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn resolver() -> Resolver {
        Resolver::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_idempotent_entity_resolution() {
        let resolver = resolver();

        let first = resolver.resolve_entity("python", "concept").await.unwrap();
        let second = resolver.resolve_entity("python", "concept").await.unwrap();

        assert_eq!(first.id, second.id);

        let all = resolver.store.list_entities().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_is_case_insensitive() {
        let resolver = resolver();

        let first = resolver.resolve_entity("Python", "concept").await.unwrap();
        let second = resolver.resolve_entity("PYTHON", "concept").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "python");
    }

    #[tokio::test]
    async fn test_first_write_wins_for_type() {
        let resolver = resolver();

        resolver.resolve_entity("python", "concept").await.unwrap();
        let again = resolver.resolve_entity("python", "language").await.unwrap();

        assert_eq!(again.entity_type, "concept");
    }

    #[tokio::test]
    async fn test_idempotent_relationship_type_resolution() {
        let resolver = resolver();

        let first = resolver.resolve_relationship_type("created").await.unwrap();
        let second = resolver.resolve_relationship_type("Created").await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_record_relationship() {
        let resolver = resolver();

        let guido = resolver.resolve_entity("guido", "person").await.unwrap();
        let python = resolver.resolve_entity("python", "concept").await.unwrap();

        let record = resolver
            .record_relationship("guido", "python", "created")
            .await
            .unwrap();

        assert_eq!(record.source_id, guido.id);
        assert_eq!(record.target_id, python.id);
    }

    #[tokio::test]
    async fn test_unknown_entity_is_contract_violation() {
        let resolver = resolver();
        resolver.resolve_entity("python", "concept").await.unwrap();

        let err = resolver
            .record_relationship("python", "rust", "influences")
            .await
            .unwrap_err();

        assert!(matches!(err, GraphmillError::UnknownEntity(name) if name == "rust"));
    }

    #[tokio::test]
    async fn test_cross_batch_relationships_duplicate() {
        // Recording the same logical relationship in two batches creates
        // two records; batch-level dedup is the validator's job.
        let resolver = resolver();
        resolver.resolve_entity("guido", "person").await.unwrap();
        resolver.resolve_entity("python", "concept").await.unwrap();

        let first = resolver
            .record_relationship("guido", "python", "created")
            .await
            .unwrap();
        let second = resolver
            .record_relationship("guido", "python", "created")
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(resolver.store.list_relationships().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_batch_preserves_order() {
        let resolver = resolver();

        let candidates = vec![
            EntityCandidate::new("python", "concept"),
            EntityCandidate::new("guido van rossum", "person"),
        ];
        let records = resolver.resolve_entities(&candidates).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "python");
        assert_eq!(records[1].name, "guido van rossum");
    }
}
