//! In-memory record store
//!
//! Backs tests and single-process runs with no external database. All
//! collections live behind one async `RwLock`; the pipeline is a single
//! writer (lookup-or-create is not safe under concurrent writers, which is
//! a documented limitation of the resolver's discipline, not of this
//! backend).

use async_trait::async_trait;
use graphmill_core::{
    AttributeRecord, EntityRecord, RelationshipRecord, RelationshipTypeRecord, Result, TextUnit,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::RecordStore;

#[derive(Default)]
struct Collections {
    entities: Vec<EntityRecord>,
    relationship_types: Vec<RelationshipTypeRecord>,
    relationships: Vec<RelationshipRecord>,
    attributes: Vec<AttributeRecord>,
    texts: Vec<TextUnit>,
}

/// In-memory [`RecordStore`] backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_entity(&self, name: &str, entity_type: &str) -> Result<EntityRecord> {
        let record = EntityRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        };

        self.inner.write().await.entities.push(record.clone());
        Ok(record)
    }

    async fn find_entities(
        &self,
        name: Option<&str>,
        entity_type: Option<&str>,
    ) -> Result<Vec<EntityRecord>> {
        let inner = self.inner.read().await;

        Ok(inner
            .entities
            .iter()
            .filter(|e| name.is_none_or(|n| e.name.eq_ignore_ascii_case(n)))
            .filter(|e| entity_type.is_none_or(|t| e.entity_type.eq_ignore_ascii_case(t)))
            .cloned()
            .collect())
    }

    async fn get_entity(&self, id: Uuid) -> Result<Option<EntityRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.entities.iter().find(|e| e.id == id).cloned())
    }

    async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        Ok(self.inner.read().await.entities.clone())
    }

    async fn create_relationship_type(&self, name: &str) -> Result<RelationshipTypeRecord> {
        let record = RelationshipTypeRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };

        self.inner
            .write()
            .await
            .relationship_types
            .push(record.clone());
        Ok(record)
    }

    async fn find_relationship_type(&self, name: &str) -> Result<Option<RelationshipTypeRecord>> {
        let inner = self.inner.read().await;

        Ok(inner
            .relationship_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_relationship_type(&self, id: Uuid) -> Result<Option<RelationshipTypeRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.relationship_types.iter().find(|t| t.id == id).cloned())
    }

    async fn create_relationship(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        type_id: Uuid,
    ) -> Result<RelationshipRecord> {
        let record = RelationshipRecord {
            id: Uuid::new_v4(),
            source_id,
            target_id,
            type_id,
        };

        self.inner.write().await.relationships.push(record.clone());
        Ok(record)
    }

    async fn find_relationships(
        &self,
        source_id: Option<Uuid>,
        target_id: Option<Uuid>,
        type_id: Option<Uuid>,
    ) -> Result<Vec<RelationshipRecord>> {
        let inner = self.inner.read().await;

        Ok(inner
            .relationships
            .iter()
            .filter(|r| source_id.is_none_or(|id| r.source_id == id))
            .filter(|r| target_id.is_none_or(|id| r.target_id == id))
            .filter(|r| type_id.is_none_or(|id| r.type_id == id))
            .cloned()
            .collect())
    }

    async fn list_relationships(&self) -> Result<Vec<RelationshipRecord>> {
        Ok(self.inner.read().await.relationships.clone())
    }

    async fn create_attribute(
        &self,
        name: &str,
        value: &str,
        entity_id: Uuid,
    ) -> Result<AttributeRecord> {
        let record = AttributeRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            value: value.to_string(),
            entity_id,
        };

        self.inner.write().await.attributes.push(record.clone());
        Ok(record)
    }

    async fn find_attributes(&self, entity_id: Uuid) -> Result<Vec<AttributeRecord>> {
        let inner = self.inner.read().await;

        Ok(inner
            .attributes
            .iter()
            .filter(|a| a.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn add_text(&self, body: &str) -> Result<TextUnit> {
        let unit = TextUnit {
            id: Uuid::new_v4(),
            body: body.to_string(),
        };

        self.inner.write().await.texts.push(unit.clone());
        Ok(unit)
    }

    async fn find_text(&self, body: &str) -> Result<Option<TextUnit>> {
        let inner = self.inner.read().await;
        Ok(inner.texts.iter().find(|t| t.body == body).cloned())
    }

    async fn list_text(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<TextUnit>> {
        let inner = self.inner.read().await;

        Ok(inner
            .texts
            .iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn delete_text(&self, id: Uuid) -> Result<()> {
        self.inner.write().await.texts.retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_text_by_body(&self, body: &str) -> Result<()> {
        self.inner.write().await.texts.retain(|t| t.body != body);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
