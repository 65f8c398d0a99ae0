//! Graphmill Store - Record store abstraction
//!
//! Provides the [`RecordStore`] trait over the normalized schema (entities,
//! relationship types, relationships, attributes, text units), an in-memory
//! backend, a SurrealDB backend, and the referential resolver that maps
//! validated candidates onto identity-bearing records.
//!
//! The store exclusively owns persistence and identity assignment: every
//! `create_*` method mints the record's id. "Not found" is an empty result,
//! never an error.

use async_trait::async_trait;
use graphmill_core::{
    AttributeRecord, EntityRecord, RelationshipRecord, RelationshipTypeRecord, Result, TextUnit,
};
use uuid::Uuid;

/// Trait for record store backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create an entity; the store assigns its id.
    async fn create_entity(&self, name: &str, entity_type: &str) -> Result<EntityRecord>;

    /// Find entities by whole-name (case-insensitive) and/or type.
    async fn find_entities(
        &self,
        name: Option<&str>,
        entity_type: Option<&str>,
    ) -> Result<Vec<EntityRecord>>;

    /// Get an entity by id.
    async fn get_entity(&self, id: Uuid) -> Result<Option<EntityRecord>>;

    /// List all entities.
    async fn list_entities(&self) -> Result<Vec<EntityRecord>>;

    // ------------------------------------------------------------------
    // Relationship types
    // ------------------------------------------------------------------

    /// Create a relationship type; the store assigns its id.
    async fn create_relationship_type(&self, name: &str) -> Result<RelationshipTypeRecord>;

    /// Find a relationship type by whole-name (case-insensitive).
    async fn find_relationship_type(&self, name: &str) -> Result<Option<RelationshipTypeRecord>>;

    /// Get a relationship type by id.
    async fn get_relationship_type(&self, id: Uuid) -> Result<Option<RelationshipTypeRecord>>;

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    /// Create a relationship; no dedup is performed at this layer.
    async fn create_relationship(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        type_id: Uuid,
    ) -> Result<RelationshipRecord>;

    /// Find relationships by any combination of endpoint/type ids.
    async fn find_relationships(
        &self,
        source_id: Option<Uuid>,
        target_id: Option<Uuid>,
        type_id: Option<Uuid>,
    ) -> Result<Vec<RelationshipRecord>>;

    /// List all relationships.
    async fn list_relationships(&self) -> Result<Vec<RelationshipRecord>>;

    // ------------------------------------------------------------------
    // Attributes (shared schema; the extraction pipeline never writes these)
    // ------------------------------------------------------------------

    /// Create an attribute on an entity.
    async fn create_attribute(
        &self,
        name: &str,
        value: &str,
        entity_id: Uuid,
    ) -> Result<AttributeRecord>;

    /// Find attributes for an entity.
    async fn find_attributes(&self, entity_id: Uuid) -> Result<Vec<AttributeRecord>>;

    // ------------------------------------------------------------------
    // TextUnit work queue
    // ------------------------------------------------------------------

    /// Enqueue a raw snippet.
    async fn add_text(&self, body: &str) -> Result<TextUnit>;

    /// Find a queued snippet by exact body.
    async fn find_text(&self, body: &str) -> Result<Option<TextUnit>>;

    /// List queued snippets, optionally windowed.
    async fn list_text(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<TextUnit>>;

    /// Delete a queued snippet by id. Deleting a missing id is a no-op.
    async fn delete_text(&self, id: Uuid) -> Result<()>;

    /// Delete queued snippets by exact body.
    async fn delete_text_by_body(&self, body: &str) -> Result<()>;
}

pub mod memory;
pub mod resolver;
pub mod surrealdb_store;

pub use memory::MemoryStore;
pub use resolver::Resolver;
pub use surrealdb_store::SurrealStore;
