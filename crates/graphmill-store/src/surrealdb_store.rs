//! SurrealDB implementation of the record store
//!
//! Provides connection management and CRUD operations for the normalized
//! schema in SurrealDB. Record ids are UUIDs minted here at creation time
//! and used as SurrealDB record ids.

use async_trait::async_trait;
use graphmill_core::{
    AttributeRecord, EntityRecord, GraphmillError, RelationshipRecord, RelationshipTypeRecord,
    Result, StoreConfig, TextUnit,
};
use serde::{Deserialize, Serialize};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use uuid::Uuid;

use crate::RecordStore;

/// SurrealDB record store implementation
pub struct SurrealStore {
    client: Surreal<Client>,
}

impl SurrealStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        // Remove ws:// or wss:// prefix if present (surrealdb crate adds it
        // automatically)
        let url = config
            .surrealdb_url
            .strip_prefix("ws://")
            .or_else(|| config.surrealdb_url.strip_prefix("wss://"))
            .unwrap_or(&config.surrealdb_url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| GraphmillError::Store(format!("SurrealDB connection failed: {e}")))?;

        client
            .signin(Root {
                username: &config.surrealdb_user,
                password: &config.surrealdb_pass,
            })
            .await
            .map_err(|e| GraphmillError::Store(format!("SurrealDB auth failed: {e}")))?;

        client
            .use_ns(&config.surrealdb_namespace)
            .use_db(&config.surrealdb_database)
            .await
            .map_err(|e| GraphmillError::Store(format!("SurrealDB namespace error: {e}")))?;

        Ok(Self { client })
    }

    /// Initialize schema (run once on setup)
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE entity SCHEMAFULL;
                DEFINE FIELD name ON entity TYPE string;
                DEFINE FIELD entity_type ON entity TYPE string;
                DEFINE INDEX idx_entity_name ON entity FIELDS name;

                DEFINE TABLE relationship_type SCHEMAFULL;
                DEFINE FIELD name ON relationship_type TYPE string;
                DEFINE INDEX idx_relationship_type_name ON relationship_type FIELDS name;

                DEFINE TABLE relationship SCHEMAFULL;
                DEFINE FIELD source_id ON relationship TYPE string;
                DEFINE FIELD target_id ON relationship TYPE string;
                DEFINE FIELD type_id ON relationship TYPE string;

                DEFINE TABLE attribute SCHEMAFULL;
                DEFINE FIELD name ON attribute TYPE string;
                DEFINE FIELD value ON attribute TYPE string;
                DEFINE FIELD entity_id ON attribute TYPE string;

                DEFINE TABLE text_unit SCHEMAFULL;
                DEFINE FIELD body ON text_unit TYPE string;
            "#,
            )
            .await
            .map_err(|e| GraphmillError::Store(format!("Schema init failed: {e}")))?;

        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntityRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    name: String,
    entity_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RelationshipTypeRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RelationshipRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    source_id: String,
    target_id: String,
    type_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AttributeRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    name: String,
    value: String,
    entity_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TextRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    body: String,
}

fn row_id(thing: &Option<surrealdb::sql::Thing>) -> Uuid {
    thing
        .as_ref()
        .and_then(|t| Uuid::parse_str(&t.id.to_raw()).ok())
        .unwrap_or_default()
}

fn parse_uuid(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_default()
}

impl From<EntityRow> for EntityRecord {
    fn from(row: EntityRow) -> Self {
        Self {
            id: row_id(&row.id),
            name: row.name,
            entity_type: row.entity_type,
        }
    }
}

impl From<RelationshipTypeRow> for RelationshipTypeRecord {
    fn from(row: RelationshipTypeRow) -> Self {
        Self {
            id: row_id(&row.id),
            name: row.name,
        }
    }
}

impl From<RelationshipRow> for RelationshipRecord {
    fn from(row: RelationshipRow) -> Self {
        Self {
            id: row_id(&row.id),
            source_id: parse_uuid(&row.source_id),
            target_id: parse_uuid(&row.target_id),
            type_id: parse_uuid(&row.type_id),
        }
    }
}

impl From<AttributeRow> for AttributeRecord {
    fn from(row: AttributeRow) -> Self {
        Self {
            id: row_id(&row.id),
            name: row.name,
            value: row.value,
            entity_id: parse_uuid(&row.entity_id),
        }
    }
}

impl From<TextRow> for TextUnit {
    fn from(row: TextRow) -> Self {
        Self {
            id: row_id(&row.id),
            body: row.body,
        }
    }
}

// ============================================================================
// RecordStore implementation
// ============================================================================

#[async_trait]
impl RecordStore for SurrealStore {
    async fn create_entity(&self, name: &str, entity_type: &str) -> Result<EntityRecord> {
        let id = Uuid::new_v4();
        let row = EntityRow {
            id: None,
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        };

        let _: Option<EntityRow> = self
            .client
            .create(("entity", id.to_string()))
            .content(row)
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to create entity: {e}")))?;

        Ok(EntityRecord {
            id,
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        })
    }

    async fn find_entities(
        &self,
        name: Option<&str>,
        entity_type: Option<&str>,
    ) -> Result<Vec<EntityRecord>> {
        let mut conditions = Vec::new();
        if name.is_some() {
            conditions.push("string::lowercase(name) = string::lowercase($name)");
        }
        if entity_type.is_some() {
            conditions.push("string::lowercase(entity_type) = string::lowercase($entity_type)");
        }

        let sql = if conditions.is_empty() {
            "SELECT * FROM entity".to_string()
        } else {
            format!("SELECT * FROM entity WHERE {}", conditions.join(" AND "))
        };

        let mut query = self.client.query(sql);
        if let Some(name) = name {
            query = query.bind(("name", name.to_string()));
        }
        if let Some(entity_type) = entity_type {
            query = query.bind(("entity_type", entity_type.to_string()));
        }

        let rows: Vec<EntityRow> = query
            .await
            .map_err(|e| GraphmillError::Store(format!("Entity query failed: {e}")))?
            .take(0)
            .map_err(|e| GraphmillError::Store(format!("Result extraction failed: {e}")))?;

        Ok(rows.into_iter().map(EntityRecord::from).collect())
    }

    async fn get_entity(&self, id: Uuid) -> Result<Option<EntityRecord>> {
        let row: Option<EntityRow> = self
            .client
            .select(("entity", id.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to get entity: {e}")))?;

        Ok(row.map(EntityRecord::from))
    }

    async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        let rows: Vec<EntityRow> = self
            .client
            .select("entity")
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to list entities: {e}")))?;

        Ok(rows.into_iter().map(EntityRecord::from).collect())
    }

    async fn create_relationship_type(&self, name: &str) -> Result<RelationshipTypeRecord> {
        let id = Uuid::new_v4();
        let row = RelationshipTypeRow {
            id: None,
            name: name.to_string(),
        };

        let _: Option<RelationshipTypeRow> = self
            .client
            .create(("relationship_type", id.to_string()))
            .content(row)
            .await
            .map_err(|e| {
                GraphmillError::Store(format!("Failed to create relationship type: {e}"))
            })?;

        Ok(RelationshipTypeRecord {
            id,
            name: name.to_string(),
        })
    }

    async fn find_relationship_type(&self, name: &str) -> Result<Option<RelationshipTypeRecord>> {
        let rows: Vec<RelationshipTypeRow> = self
            .client
            .query(
                "SELECT * FROM relationship_type \
                 WHERE string::lowercase(name) = string::lowercase($name)",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Relationship type query failed: {e}")))?
            .take(0)
            .map_err(|e| GraphmillError::Store(format!("Result extraction failed: {e}")))?;

        Ok(rows.into_iter().next().map(RelationshipTypeRecord::from))
    }

    async fn get_relationship_type(&self, id: Uuid) -> Result<Option<RelationshipTypeRecord>> {
        let row: Option<RelationshipTypeRow> = self
            .client
            .select(("relationship_type", id.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to get relationship type: {e}")))?;

        Ok(row.map(RelationshipTypeRecord::from))
    }

    async fn create_relationship(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        type_id: Uuid,
    ) -> Result<RelationshipRecord> {
        let id = Uuid::new_v4();
        let row = RelationshipRow {
            id: None,
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            type_id: type_id.to_string(),
        };

        let _: Option<RelationshipRow> = self
            .client
            .create(("relationship", id.to_string()))
            .content(row)
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to create relationship: {e}")))?;

        Ok(RelationshipRecord {
            id,
            source_id,
            target_id,
            type_id,
        })
    }

    async fn find_relationships(
        &self,
        source_id: Option<Uuid>,
        target_id: Option<Uuid>,
        type_id: Option<Uuid>,
    ) -> Result<Vec<RelationshipRecord>> {
        let mut conditions = Vec::new();
        if source_id.is_some() {
            conditions.push("source_id = $source_id");
        }
        if target_id.is_some() {
            conditions.push("target_id = $target_id");
        }
        if type_id.is_some() {
            conditions.push("type_id = $type_id");
        }

        let sql = if conditions.is_empty() {
            "SELECT * FROM relationship".to_string()
        } else {
            format!(
                "SELECT * FROM relationship WHERE {}",
                conditions.join(" AND ")
            )
        };

        let mut query = self.client.query(sql);
        if let Some(id) = source_id {
            query = query.bind(("source_id", id.to_string()));
        }
        if let Some(id) = target_id {
            query = query.bind(("target_id", id.to_string()));
        }
        if let Some(id) = type_id {
            query = query.bind(("type_id", id.to_string()));
        }

        let rows: Vec<RelationshipRow> = query
            .await
            .map_err(|e| GraphmillError::Store(format!("Relationship query failed: {e}")))?
            .take(0)
            .map_err(|e| GraphmillError::Store(format!("Result extraction failed: {e}")))?;

        Ok(rows.into_iter().map(RelationshipRecord::from).collect())
    }

    async fn list_relationships(&self) -> Result<Vec<RelationshipRecord>> {
        let rows: Vec<RelationshipRow> = self
            .client
            .select("relationship")
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to list relationships: {e}")))?;

        Ok(rows.into_iter().map(RelationshipRecord::from).collect())
    }

    async fn create_attribute(
        &self,
        name: &str,
        value: &str,
        entity_id: Uuid,
    ) -> Result<AttributeRecord> {
        let id = Uuid::new_v4();
        let row = AttributeRow {
            id: None,
            name: name.to_string(),
            value: value.to_string(),
            entity_id: entity_id.to_string(),
        };

        let _: Option<AttributeRow> = self
            .client
            .create(("attribute", id.to_string()))
            .content(row)
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to create attribute: {e}")))?;

        Ok(AttributeRecord {
            id,
            name: name.to_string(),
            value: value.to_string(),
            entity_id,
        })
    }

    async fn find_attributes(&self, entity_id: Uuid) -> Result<Vec<AttributeRecord>> {
        let rows: Vec<AttributeRow> = self
            .client
            .query("SELECT * FROM attribute WHERE entity_id = $entity_id")
            .bind(("entity_id", entity_id.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Attribute query failed: {e}")))?
            .take(0)
            .map_err(|e| GraphmillError::Store(format!("Result extraction failed: {e}")))?;

        Ok(rows.into_iter().map(AttributeRecord::from).collect())
    }

    async fn add_text(&self, body: &str) -> Result<TextUnit> {
        let id = Uuid::new_v4();
        let row = TextRow {
            id: None,
            body: body.to_string(),
        };

        let _: Option<TextRow> = self
            .client
            .create(("text_unit", id.to_string()))
            .content(row)
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to add text: {e}")))?;

        Ok(TextUnit {
            id,
            body: body.to_string(),
        })
    }

    async fn find_text(&self, body: &str) -> Result<Option<TextUnit>> {
        let rows: Vec<TextRow> = self
            .client
            .query("SELECT * FROM text_unit WHERE body = $body")
            .bind(("body", body.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Text query failed: {e}")))?
            .take(0)
            .map_err(|e| GraphmillError::Store(format!("Result extraction failed: {e}")))?;

        Ok(rows.into_iter().next().map(TextUnit::from))
    }

    async fn list_text(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<TextUnit>> {
        let mut sql = "SELECT * FROM text_unit".to_string();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" START {offset}"));
        }

        let rows: Vec<TextRow> = self
            .client
            .query(sql)
            .await
            .map_err(|e| GraphmillError::Store(format!("Text list failed: {e}")))?
            .take(0)
            .map_err(|e| GraphmillError::Store(format!("Result extraction failed: {e}")))?;

        Ok(rows.into_iter().map(TextUnit::from).collect())
    }

    async fn delete_text(&self, id: Uuid) -> Result<()> {
        let _: Option<TextRow> = self
            .client
            .delete(("text_unit", id.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to delete text: {e}")))?;

        Ok(())
    }

    async fn delete_text_by_body(&self, body: &str) -> Result<()> {
        self.client
            .query("DELETE text_unit WHERE body = $body")
            .bind(("body", body.to_string()))
            .await
            .map_err(|e| GraphmillError::Store(format!("Failed to delete text: {e}")))?;

        Ok(())
    }
}
