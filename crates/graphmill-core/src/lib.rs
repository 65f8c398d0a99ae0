//! Graphmill Core - Domain records, candidate types, and shared traits
//!
//! This crate defines the core abstractions used throughout Graphmill:
//! - Normalized records (entities, relationship types, relationships,
//!   attributes, text units)
//! - Transient extraction candidates produced by the pipeline
//! - Common error types
//! - Collaborator traits (model client, content fetcher)
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, ModelConfig, ModelProvider,
    StoreConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Graphmill operations
#[derive(Error, Debug)]
pub enum GraphmillError {
    #[error("model error: {0}")]
    Model(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("unknown entity reference: {0}")]
    UnknownEntity(String),

    #[error("referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GraphmillError>;

// ============================================================================
// Normalized Records
// ============================================================================

/// An entity in the normalized store.
///
/// Names are stored case-folded; no two entities share the same name. The
/// identifier is opaque and assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Case-folded entity name
    pub name: String,

    /// Free-form type label (e.g. "person", "concept")
    pub entity_type: String,
}

/// A named relationship type, shared by all relationships of that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTypeRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Case-folded type name (e.g. "created", "depends_on")
    pub name: String,
}

/// A directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Source entity id (the active doer)
    pub source_id: Uuid,

    /// Target entity id (the receiver)
    pub target_id: Uuid,

    /// Relationship type id
    pub type_id: Uuid,
}

/// Free-form property attached to an entity.
///
/// Part of the shared schema; the extraction pipeline itself never writes
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Attribute name
    pub name: String,

    /// Attribute value
    pub value: String,

    /// Owning entity id
    pub entity_id: Uuid,
}

/// A raw scraped snippet queued for extraction.
///
/// TextUnits form a work queue: created on fetch, read in batches by the
/// pipeline, and deleted once their entities have been extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Unique identifier
    pub id: Uuid,

    /// Raw snippet body
    pub body: String,
}

// ============================================================================
// Extraction Candidates
// ============================================================================

/// One tuple recovered from raw model output.
///
/// The parser makes no promise about arity or field content; the validator
/// matches on the field slice and drops anything that is not the expected
/// shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTuple {
    pub fields: Vec<String>,
}

impl RawTuple {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl<const N: usize> From<[&str; N]> for RawTuple {
    fn from(fields: [&str; N]) -> Self {
        Self::new(fields.iter().map(|s| s.to_string()).collect())
    }
}

/// A validated entity candidate, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// Trimmed, lower-cased name
    pub name: String,

    /// Trimmed, lower-cased type label
    pub entity_type: String,
}

impl EntityCandidate {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// A validated relationship candidate, not yet persisted.
///
/// Both endpoint names are guaranteed by the validator to be in the
/// known-entity set of the batch that produced this candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCandidate {
    /// Source entity name (lower-cased)
    pub source: String,

    /// Target entity name (lower-cased)
    pub target: String,

    /// Relationship type name (lower-cased)
    pub relation: String,
}

impl RelationshipCandidate {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }

    /// Batch-level dedup key: `source|relation|target`.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}|{}", self.source, self.relation, self.target)
    }
}

/// Trim and case-fold a candidate field.
///
/// The one normalization applied everywhere names are compared: by the
/// validator before dedup and by the resolver before lookup.
pub fn normalize(field: &str) -> String {
    field.trim().to_lowercase()
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Trait for generative model transports.
///
/// A single blocking round trip; the response is opaque text with no
/// structural guarantee. Retries and latency policy belong to the
/// implementation, never to the pipeline.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a prompt and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Trait for content fetchers.
///
/// Given a source locator and a search term, produce a finite sequence of
/// raw text snippets. Browser automation lives behind this trait, outside
/// the pipeline.
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch snippets that mention the search term.
    async fn fetch(&self, source: &str, search: &str) -> Result<Vec<String>>;
}

// ============================================================================
// Tests
// ============================================================================
