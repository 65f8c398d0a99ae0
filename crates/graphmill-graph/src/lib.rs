//! Graphmill Graph - Renderable graph assembly
//!
//! Reads the normalized store back into an in-memory node/edge graph for
//! the external visualizer: one node per entity keyed by name, one edge per
//! relationship carrying the resolved type name. Assembly is the only part
//! of the pipeline with a fatal failure mode: a relationship whose
//! endpoint or type no longer resolves aborts the build, since a partial
//! graph is worse than a failed render.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use graphmill_core::{
    EntityRecord, GraphmillError, RelationshipRecord, RelationshipTypeRecord, Result,
};
use graphmill_store::RecordStore;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use uuid::Uuid;

// ============================================================================
// Graph representation
// ============================================================================

/// Node payload: the entity's name and type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub name: String,
    pub entity_type: String,
}

/// Edge payload: the relationship type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeData {
    pub relationship_type: String,
}

/// The assembled knowledge graph.
///
/// Nodes are unique per entity name. At most one edge exists per ordered
/// node pair: repeated relationships between the same pair collapse, with
/// the last-written type label winning. That collapse is a property of this
/// representation, not a pipeline decision.
#[derive(Debug)]
pub struct KnowledgeGraph {
    graph: DiGraph<NodeData, EdgeData>,
    nodes_by_name: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes_by_name: HashMap::new(),
        }
    }

    /// Build a graph from records, without touching a store.
    ///
    /// `types` must cover every `type_id` referenced by `relationships`;
    /// a relationship referencing an entity or type that is not present
    /// fails the whole build with
    /// [`GraphmillError::ReferentialIntegrity`].
    pub fn from_records(
        entities: &[EntityRecord],
        relationships: &[RelationshipRecord],
        types: &[RelationshipTypeRecord],
    ) -> Result<Self> {
        let mut graph = Self::new();

        let entities_by_id: HashMap<Uuid, &EntityRecord> =
            entities.iter().map(|e| (e.id, e)).collect();
        let type_names: HashMap<Uuid, &str> =
            types.iter().map(|t| (t.id, t.name.as_str())).collect();

        for entity in entities {
            graph.add_node(&entity.name, &entity.entity_type);
        }

        for relationship in relationships {
            let source = entities_by_id.get(&relationship.source_id).ok_or_else(|| {
                GraphmillError::ReferentialIntegrity(format!(
                    "relationship {} references missing source entity {}",
                    relationship.id, relationship.source_id
                ))
            })?;
            let target = entities_by_id.get(&relationship.target_id).ok_or_else(|| {
                GraphmillError::ReferentialIntegrity(format!(
                    "relationship {} references missing target entity {}",
                    relationship.id, relationship.target_id
                ))
            })?;
            let type_name = type_names.get(&relationship.type_id).ok_or_else(|| {
                GraphmillError::ReferentialIntegrity(format!(
                    "relationship {} references missing relationship type {}",
                    relationship.id, relationship.type_id
                ))
            })?;

            graph.upsert_edge(&source.name, &target.name, type_name);
        }

        Ok(graph)
    }

    /// Add a node for an entity, idempotently by name.
    fn add_node(&mut self, name: &str, entity_type: &str) -> NodeIndex {
        if let Some(&index) = self.nodes_by_name.get(name) {
            return index;
        }

        let index = self.graph.add_node(NodeData {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        });
        self.nodes_by_name.insert(name.to_string(), index);
        index
    }

    /// Add or relabel the edge between an ordered node pair.
    fn upsert_edge(&mut self, source: &str, target: &str, relationship_type: &str) {
        let source = self.add_node(source, "");
        let target = self.add_node(target, "");

        let data = EdgeData {
            relationship_type: relationship_type.to_string(),
        };

        match self.graph.find_edge(source, target) {
            Some(edge) => {
                // Last write wins on the label
                self.graph[edge] = data;
            }
            None => {
                self.graph.add_edge(source, target, data);
            }
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node by entity name.
    pub fn node(&self, name: &str) -> Option<&NodeData> {
        self.nodes_by_name
            .get(name)
            .map(|&index| &self.graph[index])
    }

    /// Look up the edge between two entity names, if any.
    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeData> {
        let source = *self.nodes_by_name.get(source)?;
        let target = *self.nodes_by_name.get(target)?;
        let edge = self.graph.find_edge(source, target)?;
        Some(&self.graph[edge])
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights()
    }

    /// Iterate edges as `(source, target, data)` name triples.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &EdgeData)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].name.as_str(),
                self.graph[edge.target()].name.as_str(),
                edge.weight(),
            )
        })
    }

    /// Render the graph in Graphviz DOT for the external visualizer.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph knowledge {\n");

        for node in self.graph.node_weights() {
            dot.push_str(&format!(
                "    \"{}\" [label=\"{}\\n({})\"];\n",
                escape(&node.name),
                escape(&node.name),
                escape(&node.entity_type)
            ));
        }

        for (source, target, data) in self.edges() {
            dot.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                escape(source),
                escape(target),
                escape(&data.relationship_type)
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// ============================================================================
// Graph Assembler
// ============================================================================

/// Assembles a [`KnowledgeGraph`] from the current contents of a store.
pub struct GraphAssembler {
    store: Arc<dyn RecordStore>,
}

impl GraphAssembler {
    /// Create an assembler over a store handle.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Read all entities and relationships and assemble the graph.
    ///
    /// Relationship type names are resolved per distinct id. Any dangling
    /// reference aborts with [`GraphmillError::ReferentialIntegrity`].
    pub async fn build(&self) -> Result<KnowledgeGraph> {
        let entities = self.store.list_entities().await?;
        let relationships = self.store.list_relationships().await?;

        let mut types: Vec<RelationshipTypeRecord> = Vec::new();
        let mut seen: HashSet<Uuid> = HashSet::new();
        for relationship in &relationships {
            if !seen.insert(relationship.type_id) {
                continue;
            }
            if let Some(record) = self
                .store
                .get_relationship_type(relationship.type_id)
                .await?
            {
                types.push(record);
            }
            // A missing type is caught (and reported) by from_records
        }

        tracing::info!(
            entities = entities.len(),
            relationships = relationships.len(),
            "assembling graph"
        );

        KnowledgeGraph::from_records(&entities, &relationships, &types)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use graphmill_store::{MemoryStore, Resolver};

    fn entity(name: &str, entity_type: &str) -> EntityRecord {
        EntityRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        }
    }

    fn relationship_type(name: &str) -> RelationshipTypeRecord {
        RelationshipTypeRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn relationship(source: &EntityRecord, target: &EntityRecord, ty: &RelationshipTypeRecord) -> RelationshipRecord {
        RelationshipRecord {
            id: Uuid::new_v4(),
            source_id: source.id,
            target_id: target.id,
            type_id: ty.id,
        }
    }

    #[test]
    fn test_from_records() {
        let python = entity("python", "concept");
        let guido = entity("guido van rossum", "person");
        let created = relationship_type("created");
        let rel = relationship(&guido, &python, &created);

        let graph = KnowledgeGraph::from_records(
            &[python.clone(), guido.clone()],
            &[rel],
            &[created],
        )
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node("python").unwrap().entity_type, "concept");

        let edge = graph.edge("guido van rossum", "python").unwrap();
        assert_eq!(edge.relationship_type, "created");
    }

    #[test]
    fn test_parallel_edges_collapse_last_wins() {
        let guido = entity("guido", "person");
        let python = entity("python", "concept");
        let created = relationship_type("created");
        let maintains = relationship_type("maintains");

        let rels = vec![
            relationship(&guido, &python, &created),
            relationship(&guido, &python, &maintains),
        ];

        let graph = KnowledgeGraph::from_records(
            &[guido.clone(), python.clone()],
            &rels,
            &[created, maintains],
        )
        .unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.edge("guido", "python").unwrap().relationship_type,
            "maintains"
        );
    }

    #[test]
    fn test_opposite_directions_are_distinct_edges() {
        let a = entity("a", "concept");
        let b = entity("b", "concept");
        let ty = relationship_type("relates_to");

        let rels = vec![relationship(&a, &b, &ty), relationship(&b, &a, &ty)];

        let graph =
            KnowledgeGraph::from_records(&[a.clone(), b.clone()], &rels, &[ty]).unwrap();

        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_self_relationship_allowed() {
        let a = entity("ouroboros", "concept");
        let ty = relationship_type("consumes");
        let rel = relationship(&a, &a, &ty);

        let graph = KnowledgeGraph::from_records(&[a.clone()], &[rel], &[ty]).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge("ouroboros", "ouroboros").is_some());
    }

    #[test]
    fn test_dangling_endpoint_aborts() {
        let python = entity("python", "concept");
        let ghost = entity("ghost", "person");
        let created = relationship_type("created");
        let rel = relationship(&ghost, &python, &created);

        // ghost is not among the entities handed to the assembler
        let err = KnowledgeGraph::from_records(&[python], &[rel], &[created]).unwrap_err();

        assert!(matches!(err, GraphmillError::ReferentialIntegrity(_)));
    }

    #[test]
    fn test_missing_type_aborts() {
        let a = entity("a", "concept");
        let b = entity("b", "concept");
        let ty = relationship_type("orphaned");
        let rel = relationship(&a, &b, &ty);

        let err = KnowledgeGraph::from_records(&[a, b], &[rel], &[]).unwrap_err();

        assert!(matches!(err, GraphmillError::ReferentialIntegrity(_)));
    }

    #[test]
    fn test_to_dot() {
        let guido = entity("guido", "person");
        let python = entity("python", "concept");
        let created = relationship_type("created");
        let rel = relationship(&guido, &python, &created);

        let graph =
            KnowledgeGraph::from_records(&[guido, python], &[rel], &[created]).unwrap();
        let dot = graph.to_dot();

        assert!(dot.starts_with("digraph knowledge {"));
        assert!(dot.contains("\"guido\" -> \"python\" [label=\"created\"];"));
        assert!(dot.contains("(person)"));
    }

    #[tokio::test]
    async fn test_assembler_reads_store() {
        let store = Arc::new(MemoryStore::new());
        let resolver = Resolver::new(store.clone());

        resolver.resolve_entity("guido", "person").await.unwrap();
        resolver.resolve_entity("python", "concept").await.unwrap();
        resolver
            .record_relationship("guido", "python", "created")
            .await
            .unwrap();

        let graph = GraphAssembler::new(store).build().await.unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.edge("guido", "python").unwrap().relationship_type,
            "created"
        );
    }
}
