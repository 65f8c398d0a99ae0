//! Batch ingest pipeline
//!
//! Sequences one full pass: fetch snippets into the TextUnit queue, extract
//! entities from a batch, resolve them, retire the consumed TextUnits,
//! extract and record relationships, then assemble the graph. The pipeline
//! is strictly sequential: a batch runs to completion or returns an error,
//! and the resolver is only ever driven by this single writer.

use std::sync::Arc;

use graphmill_core::{ContentFetcher, ExtractionConfig, ModelClient, Result};
use graphmill_extractor::Extractor;
use graphmill_graph::{GraphAssembler, KnowledgeGraph};
use graphmill_store::{RecordStore, Resolver};

/// Summary of one processed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// TextUnits consumed from the queue
    pub texts_consumed: usize,
    /// Entity candidates resolved
    pub entities_resolved: usize,
    /// Relationship candidates recorded
    pub relationships_recorded: usize,
}

/// Owns the collaborators and drives the extraction run.
///
/// All handles are passed in explicitly; lifecycle belongs to the caller.
pub struct IngestPipeline {
    fetcher: Arc<dyn ContentFetcher>,
    extractor: Extractor,
    resolver: Resolver,
    assembler: GraphAssembler,
    store: Arc<dyn RecordStore>,
    config: ExtractionConfig,
}

impl IngestPipeline {
    /// Wire a pipeline from its collaborators.
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        model: Arc<dyn ModelClient>,
        store: Arc<dyn RecordStore>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor: Extractor::new(model).with_config(config.clone()),
            resolver: Resolver::new(store.clone()),
            assembler: GraphAssembler::new(store.clone()),
            store,
            config,
        }
    }

    /// Run one full pass for a source and return the assembled graph.
    pub async fn run(&self, source: &str, search: &str) -> Result<KnowledgeGraph> {
        self.enqueue(source, search).await?;
        let report = self.process_batch().await?;

        tracing::info!(
            texts = report.texts_consumed,
            entities = report.entities_resolved,
            relationships = report.relationships_recorded,
            "batch processed"
        );

        self.assembler.build().await
    }

    /// Fetch snippets and enqueue the novel ones as TextUnits.
    pub async fn enqueue(&self, source: &str, search: &str) -> Result<usize> {
        let snippets = self.fetcher.fetch(source, search).await?;
        let mut queued = 0;

        for snippet in snippets {
            if snippet.trim().is_empty() {
                continue;
            }
            // Already-queued bodies are not re-queued
            if self.store.find_text(&snippet).await?.is_some() {
                continue;
            }
            self.store.add_text(&snippet).await?;
            queued += 1;
        }

        tracing::debug!(queued, "snippets enqueued");
        Ok(queued)
    }

    /// Consume one batch from the TextUnit queue.
    ///
    /// TextUnits are deleted once their entities are extracted; the
    /// relationship stage runs over the same in-memory batch afterwards.
    pub async fn process_batch(&self) -> Result<BatchReport> {
        let units = self
            .store
            .list_text(Some(self.config.batch_size), None)
            .await?;
        let batch: Vec<String> = units.iter().map(|u| u.body.clone()).collect();

        let entities = self.extractor.extract_entities(&batch).await?;
        self.resolver.resolve_entities(&entities).await?;

        for unit in &units {
            self.store.delete_text(unit.id).await?;
        }

        let relationships = self
            .extractor
            .extract_relationships(&batch, &entities)
            .await?;
        self.resolver.record_relationships(&relationships).await?;

        Ok(BatchReport {
            texts_consumed: units.len(),
            entities_resolved: entities.len(),
            relationships_recorded: relationships.len(),
        })
    }

    /// Assemble the graph from the store's current contents.
    pub async fn assemble(&self) -> Result<KnowledgeGraph> {
        self.assembler.build().await
    }
}
