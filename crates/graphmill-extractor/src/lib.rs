//! Graphmill Extractor - Extraction pipeline front half
//!
//! Turns a batch of raw text snippets into validated entity and
//! relationship candidates by way of a generative model: a prompt goes out,
//! the raw response comes back through [`parser`] and then [`validate`].
//!
//! The model is treated as adversarial input. Its output is parsed totally
//! (never an error) and validated fail-closed (drop, don't guess). The only
//! errors this crate surfaces are transport failures from the
//! [`ModelClient`] itself, which propagate untouched. No retries here.

use std::sync::Arc;

use graphmill_core::{
    EntityCandidate, ExtractionConfig, ModelClient, RelationshipCandidate, Result,
};

pub mod parser;
pub mod prompts;
pub mod validate;

pub use parser::parse;
pub use validate::{known_entity_names, validate_entities, validate_relationships};

// ============================================================================
// Extraction Orchestrator
// ============================================================================

/// Sequences the two extraction stages for one batch and owns the
/// known-entity context passed between them.
pub struct Extractor {
    model: Arc<dyn ModelClient>,
    config: ExtractionConfig,
}

impl Extractor {
    /// Create a new extractor over a model transport.
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            config: ExtractionConfig::default(),
        }
    }

    /// Override the extraction configuration.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract entity candidates from a text batch.
    ///
    /// Short-circuits to empty when the batch's first snippet is shorter
    /// than the configured minimum, a cheap signal that the batch is not
    /// real content, checked before spending a model call.
    pub async fn extract_entities(&self, batch: &[String]) -> Result<Vec<EntityCandidate>> {
        let Some(first) = batch.first() else {
            return Ok(Vec::new());
        };
        if first.chars().count() < self.config.min_text_len {
            tracing::debug!("batch below minimum text length, skipping entity extraction");
            return Ok(Vec::new());
        }

        let prompt = prompts::entity_prompt(batch);
        let response = self.model.complete(&prompt).await?;

        let tuples = parser::parse(&response);
        let candidates = validate::validate_entities(&tuples);

        tracing::info!(
            parsed = tuples.len(),
            valid = candidates.len(),
            "entity extraction complete"
        );

        Ok(candidates)
    }

    /// Extract relationship candidates from a text batch, filtered against
    /// the entities already extracted from it.
    ///
    /// Short-circuits to empty when fewer than 2 entities are known: a
    /// single entity cannot form a relationship, so the model call is
    /// skipped entirely.
    pub async fn extract_relationships(
        &self,
        batch: &[String],
        entities: &[EntityCandidate],
    ) -> Result<Vec<RelationshipCandidate>> {
        if entities.len() < 2 {
            tracing::debug!("fewer than 2 known entities, skipping relationship extraction");
            return Ok(Vec::new());
        }

        let names: Vec<String> = entities.iter().map(|e| e.name.clone()).collect();
        let prompt = prompts::relationship_prompt(batch, &names);
        let response = self.model.complete(&prompt).await?;

        let tuples = parser::parse(&response);
        let known = validate::known_entity_names(entities);
        let candidates = validate::validate_relationships(&tuples, &known);

        tracing::info!(
            parsed = tuples.len(),
            valid = candidates.len(),
            "relationship extraction complete"
        );

        Ok(candidates)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted model double that counts completions.
    struct MockModel {
        response: String,
        calls: AtomicUsize,
    }

    impl MockModel {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl graphmill_core::ModelClient for MockModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    fn batch(text: &str) -> Vec<String> {
        vec![text.to_string()]
    }

    #[tokio::test]
    async fn test_extract_entities() {
        let model = Arc::new(MockModel::new(
            r#"[("Python", "Concept"), ("Guido van Rossum", "Person")]"#,
        ));
        let extractor = Extractor::new(model.clone());

        let candidates = extractor
            .extract_entities(&batch(
                "Python is a programming language created by Guido van Rossum.",
            ))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], EntityCandidate::new("python", "concept"));
        assert_eq!(
            candidates[1],
            EntityCandidate::new("guido van rossum", "person")
        );
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_short_text_skips_model_call() {
        let model = Arc::new(MockModel::new(r#"[("noise", "concept")]"#));
        let extractor = Extractor::new(model.clone());

        let candidates = extractor.extract_entities(&batch("short")).await.unwrap();

        assert!(candidates.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_model_call() {
        let model = Arc::new(MockModel::new("[]"));
        let extractor = Extractor::new(model.clone());

        let candidates = extractor.extract_entities(&[]).await.unwrap();

        assert!(candidates.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_response_degrades_to_empty() {
        let model = Arc::new(MockModel::new("I'm sorry, I cannot do that."));
        let extractor = Extractor::new(model.clone());

        let candidates = extractor
            .extract_entities(&batch("A perfectly reasonable piece of text."))
            .await
            .unwrap();

        assert!(candidates.is_empty());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_entity_skips_relationship_call() {
        let model = Arc::new(MockModel::new(r#"[("a", "rel", "b")]"#));
        let extractor = Extractor::new(model.clone());

        let entities = vec![EntityCandidate::new("python", "concept")];
        let candidates = extractor
            .extract_relationships(&batch("some text about python"), &entities)
            .await
            .unwrap();

        assert!(candidates.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_relationships_filters_unknown() {
        let model = Arc::new(MockModel::new(
            r#"[("guido van rossum", "created", "python"), ("python", "influences", "rust")]"#,
        ));
        let extractor = Extractor::new(model.clone());

        let entities = vec![
            EntityCandidate::new("python", "concept"),
            EntityCandidate::new("guido van rossum", "person"),
        ];
        let candidates = extractor
            .extract_relationships(
                &batch("Python is a programming language created by Guido van Rossum."),
                &entities,
            )
            .await
            .unwrap();

        // "rust" was never extracted as an entity, so that candidate drops
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0],
            RelationshipCandidate::new("guido van rossum", "python", "created")
        );
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_repaired_response_still_validates() {
        // Missing closing quote before the paren; repair path output
        let model = Arc::new(MockModel::new(
            r#"[("python", "concept), ("guido", "person")]"#,
        ));
        let extractor = Extractor::new(model);

        let candidates = extractor
            .extract_entities(&batch("Python was created by Guido."))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "python");
        assert_eq!(candidates[1].name, "guido");
    }
}
