//! Prompt construction for the two extraction stages
//!
//! Templates live next to this module as plain text with `{text}` and
//! `{entities}` placeholders. The model is instructed to answer with a
//! literal list of tuples; the parser assumes nothing of the sort.

const ENTITY_TEMPLATE: &str = include_str!("prompts/entity_extraction.txt");
const RELATIONSHIP_TEMPLATE: &str = include_str!("prompts/relationship_extraction.txt");

/// Build the entity-extraction prompt for a text batch.
pub fn entity_prompt(batch: &[String]) -> String {
    ENTITY_TEMPLATE.replace("{text}", &join_batch(batch))
}

/// Build the relationship-extraction prompt for a text batch, seeded with
/// the batch's known entity names (already case-folded).
pub fn relationship_prompt(batch: &[String], entity_names: &[String]) -> String {
    RELATIONSHIP_TEMPLATE
        .replace("{entities}", &format!("{entity_names:?}"))
        .replace("{text}", &join_batch(batch))
}

fn join_batch(batch: &[String]) -> String {
    batch.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_prompt_embeds_text() {
        let batch = vec!["Python is a programming language.".to_string()];
        let prompt = entity_prompt(&batch);

        assert!(prompt.contains("Python is a programming language."));
        assert!(prompt.contains("entity extractor"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_relationship_prompt_embeds_entities() {
        let batch = vec!["Guido created Python.".to_string()];
        let names = vec!["python".to_string(), "guido van rossum".to_string()];
        let prompt = relationship_prompt(&batch, &names);

        assert!(prompt.contains("guido van rossum"));
        assert!(prompt.contains("Guido created Python."));
        assert!(!prompt.contains("{entities}"));
        assert!(!prompt.contains("{text}"));
    }
}
