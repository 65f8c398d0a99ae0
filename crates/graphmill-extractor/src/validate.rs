//! Candidate validation and deduplication
//!
//! Two independent passes over the parser's output, sharing the same
//! discipline: trim and case-fold every field, drop anything incomplete,
//! dedup within the batch. Validation fails closed; a tuple that is not the
//! expected shape is dropped, never guessed at.

use std::collections::HashSet;

use graphmill_core::{normalize, EntityCandidate, RawTuple, RelationshipCandidate};

/// Validate entity candidates.
///
/// Keeps 2-tuples with non-empty fields, first occurrence of each
/// case-folded name wins (including its type), insertion order preserved.
pub fn validate_entities(tuples: &[RawTuple]) -> Vec<EntityCandidate> {
    let mut seen = HashSet::new();
    let mut valid = Vec::new();

    for tuple in tuples {
        let [name, entity_type] = tuple.fields.as_slice() else {
            // Wrong arity: not an entity tuple
            continue;
        };

        let name = normalize(name);
        let entity_type = normalize(entity_type);

        if name.is_empty() || entity_type.is_empty() {
            continue;
        }

        if seen.insert(name.clone()) {
            valid.push(EntityCandidate { name, entity_type });
        }
    }

    valid
}

/// Validate relationship candidates against the batch's known-entity set.
///
/// Keeps 3-tuples whose source and target both name known entities. A
/// relationship naming an entity the model invented is dropped, not
/// promoted. Dedup key is `source|relation|target`, first occurrence wins.
pub fn validate_relationships(
    tuples: &[RawTuple],
    known_entities: &HashSet<String>,
) -> Vec<RelationshipCandidate> {
    let mut seen = HashSet::new();
    let mut valid = Vec::new();

    for tuple in tuples {
        let [source, relation, target] = tuple.fields.as_slice() else {
            continue;
        };

        let source = normalize(source);
        let relation = normalize(relation);
        let target = normalize(target);

        if source.is_empty() || relation.is_empty() || target.is_empty() {
            continue;
        }

        if !known_entities.contains(&source) || !known_entities.contains(&target) {
            continue;
        }

        let candidate = RelationshipCandidate {
            source,
            target,
            relation,
        };

        if seen.insert(candidate.dedup_key()) {
            valid.push(candidate);
        }
    }

    valid
}

/// The known-entity set for a batch: the case-folded names of its validated
/// entity candidates.
pub fn known_entity_names(entities: &[EntityCandidate]) -> HashSet<String> {
    entities.iter().map(|e| e.name.clone()).collect()
}

// ============================================================================
// Tests
// ============================================================================
