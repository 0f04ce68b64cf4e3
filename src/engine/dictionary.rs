//! Dictionary (gazetteer) engine: longest-match lookup of concept names.

use super::concept_db::{tokenize, ConceptDatabase};
use super::{AnnotationEngine, EngineError, Entities, Entity};

/// Matches document text against every name in a `ConceptDatabase`.
///
/// At each token position the longest indexed name wins; matched tokens are
/// consumed, so entities never overlap. When several concepts share a name the
/// lowest CUI is chosen and the accuracy is split evenly between them.
pub struct DictionaryEngine {
    cdb: ConceptDatabase,
}

impl DictionaryEngine {
    pub fn new(cdb: ConceptDatabase) -> Self {
        Self { cdb }
    }

    /// Number of concepts available for matching.
    pub fn concept_count(&self) -> usize {
        self.cdb.len()
    }
}

impl AnnotationEngine for DictionaryEngine {
    fn engine_id(&self) -> &str {
        "dictionary"
    }

    fn get_entities(&self, text: &str) -> Result<Entities, EngineError> {
        let tokens = tokenize(text);
        let lowered: Vec<String> = tokens.iter().map(|t| t.text.to_lowercase()).collect();
        let mut entities = Entities::new();

        let mut position = 0;
        while position < tokens.len() {
            let widest = self.cdb.max_name_tokens().min(tokens.len() - position);

            let matched = (1..=widest).rev().find_map(|width| {
                let candidate = lowered[position..position + width].join(" ");
                self.cdb
                    .lookup(&candidate)
                    .map(|concepts| (width, candidate, concepts))
            });

            let Some((width, name, concepts)) = matched else {
                position += 1;
                continue;
            };

            let concept = concepts[0];
            let first = &tokens[position];
            let last = &tokens[position + width - 1];
            let acc = 1.0 / concepts.len() as f64;
            let id = entities.len();

            entities.insert(
                id,
                Entity {
                    id,
                    cui: concept.cui.clone(),
                    pretty_name: concept.pretty_name.clone(),
                    source_value: text[first.byte_start..last.byte_end].to_string(),
                    detected_name: name.replace(' ', "~"),
                    type_ids: concept.type_ids.clone(),
                    types: concept
                        .type_ids
                        .iter()
                        .map(|t| self.cdb.type_name(t).to_string())
                        .collect(),
                    acc,
                    context_similarity: acc,
                    start: first.char_start,
                    end: last.char_end,
                },
            );

            position += width;
        }

        Ok(entities)
    }
}
