//! Merge out-of-order engine results back into input order.

use crate::config::EntityOutputMode;
use crate::models::{Annotations, DocumentResult, InputDocument};

use super::types::Dispatch;

/// Build one result per input document, in input order.
///
/// Slots filled by neither a raw result nor the invalid list become error
/// results, so the output always has exactly `documents.len()` entries.
pub fn reassemble(
    documents: &[InputDocument],
    dispatch: Dispatch,
    output_mode: EntityOutputMode,
) -> Vec<DocumentResult> {
    let elapsed = dispatch.elapsed.as_secs_f64();
    let mut slots: Vec<Option<DocumentResult>> = vec![None; documents.len()];

    for raw in dispatch.raw_results {
        let Some(slot) = slots.get_mut(raw.index) else {
            tracing::warn!(index = raw.index, "Discarding result for unknown document");
            continue;
        };
        if slot.is_some() {
            tracing::warn!(index = raw.index, "Duplicate result for document");
        }
        *slot = Some(DocumentResult::annotated(
            raw.text,
            Annotations::reshape(raw.entities, output_mode),
            elapsed,
        ));
    }

    for index in dispatch.invalid {
        if let Some(slot) = slots.get_mut(index) {
            let text = documents[index].text.clone().unwrap_or_default();
            *slot = Some(DocumentResult::blank(text));
        }
    }

    let mut unfilled = 0usize;
    let results: Vec<DocumentResult> = slots
        .into_iter()
        .zip(documents)
        .map(|(slot, document)| {
            let result = slot.unwrap_or_else(|| {
                unfilled += 1;
                DocumentResult::unfilled(document.text.clone().unwrap_or_default())
            });
            result.with_footer(document.footer.clone())
        })
        .collect();

    if unfilled > 0 {
        tracing::warn!(
            unfilled,
            total = documents.len(),
            "Engine returned no result for some documents"
        );
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::engine::testing::{sample_engine, SHORT_DOCUMENT};
    use crate::engine::{AnnotationEngine, RawAnnotationResult};
    use crate::models::UNFILLED_SLOT_ERROR;
    use crate::services::annotation::planner::WorkPlan;

    fn raw(index: usize, text: &str) -> RawAnnotationResult {
        RawAnnotationResult {
            index,
            text: text.to_string(),
            entities: sample_engine().get_entities(text).unwrap(),
        }
    }

    fn dispatch(raw_results: Vec<RawAnnotationResult>, invalid: Vec<usize>) -> Dispatch {
        Dispatch {
            raw_results,
            invalid,
            plan: WorkPlan::for_documents(0, 1),
            elapsed: Duration::from_millis(250),
        }
    }

    #[test]
    fn test_restores_input_order() {
        let texts = ["aspirin", "clonidine", "vyvanse", "rash"];
        let docs: Vec<_> = texts.iter().map(|t| InputDocument::new(*t)).collect();
        let shuffled = vec![raw(2, texts[2]), raw(0, texts[0]), raw(3, texts[3]), raw(1, texts[1])];

        let results = reassemble(&docs, dispatch(shuffled, vec![]), EntityOutputMode::Dict);

        assert_eq!(results.len(), 4);
        for (result, text) in results.iter().zip(texts) {
            assert_eq!(result.text.as_deref(), Some(text));
            assert!(result.success);
            assert_eq!(result.annotation_count(), 1);
            assert_eq!(result.elapsed_time, Some(0.25));
        }
    }

    #[test]
    fn test_invalid_documents_are_successful_and_empty() {
        let docs = vec![
            InputDocument::new(SHORT_DOCUMENT),
            InputDocument::new("\n\t").with_footer(json!({"row": 1})),
            InputDocument::default(),
        ];

        let results = reassemble(
            &docs,
            dispatch(vec![raw(0, SHORT_DOCUMENT)], vec![1, 2]),
            EntityOutputMode::List,
        );

        assert_eq!(results[1].text.as_deref(), Some("\n\t"));
        assert_eq!(results[1].annotations, Some(Annotations::empty()));
        assert!(results[1].success);
        assert_eq!(results[1].footer, Some(json!({"row": 1})));
        assert!(results[1].errors.is_none());

        assert_eq!(results[2].text.as_deref(), Some(""));
        assert!(results[2].success);
        assert!(results[2].footer.is_none());
    }

    #[test]
    fn test_footer_passthrough() {
        let docs = vec![
            InputDocument::new("aspirin").with_footer(json!("a")),
            InputDocument::new("aspirin"),
            InputDocument::new("aspirin").with_footer(serde_json::Value::Null),
        ];

        let results = reassemble(
            &docs,
            dispatch(vec![raw(1, "aspirin"), raw(2, "aspirin"), raw(0, "aspirin")], vec![]),
            EntityOutputMode::Dict,
        );

        assert_eq!(results[0].footer, Some(json!("a")));
        assert_eq!(results[1].footer, None);
        assert_eq!(results[2].footer, Some(serde_json::Value::Null));

        let serialized = serde_json::to_value(&results).unwrap();
        assert!(serialized[1].get("footer").is_none());
        assert!(serialized[2].get("footer").is_some());
    }

    #[test]
    fn test_unfilled_slots_become_errors() {
        let docs: Vec<_> = (0..3).map(|_| InputDocument::new("aspirin")).collect();
        let results = reassemble(&docs, dispatch(vec![raw(1, "aspirin")], vec![]), EntityOutputMode::Dict);

        assert_eq!(results.len(), 3);
        assert!(results[1].success);
        for index in [0, 2] {
            assert!(!results[index].success);
            assert_eq!(results[index].errors, Some(vec![UNFILLED_SLOT_ERROR.to_string()]));
            assert_eq!(results[index].annotation_count(), 0);
        }
    }

    #[test]
    fn test_out_of_range_result_is_ignored() {
        let docs = vec![InputDocument::new("aspirin")];
        let results = reassemble(
            &docs,
            dispatch(vec![raw(0, "aspirin"), raw(5, "aspirin")], vec![]),
            EntityOutputMode::Dict,
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
    }

    #[test]
    fn test_empty_input() {
        let results = reassemble(&[], dispatch(vec![], vec![]), EntityOutputMode::Dict);
        assert!(results.is_empty());
    }
}
