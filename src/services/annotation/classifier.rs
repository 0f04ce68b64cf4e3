use crate::models::InputDocument;

use super::types::ClassificationResult;

/// Split documents into processable (non-blank text) and invalid ones.
pub fn classify(documents: &[InputDocument]) -> ClassificationResult {
    let mut result = ClassificationResult::default();

    for (index, document) in documents.iter().enumerate() {
        match document.annotatable_text() {
            Some(text) => result.processable.push((index, text.to_string())),
            None => result.invalid.push(index),
        }
    }

    result
}
