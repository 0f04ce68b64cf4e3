//! Request payload parsing.
//!
//! Both endpoints take `{"content": ...}`. Anything that does not parse into
//! the expected shape is a caller error.

use serde::Deserialize;
use thiserror::Error;

use super::InputDocument;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Input Payload should be JSON")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Input Payload should be JSON")]
    MissingContent,
}

#[derive(Deserialize)]
struct Envelope<T> {
    content: Option<T>,
}

/// Parse `{"content": {"text": ..., "footer": ...}}`.
pub fn parse_single(body: &[u8]) -> Result<InputDocument, PayloadError> {
    let envelope: Envelope<InputDocument> = serde_json::from_slice(body)?;
    envelope.content.ok_or(PayloadError::MissingContent)
}

/// Parse `{"content": [{"text": ...}, ...]}`.
///
/// A `null` element becomes a document without text, so it is classified as
/// invalid rather than rejecting the whole request.
pub fn parse_bulk(body: &[u8]) -> Result<Vec<InputDocument>, PayloadError> {
    let envelope: Envelope<Vec<Option<InputDocument>>> = serde_json::from_slice(body)?;
    let content = envelope.content.ok_or(PayloadError::MissingContent)?;
    Ok(content.into_iter().map(Option::unwrap_or_default).collect())
}
