//! Concept annotation engines.
//!
//! Provides the `AnnotationEngine` trait for pluggable extraction backends and
//! a built-in `DictionaryEngine` that matches text against a concept database.
//! The rest of the service treats engine output as opaque and only forwards it.

mod concept_db;
mod dictionary;
mod parallel;
#[cfg(test)]
pub(crate) mod testing;

pub use concept_db::{Concept, ConceptDatabase};
pub use dictionary::DictionaryEngine;
pub use parallel::{annotate_parallel, RESULT_CHANNEL_CAPACITY};

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-document entity identifier, assigned by the engine.
pub type EntityId = usize;

/// A single concept annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub cui: String,
    pub pretty_name: String,
    /// Text exactly as it appears in the document.
    pub source_value: String,
    /// Normalized name that matched, tokens joined by `~`.
    pub detected_name: String,
    pub type_ids: Vec<String>,
    pub types: Vec<String>,
    pub acc: f64,
    pub context_similarity: f64,
    /// Character offset of the first matched character.
    pub start: usize,
    /// Character offset one past the last matched character.
    pub end: usize,
}

/// Entities keyed by id, in ascending id order.
pub type Entities = BTreeMap<EntityId, Entity>;

/// Engine output for one document of a bulk run.
#[derive(Debug, Clone)]
pub struct RawAnnotationResult {
    /// Position of the document in the original request.
    pub index: usize,
    pub text: String,
    pub entities: Entities,
}

/// Errors from annotation engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse concept database: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Concept database contains no concepts")]
    EmptyDatabase,

    #[error("Annotation failed: {0}")]
    Failed(String),

    #[error("Annotation worker stopped unexpectedly: {0}")]
    WorkerPanicked(String),
}

/// A backend that extracts concept annotations from text.
///
/// Engines are CPU-bound and synchronous; callers run them on blocking
/// workers. One instance is built at startup and shared read-only by every
/// request, so implementations must not rely on interior mutation.
pub trait AnnotationEngine: Send + Sync {
    /// Short backend identifier (e.g. "dictionary").
    fn engine_id(&self) -> &str;

    /// Annotate a single text.
    fn get_entities(&self, text: &str) -> Result<Entities, EngineError>;
}
