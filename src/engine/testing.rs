//! Shared fixtures for engine and pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{AnnotationEngine, ConceptDatabase, DictionaryEngine, EngineError, Entities};

pub const SAMPLE_CDB: &str = include_str!("../../models/sample/cdb.json");

pub const SHORT_DOCUMENT: &str = "The patient was prescribed with Aspirin, 4-5 tabs daily";

pub const LONG_DOCUMENT: &str = "Pt is 40yo mother, software engineer
            HPI : Sleeping trouble on present dosage of Clonidine.
            Severe Rash  on face and leg, slightly itchy
            Meds : Vyvanse 50 mgs po at breakfast daily,
            Clonidine 0.2 mgs -- 1 and 1 / 2 tabs po qhs,
            Aspirin -- 4-5 tabs daily
            HEENT : Boggy inferior turbinates, No oropharyngeal lesion
            Lungs : clear Heart : Regular rhythm
            Skin :  Papular mild erythematous eruption to hairline Follow-up as scheduled.";

pub const BLANK_DOCUMENTS: [&str; 5] = [
    " ",
    " \n\n\n ",
    " \n   \n   \t ",
    "\t",
    "\n\n\n \t \t    \t \n",
];

pub fn sample_engine() -> DictionaryEngine {
    DictionaryEngine::new(ConceptDatabase::from_json(SAMPLE_CDB).expect("sample cdb is valid"))
}

pub fn shared_sample_engine() -> Arc<dyn AnnotationEngine> {
    Arc::new(sample_engine())
}

/// Engine that annotates normally until it has been called `healthy_calls`
/// times, then fails every call.
pub struct FlakyEngine {
    inner: DictionaryEngine,
    healthy_calls: usize,
    calls: AtomicUsize,
}

impl FlakyEngine {
    pub fn new(healthy_calls: usize) -> Self {
        Self {
            inner: sample_engine(),
            healthy_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

impl AnnotationEngine for FlakyEngine {
    fn engine_id(&self) -> &str {
        "flaky"
    }

    fn get_entities(&self, text: &str) -> Result<Entities, EngineError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy_calls {
            return Err(EngineError::Failed("model unavailable".to_string()));
        }
        self.inner.get_entities(text)
    }
}

/// Engine that panics on every call.
pub struct PanickingEngine;

impl AnnotationEngine for PanickingEngine {
    fn engine_id(&self) -> &str {
        "panicking"
    }

    fn get_entities(&self, _text: &str) -> Result<Entities, EngineError> {
        panic!("engine crashed");
    }
}
