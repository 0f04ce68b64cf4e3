//! Types shared by the bulk annotation stages.

use std::time::Duration;

use crate::engine::RawAnnotationResult;

use super::planner::WorkPlan;

/// Position of a document in the caller's input.
pub type DocumentIndex = usize;

/// Input documents split into those worth annotating and those that are not.
///
/// Every input index lands in exactly one of the two groups, in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    pub processable: Vec<(DocumentIndex, String)>,
    pub invalid: Vec<DocumentIndex>,
}

impl ClassificationResult {
    pub fn total(&self) -> usize {
        self.processable.len() + self.invalid.len()
    }
}

/// Outcome of one bulk dispatch, before reassembly.
#[derive(Debug)]
pub struct Dispatch {
    /// Engine results in arrival order.
    pub raw_results: Vec<RawAnnotationResult>,
    pub invalid: Vec<DocumentIndex>,
    pub plan: WorkPlan,
    pub elapsed: Duration,
}
