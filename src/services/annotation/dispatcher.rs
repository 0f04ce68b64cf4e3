//! Bulk dispatch: classify, plan, and fan documents out to the engine.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::engine::{annotate_parallel, AnnotationEngine, EngineError, RESULT_CHANNEL_CAPACITY};
use crate::models::InputDocument;

use super::classifier::classify;
use super::planner::WorkPlan;
use super::types::Dispatch;

/// Annotate every processable document and collect raw results.
///
/// Engine failures are logged and swallowed: whatever results arrived before
/// the failure are kept, and the reassembler accounts for the rest.
pub async fn dispatch_bulk(
    engine: Arc<dyn AnnotationEngine>,
    documents: &[InputDocument],
    worker_ceiling: usize,
) -> Dispatch {
    let started = Instant::now();
    let classification = classify(documents);
    let plan = WorkPlan::for_documents(classification.processable.len(), worker_ceiling);

    tracing::debug!(
        processable = classification.processable.len(),
        invalid = classification.invalid.len(),
        workers = plan.worker_count,
        batch_size = plan.batch_size,
        "Planned bulk annotation"
    );

    if classification.processable.is_empty() {
        return Dispatch {
            raw_results: Vec::new(),
            invalid: classification.invalid,
            plan,
            elapsed: started.elapsed(),
        };
    }

    let expected = classification.processable.len();
    let (tx, mut rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
    let fanout = tokio::spawn(annotate_parallel(
        engine.clone(),
        classification.processable,
        plan.worker_count,
        plan.batch_size,
        tx,
    ));

    let mut raw_results = Vec::with_capacity(expected);
    while let Some(result) = rx.recv().await {
        raw_results.push(result);
    }

    let outcome = match fanout.await {
        Ok(outcome) => outcome,
        Err(e) => Err(EngineError::WorkerPanicked(e.to_string())),
    };
    if let Err(e) = outcome {
        tracing::error!(
            engine = engine.engine_id(),
            received = raw_results.len(),
            expected,
            "Bulk annotation failed: {}",
            e
        );
    }

    Dispatch {
        raw_results,
        invalid: classification.invalid,
        plan,
        elapsed: started.elapsed(),
    }
}
