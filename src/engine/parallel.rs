//! Fan-out of document batches across blocking annotation workers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{AnnotationEngine, EngineError, RawAnnotationResult};

/// Capacity of the result channel between workers and the collector.
pub const RESULT_CHANNEL_CAPACITY: usize = 100;

type Batch = Vec<(usize, String)>;

/// Annotate `(index, text)` pairs on up to `worker_count` blocking workers.
///
/// Documents are cut into batches of `batch_size` and pulled from a shared
/// queue. Each result is sent on `result_tx` as soon as it is produced, so
/// results arrive in no particular order; `index` is the only correlation key.
///
/// A failing or panicking worker stops working on its batch but does not stop
/// the others. Results already sent stay sent. The first failure is returned
/// once every worker has finished.
pub async fn annotate_parallel(
    engine: Arc<dyn AnnotationEngine>,
    documents: Vec<(usize, String)>,
    worker_count: usize,
    batch_size: usize,
    result_tx: mpsc::Sender<RawAnnotationResult>,
) -> Result<(), EngineError> {
    let batch_size = batch_size.max(1);
    let mut batches: VecDeque<Batch> = VecDeque::new();
    let mut remaining = documents.into_iter().peekable();
    while remaining.peek().is_some() {
        batches.push_back(remaining.by_ref().take(batch_size).collect());
    }

    let workers = worker_count.clamp(1, batches.len().max(1));
    let queue = Arc::new(Mutex::new(batches));
    let mut handles = Vec::with_capacity(workers);

    for worker in 0..workers {
        let engine = engine.clone();
        let queue = queue.clone();
        let result_tx = result_tx.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            run_worker(worker, engine.as_ref(), &queue, &result_tx)
        }));
    }

    // Only workers hold senders now; the channel closes when they finish
    drop(result_tx);

    let mut first_error = None;
    for outcome in futures::future::join_all(handles).await {
        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) => EngineError::WorkerPanicked(e.to_string()),
        };
        tracing::warn!("Annotation worker failed: {}", error);
        first_error.get_or_insert(error);
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_worker(
    worker: usize,
    engine: &dyn AnnotationEngine,
    queue: &Mutex<VecDeque<Batch>>,
    result_tx: &mpsc::Sender<RawAnnotationResult>,
) -> Result<(), EngineError> {
    let mut annotated = 0usize;

    loop {
        let batch = {
            let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
            queue.pop_front()
        };

        let Some(batch) = batch else {
            tracing::trace!(worker, annotated, "Annotation worker drained queue");
            return Ok(());
        };

        for (index, text) in batch {
            let entities = engine.get_entities(&text)?;
            annotated += 1;

            if result_tx
                .blocking_send(RawAnnotationResult {
                    index,
                    text,
                    entities,
                })
                .is_err()
            {
                // Collector is gone; nobody is waiting for the rest
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{shared_sample_engine, FlakyEngine, PanickingEngine, SHORT_DOCUMENT};

    fn documents(n: usize) -> Vec<(usize, String)> {
        (0..n).map(|i| (i, SHORT_DOCUMENT.to_string())).collect()
    }

    async fn collect(
        engine: Arc<dyn AnnotationEngine>,
        docs: Vec<(usize, String)>,
        worker_count: usize,
        batch_size: usize,
    ) -> (Vec<RawAnnotationResult>, Result<(), EngineError>) {
        let (tx, mut rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let fanout = tokio::spawn(annotate_parallel(engine, docs, worker_count, batch_size, tx));

        let mut results = Vec::new();
        while let Some(r) = rx.recv().await {
            results.push(r);
        }
        (results, fanout.await.unwrap())
    }

    #[tokio::test]
    async fn test_every_document_is_annotated_once() {
        let (results, outcome) = collect(shared_sample_engine(), documents(250), 4, 10).await;
        assert!(outcome.is_ok());
        assert_eq!(results.len(), 250);

        let mut indices: Vec<_> = results.iter().map(|r| r.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..250).collect::<Vec<_>>());
        assert!(results.iter().all(|r| !r.entities.is_empty()));
    }

    #[tokio::test]
    async fn test_more_workers_than_batches() {
        let (results, outcome) = collect(shared_sample_engine(), documents(3), 8, 10).await;
        assert!(outcome.is_ok());
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let (results, outcome) = collect(shared_sample_engine(), documents(5), 2, 0).await;
        assert!(outcome.is_ok());
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_results() {
        let engine: Arc<dyn AnnotationEngine> = Arc::new(FlakyEngine::new(4));
        let (results, outcome) = collect(engine, documents(20), 1, 10).await;

        assert!(matches!(outcome, Err(EngineError::Failed(_))));
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_reported() {
        let engine: Arc<dyn AnnotationEngine> = Arc::new(PanickingEngine);
        let (results, outcome) = collect(engine, documents(2), 2, 1).await;

        assert!(results.is_empty());
        assert!(matches!(outcome, Err(EngineError::WorkerPanicked(_))));
    }
}
