//! Worker count and batch size for a bulk request.

/// Fewest documents worth giving a worker of its own.
pub const MIN_DOCS_PER_WORKER: usize = 10;

/// Largest batch handed to a worker at once.
pub const MAX_BATCH_SIZE: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPlan {
    pub worker_count: usize,
    pub batch_size: usize,
}

impl WorkPlan {
    /// Plan work for `count` processable documents with at most `ceiling`
    /// workers.
    ///
    /// Small requests get batches of [`MIN_DOCS_PER_WORKER`] with one worker
    /// per batch. Once the slice count reaches the ceiling every worker is
    /// used and the batch grows with the request, up to [`MAX_BATCH_SIZE`].
    pub fn for_documents(count: usize, ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        let num_slices = (count / MIN_DOCS_PER_WORKER).max(1);
        let batch_size = num_slices.min(MAX_BATCH_SIZE);

        if batch_size >= ceiling {
            return Self {
                worker_count: ceiling,
                batch_size,
            };
        }

        let batch_size = MIN_DOCS_PER_WORKER;
        let mut worker_count = num_slices;
        if count > batch_size * worker_count {
            worker_count += 1;
        }

        Self {
            worker_count: worker_count.clamp(1, ceiling),
            batch_size,
        }
    }
}
