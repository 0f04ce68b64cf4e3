//! Document annotation pipeline.
//!
//! Single documents go straight to the engine. Bulk requests are classified,
//! sized, fanned out over blocking workers, and reassembled in input order.

mod classifier;
mod dispatcher;
mod planner;
mod processor;
mod reassembler;
mod types;

pub use classifier::classify;
pub use dispatcher::dispatch_bulk;
pub use planner::{WorkPlan, MAX_BATCH_SIZE, MIN_DOCS_PER_WORKER};
pub use processor::{build_engine, Processor};
pub use reassembler::reassemble;
pub use types::{ClassificationResult, Dispatch, DocumentIndex};
