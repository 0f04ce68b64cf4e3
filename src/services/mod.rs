//! Service layer.
//!
//! Annotation logic separated from transport concerns, so the HTTP server and
//! the CLI drive the same pipeline.

pub mod annotation;

pub use annotation::Processor;
