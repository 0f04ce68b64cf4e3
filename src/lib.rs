//! concept-annotator - concept annotation service for clinical free text.
//!
//! Documents are submitted one at a time or in bulk; each comes back with
//! the concepts found in it (CUI, span, accuracy). Bulk requests are fanned
//! out across blocking workers and reassembled in input order.

pub mod cli;
pub mod config;
pub mod engine;
pub mod models;
pub mod server;
pub mod services;
