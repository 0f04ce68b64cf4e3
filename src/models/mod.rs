//! Data models for request payloads and annotation results.

mod app_info;
mod document;
mod payload;

pub use app_info::AppInfo;
pub use document::{
    timestamp, Annotations, DocumentResult, InputDocument, MISSING_TEXT_ERROR,
    UNFILLED_SLOT_ERROR,
};
pub use payload::{parse_bulk, parse_single, PayloadError};
