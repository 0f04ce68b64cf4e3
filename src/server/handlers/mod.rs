//! HTTP request handlers for the web server.

mod api;
mod api_types;

pub use api::{api_info, api_process, api_process_bulk, health};
