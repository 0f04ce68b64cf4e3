//! Response types and error responses for the annotation API.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::models::AppInfo;

/// Envelope for both annotation endpoints.
#[derive(Debug, Serialize)]
pub struct ProcessResponse<T> {
    pub result: T,
    pub service_info: AppInfo,
}

/// 400 for a payload that is not the expected JSON shape.
pub fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "Input Payload should be JSON").into_response()
}

/// 500 for anything that went wrong while processing.
pub fn internal_error(error: impl Display) -> Response {
    tracing::error!("Annotation request failed: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal processing error {}", error),
    )
        .into_response()
}
