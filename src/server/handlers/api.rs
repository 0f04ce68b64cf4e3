//! API endpoint handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::super::AppState;
use super::api_types::{bad_request, internal_error, ProcessResponse};
use crate::models::{parse_bulk, parse_single};

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Service identity.
pub async fn api_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.processor.app_info().clone())
}

/// Annotate a single document.
pub async fn api_process(State(state): State<AppState>, body: Bytes) -> Response {
    let document = match parse_single(&body) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!("Rejected single payload: {:?}", e);
            return bad_request();
        }
    };

    let processor = state.processor.clone();
    let outcome = tokio::spawn(async move { processor.process_one(document).await }).await;

    match outcome {
        Ok(Ok(result)) => Json(ProcessResponse {
            result,
            service_info: state.processor.app_info().clone(),
        })
        .into_response(),
        Ok(Err(e)) => internal_error(e),
        Err(e) => internal_error(e),
    }
}

/// Annotate a list of documents, returning results in input order.
pub async fn api_process_bulk(State(state): State<AppState>, body: Bytes) -> Response {
    let documents = match parse_bulk(&body) {
        Ok(documents) => documents,
        Err(e) => {
            tracing::debug!("Rejected bulk payload: {:?}", e);
            return bad_request();
        }
    };

    tracing::info!(documents = documents.len(), "Bulk annotation request");

    let processor = state.processor.clone();
    match tokio::spawn(async move { processor.process_bulk(documents).await }).await {
        Ok(result) => Json(ProcessResponse {
            result,
            service_info: state.processor.app_info().clone(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}
