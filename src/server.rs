//! HTTP transport.
//!
//! Serves the SOAP endpoint under the configured path, a JSON rendition of
//! the lookup, and a health probe.
//!
//! The health counters come from the SOAP dispatcher; JSON lookups are not
//! counted.

use crate::dispatcher::MessageDispatcher;
use crate::endpoint::{CountryEndpoint, GetCountryRequest, GetCountryResponse};
use axum::{
    body::{to_bytes, Body},
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,
    pub endpoint: Arc<CountryEndpoint>,
}

impl AppState {
    pub fn new(dispatcher: Arc<MessageDispatcher>, endpoint: Arc<CountryEndpoint>) -> Self {
        Self {
            dispatcher,
            endpoint,
        }
    }
}

/// Build the router with the SOAP endpoint mounted at `soap_path`.
pub fn create_router(state: AppState, soap_path: &str) -> Router {
    let max_body_size = state.dispatcher.max_body_size();
    Router::new()
        .route(soap_path, post(soap_handler))
        .route(&format!("{}/*rest", soap_path), post(soap_handler))
        .route("/api/getCountry", post(json_handler))
        .route("/health", get(health_handler))
        // Applies to the JSON extractor; SOAP bodies are capped in `soap_handler`.
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn soap_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let soap_action = headers.get("soapaction").and_then(|v| v.to_str().ok());

    let response = match to_bytes(body, state.dispatcher.max_body_size()).await {
        Ok(bytes) => state.dispatcher.dispatch(content_type, soap_action, &bytes),
        Err(e) => {
            warn!(error = %e, "Failed to read SOAP request body");
            state.dispatcher.reject_oversized(content_type)
        }
    };
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}

async fn json_handler(
    State(state): State<AppState>,
    Json(request): Json<GetCountryRequest>,
) -> Json<GetCountryResponse> {
    Json(state.endpoint.handle(&request))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let metrics = state.dispatcher.metrics();
    Json(json!({
        "status": "healthy",
        "countries": state.endpoint.repository().len(),
        "requests_processed": metrics.requests_processed,
        "faults_returned": metrics.faults_returned,
    }))
}
