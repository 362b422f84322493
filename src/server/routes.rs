//! HTTP routes for `/api/get` and `/api/set`.
//!
//! Bodies are parsed here rather than with axum's `Json` extractor so that
//! malformed JSON gets the same [`ErrorBody`](crate::protocol::ErrorBody)
//! shape as every other failure.

use super::service::WhiteboardService;
use crate::error::Result;
use crate::protocol::{
    GetWhiteboardRequest, GetWhiteboardResponse, SetWhiteboardRequest, SetWhiteboardResponse,
    API_VERSION, GET_PATH, SET_PATH,
};
use axum::{extract::State, routing::post, Json, Router};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Router with both whiteboard routes and no middleware.
pub fn routes(service: Arc<WhiteboardService>) -> Router {
    Router::new()
        .route(GET_PATH, post(get_whiteboard))
        .route(SET_PATH, post(set_whiteboard))
        .with_state(service)
}

async fn get_whiteboard(
    State(service): State<Arc<WhiteboardService>>,
    body: Bytes,
) -> Result<Json<GetWhiteboardResponse>> {
    let request: GetWhiteboardRequest = parse_body(&body)?;
    check_api_version(request.api_version);
    Ok(Json(service.fetch(&request.identifier).await?))
}

async fn set_whiteboard(
    State(service): State<Arc<WhiteboardService>>,
    body: Bytes,
) -> Result<Json<SetWhiteboardResponse>> {
    let request: SetWhiteboardRequest = parse_body(&body)?;
    check_api_version(request.api_version);
    Ok(Json(service.update(request).await?))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let request: T = serde_json::from_slice(body)?;
    Ok(request)
}

fn check_api_version(version: Option<u32>) {
    if let Some(version) = version.filter(|v| *v != API_VERSION) {
        debug!(version, supported = API_VERSION, "request uses unknown api version");
    }
}
