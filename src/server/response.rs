//! Error responses.
//!
//! Every failure leaves the server as a JSON [`ErrorBody`] with a status
//! derived from the error kind:
//!
//! | Status | Errors |
//! |--------|--------|
//! | `400 Bad Request` | `Parse`, `MalformedElement`, `Encoding`, `Json` |
//! | `409 Conflict` | `SourceVersionNotFound` |
//! | `503 Service Unavailable` | `ConcurrentUpdateExhausted` |
//! | `500 Internal Server Error` | everything else |

use crate::error::WhiteboardError;
use crate::protocol::ErrorBody;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use tracing::{error, warn};

/// HTTP status for an error.
#[must_use]
pub fn status_for(err: &WhiteboardError) -> StatusCode {
    match err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        WhiteboardError::SourceVersionNotFound { .. } => StatusCode::CONFLICT,
        WhiteboardError::ConcurrentUpdateExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for WhiteboardError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            retryable: self.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}
