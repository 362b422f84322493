//! JSON request and response bodies for the whiteboard API.
//!
//! Field names are camelCase to match what browser editors already send.
//! Every `content` field holds a payload token (see [`super::encoding`]),
//! never raw document text.

use serde::{Deserialize, Serialize};

/// Current API version sent by clients.
pub const API_VERSION: u32 = 1;

/// Body of `POST /api/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWhiteboardRequest {
    /// Protocol version, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<u32>,
    /// Whiteboard identifier
    pub identifier: String,
}

/// Response to `POST /api/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWhiteboardResponse {
    /// Whiteboard identifier
    pub identifier: String,
    /// Payload token of the newest version
    pub content: String,
    /// Newest stored version
    pub version: u64,
}

/// Body of `POST /api/set`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWhiteboardRequest {
    /// Protocol version, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<u32>,
    /// Whiteboard identifier
    pub identifier: String,
    /// Version the edit was based on; `None` requests a two-way merge
    #[serde(default, rename = "sourceWhiteboardVersion")]
    pub source_version: Option<u64>,
    /// Payload token of the candidate document
    pub content: String,
}

/// Response to `POST /api/set`.
///
/// Comparing the three versions tells the client whether its optimistic
/// assumption held: if `request_source_version == existing_newest_version`
/// its content was stored verbatim, otherwise it was merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWhiteboardResponse {
    /// Whiteboard identifier
    pub identifier: String,
    /// Payload token of the committed (possibly merged) document
    pub content: String,
    /// Source version the request declared
    #[serde(rename = "requestSourceWhiteboardVersion")]
    pub request_source_version: Option<u64>,
    /// Newest version at the time the committing attempt read the store
    #[serde(rename = "existingNewestWhiteboardVersion")]
    pub existing_newest_version: u64,
    /// Version this request committed
    #[serde(rename = "currentNewestWhiteboardVersion")]
    pub committed_version: u64,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Whether resubmitting the same request may succeed
    pub retryable: bool,
}
