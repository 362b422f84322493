//! Wire format shared by the server and the client.
//!
//! - **[encoding]** - payload tokens (zlib + base64) for document content
//! - **[messages]** - JSON bodies of `/api/get` and `/api/set`

pub mod encoding;
pub mod messages;

pub use encoding::{decode, decode_with_limit, encode, DEFAULT_MAX_DOCUMENT_BYTES};
pub use messages::{
    ErrorBody, GetWhiteboardRequest, GetWhiteboardResponse, SetWhiteboardRequest,
    SetWhiteboardResponse, API_VERSION,
};

/// Route for fetching a whiteboard.
pub const GET_PATH: &str = "/api/get";
/// Route for updating a whiteboard.
pub const SET_PATH: &str = "/api/set";
