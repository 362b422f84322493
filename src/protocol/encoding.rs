//! Reversible compression of document payloads for storage and transport.
//!
//! A token is the zlib-compressed UTF-8 text, base64 encoded with the
//! standard padded alphabet. This is the same format browser editors produce
//! with `pako.deflate` followed by base64, so tokens pass through unchanged.
//!
//! # Examples
//!
//! ```
//! use whiteboard_sync::protocol::{decode, encode};
//!
//! let token = encode("<mxGraphModel/>").unwrap();
//! assert_eq!(decode(&token).unwrap(), "<mxGraphModel/>");
//! assert_eq!(decode("").unwrap(), "");
//! ```

use crate::error::{Result, WhiteboardError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Compress and base64-encode document text.
pub fn encode(text: &str) -> Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(text.len() / 2), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Largest inflated document [`decode`] accepts.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 64 * 1024 * 1024;

/// Decode a token produced by [`encode`].
///
/// An empty (or whitespace-only) token is the empty document. The inflated
/// text may be at most [`DEFAULT_MAX_DOCUMENT_BYTES`] long.
///
/// # Errors
///
/// [`WhiteboardError::Encoding`] if the token is not base64, not a zlib
/// stream, inflates past the size limit, or does not inflate to UTF-8.
pub fn decode(token: &str) -> Result<String> {
    decode_with_limit(token, DEFAULT_MAX_DOCUMENT_BYTES)
}

/// [`decode`] with an explicit cap on the inflated size in bytes.
pub fn decode_with_limit(token: &str, max_bytes: usize) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(String::new());
    }

    let compressed = STANDARD
        .decode(token)
        .map_err(|e| WhiteboardError::Encoding(format!("invalid base64: {}", e)))?;

    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut inflated = Vec::with_capacity((compressed.len() * 4).min(max_bytes));
    ZlibDecoder::new(compressed.as_slice())
        .take(limit)
        .read_to_end(&mut inflated)
        .map_err(|e| WhiteboardError::Encoding(format!("invalid zlib stream: {}", e)))?;

    if inflated.len() > max_bytes {
        return Err(WhiteboardError::Encoding(format!(
            "document inflates past {} bytes",
            max_bytes
        )));
    }

    String::from_utf8(inflated)
        .map_err(|e| WhiteboardError::Encoding(format!("payload is not UTF-8: {}", e)))
}
