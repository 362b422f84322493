//! Tower middleware stack for the whiteboard routes.
//!
//! Browser editors call the API cross-origin, so every route sits behind a
//! CORS layer that answers preflight `OPTIONS` requests. Requests are traced
//! with `tower_http::trace` and bodies are capped at
//! [`ServerConfig::max_body_bytes`].
//!
//! # Usage
//!
//! ```
//! use whiteboard_sync::server::{HttpLayers, ServerConfig};
//!
//! let layers = HttpLayers::with_config(ServerConfig::default());
//! let app = layers.apply(axum::Router::new()).unwrap();
//! # let _ = app;
//! ```

use super::config::ServerConfig;
use crate::error::{Result, WhiteboardError};
use axum::Router;
use http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// How long browsers may cache a preflight response.
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Builds the middleware applied around the whiteboard routes.
#[derive(Clone, Debug, Default)]
pub struct HttpLayers {
    config: ServerConfig,
}

impl HttpLayers {
    /// Layers with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers honouring `config`'s origin and body limit.
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// The configuration used by these layers.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// CORS policy: `POST` and `OPTIONS` with a `Content-Type` header.
    ///
    /// # Errors
    ///
    /// [`WhiteboardError::Config`] if the configured origin is not a valid header value.
    pub fn cors(&self) -> Result<CorsLayer> {
        let origin = match &self.config.allowed_origin {
            Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|e| {
                WhiteboardError::Config(format!("invalid allowed origin '{}': {}", origin, e))
            })?),
            None => AllowOrigin::any(),
        };

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(PREFLIGHT_MAX_AGE))
    }

    /// Wrap `router` with body limit, CORS and tracing, outermost last.
    pub fn apply(&self, router: Router) -> Result<Router> {
        Ok(router
            .layer(RequestBodyLimitLayer::new(self.config.max_body_bytes))
            .layer(self.cors()?)
            .layer(TraceLayer::new_for_http()))
    }
}
