use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::extractors::USER_ID_HEADER;

/// CORS layer for the storefront API.
///
/// `X-User-ID` is both accepted and exposed so browser clients can read an
/// id issued by the server.
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, USER_ID_HEADER])
        .expose_headers([USER_ID_HEADER])
        .max_age(Duration::from_secs(3600))
}

/// Reads comma-separated origins from `CORS_ALLOWED_ORIGIN`.
///
/// Unset means same-origin only (no CORS headers are granted).
pub fn cors_layer_from_env() -> io::Result<CorsLayer> {
    let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGIN") else {
        warn!("CORS_ALLOWED_ORIGIN not set, cross-origin requests will be rejected");
        return Ok(create_cors_layer(Vec::new()));
    };

    let allowed = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    info!(origins = %origins, "CORS configured");
    Ok(create_cors_layer(allowed))
}
