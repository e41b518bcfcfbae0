//! # Axum Helpers
//!
//! Shared HTTP plumbing for the storefront services.
//!
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: `AppError`, error codes, OpenAPI error responses
//! - **[`extractors`]**: UUID path, validated JSON/query, `X-User-ID`
//!
//! ```ignore
//! use axum_helpers::server::{create_router, create_production_app, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes).await?;
//! let app = router.merge(health_router(app_info!()));
//! create_production_app(app, &config.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};

pub use http::{cors_layer_from_env, create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{USER_ID_HEADER, UserId, UuidPath, ValidatedJson, ValidatedQuery, ensure_user_id};
