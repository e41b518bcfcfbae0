//! Readiness endpoint

use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};

use crate::state::AppState;

async fn ready(State(state): State<AppState>) -> Response {
    let database: HealthCheckFuture = Box::pin(async {
        database::postgres::check_health(&state.db)
            .await
            .map_err(|e| e.to_string())
    });

    run_health_checks(vec![("database", database)]).await
}

/// Router exposing `GET /ready`
pub fn router(state: AppState) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
