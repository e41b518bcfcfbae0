//! Cart API routes

use axum::Router;
use domain_cart::{CartService, PgInventoryStore, handlers};

use crate::state::AppState;

/// Create cart router
pub fn router(state: &AppState) -> Router {
    let store = PgInventoryStore::new(state.db.clone());
    let service = CartService::new(store, state.config.reservation.clone());
    handlers::router(service)
}
