//! Route definitions for the Stock Ledger backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public + protected profile)
        .nest("/auth", auth_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - stock movements
        .nest("/movements", movement_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .merge(protected_auth_routes())
}

/// Protected authentication routes
fn protected_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(handlers::profile))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/code/:code", get(handlers::get_product_by_code))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock movement routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/inbound", post(handlers::record_inbound))
        .route("/outbound", post(handlers::record_outbound))
        .route("/", get(handlers::list_movements))
        .route("/:movement_id", get(handlers::get_movement))
        .route("/:movement_id/void", post(handlers::void_movement))
        .route("/:movement_id/quantity", put(handlers::update_movement_quantity))
        .route("/:movement_id/product", put(handlers::reassign_movement_product))
        .route_layer(middleware::from_fn(auth_middleware))
}
