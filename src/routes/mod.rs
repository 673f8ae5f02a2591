use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::ListingStore,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{PriceScorer, Recommender},
};

pub mod favorites;
pub mod listings;
pub mod recommendations;

/// Shared handler state
pub struct AppState {
    pub store: Arc<dyn ListingStore>,
    pub scorer: Arc<dyn PriceScorer>,
    pub recommender: Recommender,
    pub reference_year: i32,
    pub recommendation_limit: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ListingStore>,
        scorer: Arc<dyn PriceScorer>,
        reference_year: i32,
        recommendation_limit: usize,
    ) -> Self {
        Self {
            store,
            scorer,
            recommender: Recommender::default(),
            reference_year,
            recommendation_limit,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Listings
        .route("/cars", post(listings::create))
        .route("/cars/recommended", get(recommendations::recommended))
        .route("/cars/:car_id", get(listings::details).delete(listings::remove))
        .route("/user/cars", get(listings::mine))
        // Favorites
        .route(
            "/favorites/:car_id",
            post(favorites::add).delete(favorites::remove),
        )
        .route("/user/favorites", get(favorites::list))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
