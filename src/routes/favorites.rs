use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{FavoriteResponse, ListingId, ListingResponse},
    services::listings,
};

pub async fn add(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(car_id): Path<ListingId>,
) -> AppResult<Json<FavoriteResponse>> {
    let status = listings::add_favorite(state.store.as_ref(), user_id, car_id).await?;
    Ok(Json(FavoriteResponse { status }))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(car_id): Path<ListingId>,
) -> AppResult<Json<FavoriteResponse>> {
    let status = listings::remove_favorite(state.store.as_ref(), user_id, car_id).await?;
    Ok(Json(FavoriteResponse { status }))
}

/// Handler for the caller's favorites, oldest like first
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let listings = listings::favorite_listings(state.store.as_ref(), user_id).await?;
    Ok(Json(listings))
}
