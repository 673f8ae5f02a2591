use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{CreatedListing, ListingDetails, ListingId, ListingResponse, NewListing},
    services::listings,
};

/// Handler for publishing a listing
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(listing): Json<NewListing>,
) -> AppResult<(StatusCode, Json<CreatedListing>)> {
    let car_id = listings::create_listing(
        state.store.as_ref(),
        state.scorer.as_ref(),
        user_id,
        listing,
        state.reference_year,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedListing {
            message: "Created".to_string(),
            car_id,
        }),
    ))
}

/// Public listing page, no session needed
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<ListingId>,
) -> AppResult<Json<ListingDetails>> {
    let details = listings::listing_details(state.store.as_ref(), car_id).await?;
    Ok(Json(details))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(car_id): Path<ListingId>,
) -> AppResult<Json<Value>> {
    listings::delete_listing(state.store.as_ref(), user_id, car_id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}

/// Handler for the caller's own listings
pub async fn mine(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let listings = listings::seller_listings(state.store.as_ref(), user_id).await?;
    Ok(Json(listings))
}
