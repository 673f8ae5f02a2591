use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::ListingResponse,
    services::recommendations,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    limit: Option<usize>,
}

/// Handler for personalized recommendations
pub async fn recommended(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let limit = params.limit.unwrap_or(state.recommendation_limit);
    let listings = recommendations::recommended_listings(
        state.store.as_ref(),
        &state.recommender,
        user_id,
        limit,
    )
    .await?;
    Ok(Json(listings))
}
