use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::models::{Listing, ListingResponse, NewListing, Photo, PriceBadge};

/// Bracket returned whenever the model cannot give an answer
pub const NEUTRAL_BRACKET: i32 = 0;

const BRACKET_WIDTH: f64 = 500_000.0;
const TOP_BRACKET: i32 = 10;

/// Bracket of an asking price: 0 up to 500 000, one step per further
/// 500 000, and 10 for anything above 5 000 000.
pub fn price_to_range(price: f64) -> i32 {
    if price <= BRACKET_WIDTH {
        return 0;
    }
    let bracket = (price / BRACKET_WIDTH).ceil() as i32 - 1;
    bracket.min(TOP_BRACKET)
}

/// Compares the asking bracket with the model estimate
pub fn price_badge(actual: i32, predicted: i32) -> PriceBadge {
    match predicted.cmp(&actual) {
        std::cmp::Ordering::Greater => PriceBadge::Low,
        std::cmp::Ordering::Equal => PriceBadge::Good,
        std::cmp::Ordering::Less => PriceBadge::High,
    }
}

pub fn to_response(listing: Listing, photos: Vec<Photo>) -> ListingResponse {
    let price_badge = match (listing.price_range, listing.predicted_price_range) {
        (Some(actual), Some(predicted)) => Some(price_badge(actual, predicted)),
        _ => None,
    };
    ListingResponse {
        listing,
        price_badge,
        photos,
    }
}

/// Attributes the price model was trained on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingFeatures {
    pub body_type: String,
    pub brand: String,
    pub color: String,
    pub fuel_type: String,
    #[serde(rename = "model_name")]
    pub model_name: String,
    pub vehicle_transmission: String,
    pub drivetrains: String,
    pub wheel: String,
    pub engine_displacement: f64,
    pub engine_power: i32,
    pub mileage: i32,
    pub production_date: i32,
    pub owners: i32,
    #[serde(rename = "car_age")]
    pub car_age: i32,
}

impl PricingFeatures {
    pub fn from_listing(listing: &NewListing, reference_year: i32) -> Self {
        Self {
            body_type: listing.bodytype.clone(),
            brand: listing.brand.clone(),
            color: listing.color.clone(),
            fuel_type: listing.fuel_type.clone(),
            model_name: listing.model.clone(),
            vehicle_transmission: listing.vehicle_transmission.clone(),
            drivetrains: listing.drive_type.clone(),
            wheel: listing.wheel.clone(),
            engine_displacement: listing.engine_displacement,
            engine_power: listing.engine_power,
            mileage: listing.mileage,
            production_date: listing.production_date,
            owners: listing.owners,
            car_age: reference_year - listing.production_date,
        }
    }
}

/// Pretrained price-bracket model. Never fails: an unavailable or broken
/// model yields [`NEUTRAL_BRACKET`].
#[async_trait::async_trait]
pub trait PriceScorer: Send + Sync {
    async fn predict_bracket(&self, features: &PricingFeatures) -> i32;

    /// Scorer name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    price_range: i32,
}

/// Calls a model-serving endpoint over HTTP
#[derive(Clone)]
pub struct HttpPriceScorer {
    http_client: HttpClient,
    endpoint: Option<String>,
}

impl HttpPriceScorer {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for price model");
                HttpClient::new()
            });

        if endpoint.is_none() {
            tracing::warn!("No price model configured, predictions will be neutral");
        }

        Self {
            http_client,
            endpoint,
        }
    }

    async fn call_model(&self, endpoint: &str, features: &PricingFeatures) -> crate::error::AppResult<i32> {
        let response = self
            .http_client
            .post(endpoint)
            .json(features)
            .send()
            .await?
            .error_for_status()?;

        let prediction: PredictionResponse = response.json().await?;
        Ok(prediction.price_range)
    }
}

#[async_trait::async_trait]
impl PriceScorer for HttpPriceScorer {
    async fn predict_bracket(&self, features: &PricingFeatures) -> i32 {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return NEUTRAL_BRACKET;
        };

        match self.call_model(endpoint, features).await {
            Ok(bracket) => {
                tracing::debug!(bracket, brand = %features.brand, "Price model prediction");
                bracket
            }
            Err(e) => {
                tracing::warn!(error = %e, "Price model unavailable, using neutral bracket");
                NEUTRAL_BRACKET
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
