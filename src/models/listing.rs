use serde::{Deserialize, Deserializer, Serialize};

pub type ListingId = i64;
pub type UserId = i64;

/// A car-for-sale row as persisted. Every attribute is nullable because
/// listings are also bulk-imported from partial data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Listing {
    pub car_id: ListingId,
    pub seller_id: Option<UserId>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub bodytype: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub engine_displacement: Option<f64>,
    pub engine_power: Option<f64>,
    pub fuel_type: Option<String>,
    pub mileage: Option<i32>,
    pub production_date: Option<i32>,
    pub vehicle_transmission: Option<String>,
    pub owners: Option<i32>,
    pub drive_type: Option<String>,
    pub wheel: Option<String>,
    pub price: Option<f64>,
    pub vin: Option<String>,
    pub state_number: Option<String>,
    /// Bracket of the asking price
    pub price_range: Option<i32>,
    /// Bracket the price model estimated from the attributes
    pub predicted_price_range: Option<i32>,
}

impl Listing {
    pub fn from_new(
        car_id: ListingId,
        seller_id: UserId,
        listing: &NewListing,
        brackets: PriceBrackets,
    ) -> Self {
        Self {
            car_id,
            seller_id: Some(seller_id),
            brand: Some(listing.brand.clone()),
            model: Some(listing.model.clone()),
            bodytype: Some(listing.bodytype.clone()),
            description: listing.description.clone(),
            color: Some(listing.color.clone()),
            engine_displacement: Some(listing.engine_displacement),
            engine_power: Some(listing.engine_power as f64),
            fuel_type: Some(listing.fuel_type.clone()),
            mileage: Some(listing.mileage),
            production_date: Some(listing.production_date),
            vehicle_transmission: Some(listing.vehicle_transmission.clone()),
            owners: Some(listing.owners),
            drive_type: Some(listing.drive_type.clone()),
            wheel: Some(listing.wheel.clone()),
            price: Some(listing.price),
            vin: Some(listing.vin.clone()),
            state_number: Some(listing.state_number.clone()),
            price_range: Some(brackets.actual),
            predicted_price_range: Some(brackets.predicted),
        }
    }
}

/// Request body for creating a listing
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewListing {
    pub brand: String,
    pub model: String,
    pub production_date: i32,
    pub mileage: i32,
    #[serde(deserialize_with = "lenient_displacement")]
    pub engine_displacement: f64,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub bodytype: String,
    pub color: String,
    pub fuel_type: String,
    pub vehicle_transmission: String,
    pub owners: i32,
    pub drive_type: String,
    pub wheel: String,
    pub engine_power: i32,
    pub vin: String,
    pub state_number: String,
}

/// Actual and model-estimated brackets computed before a listing is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBrackets {
    pub actual: i32,
    pub predicted: i32,
}

/// Accepts either a number or free text such as `"2.0 L"`.
/// Text that does not parse becomes 0.0.
fn lenient_displacement<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(text) => parse_displacement(&text),
    })
}

pub fn parse_displacement(raw: &str) -> f64 {
    raw.split(['L', 'l'])
        .next()
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Whether the asking price sits under, at, or over the model's estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceBadge {
    /// Asking price below market
    Low,
    Good,
    High,
}

/// Listing as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    pub price_badge: Option<PriceBadge>,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Photo {
    pub photo_url: String,
}

/// Account data this service reads; accounts themselves are issued elsewhere
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: String,
}

/// Seller block of the listing details view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct SellerSummary {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub seller_phone: String,
    pub sales_count: i64,
}

/// Single-listing view with seller information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDetails {
    #[serde(flatten)]
    pub listing: ListingResponse,
    pub user_id: Option<UserId>,
    pub seller: Option<SellerSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteStatus {
    Added,
    Exists,
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteResponse {
    pub status: FavoriteStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedListing {
    pub message: String,
    pub car_id: ListingId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_listing_json(displacement: serde_json::Value) -> serde_json::Value {
        json!({
            "brand": "Toyota",
            "model": "Camry",
            "production_date": 2019,
            "mileage": 45000,
            "engine_displacement": displacement,
            "price": 2_300_000.0,
            "bodytype": "sedan",
            "color": "white",
            "fuel_type": "petrol",
            "vehicle_transmission": "automatic",
            "owners": 1,
            "drive_type": "front",
            "wheel": "left",
            "engine_power": 181,
            "vin": "JT2BF22K1W0123456",
            "state_number": "A123BC77"
        })
    }

    #[test]
    fn test_parse_displacement_with_unit() {
        assert_eq!(parse_displacement("2.0 L"), 2.0);
        assert_eq!(parse_displacement("1.6L"), 1.6);
        assert_eq!(parse_displacement(" 3.5 "), 3.5);
    }

    #[test]
    fn test_parse_displacement_garbage_is_zero() {
        assert_eq!(parse_displacement("electric"), 0.0);
        assert_eq!(parse_displacement(""), 0.0);
    }

    #[test]
    fn test_new_listing_accepts_numeric_displacement() {
        let listing: NewListing = serde_json::from_value(new_listing_json(json!(2.5))).unwrap();
        assert_eq!(listing.engine_displacement, 2.5);
        assert_eq!(listing.description, None);
    }

    #[test]
    fn test_new_listing_accepts_text_displacement() {
        let listing: NewListing =
            serde_json::from_value(new_listing_json(json!("2.5 L"))).unwrap();
        assert_eq!(listing.engine_displacement, 2.5);
    }

    #[test]
    fn test_favorite_status_serialization() {
        let body = FavoriteResponse {
            status: FavoriteStatus::Exists,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "status": "exists" })
        );
    }

    #[test]
    fn test_price_badge_serialization() {
        assert_eq!(serde_json::to_string(&PriceBadge::Low).unwrap(), "\"low\"");
        assert_eq!(serde_json::to_string(&PriceBadge::High).unwrap(), "\"high\"");
    }
}
