use serde::{Deserialize, Serialize};

use crate::models::{Listing, ListingId};

/// Placeholder for a missing categorical value. It is encoded like any other
/// category so rows with gaps still line up.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Categorical attributes in column-layout order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalAttribute {
    Brand,
    BodyType,
    FuelType,
    Transmission,
    Color,
    Wheel,
}

impl CategoricalAttribute {
    pub const ALL: [CategoricalAttribute; 6] = [
        CategoricalAttribute::Brand,
        CategoricalAttribute::BodyType,
        CategoricalAttribute::FuelType,
        CategoricalAttribute::Transmission,
        CategoricalAttribute::Color,
        CategoricalAttribute::Wheel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoricalAttribute::Brand => "brand",
            CategoricalAttribute::BodyType => "bodyType",
            CategoricalAttribute::FuelType => "fuelType",
            CategoricalAttribute::Transmission => "vehicleTransmission",
            CategoricalAttribute::Color => "color",
            CategoricalAttribute::Wheel => "wheel",
        }
    }
}

/// Numeric attributes in column-layout order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericAttribute {
    PriceRange,
    EnginePower,
    ProductionDate,
}

impl NumericAttribute {
    pub const ALL: [NumericAttribute; 3] = [
        NumericAttribute::PriceRange,
        NumericAttribute::EnginePower,
        NumericAttribute::ProductionDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericAttribute::PriceRange => "price_range",
            NumericAttribute::EnginePower => "enginePower",
            NumericAttribute::ProductionDate => "productionDate",
        }
    }

    fn index(&self) -> usize {
        match self {
            NumericAttribute::PriceRange => 0,
            NumericAttribute::EnginePower => 1,
            NumericAttribute::ProductionDate => 2,
        }
    }
}

/// Any attribute that owns encoded columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    Categorical(CategoricalAttribute),
    Numeric(NumericAttribute),
}

/// The projection of a listing the recommender works on. Nulls have already
/// been normalized: numeric gaps are 0, categorical gaps are [`UNKNOWN_CATEGORY`].
#[derive(Debug, Clone, PartialEq)]
pub struct CarFeatures {
    pub car_id: ListingId,
    categorical: [String; 6],
    numeric: [f64; 3],
}

impl CarFeatures {
    pub fn new(car_id: ListingId) -> Self {
        Self {
            car_id,
            categorical: std::array::from_fn(|_| UNKNOWN_CATEGORY.to_string()),
            numeric: [0.0; 3],
        }
    }

    pub fn with_category(mut self, attribute: CategoricalAttribute, value: impl Into<String>) -> Self {
        self.categorical[attribute as usize] = value.into();
        self
    }

    pub fn with_numeric(mut self, attribute: NumericAttribute, value: f64) -> Self {
        self.numeric[attribute.index()] = value;
        self
    }

    pub fn category(&self, attribute: CategoricalAttribute) -> &str {
        &self.categorical[attribute as usize]
    }

    pub fn numeric(&self, attribute: NumericAttribute) -> f64 {
        self.numeric[attribute.index()]
    }

    pub fn price_range(&self) -> f64 {
        self.numeric(NumericAttribute::PriceRange)
    }

    pub fn production_date(&self) -> f64 {
        self.numeric(NumericAttribute::ProductionDate)
    }
}

fn category_or_unknown(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(UNKNOWN_CATEGORY)
        .to_string()
}

impl From<&Listing> for CarFeatures {
    fn from(listing: &Listing) -> Self {
        use CategoricalAttribute as C;
        use NumericAttribute as N;

        CarFeatures::new(listing.car_id)
            .with_category(C::Brand, category_or_unknown(&listing.brand))
            .with_category(C::BodyType, category_or_unknown(&listing.bodytype))
            .with_category(C::FuelType, category_or_unknown(&listing.fuel_type))
            .with_category(C::Transmission, category_or_unknown(&listing.vehicle_transmission))
            .with_category(C::Color, category_or_unknown(&listing.color))
            .with_category(C::Wheel, category_or_unknown(&listing.wheel))
            .with_numeric(N::PriceRange, listing.price_range.unwrap_or(0) as f64)
            .with_numeric(N::EnginePower, listing.engine_power.unwrap_or(0.0))
            .with_numeric(N::ProductionDate, listing.production_date.unwrap_or(0) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_listing(car_id: ListingId) -> Listing {
        Listing {
            car_id,
            seller_id: None,
            brand: None,
            model: None,
            bodytype: None,
            description: None,
            color: None,
            engine_displacement: None,
            engine_power: None,
            fuel_type: None,
            mileage: None,
            production_date: None,
            vehicle_transmission: None,
            owners: None,
            drive_type: None,
            wheel: None,
            price: None,
            vin: None,
            state_number: None,
            price_range: None,
            predicted_price_range: None,
        }
    }

    #[test]
    fn test_missing_values_are_normalized() {
        let features = CarFeatures::from(&bare_listing(4));
        assert_eq!(features.car_id, 4);
        for attribute in CategoricalAttribute::ALL {
            assert_eq!(features.category(attribute), UNKNOWN_CATEGORY);
        }
        for attribute in NumericAttribute::ALL {
            assert_eq!(features.numeric(attribute), 0.0);
        }
    }

    #[test]
    fn test_present_values_are_projected() {
        let listing = Listing {
            brand: Some("Kia".to_string()),
            wheel: Some("  ".to_string()),
            engine_power: Some(123.0),
            production_date: Some(2017),
            price_range: Some(3),
            ..bare_listing(9)
        };

        let features = CarFeatures::from(&listing);
        assert_eq!(features.category(CategoricalAttribute::Brand), "Kia");
        assert_eq!(features.category(CategoricalAttribute::Wheel), UNKNOWN_CATEGORY);
        assert_eq!(features.numeric(NumericAttribute::EnginePower), 123.0);
        assert_eq!(features.production_date(), 2017.0);
        assert_eq!(features.price_range(), 3.0);
    }
}
