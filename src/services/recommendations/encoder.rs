use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;

use super::features::{Attribute, CarFeatures, CategoricalAttribute, NumericAttribute};
use crate::models::ListingId;

/// One encoded column and the attribute it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub attribute: Attribute,
    pub label: String,
}

/// Mean and scale of one numeric attribute
#[derive(Debug, Clone, Copy, PartialEq)]
struct Standardizer {
    mean: f64,
    scale: f64,
}

impl Standardizer {
    /// Population standard deviation. A constant column keeps scale 1.0 so
    /// every value maps to 0.0 instead of dividing by zero.
    fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                scale: 1.0,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        let scale = if std.is_finite() && std > f64::EPSILON {
            std
        } else {
            1.0
        };

        Self { mean, scale }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Encoded rows with the listing id of each row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub ids: Vec<ListingId>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

/// One-hot encoder for the categorical attributes plus a standard scaler for
/// the numeric ones, fitted together on one corpus.
///
/// The column layout is fixed at fit time: every categorical attribute in
/// [`CategoricalAttribute::ALL`] order with its observed values sorted, then
/// every numeric attribute in [`NumericAttribute::ALL`] order. Any subset
/// transformed by the same encoder gets exactly these columns.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    vocabulary: HashMap<(CategoricalAttribute, String), usize>,
    numeric_offset: usize,
    standardizers: Vec<(NumericAttribute, Standardizer)>,
    columns: Vec<Column>,
}

impl FeatureEncoder {
    pub fn fit(corpus: &[&CarFeatures]) -> Self {
        let mut vocabulary = HashMap::new();
        let mut columns = Vec::new();

        for attribute in CategoricalAttribute::ALL {
            let values: BTreeSet<&str> = corpus.iter().map(|car| car.category(attribute)).collect();

            for value in values {
                vocabulary.insert((attribute, value.to_string()), columns.len());
                columns.push(Column {
                    attribute: Attribute::Categorical(attribute),
                    label: format!("{}_{}", attribute.name(), value),
                });
            }
        }

        let numeric_offset = columns.len();
        let standardizers = NumericAttribute::ALL
            .iter()
            .map(|&attribute| {
                let values: Vec<f64> = corpus.iter().map(|car| car.numeric(attribute)).collect();
                columns.push(Column {
                    attribute: Attribute::Numeric(attribute),
                    label: attribute.name().to_string(),
                });
                (attribute, Standardizer::fit(&values))
            })
            .collect();

        tracing::debug!(
            corpus_size = corpus.len(),
            columns = columns.len(),
            "Fitted feature encoder"
        );

        Self {
            vocabulary,
            numeric_offset,
            standardizers,
            columns,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column index of a categorical value, if it was seen during fit
    pub fn column_of(&self, attribute: CategoricalAttribute, value: &str) -> Option<usize> {
        self.vocabulary.get(&(attribute, value.to_string())).copied()
    }

    /// Encodes `listings` against the fitted layout. Categorical values not
    /// seen during fit leave that attribute's indicator block all zero.
    pub fn transform(&self, listings: &[CarFeatures]) -> FeatureMatrix {
        let mut values = Array2::<f64>::zeros((listings.len(), self.width()));

        for (row, car) in listings.iter().enumerate() {
            for attribute in CategoricalAttribute::ALL {
                if let Some(col) = self.column_of(attribute, car.category(attribute)) {
                    values[[row, col]] = 1.0;
                }
            }

            for (i, (attribute, standardizer)) in self.standardizers.iter().enumerate() {
                values[[row, self.numeric_offset + i]] = standardizer.apply(car.numeric(*attribute));
            }
        }

        FeatureMatrix {
            ids: listings.iter().map(|car| car.car_id).collect(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CategoricalAttribute as C;
    use NumericAttribute as N;

    fn car(id: ListingId, brand: &str, color: &str, power: f64) -> CarFeatures {
        CarFeatures::new(id)
            .with_category(C::Brand, brand)
            .with_category(C::BodyType, "sedan")
            .with_category(C::FuelType, "petrol")
            .with_category(C::Transmission, "automatic")
            .with_category(C::Color, color)
            .with_category(C::Wheel, "left")
            .with_numeric(N::PriceRange, 2.0)
            .with_numeric(N::EnginePower, power)
            .with_numeric(N::ProductionDate, 2018.0)
    }

    #[test]
    fn test_column_layout_is_sorted_per_attribute() {
        let a = car(1, "Volvo", "red", 150.0);
        let b = car(2, "Audi", "black", 250.0);
        let encoder = FeatureEncoder::fit(&[&a, &b]);

        let labels: Vec<&str> = encoder.columns().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "brand_Audi",
                "brand_Volvo",
                "bodyType_sedan",
                "fuelType_petrol",
                "vehicleTransmission_automatic",
                "color_black",
                "color_red",
                "wheel_left",
                "price_range",
                "enginePower",
                "productionDate",
            ]
        );
        assert_eq!(
            encoder.columns()[0].attribute,
            Attribute::Categorical(C::Brand)
        );
        assert_eq!(
            encoder.columns()[9].attribute,
            Attribute::Numeric(N::EnginePower)
        );
    }

    #[test]
    fn test_subsets_share_the_fitted_columns() {
        let sale = vec![car(1, "Volvo", "red", 150.0), car(2, "Audi", "black", 250.0)];
        let liked = vec![car(3, "Lada", "green", 90.0)];
        let own: Vec<CarFeatures> = Vec::new();

        let corpus: Vec<&CarFeatures> = sale.iter().chain(liked.iter()).chain(own.iter()).collect();
        let encoder = FeatureEncoder::fit(&corpus);

        let sale_m = encoder.transform(&sale);
        let liked_m = encoder.transform(&liked);
        let own_m = encoder.transform(&own);

        assert_eq!(sale_m.ncols(), encoder.width());
        assert_eq!(liked_m.ncols(), encoder.width());
        assert_eq!(own_m.ncols(), encoder.width());
        assert_eq!(own_m.nrows(), 0);

        // The liked brand is only in the liked set but still has its own column
        let lada = encoder.column_of(C::Brand, "Lada").unwrap();
        assert_eq!(liked_m.values[[0, lada]], 1.0);
        assert_eq!(sale_m.values[[0, lada]], 0.0);
        assert_eq!(liked_m.ids, vec![3]);
    }

    #[test]
    fn test_unseen_category_encodes_as_zeros() {
        let fitted = car(1, "Volvo", "red", 150.0);
        let encoder = FeatureEncoder::fit(&[&fitted]);

        let stranger = car(2, "Tesla", "red", 150.0);
        let m = encoder.transform(&[stranger]);

        let volvo = encoder.column_of(C::Brand, "Volvo").unwrap();
        assert_eq!(m.values[[0, volvo]], 0.0);
        assert_eq!(encoder.column_of(C::Brand, "Tesla"), None);
        let red = encoder.column_of(C::Color, "red").unwrap();
        assert_eq!(m.values[[0, red]], 1.0);
    }

    #[test]
    fn test_unknown_token_is_just_another_category() {
        let gap = CarFeatures::new(5);
        let encoder = FeatureEncoder::fit(&[&gap]);
        let m = encoder.transform(&[gap.clone()]);

        let unknown_brand = encoder.column_of(C::Brand, "unknown").unwrap();
        assert_eq!(m.values[[0, unknown_brand]], 1.0);
    }

    #[test]
    fn test_numeric_columns_are_standardized() {
        let a = car(1, "Volvo", "red", 100.0);
        let b = car(2, "Volvo", "red", 300.0);
        let encoder = FeatureEncoder::fit(&[&a, &b]);
        let m = encoder.transform(&[a, b]);

        let power = encoder.width() - 2;
        // mean 200, population std 100
        assert!((m.values[[0, power]] + 1.0).abs() < 1e-12);
        assert!((m.values[[1, power]] - 1.0).abs() < 1e-12);

        // year is constant so it standardizes to zero
        let year = encoder.width() - 1;
        assert_eq!(m.values[[0, year]], 0.0);
        assert_eq!(m.values[[1, year]], 0.0);
    }
}
