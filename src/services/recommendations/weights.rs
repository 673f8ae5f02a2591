use std::collections::HashMap;

use ndarray::Axis;

use super::encoder::{Column, FeatureMatrix};
use super::features::{Attribute, CategoricalAttribute, NumericAttribute};

/// Weight for columns whose attribute has no entry
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Per-attribute importance applied to encoded columns before similarity
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeights {
    weights: HashMap<Attribute, f64>,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        use CategoricalAttribute as C;
        use NumericAttribute as N;

        Self::empty()
            .with_weight(Attribute::Categorical(C::Brand), 2.0)
            .with_weight(Attribute::Categorical(C::BodyType), 1.8)
            .with_weight(Attribute::Categorical(C::FuelType), 1.6)
            .with_weight(Attribute::Numeric(N::PriceRange), 1.5)
            .with_weight(Attribute::Numeric(N::EnginePower), 1.2)
            .with_weight(Attribute::Numeric(N::ProductionDate), 1.0)
            .with_weight(Attribute::Categorical(C::Transmission), 0.8)
            .with_weight(Attribute::Categorical(C::Color), 0.5)
            .with_weight(Attribute::Categorical(C::Wheel), 0.3)
    }
}

impl FeatureWeights {
    /// A table with no entries; every column weighs [`DEFAULT_WEIGHT`]
    pub fn empty() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    pub fn with_weight(mut self, attribute: Attribute, weight: f64) -> Self {
        self.weights.insert(attribute, weight);
        self
    }

    pub fn weight(&self, attribute: Attribute) -> f64 {
        self.weights
            .get(&attribute)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// One weight per column, resolved through the column's attribute
    pub fn column_weights(&self, columns: &[Column]) -> Vec<f64> {
        columns.iter().map(|c| self.weight(c.attribute)).collect()
    }

    /// Scales every column of `matrix` by its attribute weight
    pub fn apply(&self, mut matrix: FeatureMatrix, columns: &[Column]) -> FeatureMatrix {
        debug_assert_eq!(matrix.ncols(), columns.len());

        for (mut column, weight) in matrix
            .values
            .axis_iter_mut(Axis(1))
            .zip(self.column_weights(columns))
        {
            column *= weight;
        }

        matrix
    }
}
