use super::features::CarFeatures;
use crate::models::ListingId;

/// Ranking for users with no likes and no listings of their own: cheapest
/// bracket first, newer cars first within a bracket, then input order.
pub fn cold_start(inventory: &[CarFeatures], top_n: usize) -> Vec<ListingId> {
    let mut ordered: Vec<&CarFeatures> = inventory.iter().collect();
    ordered.sort_by(|a, b| {
        a.price_range()
            .total_cmp(&b.price_range())
            .then_with(|| b.production_date().total_cmp(&a.production_date()))
    });

    ordered
        .into_iter()
        .take(top_n)
        .map(|car| car.car_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recommendations::features::NumericAttribute;

    fn car(id: ListingId, bracket: f64, year: f64) -> CarFeatures {
        CarFeatures::new(id)
            .with_numeric(NumericAttribute::PriceRange, bracket)
            .with_numeric(NumericAttribute::ProductionDate, year)
    }

    #[test]
    fn test_bracket_then_newest() {
        let inventory = vec![car(1, 2.0, 2015.0), car(2, 1.0, 2020.0), car(3, 1.0, 2018.0)];
        assert_eq!(cold_start(&inventory, 20), vec![2, 3, 1]);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let inventory = vec![car(1, 2.0, 2015.0), car(2, 1.0, 2020.0), car(3, 1.0, 2018.0)];
        assert_eq!(cold_start(&inventory, 1), vec![2]);
        assert!(cold_start(&inventory, 0).is_empty());
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let inventory = vec![car(8, 1.0, 2019.0), car(4, 1.0, 2019.0), car(6, 0.0, 2010.0)];
        assert_eq!(cold_start(&inventory, 3), vec![6, 8, 4]);
    }
}
