use ndarray::{concatenate, Array1, ArrayView2, Axis};

use super::encoder::FeatureMatrix;

/// Mean of all rows across the given matrices.
///
/// Every row counts once, so a user with many likes and one own listing is
/// dominated by the likes. Returns `None` when there are no rows at all.
pub fn build_profile(parts: &[&FeatureMatrix]) -> Option<Array1<f64>> {
    let views: Vec<ArrayView2<f64>> = parts
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| m.values.view())
        .collect();

    if views.is_empty() {
        return None;
    }

    let stacked = concatenate(Axis(0), &views).ok()?;
    stacked.mean_axis(Axis(0))
}
