use ndarray::{Array1, ArrayView1};

use super::encoder::FeatureMatrix;
use crate::models::ListingId;

/// Cosine similarity; a zero-norm side scores 0.0
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        a.dot(&b) / (norm_a * norm_b)
    }
}

/// A sale listing and its similarity to the profile
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredListing {
    car_id: ListingId,
    similarity: f64,
}

/// Scores every row of `sale` against `profile`, most similar first.
/// Equal scores keep their row order.
fn score(profile: &Array1<f64>, sale: &FeatureMatrix) -> Vec<ScoredListing> {
    let mut scored: Vec<ScoredListing> = sale
        .ids
        .iter()
        .zip(sale.values.rows())
        .map(|(&car_id, row)| ScoredListing {
            car_id,
            similarity: cosine_similarity(profile.view(), row),
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored
}

/// Ids of the `top_n` listings most similar to `profile`
pub fn rank(profile: &Array1<f64>, sale: &FeatureMatrix, top_n: usize) -> Vec<ListingId> {
    score(profile, sale)
        .into_iter()
        .take(top_n)
        .map(|s| s.car_id)
        .collect()
}
