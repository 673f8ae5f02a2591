//! Personalized listing recommendations.
//!
//! Each call reads the user's interactions, fits a fresh encoder on the
//! union of inventory, likes and own listings, and ranks the inventory by
//! cosine similarity to the user's mean weighted vector. Users without any
//! signal get the deterministic cold-start ordering instead. Nothing fitted
//! here outlives the call.

pub mod encoder;
pub mod fallback;
pub mod features;
pub mod profile;
pub mod ranker;
pub mod weights;

use std::time::Instant;

use crate::{
    db::ListingStore,
    error::AppResult,
    models::{ListingId, ListingResponse, UserId},
    services::listings,
};

pub use encoder::{Column, FeatureEncoder, FeatureMatrix};
pub use features::{Attribute, CarFeatures, CategoricalAttribute, NumericAttribute};
pub use weights::FeatureWeights;

/// Top-N used when the caller does not ask for a specific count
pub const DEFAULT_TOP_N: usize = 20;

/// Everything the recommender needs about one user, read in one go
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionSet {
    /// Current full inventory, the user's own listings included
    pub all_sale: Vec<CarFeatures>,
    pub liked: Vec<CarFeatures>,
    pub own_sale: Vec<CarFeatures>,
}

impl InteractionSet {
    pub fn has_signal(&self) -> bool {
        !self.liked.is_empty() || !self.own_sale.is_empty()
    }
}

/// Read side of persistence the recommender depends on.
///
/// Implementations should read the three sets from one consistent snapshot
/// and release whatever they acquired before returning, on errors too.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InteractionReader: Send + Sync {
    async fn read_interactions(&self, user_id: UserId) -> AppResult<InteractionSet>;
}

/// All three interaction sets encoded by one fitted encoder, weighted
#[derive(Debug, Clone)]
pub struct EncodedInteractions {
    pub columns: Vec<Column>,
    pub sale: FeatureMatrix,
    pub liked: FeatureMatrix,
    pub own: FeatureMatrix,
}

#[derive(Debug, Clone, Default)]
pub struct Recommender {
    weights: FeatureWeights,
}

impl Recommender {
    pub fn new(weights: FeatureWeights) -> Self {
        Self { weights }
    }

    /// Recommended listing ids for `user_id`, best first, at most `top_n`.
    ///
    /// A failed read is returned as-is; no partial list is produced.
    pub async fn get_recommendations<R>(
        &self,
        reader: &R,
        user_id: UserId,
        top_n: usize,
    ) -> AppResult<Vec<ListingId>>
    where
        R: InteractionReader + ?Sized,
    {
        let start = Instant::now();
        let interactions = reader.read_interactions(user_id).await?;

        tracing::info!(
            user_id,
            inventory = interactions.all_sale.len(),
            liked = interactions.liked.len(),
            own = interactions.own_sale.len(),
            "Interactions loaded"
        );

        let ids = self.recommend(&interactions, top_n);

        tracing::info!(
            user_id,
            returned = ids.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations computed"
        );

        Ok(ids)
    }

    /// The pure part of [`Recommender::get_recommendations`]
    pub fn recommend(&self, interactions: &InteractionSet, top_n: usize) -> Vec<ListingId> {
        if interactions.all_sale.is_empty() {
            tracing::debug!("No listings for sale, nothing to recommend");
            return Vec::new();
        }

        if !interactions.has_signal() {
            tracing::debug!("No likes or own listings, using cold-start ordering");
            return fallback::cold_start(&interactions.all_sale, top_n);
        }

        let encoded = self.encode(interactions);

        let Some(profile) = profile::build_profile(&[&encoded.liked, &encoded.own]) else {
            return fallback::cold_start(&interactions.all_sale, top_n);
        };

        ranker::rank(&profile, &encoded.sale, top_n)
    }

    /// Fits on the union of all three sets and encodes each one with the
    /// same fitted encoder and weights.
    pub fn encode(&self, interactions: &InteractionSet) -> EncodedInteractions {
        let corpus: Vec<&CarFeatures> = interactions
            .all_sale
            .iter()
            .chain(&interactions.liked)
            .chain(&interactions.own_sale)
            .collect();

        let encoder = FeatureEncoder::fit(&corpus);
        let columns = encoder.columns().to_vec();

        let weigh = |listings: &[CarFeatures]| {
            self.weights.apply(encoder.transform(listings), &columns)
        };

        EncodedInteractions {
            sale: weigh(&interactions.all_sale),
            liked: weigh(&interactions.liked),
            own: weigh(&interactions.own_sale),
            columns,
        }
    }
}

/// Recommendations as served to a user: the ranked ids resolved to
/// listings, minus anything the user sells, in ranked order.
pub async fn recommended_listings(
    store: &dyn ListingStore,
    recommender: &Recommender,
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<ListingResponse>> {
    let ids = recommender.get_recommendations(store, user_id, limit).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: std::collections::HashMap<ListingId, _> = store
        .listings_by_ids(&ids)
        .await?
        .into_iter()
        .filter(|listing| listing.seller_id != Some(user_id))
        .map(|listing| (listing.car_id, listing))
        .collect();

    let ranked = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    let served = listings::with_photos(store, ranked).await?;

    tracing::debug!(
        user_id,
        ranked = ids.len(),
        served = served.len(),
        "Resolved recommended listings"
    );

    Ok(served)
}
