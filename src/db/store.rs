use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{
        FavoriteStatus, Listing, ListingId, NewListing, Photo, PriceBrackets, SellerSummary, UserId,
    },
    services::recommendations::InteractionReader,
};

/// Persistence for listings and favorites.
///
/// Listing order is stable: listing queries return rows by ascending id,
/// favorites in the order they were added. The recommender relies on this
/// for deterministic tie-breaking.
#[async_trait::async_trait]
pub trait ListingStore: InteractionReader {
    /// Fails with `Unauthorized` when `seller_id` has no account
    async fn create_listing(
        &self,
        seller_id: UserId,
        listing: &NewListing,
        brackets: PriceBrackets,
    ) -> AppResult<ListingId>;

    async fn get_listing(&self, car_id: ListingId) -> AppResult<Option<Listing>>;

    /// Listings among `ids` that exist, in no particular order
    async fn listings_by_ids(&self, ids: &[ListingId]) -> AppResult<Vec<Listing>>;

    async fn seller_listings(&self, seller_id: UserId) -> AppResult<Vec<Listing>>;

    /// Contact data and listing count, `None` for an unknown account
    async fn seller_summary(&self, seller_id: UserId) -> AppResult<Option<SellerSummary>>;

    /// Photos of each listing among `ids`, in upload order. Listings
    /// without photos have no entry.
    async fn listing_photos(&self, ids: &[ListingId]) -> AppResult<HashMap<ListingId, Vec<Photo>>>;

    /// Deletes the listing if `seller_id` owns it. Returns whether a row went away.
    async fn delete_listing(&self, seller_id: UserId, car_id: ListingId) -> AppResult<bool>;

    /// Fails with `NotFound` when the listing does not exist and with
    /// `Unauthorized` when the user has no account
    async fn add_favorite(&self, user_id: UserId, car_id: ListingId) -> AppResult<FavoriteStatus>;

    async fn remove_favorite(&self, user_id: UserId, car_id: ListingId) -> AppResult<()>;

    async fn favorite_listings(&self, user_id: UserId) -> AppResult<Vec<Listing>>;
}
