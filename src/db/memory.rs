use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::ListingStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        FavoriteStatus, Listing, ListingId, NewListing, Photo, PriceBrackets, SellerSummary,
        UserId, UserProfile,
    },
    services::recommendations::{CarFeatures, InteractionReader, InteractionSet},
};

/// Process-local store used by tests and local demos
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<InMemoryStoreInner>>,
}

#[derive(Default)]
struct InMemoryStoreInner {
    users: BTreeMap<UserId, UserProfile>,
    listings: BTreeMap<ListingId, Listing>,
    /// (listing, photo) in upload order
    photos: Vec<(ListingId, Photo)>,
    /// (user, listing) in the order they were liked
    favorites: Vec<(UserId, ListingId)>,
    next_id: ListingId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed row, e.g. imported data with gaps.
    /// Keeps `car_id` and moves the id sequence past it.
    pub async fn insert_listing(&self, listing: Listing) {
        let mut inner = self.inner.write().await;
        inner.next_id = inner.next_id.max(listing.car_id);
        inner.listings.insert(listing.car_id, listing);
    }

    /// Registers an account. Listings and favorites require one.
    pub async fn insert_user(&self, user: UserProfile) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.user_id, user);
    }

    pub async fn insert_photo(&self, car_id: ListingId, photo_url: &str) {
        let mut inner = self.inner.write().await;
        inner.photos.push((
            car_id,
            Photo {
                photo_url: photo_url.to_string(),
            },
        ));
    }
}

fn unknown_user() -> AppError {
    AppError::Unauthorized("unknown user".to_string())
}

#[async_trait::async_trait]
impl InteractionReader for InMemoryStore {
    async fn read_interactions(&self, user_id: UserId) -> AppResult<InteractionSet> {
        // One read guard for all three sets gives a consistent snapshot
        let inner = self.inner.read().await;

        let all_sale = inner.listings.values().map(CarFeatures::from).collect();
        let liked = inner
            .favorites
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, car_id)| inner.listings.get(car_id))
            .map(CarFeatures::from)
            .collect();
        let own_sale = inner
            .listings
            .values()
            .filter(|l| l.seller_id == Some(user_id))
            .map(CarFeatures::from)
            .collect();

        Ok(InteractionSet {
            all_sale,
            liked,
            own_sale,
        })
    }
}

#[async_trait::async_trait]
impl ListingStore for InMemoryStore {
    async fn create_listing(
        &self,
        seller_id: UserId,
        listing: &NewListing,
        brackets: PriceBrackets,
    ) -> AppResult<ListingId> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&seller_id) {
            return Err(unknown_user());
        }

        let duplicate = inner.listings.values().any(|l| {
            l.vin.as_deref() == Some(listing.vin.as_str())
                || l.state_number.as_deref() == Some(listing.state_number.as_str())
        });
        if duplicate {
            return Err(AppError::Conflict(
                "listing with this VIN or state number already exists".to_string(),
            ));
        }

        inner.next_id += 1;
        let car_id = inner.next_id;

        inner.listings.insert(
            car_id,
            Listing::from_new(car_id, seller_id, listing, brackets),
        );

        Ok(car_id)
    }

    async fn get_listing(&self, car_id: ListingId) -> AppResult<Option<Listing>> {
        let inner = self.inner.read().await;
        Ok(inner.listings.get(&car_id).cloned())
    }

    async fn listings_by_ids(&self, ids: &[ListingId]) -> AppResult<Vec<Listing>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.listings.get(id).cloned())
            .collect())
    }

    async fn seller_listings(&self, seller_id: UserId) -> AppResult<Vec<Listing>> {
        let inner = self.inner.read().await;
        Ok(inner
            .listings
            .values()
            .filter(|l| l.seller_id == Some(seller_id))
            .cloned()
            .collect())
    }

    async fn seller_summary(&self, seller_id: UserId) -> AppResult<Option<SellerSummary>> {
        let inner = self.inner.read().await;
        let Some(user) = inner.users.get(&seller_id) else {
            return Ok(None);
        };

        let sales_count = inner
            .listings
            .values()
            .filter(|l| l.seller_id == Some(seller_id))
            .count() as i64;

        Ok(Some(SellerSummary {
            user_id: user.user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            seller_phone: user.phone.clone(),
            sales_count,
        }))
    }

    async fn listing_photos(&self, ids: &[ListingId]) -> AppResult<HashMap<ListingId, Vec<Photo>>> {
        let inner = self.inner.read().await;
        let mut photos: HashMap<ListingId, Vec<Photo>> = HashMap::new();
        for (car_id, photo) in inner.photos.iter().filter(|(id, _)| ids.contains(id)) {
            photos.entry(*car_id).or_default().push(photo.clone());
        }
        Ok(photos)
    }

    async fn delete_listing(&self, seller_id: UserId, car_id: ListingId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;

        let owned = inner
            .listings
            .get(&car_id)
            .is_some_and(|l| l.seller_id == Some(seller_id));
        if !owned {
            return Ok(false);
        }

        inner.listings.remove(&car_id);
        inner.favorites.retain(|(_, liked)| *liked != car_id);
        inner.photos.retain(|(id, _)| *id != car_id);
        Ok(true)
    }

    async fn add_favorite(&self, user_id: UserId, car_id: ListingId) -> AppResult<FavoriteStatus> {
        let mut inner = self.inner.write().await;

        if !inner.listings.contains_key(&car_id) {
            return Err(AppError::NotFound(format!("car {}", car_id)));
        }
        if !inner.users.contains_key(&user_id) {
            return Err(unknown_user());
        }
        if inner.favorites.contains(&(user_id, car_id)) {
            return Ok(FavoriteStatus::Exists);
        }

        inner.favorites.push((user_id, car_id));
        Ok(FavoriteStatus::Added)
    }

    async fn remove_favorite(&self, user_id: UserId, car_id: ListingId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.favorites.retain(|entry| *entry != (user_id, car_id));
        Ok(())
    }

    async fn favorite_listings(&self, user_id: UserId) -> AppResult<Vec<Listing>> {
        let inner = self.inner.read().await;
        Ok(inner
            .favorites
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, car_id)| inner.listings.get(car_id).cloned())
            .collect())
    }
}
