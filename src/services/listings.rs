use crate::{
    db::ListingStore,
    error::{AppError, AppResult},
    models::{
        FavoriteStatus, Listing, ListingDetails, ListingId, ListingResponse, NewListing,
        PriceBrackets, UserId,
    },
    services::pricing::{self, PriceScorer, PricingFeatures},
};

fn validate(listing: &NewListing, reference_year: i32) -> AppResult<()> {
    if !listing.price.is_finite() || listing.price < 0.0 {
        return Err(AppError::InvalidInput(
            "price must be a non-negative number".to_string(),
        ));
    }
    if listing.mileage < 0 || listing.owners < 0 || listing.engine_power < 0 {
        return Err(AppError::InvalidInput(
            "mileage, owners and engine_power must not be negative".to_string(),
        ));
    }
    if listing.production_date > reference_year + 1 {
        return Err(AppError::InvalidInput(format!(
            "production_date {} is in the future",
            listing.production_date
        )));
    }
    Ok(())
}

/// Validates, prices and stores a new listing for `seller_id`.
///
/// The model estimate is stored next to the asking bracket; a model outage
/// only means the estimate is the neutral bracket.
pub async fn create_listing(
    store: &dyn ListingStore,
    scorer: &dyn PriceScorer,
    seller_id: UserId,
    listing: NewListing,
    reference_year: i32,
) -> AppResult<ListingId> {
    validate(&listing, reference_year)?;

    let features = PricingFeatures::from_listing(&listing, reference_year);
    let brackets = PriceBrackets {
        actual: pricing::price_to_range(listing.price),
        predicted: scorer.predict_bracket(&features).await,
    };

    let car_id = store.create_listing(seller_id, &listing, brackets).await?;

    tracing::info!(
        car_id,
        seller_id,
        actual_bracket = brackets.actual,
        predicted_bracket = brackets.predicted,
        scorer = scorer.name(),
        "Listing created"
    );

    Ok(car_id)
}

pub async fn listing_details(store: &dyn ListingStore, car_id: ListingId) -> AppResult<ListingDetails> {
    let listing = store
        .get_listing(car_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("car {}", car_id)))?;

    let seller = match listing.seller_id {
        Some(user_id) => store.seller_summary(user_id).await?,
        None => None,
    };
    let user_id = listing.seller_id;

    let mut responses = with_photos(store, vec![listing]).await?;
    let listing = responses
        .pop()
        .ok_or_else(|| AppError::Internal(format!("car {} lost while loading photos", car_id)))?;

    Ok(ListingDetails {
        listing,
        user_id,
        seller,
    })
}

/// Client view of `listings`, keeping their order
pub async fn with_photos(store: &dyn ListingStore, listings: Vec<Listing>) -> AppResult<Vec<ListingResponse>> {
    let ids: Vec<ListingId> = listings.iter().map(|l| l.car_id).collect();
    let mut photos = store.listing_photos(&ids).await?;

    Ok(listings
        .into_iter()
        .map(|listing| {
            let listing_photos = photos.remove(&listing.car_id).unwrap_or_default();
            pricing::to_response(listing, listing_photos)
        })
        .collect())
}

pub async fn seller_listings(store: &dyn ListingStore, seller_id: UserId) -> AppResult<Vec<ListingResponse>> {
    let listings = store.seller_listings(seller_id).await?;
    with_photos(store, listings).await
}

/// Deletes a listing owned by `seller_id`. Someone else's listing looks
/// the same as a missing one.
pub async fn delete_listing(store: &dyn ListingStore, seller_id: UserId, car_id: ListingId) -> AppResult<()> {
    if !store.delete_listing(seller_id, car_id).await? {
        return Err(AppError::NotFound(format!("car {}", car_id)));
    }
    tracing::info!(car_id, seller_id, "Listing deleted");
    Ok(())
}

pub async fn favorite_listings(store: &dyn ListingStore, user_id: UserId) -> AppResult<Vec<ListingResponse>> {
    let listings = store.favorite_listings(user_id).await?;
    with_photos(store, listings).await
}

pub async fn add_favorite(store: &dyn ListingStore, user_id: UserId, car_id: ListingId) -> AppResult<FavoriteStatus> {
    let status = store.add_favorite(user_id, car_id).await?;
    tracing::debug!(user_id, car_id, status = ?status, "Favorite added");
    Ok(status)
}

pub async fn remove_favorite(store: &dyn ListingStore, user_id: UserId, car_id: ListingId) -> AppResult<FavoriteStatus> {
    store.remove_favorite(user_id, car_id).await?;
    Ok(FavoriteStatus::Removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryStore,
        models::{Photo, SellerSummary, UserProfile},
    };

    struct FixedScorer(i32);

    #[async_trait::async_trait]
    impl PriceScorer for FixedScorer {
        async fn predict_bracket(&self, _features: &PricingFeatures) -> i32 {
            self.0
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn new_listing() -> NewListing {
        NewListing {
            brand: "Hyundai".to_string(),
            model: "Solaris".to_string(),
            production_date: 2020,
            mileage: 60_000,
            engine_displacement: 1.6,
            price: 1_400_000.0,
            description: None,
            bodytype: "sedan".to_string(),
            color: "silver".to_string(),
            fuel_type: "petrol".to_string(),
            vehicle_transmission: "automatic".to_string(),
            owners: 1,
            drive_type: "front".to_string(),
            wheel: "left".to_string(),
            engine_power: 123,
            vin: "Z94CT41DBLR123456".to_string(),
            state_number: "E777KX77".to_string(),
        }
    }

    async fn store_with_seller() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_user(UserProfile {
                user_id: 9,
                first_name: "Ivan".to_string(),
                last_name: Some("Petrov".to_string()),
                phone: "+79001234567".to_string(),
            })
            .await;
        store
    }

    #[tokio::test]
    async fn test_create_stores_both_brackets() {
        let store = store_with_seller().await;
        let car_id = create_listing(&store, &FixedScorer(4), 9, new_listing(), 2025)
            .await
            .unwrap();

        let details = listing_details(&store, car_id).await.unwrap();
        assert_eq!(details.listing.listing.price_range, Some(2));
        assert_eq!(details.listing.listing.predicted_price_range, Some(4));
        assert_eq!(details.listing.price_badge, Some(crate::models::PriceBadge::Low));
        assert_eq!(details.user_id, Some(9));
        assert_eq!(
            details.seller,
            Some(SellerSummary {
                user_id: 9,
                first_name: "Ivan".to_string(),
                last_name: Some("Petrov".to_string()),
                seller_phone: "+79001234567".to_string(),
                sales_count: 1
            })
        );
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let store = InMemoryStore::new();
        let listing = NewListing {
            price: -1.0,
            ..new_listing()
        };
        let err = create_listing(&store, &FixedScorer(0), 9, listing, 2025)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_future_year() {
        let store = InMemoryStore::new();
        let listing = NewListing {
            production_date: 2031,
            ..new_listing()
        };
        let err = create_listing(&store, &FixedScorer(0), 9, listing, 2025)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_not_found() {
        let store = store_with_seller().await;
        let car_id = create_listing(&store, &FixedScorer(2), 9, new_listing(), 2025)
            .await
            .unwrap();

        let err = delete_listing(&store, 10, car_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        delete_listing(&store, 9, car_id).await.unwrap();
        assert!(matches!(
            listing_details(&store, car_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_for_unknown_seller_is_unauthorized() {
        let store = InMemoryStore::new();
        let err = create_listing(&store, &FixedScorer(0), 9, new_listing(), 2025)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_details_and_seller_listings_carry_photos() {
        let store = store_with_seller().await;
        let car_id = create_listing(&store, &FixedScorer(2), 9, new_listing(), 2025)
            .await
            .unwrap();
        store.insert_photo(car_id, "/static/solaris-front.jpg").await;

        let details = listing_details(&store, car_id).await.unwrap();
        assert_eq!(
            details.listing.photos,
            vec![Photo {
                photo_url: "/static/solaris-front.jpg".to_string()
            }]
        );

        let mine = seller_listings(&store, 9).await.unwrap();
        assert_eq!(mine[0].photos.len(), 1);
    }
}
