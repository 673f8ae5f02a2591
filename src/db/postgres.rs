use std::collections::HashMap;

use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};

use super::{Cache, CacheKey, ListingStore};
use crate::{
    cached,
    error::{AppError, AppResult},
    models::{
        FavoriteStatus, Listing, ListingId, NewListing, Photo, PriceBrackets, SellerSummary,
        UserId,
    },
    services::recommendations::{CarFeatures, InteractionReader, InteractionSet},
};

const LISTING_CACHE_TTL: u64 = 300; // 5 minutes

const LISTING_COLUMNS: &str = "c.car_id, c.seller_id, c.brand, c.model, c.bodytype, \
    c.description, c.color, c.engine_displacement, c.engine_power, c.fuel_type, c.mileage, \
    c.production_date, c.vehicle_transmission, c.owners, c.drive_type, c.wheel, c.price, \
    c.vin, c.state_number, c.price_range, c.predicted_price_range";

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Listing store backed by Postgres, with listing rows cached in Redis
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    cache: Cache,
}

impl PgStore {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }

    async fn fetch_listing(&self, car_id: ListingId) -> AppResult<Listing> {
        let sql = format!("SELECT {} FROM cars c WHERE c.car_id = $1", LISTING_COLUMNS);
        sqlx::query_as::<_, Listing>(&sql)
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("car {}", car_id)))
    }

    async fn cached_listing(&self, car_id: ListingId) -> AppResult<Listing> {
        cached!(
            self.cache,
            CacheKey::Listing(car_id),
            LISTING_CACHE_TTL,
            self.fetch_listing(car_id)
        )
    }

    async fn listing_exists(&self, car_id: ListingId) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cars WHERE car_id = $1)")
                .bind(car_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn all_listings(conn: &mut PgConnection) -> AppResult<Vec<Listing>> {
        let sql = format!("SELECT {} FROM cars c ORDER BY c.car_id", LISTING_COLUMNS);
        Ok(sqlx::query_as::<_, Listing>(&sql).fetch_all(conn).await?)
    }

    async fn liked_listings(conn: &mut PgConnection, user_id: UserId) -> AppResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM cars c \
             JOIN favorites f ON f.car_id = c.car_id \
             WHERE f.user_id = $1 \
             ORDER BY f.favorites_id",
            LISTING_COLUMNS
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(user_id)
            .fetch_all(conn)
            .await?)
    }

    async fn own_listings(conn: &mut PgConnection, seller_id: UserId) -> AppResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM cars c WHERE c.seller_id = $1 ORDER BY c.car_id",
            LISTING_COLUMNS
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(seller_id)
            .fetch_all(conn)
            .await?)
    }

    /// Makes sure the reference rows a listing points at exist
    async fn upsert_references(conn: &mut PgConnection, listing: &NewListing) -> AppResult<()> {
        sqlx::query("INSERT INTO brands (brand_name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(&listing.brand)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO models (model_name, brand_name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(&listing.model)
        .bind(&listing.brand)
        .execute(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO body_types (body_type_name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(&listing.bodytype)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

fn to_features(listings: &[Listing]) -> Vec<CarFeatures> {
    listings.iter().map(CarFeatures::from).collect()
}

#[async_trait::async_trait]
impl InteractionReader for PgStore {
    /// Reads all three sets inside one read-only snapshot. The transaction
    /// is dropped on every early return, which rolls it back and hands the
    /// connection back to the pool.
    async fn read_interactions(&self, user_id: UserId) -> AppResult<InteractionSet> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let all_sale = Self::all_listings(&mut tx).await?;
        let liked = Self::liked_listings(&mut tx, user_id).await?;
        let own_sale = Self::own_listings(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(InteractionSet {
            all_sale: to_features(&all_sale),
            liked: to_features(&liked),
            own_sale: to_features(&own_sale),
        })
    }
}

#[async_trait::async_trait]
impl ListingStore for PgStore {
    async fn create_listing(
        &self,
        seller_id: UserId,
        listing: &NewListing,
        brackets: PriceBrackets,
    ) -> AppResult<ListingId> {
        let mut tx = self.pool.begin().await?;

        Self::upsert_references(&mut tx, listing).await?;

        let car_id: ListingId = sqlx::query_scalar(
            r#"
            INSERT INTO cars (
                seller_id, brand, model, bodytype, description, color,
                engine_displacement, engine_power, fuel_type, mileage, production_date,
                vehicle_transmission, owners, drive_type, wheel, price, vin, state_number,
                price_range, predicted_price_range
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING car_id
            "#,
        )
        .bind(seller_id)
        .bind(&listing.brand)
        .bind(&listing.model)
        .bind(&listing.bodytype)
        .bind(&listing.description)
        .bind(&listing.color)
        .bind(listing.engine_displacement)
        .bind(listing.engine_power as f64)
        .bind(&listing.fuel_type)
        .bind(listing.mileage)
        .bind(listing.production_date)
        .bind(&listing.vehicle_transmission)
        .bind(listing.owners)
        .bind(&listing.drive_type)
        .bind(&listing.wheel)
        .bind(listing.price)
        .bind(&listing.vin)
        .bind(&listing.state_number)
        .bind(brackets.actual)
        .bind(brackets.predicted)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "listing with this VIN or state number"))?;

        tx.commit().await?;

        Ok(car_id)
    }

    async fn get_listing(&self, car_id: ListingId) -> AppResult<Option<Listing>> {
        let listing = match self.cached_listing(car_id).await {
            Ok(listing) => listing,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        // A read racing a delete can re-cache the row after its invalidation
        if !self.listing_exists(car_id).await? {
            tracing::debug!(car_id, "Dropping cached row of a deleted listing");
            self.cache.invalidate_in_background(&CacheKey::Listing(car_id));
            return Ok(None);
        }

        Ok(Some(listing))
    }

    async fn listings_by_ids(&self, ids: &[ListingId]) -> AppResult<Vec<Listing>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM cars c WHERE c.car_id = ANY($1)", LISTING_COLUMNS);
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn seller_listings(&self, seller_id: UserId) -> AppResult<Vec<Listing>> {
        let mut conn = self.pool.acquire().await?;
        Self::own_listings(&mut conn, seller_id).await
    }

    async fn seller_summary(&self, seller_id: UserId) -> AppResult<Option<SellerSummary>> {
        let summary = sqlx::query_as::<_, SellerSummary>(
            r#"
            SELECT u.user_id, u.first_name, u.last_name, u.phone AS seller_phone,
                   (SELECT COUNT(*) FROM cars c WHERE c.seller_id = u.user_id) AS sales_count
            FROM users u
            WHERE u.user_id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary)
    }

    async fn listing_photos(&self, ids: &[ListingId]) -> AppResult<HashMap<ListingId, Vec<Photo>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(ListingId, String)> = sqlx::query_as(
            "SELECT car_id, photo_url FROM photos WHERE car_id = ANY($1) ORDER BY photo_id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut photos: HashMap<ListingId, Vec<Photo>> = HashMap::new();
        for (car_id, photo_url) in rows {
            photos.entry(car_id).or_default().push(Photo { photo_url });
        }
        Ok(photos)
    }

    async fn delete_listing(&self, seller_id: UserId, car_id: ListingId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE car_id = $1 AND seller_id = $2")
            .bind(car_id)
            .bind(seller_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.cache.invalidate_in_background(&CacheKey::Listing(car_id));
        }
        Ok(deleted)
    }

    async fn add_favorite(&self, user_id: UserId, car_id: ListingId) -> AppResult<FavoriteStatus> {
        if !self.listing_exists(car_id).await? {
            return Err(AppError::NotFound(format!("car {}", car_id)));
        }

        let inserted = sqlx::query(
            "INSERT INTO favorites (user_id, car_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, car_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(car_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "favorite"))?;

        Ok(if inserted.rows_affected() > 0 {
            FavoriteStatus::Added
        } else {
            FavoriteStatus::Exists
        })
    }

    async fn remove_favorite(&self, user_id: UserId, car_id: ListingId) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND car_id = $2")
            .bind(user_id)
            .bind(car_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn favorite_listings(&self, user_id: UserId) -> AppResult<Vec<Listing>> {
        let mut conn = self.pool.acquire().await?;
        Self::liked_listings(&mut conn, user_id).await
    }
}
