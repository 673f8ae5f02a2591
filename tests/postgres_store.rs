//! Store tests against live services. Run with
//! `DATABASE_URL=... REDIS_URL=... cargo test -- --ignored`.

use std::time::Duration;

use sellcar_api::{
    db::{
        create_pool, create_redis_client, run_migrations, Cache, CacheKey, CacheWriterHandle,
        ListingStore, PgStore,
    },
    error::AppError,
    models::{NewListing, PriceBrackets, UserId},
};
use sqlx::PgPool;
use uuid::Uuid;

const BRACKETS: PriceBrackets = PriceBrackets {
    actual: 1,
    predicted: 1,
};

/// The writer handle must stay alive or the writer stops
async fn connect() -> (PgStore, PgPool, Cache, CacheWriterHandle) {
    let database_url = std::env::var("DATABASE_URL").unwrap();
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let pool = create_pool(&database_url, 2).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let (cache, handle) = Cache::new(create_redis_client(&redis_url).unwrap()).await;

    (PgStore::new(pool.clone(), cache.clone()), pool, cache, handle)
}

async fn register(pool: &PgPool, first_name: &str) -> UserId {
    let tag = Uuid::new_v4().simple().to_string();
    sqlx::query_scalar(
        "INSERT INTO users (login, first_name, last_name, phone) \
         VALUES ($1, $2, 'Orlova', $3) RETURNING user_id",
    )
    .bind(format!("login-{}", tag))
    .bind(first_name)
    .bind(format!("+7-{}", tag))
    .fetch_one(pool)
    .await
    .unwrap()
}

fn new_listing() -> NewListing {
    let tag = Uuid::new_v4().simple().to_string();
    NewListing {
        brand: "Skoda".to_string(),
        model: "Octavia".to_string(),
        production_date: 2018,
        mileage: 90_000,
        engine_displacement: 1.4,
        price: 950_000.0,
        description: None,
        bodytype: "liftback".to_string(),
        color: "grey".to_string(),
        fuel_type: "petrol".to_string(),
        vehicle_transmission: "robot".to_string(),
        owners: 2,
        drive_type: "front".to_string(),
        wheel: "left".to_string(),
        engine_power: 150,
        vin: format!("VIN-{}", tag),
        state_number: format!("SN-{}", tag),
    }
}

#[tokio::test]
#[ignore = "needs Postgres and Redis"]
async fn test_recached_row_of_deleted_listing_is_not_served() {
    let (store, pool, cache, _handle) = connect().await;
    let seller = register(&pool, "Anna").await;
    let car_id = store.create_listing(seller, &new_listing(), BRACKETS).await.unwrap();

    let listing = store.get_listing(car_id).await.unwrap().unwrap();
    assert!(store.delete_listing(seller, car_id).await.unwrap());

    // A slow reader's write lands after the delete's invalidation
    cache.set_in_background(&CacheKey::Listing(car_id), &listing, 300);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(store.get_listing(car_id).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "needs Postgres and Redis"]
async fn test_writes_for_unknown_account_are_unauthorized() {
    let (store, pool, _cache, _handle) = connect().await;

    let err = store
        .create_listing(i64::MAX, &new_listing(), BRACKETS)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let seller = register(&pool, "Anna").await;
    let car_id = store.create_listing(seller, &new_listing(), BRACKETS).await.unwrap();
    let err = store.add_favorite(i64::MAX, car_id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
#[ignore = "needs Postgres and Redis"]
async fn test_seller_summary_and_photos() {
    let (store, pool, _cache, _handle) = connect().await;
    let seller = register(&pool, "Anna").await;
    let car_id = store.create_listing(seller, &new_listing(), BRACKETS).await.unwrap();

    for url in ["/static/front.jpg", "/static/rear.jpg"] {
        sqlx::query("INSERT INTO photos (car_id, photo_url) VALUES ($1, $2)")
            .bind(car_id)
            .bind(url)
            .execute(&pool)
            .await
            .unwrap();
    }

    let summary = store.seller_summary(seller).await.unwrap().unwrap();
    assert_eq!(summary.first_name, "Anna");
    assert_eq!(summary.last_name.as_deref(), Some("Orlova"));
    assert_eq!(summary.sales_count, 1);

    let photos = store.listing_photos(&[car_id]).await.unwrap();
    let urls: Vec<&str> = photos[&car_id].iter().map(|p| p.photo_url.as_str()).collect();
    assert_eq!(urls, vec!["/static/front.jpg", "/static/rear.jpg"]);
}
