/// Read-through caching around an async computation.
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the result for storage with `$ttl` seconds and returns
/// it. A failing cache read is logged and treated as a miss. Errors from
/// `$block` propagate with `?` and are never cached.
///
/// # Example
/// ```rust,ignore
/// async fn cached_listing(&self, id: ListingId) -> AppResult<Listing> {
///     cached!(self.cache, CacheKey::Listing(id), 300, self.fetch_listing(id))
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            result => {
                if let Err(e) = result {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                } else {
                    tracing::debug!(key = %key, "Cache miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
