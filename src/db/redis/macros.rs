/// Read-through caching against Redis that never lets the cache fail a lookup.
///
/// Returns the cached value when present. On a miss, or when the cache read
/// itself fails, the block is evaluated and its value written back in the
/// background. Errors from the block propagate with `?`; cache errors are
/// logged and otherwise ignored.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache) (or anything with
///   `get_from_cache` and `set_in_background`).
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live in seconds for a freshly computed value.
/// * `$block`: a future producing `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let url: Option<String> = cached!(
///     cache,
///     CacheKey::Poster(external_id.to_string()),
///     POSTER_CACHE_TTL,
///     provider.fetch_poster_url(external_id)
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
