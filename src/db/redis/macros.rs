/// Cache-aside lookup around an async computation.
///
/// Returns the cached value when one is present. Otherwise awaits `$block`,
/// stores its value under `$key` for `$ttl` seconds and returns it.
///
/// Cache failures never fail the expression: a failed read is logged and treated
/// as a miss, and `set_in_cache` logs failed writes. Errors of `$block` propagate.
///
/// # Arguments
/// * `$cache`: a `db::Cache`, providing `get_from_cache` and `set_in_cache`.
/// * `$key`: the `CacheKey` of the value.
/// * `$ttl`: time-to-live of the stored value, in seconds.
/// * `$block`: the future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let movies: Vec<Movie> = cached!(cache, CacheKey::Recommendations(user_id), 600, async move {
///     engine.compute(user_id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache unavailable, computing value");
                None
            }
        };

        match hit {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_cache(&key, &value, $ttl).await;
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
