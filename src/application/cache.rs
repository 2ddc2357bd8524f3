//! Request-shaped memoization for list responses.
//!
//! Listing endpoints are the expensive path (filtered page query plus count
//! query); their results are memoized process-wide under a key derived from
//! the request shape, with per-entry expiry. Expired slots are evicted lazily
//! on the access that observes them.

use std::future::Future;
use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use tokio::time::Instant;

/// Fields participating in a list cache key, in their canonical order.
///
/// The cursor is deliberately absent: cursor-paginated pages bypass the cache
/// entirely, so no per-cursor staleness window exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFields<'a> {
    pub page: u32,
    pub limit: u32,
    pub q: &'a str,
    pub category: &'a str,
    pub kind: &'a str,
    pub sort: &'a str,
    pub locale: &'a str,
    pub status: &'a str,
}

/// Build a deterministic cache key from an entity prefix and the request's
/// recognized fields. Two logically identical requests always produce
/// byte-identical keys; requests differing in any field produce different
/// keys.
pub fn list_cache_key(prefix: &str, fields: &KeyFields<'_>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("page", &fields.page.to_string())
        .append_pair("limit", &fields.limit.to_string())
        .append_pair("q", fields.q)
        .append_pair("category", fields.category)
        .append_pair("type", fields.kind)
        .append_pair("sort", fields.sort)
        .append_pair("locale", fields.locale)
        .append_pair("status", fields.status);
    format!("{prefix}?{}", query.finish())
}

struct Slot<V> {
    value: V,
    expires_at: Instant,
}

/// TTL-expiring memoization map.
///
/// `get_or_compute` runs the producer on a miss and stores the value only on
/// success; a failing producer leaves the key absent and its error passes
/// through unchanged. Concurrent callers on the same cold key each run the
/// producer; the win is amortized over the TTL window, not per burst.
pub struct TtlCache<V> {
    name: &'static str,
    slots: DashMap<String, Slot<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = match self.slots.get(key) {
            Some(slot) if now < slot.expires_at => {
                counter!("dealstack_list_cache_hit_total", "entity" => self.name).increment(1);
                return Some(slot.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.slots.remove(key);
            counter!("dealstack_list_cache_expired_total", "entity" => self.name).increment(1);
        }
        counter!("dealstack_list_cache_miss_total", "entity" => self.name).increment(1);
        None
    }

    pub fn insert(&self, key: String, value: V, ttl: Duration) {
        self.slots.insert(
            key,
            Slot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub async fn get_or_compute<E, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: impl FnOnce() -> Fut,
    ) -> Result<V, E>
    where
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = producer().await?;
        self.insert(key.to_string(), value.clone(), ttl);
        Ok(value)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(page: u32, q: &'a str, sort: &'a str) -> KeyFields<'a> {
        KeyFields {
            page,
            limit: 20,
            q,
            category: "",
            kind: "",
            sort,
            locale: "",
            status: "",
        }
    }

    #[test]
    fn identical_requests_produce_identical_keys() {
        let a = list_cache_key("coupons", &fields(2, "tv", "newest"));
        let b = list_cache_key("coupons", &fields(2, "tv", "newest"));
        assert_eq!(a, b);
    }

    #[test]
    fn any_differing_field_changes_the_key() {
        let base = list_cache_key("coupons", &fields(1, "tv", "newest"));
        assert_ne!(base, list_cache_key("coupons", &fields(2, "tv", "newest")));
        assert_ne!(base, list_cache_key("coupons", &fields(1, "tvs", "newest")));
        assert_ne!(base, list_cache_key("coupons", &fields(1, "tv", "popular")));
        assert_ne!(base, list_cache_key("stores", &fields(1, "tv", "newest")));
    }

    #[test]
    fn absent_fields_serialize_as_empty_values() {
        let key = list_cache_key("coupons", &fields(1, "", ""));
        assert_eq!(
            key,
            "coupons?page=1&limit=20&q=&category=&type=&sort=&locale=&status="
        );
    }

    #[test]
    fn values_are_url_encoded() {
        let key = list_cache_key("coupons", &fields(1, "flat screen & more", "newest"));
        assert!(key.contains("q=flat+screen+%26+more"));
    }

    #[tokio::test(start_paused = true)]
    async fn hit_before_expiry_skips_the_producer() {
        let cache: TtlCache<u32> = TtlCache::new("test");
        let ttl = Duration::from_secs(60);

        let first: Result<u32, ()> = cache.get_or_compute("k", ttl, || async { Ok(7) }).await;
        assert_eq!(first, Ok(7));

        tokio::time::advance(Duration::from_secs(59)).await;
        let second: Result<u32, ()> = cache
            .get_or_compute("k", ttl, || async { panic!("producer must not run on a hit") })
            .await;
        assert_eq!(second, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_recomputed() {
        let cache: TtlCache<u32> = TtlCache::new("test");
        let ttl = Duration::from_secs(60);

        let _: Result<u32, ()> = cache.get_or_compute("k", ttl, || async { Ok(1) }).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let recomputed: Result<u32, ()> = cache.get_or_compute("k", ttl, || async { Ok(2) }).await;
        assert_eq!(recomputed, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_producer_does_not_poison_the_key() {
        let cache: TtlCache<u32> = TtlCache::new("test");
        let ttl = Duration::from_secs(60);

        let failed: Result<u32, &str> = cache
            .get_or_compute("k", ttl, || async { Err("backend down") })
            .await;
        assert_eq!(failed, Err("backend down"));
        assert_eq!(cache.len(), 0);

        let recovered: Result<u32, &str> = cache.get_or_compute("k", ttl, || async { Ok(9) }).await;
        assert_eq!(recovered, Ok(9));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_slot_is_evicted_on_access() {
        let cache: TtlCache<u32> = TtlCache::new("test");
        cache.insert("k".to_string(), 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }
}
