use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::query::ast::Query;
use crate::query::types::QueryOptions;
use crate::search::results::QueryResponse;

/// Query cache for avoiding recomputation.
///
/// Keys carry the snapshot version, so a publish implicitly invalidates
/// every entry computed against an older snapshot.
pub struct QueryCache {
    cache: Option<Mutex<LruCache<QueryKey, QueryResponse>>>,
    size_limit: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub version: u64,
    pub query: Query,
    pub options: QueryOptions,
}

impl QueryKey {
    pub fn new(version: u64, query: &Query, options: &QueryOptions) -> Self {
        QueryKey {
            version,
            query: query.clone(),
            options: options.clone(),
        }
    }
}

impl QueryCache {
    /// A zero `size_limit` disables caching.
    pub fn new(size_limit: usize) -> Self {
        QueryCache {
            cache: NonZeroUsize::new(size_limit).map(|cap| Mutex::new(LruCache::new(cap))),
            size_limit,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn get(&self, key: &QueryKey) -> Option<QueryResponse> {
        let cache = self.cache.as_ref()?;
        let found = cache.lock().get(key).cloned();
        let counter = if found.is_some() { &self.hit_count } else { &self.miss_count };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn put(&self, key: QueryKey, response: QueryResponse) {
        if let Some(cache) = &self.cache {
            cache.lock().put(key, response);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.as_ref().map_or(0, |cache| cache.lock().len()),
            capacity: self.size_limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> QueryResponse {
        QueryResponse::Values(vec!["volvo".to_string()])
    }

    #[test]
    fn hits_only_for_the_same_version() {
        let cache = QueryCache::new(4);
        let query = Query::dictionary(["make"]);
        let options = QueryOptions::default();

        cache.put(QueryKey::new(1, &query, &options), response());
        assert_eq!(cache.get(&QueryKey::new(1, &query, &options)), Some(response()));
        assert_eq!(cache.get(&QueryKey::new(2, &query, &options)), None);

        let stats = cache.stats();
        assert_eq!((stats.hit_count, stats.miss_count, stats.size), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn options_are_part_of_the_key() {
        let cache = QueryCache::new(4);
        let query = Query::literal("make", "volvo");
        cache.put(QueryKey::new(1, &query, &QueryOptions::default()), response());
        assert!(cache.get(&QueryKey::new(1, &query, &QueryOptions::with_documents())).is_none());
    }

    #[test]
    fn zero_capacity_disables() {
        let cache = QueryCache::new(0);
        let key = QueryKey::new(1, &Query::distinct("make"), &QueryOptions::default());
        cache.put(key.clone(), response());
        assert!(!cache.is_enabled());
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = QueryCache::new(1);
        let options = QueryOptions::default();
        let first = QueryKey::new(1, &Query::distinct("make"), &options);
        let second = QueryKey::new(1, &Query::distinct("brand"), &options);
        cache.put(first.clone(), response());
        cache.put(second.clone(), response());
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());
    }
}
