//! Process-wide counters for cache and network activity.
use std::sync::atomic::{AtomicU64, Ordering};

static CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static CACHE_MISSES: AtomicU64 = AtomicU64::new(0);
static CACHE_EVICTIONS: AtomicU64 = AtomicU64::new(0);
static PAGE_FETCHES: AtomicU64 = AtomicU64::new(0);
static ARTICLES_WRITTEN: AtomicU64 = AtomicU64::new(0);

pub fn inc_cache_hit() { CACHE_HITS.fetch_add(1, Ordering::Relaxed); }
pub fn inc_cache_miss() { CACHE_MISSES.fetch_add(1, Ordering::Relaxed); }
pub fn inc_cache_eviction() { CACHE_EVICTIONS.fetch_add(1, Ordering::Relaxed); }
pub fn inc_page_fetch() { PAGE_FETCHES.fetch_add(1, Ordering::Relaxed); }
pub fn inc_article_written() { ARTICLES_WRITTEN.fetch_add(1, Ordering::Relaxed); }

#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub page_fetches: u64,
    pub articles_written: u64,
}

impl Snapshot {
    /// Fraction of lookups served from the cache.
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.cache_hits + self.cache_misses;
        if total > 0 { Some(self.cache_hits as f64 / total as f64) } else { None }
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        cache_hits: CACHE_HITS.load(Ordering::Relaxed),
        cache_misses: CACHE_MISSES.load(Ordering::Relaxed),
        cache_evictions: CACHE_EVICTIONS.load(Ordering::Relaxed),
        page_fetches: PAGE_FETCHES.load(Ordering::Relaxed),
        articles_written: ARTICLES_WRITTEN.load(Ordering::Relaxed),
    }
}
