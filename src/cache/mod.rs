//! Rendered-document cache.
//!
//! Entries are keyed by slug and carry the source fingerprint they were
//! rendered from. A lookup with a different fingerprint evicts the entry, so
//! edits on disk are picked up on the next request without any watcher.

mod lock;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use metrics::counter;

use crate::domain::document::{RenderedDocument, SourceFingerprint};

use lock::mutex_lock;

const SOURCE: &str = "cache";

pub const METRIC_CACHE_HIT_TOTAL: &str = "leafdoc_document_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "leafdoc_document_cache_miss_total";

#[derive(Debug, Clone)]
struct CachedDocument {
    fingerprint: SourceFingerprint,
    document: Arc<RenderedDocument>,
}

pub struct DocumentCache {
    entries: Mutex<LruCache<String, CachedDocument>>,
}

impl DocumentCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached render for `slug`, if it was produced from `fingerprint`.
    pub fn get(&self, slug: &str, fingerprint: &SourceFingerprint) -> Option<Arc<RenderedDocument>> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");

        let cached_fingerprint = entries.peek(slug).map(|cached| cached.fingerprint);
        let fresh = match cached_fingerprint {
            Some(cached) if cached == *fingerprint => entries
                .get(slug)
                .map(|cached| Arc::clone(&cached.document)),
            Some(_) => {
                entries.pop(slug);
                None
            }
            None => None,
        };

        if fresh.is_some() {
            counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
        } else {
            counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
        }
        fresh
    }

    pub fn put(&self, slug: &str, fingerprint: SourceFingerprint, document: Arc<RenderedDocument>) {
        mutex_lock(&self.entries, SOURCE, "put").put(
            slug.to_string(),
            CachedDocument {
                fingerprint,
                document,
            },
        );
    }

    pub fn invalidate(&self, slug: &str) {
        mutex_lock(&self.entries, SOURCE, "invalidate").pop(slug);
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
