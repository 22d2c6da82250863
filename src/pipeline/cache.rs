//! Result cache for encoded images.
//!
//! Maps a [`ResultKey`] (image content plus the budget it was encoded under)
//! to the [`EncodingResult`] produced for it, so an image that has already
//! been compressed under the same budget is never compressed again.
//!
//! # Eviction
//!
//! Capacity is a fixed number of entries. Eviction is strict LRU: both
//! `get` and `put` move an entry to the most-recently-used position, and a
//! `put` into a full cache first drops the least-recently-used entry.
//!
//! Only encoded bytes are stored, never decoded bitmaps, so steady-state
//! memory is roughly `capacity × average payload size`.

use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

use lru::LruCache;
use tokio::sync::Mutex;

use super::result::EncodingResult;
use crate::bitmap::ContentKey;
use crate::budget::ProcessingBudget;

/// Default number of cached results.
pub const DEFAULT_RESULT_CACHE_CAPACITY: usize = 64;

static GLOBAL_CACHE: OnceLock<Arc<ResultCache>> = OnceLock::new();

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for encoding results.
///
/// The same image encoded under two budgets gives two different results, so
/// every budget field is part of the key. Qualities are stored as raw `f32`
/// bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    /// Content fingerprint of the source image
    pub content: ContentKey,

    /// Longest allowed output side in pixels
    pub max_dimension: u32,

    /// Bits of the target quality
    pub target_quality: u32,

    /// Upload limit in bytes
    pub max_output_bytes: usize,

    /// Bits of the fallback quality
    pub fallback_quality: u32,
}

impl ResultKey {
    /// Create a key for `content` encoded under `budget`.
    pub fn new(content: ContentKey, budget: &ProcessingBudget) -> Self {
        Self {
            content,
            max_dimension: budget.max_dimension,
            target_quality: quality_bits(budget.target_quality),
            max_output_bytes: budget.max_output_bytes,
            fallback_quality: quality_bits(budget.fallback_quality),
        }
    }
}

// -0.0 and 0.0 are the same quality
fn quality_bits(quality: f32) -> u32 {
    if quality == 0.0 {
        0
    } else {
        quality.to_bits()
    }
}

// =============================================================================
// Result Cache
// =============================================================================

/// Bounded LRU cache of encoding results.
///
/// # Thread Safety
///
/// Every operation takes the same mutex, including reads (a hit reorders the
/// recency list). Callers never observe a half-evicted or half-inserted
/// state. Share it across tasks via `Arc`.
///
/// # Example
///
/// ```
/// use photo_prep::pipeline::ResultCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = ResultCache::with_capacity(2);
///     assert!(cache.is_empty().await);
///     assert_eq!(cache.capacity(), 2);
/// }
/// ```
pub struct ResultCache {
    cache: Mutex<LruCache<ResultKey, EncodingResult>>,
    capacity: NonZeroUsize,
}

impl ResultCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RESULT_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` results.
    ///
    /// A capacity of 0 is treated as 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    /// The process-wide cache shared by coordinators created with
    /// `PipelineCoordinator::new`.
    pub fn global() -> Arc<ResultCache> {
        Arc::clone(GLOBAL_CACHE.get_or_init(|| Arc::new(ResultCache::new())))
    }

    /// Look up a result and mark it most recently used.
    pub async fn get(&self, key: &ResultKey) -> Option<EncodingResult> {
        let mut cache = self.cache.lock().await;
        cache.get(key).cloned()
    }

    /// Check for a key without touching recency.
    pub async fn contains(&self, key: &ResultKey) -> bool {
        let cache = self.cache.lock().await;
        cache.contains(key)
    }

    /// Insert or replace a result; it becomes most recently used.
    ///
    /// Returns the entry evicted to make room, if any.
    pub async fn put(
        &self,
        key: ResultKey,
        value: EncodingResult,
    ) -> Option<(ResultKey, EncodingResult)> {
        let mut cache = self.cache.lock().await;
        // push() also reports a replaced value under the same key; that is not an eviction
        match cache.push(key, value) {
            Some((old_key, old_value)) if !cache.contains(&old_key) => Some((old_key, old_value)),
            _ => None,
        }
    }

    /// Remove a result, returning it if present.
    pub async fn remove(&self, key: &ResultKey) -> Option<EncodingResult> {
        let mut cache = self.cache.lock().await;
        cache.pop(key)
    }

    /// Drop every entry and the recency order.
    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        cache.clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.lock().await;
        cache.len()
    }

    pub async fn is_empty(&self) -> bool {
        let cache = self.cache.lock().await;
        cache.is_empty()
    }

    /// Keys from most to least recently used.
    pub async fn keys(&self) -> Vec<ResultKey> {
        let cache = self.cache.lock().await;
        cache.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
