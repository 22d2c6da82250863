//! Pipeline coordinator.
//!
//! The coordinator is the main entry point. For each image it:
//! - Computes the content key
//! - Checks the result cache under that key and the call's budget
//! - Estimates the raw size
//! - Normalizes geometry
//! - Encodes through the budget ladder
//! - Caches and returns the result
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      PipelineCoordinator                        │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    process_one()                        │    │
//! │  │  1. Content key       4. Normalize geometry             │    │
//! │  │  2. Check cache       5. Encode + budget ladder         │    │
//! │  │  3. Estimate size     6. Cache & return                 │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌─────────────┐     ┌──────────────┐    ┌──────────────────┐ │
//! │    │ ResultCache │     │  normalize   │    │  ImageEncoder    │ │
//! │    └─────────────┘     └──────────────┘    └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cache::{ResultCache, ResultKey};
use super::progress::{ProgressSender, Stage};
use super::result::EncodingResult;
use crate::bitmap::{compute_key, normalize, RawImage};
use crate::budget::ProcessingBudget;
use crate::encode::{encode_within_budget, CodecChain, ImageEncoder, LadderStep};
use crate::error::PipelineError;

// =============================================================================
// Pipeline Coordinator
// =============================================================================

/// Orchestrates lookup, normalization, encoding and caching.
///
/// The coordinator keeps no per-call state. Progress goes to the
/// [`ProgressSender`] passed to each call, so one coordinator can serve
/// concurrent calls.
///
/// # Type Parameters
///
/// * `E` - The encoder (defaults to the JPEG → PNG [`CodecChain`])
///
/// # Example
///
/// ```ignore
/// use photo_prep::{progress, PipelineCoordinator, ProcessingBudget, RawImage};
///
/// let coordinator = PipelineCoordinator::new();
/// let image = RawImage::open("photo.jpg")?;
///
/// let (tx, mut rx) = progress::channel();
/// let result = coordinator
///     .process_one_with_progress(&image, &ProcessingBudget::default(), true, &tx)
///     .await?;
///
/// println!("{} bytes, ratio {:.1}", result.encoded_byte_size, result.compression_ratio);
/// ```
pub struct PipelineCoordinator<E: ImageEncoder + 'static = CodecChain> {
    /// Result cache, usually shared process-wide
    cache: Arc<ResultCache>,

    /// Encoder run on blocking worker threads
    encoder: Arc<E>,
}

impl PipelineCoordinator<CodecChain> {
    /// Create a coordinator using the default codec chain and the global cache.
    pub fn new() -> Self {
        Self::with_cache(ResultCache::global())
    }

    /// Create a coordinator using the default codec chain and the given cache.
    pub fn with_cache(cache: Arc<ResultCache>) -> Self {
        Self::with_encoder(CodecChain::default(), cache)
    }

    /// Create a coordinator with a private cache of `capacity` entries.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self::with_cache(Arc::new(ResultCache::with_capacity(capacity)))
    }
}

impl Default for PipelineCoordinator<CodecChain> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ImageEncoder + 'static> PipelineCoordinator<E> {
    /// Create a coordinator with a custom encoder.
    pub fn with_encoder(encoder: E, cache: Arc<ResultCache>) -> Self {
        Self {
            cache,
            encoder: Arc::new(encoder),
        }
    }

    /// Process one image without progress reporting.
    pub async fn process_one(
        &self,
        image: &RawImage,
        budget: &ProcessingBudget,
        use_cache: bool,
    ) -> Result<EncodingResult, PipelineError> {
        self.process_one_with_progress(image, budget, use_cache, &ProgressSender::disabled())
            .await
    }

    /// Process one image, reporting [`Stage`] checkpoints to `progress`.
    ///
    /// A cache hit jumps straight from `Started` to `Finished`.
    ///
    /// # Errors
    ///
    /// - `InvalidBudget` if the budget is out of range
    /// - `InvalidInput` for a zero-area image
    /// - `ResizeFailure` for a zero max dimension
    /// - `EncodingFailure` if every codec rejects the image
    /// - `FileTooLarge` if the budget ladder is exhausted
    ///
    /// Nothing is cached on error.
    pub async fn process_one_with_progress(
        &self,
        image: &RawImage,
        budget: &ProcessingBudget,
        use_cache: bool,
        progress: &ProgressSender,
    ) -> Result<EncodingResult, PipelineError> {
        budget.validate()?;
        progress.stage(Stage::Started);

        let key = if use_cache {
            let content = run_blocking({
                let image = image.clone();
                move || compute_key(&image)
            })
            .await?;
            let key = ResultKey::new(content, budget);

            if let Some(cached) = self.cache.get(&key).await {
                info!(key = %key.content, bytes = cached.encoded_byte_size, "Cache hit");
                progress.stage(Stage::Finished);
                return Ok(cached);
            }
            Some(key)
        } else {
            None
        };

        let original_byte_estimate = image.estimated_byte_size();
        progress.stage(Stage::SizeEstimated);

        let (output_dimensions, outcome) = run_blocking({
            let image = image.clone();
            let encoder = Arc::clone(&self.encoder);
            let budget = *budget;
            let progress = progress.clone();
            move || {
                let normalized = normalize(&image, budget.max_dimension)?;
                drop(image);
                progress.stage(Stage::Resized);

                let outcome =
                    encode_within_budget(encoder.as_ref(), &normalized, &budget, |step, _| {
                        if step == LadderStep::Target {
                            progress.stage(Stage::Encoded);
                        }
                    })?;
                Ok((normalized.dimensions(), outcome))
            }
        })
        .await?;
        progress.stage(Stage::BudgetChecked);

        let result =
            EncodingResult::from_outcome(outcome, original_byte_estimate, output_dimensions);

        if let Some(key) = key {
            info!(
                key = %key.content,
                bytes = result.encoded_byte_size,
                codec = result.codec.name(),
                "Cache miss, stored result"
            );
            self.cache.put(key, result.clone()).await;
        } else {
            debug!(bytes = result.encoded_byte_size, "Encoded without cache");
        }

        progress.stage(Stage::Finished);
        Ok(result)
    }

    /// Process images in order without progress reporting.
    pub async fn process_batch(
        &self,
        images: &[RawImage],
        budget: &ProcessingBudget,
        use_cache: bool,
    ) -> Result<Vec<EncodingResult>, PipelineError> {
        self.process_batch_with_progress(images, budget, use_cache, &ProgressSender::disabled())
            .await
    }

    /// Process images in order, reporting `completed / total` after each one.
    ///
    /// Fail-fast: the first error aborts the batch and is returned; later
    /// images are neither processed nor cached, and no partial results are
    /// returned.
    pub async fn process_batch_with_progress(
        &self,
        images: &[RawImage],
        budget: &ProcessingBudget,
        use_cache: bool,
        progress: &ProgressSender,
    ) -> Result<Vec<EncodingResult>, PipelineError> {
        let total = images.len();
        let mut results = Vec::with_capacity(total);

        for (index, image) in images.iter().enumerate() {
            let result = self
                .process_one(image, budget, use_cache)
                .await
                .map_err(|err| {
                    warn!(
                        index,
                        total,
                        error_type = err.kind(),
                        "Batch aborted: {}",
                        err
                    );
                    err
                })?;

            results.push(result);
            progress.batch(index + 1, total);
        }

        Ok(results)
    }

    /// Returns `(entry_count, capacity)`.
    pub async fn cache_stats(&self) -> (usize, usize) {
        (self.cache.len().await, self.cache.capacity())
    }

    /// Drop every cached result.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// The cache this coordinator reads and writes.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }
}

/// Run CPU-bound work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))?
}

// =============================================================================
// Tests
// =============================================================================
