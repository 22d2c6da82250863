//! Batch processing integration tests.
//!
//! Tests verify:
//! - Results come back in input order
//! - The first failing item aborts the batch (no partial results)
//! - Items after the failure are neither encoded nor cached

use std::sync::Arc;

use photo_prep::pipeline::progress::{self, ProgressEvent};
use photo_prep::{PipelineCoordinator, PipelineError, ProcessingBudget, ResultCache};

use super::test_utils::{count, result_key, tinted, CountingEncoder, RejectWidthEncoder};

#[tokio::test]
async fn test_batch_results_in_input_order() {
    let coordinator = PipelineCoordinator::with_cache(Arc::new(ResultCache::with_capacity(8)));
    let budget = ProcessingBudget::default().with_max_dimension(50);
    let images = vec![tinted(100, 40, 1), tinted(30, 30, 2), tinted(40, 200, 3)];

    let results = coordinator
        .process_batch(&images, &budget, true)
        .await
        .unwrap();

    let dims: Vec<_> = results.iter().map(|r| r.output_dimensions).collect();
    assert_eq!(dims, vec![(50, 20), (30, 30), (10, 50)]);
}

#[tokio::test]
async fn test_fail_fast_on_second_item() {
    let encoder = RejectWidthEncoder::new(13);
    let calls = encoder.counter();
    let cache = Arc::new(ResultCache::with_capacity(8));
    let coordinator = PipelineCoordinator::with_encoder(encoder, Arc::clone(&cache));
    let budget = ProcessingBudget::default();
    let images = vec![tinted(10, 10, 1), tinted(13, 10, 2), tinted(16, 10, 3)];
    let (tx, mut rx) = progress::channel();

    let result = coordinator
        .process_batch_with_progress(&images, &budget, true, &tx)
        .await;

    assert!(matches!(result, Err(PipelineError::EncodingFailure { .. })));

    // item 1 encoded, item 2 rejected, item 3 never attempted
    assert_eq!(count(&calls), 2);
    assert_eq!(cache.len().await, 1);
    assert!(cache.contains(&result_key(&images[0], &budget)).await);
    assert!(!cache.contains(&result_key(&images[1], &budget)).await);
    assert!(!cache.contains(&result_key(&images[2], &budget)).await);

    assert_eq!(
        rx.drain(),
        vec![ProgressEvent::Batch {
            completed: 1,
            total: 3
        }]
    );
}

#[tokio::test]
async fn test_batch_failure_on_first_item_reports_nothing() {
    let coordinator =
        PipelineCoordinator::with_cache(Arc::new(ResultCache::with_capacity(8)));
    let budget = ProcessingBudget::default().with_max_output_bytes(5);
    let images = vec![tinted(32, 32, 1), tinted(32, 32, 2)];
    let (tx, mut rx) = progress::channel();

    let result = coordinator
        .process_batch_with_progress(&images, &budget, true, &tx)
        .await;

    assert_eq!(result, Err(PipelineError::FileTooLarge { limit: 5 }));
    assert!(rx.drain().is_empty());
    assert_eq!(coordinator.cache_stats().await.0, 0);
}

#[tokio::test]
async fn test_batch_reuses_cache_for_duplicates() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let coordinator =
        PipelineCoordinator::with_encoder(encoder, Arc::new(ResultCache::with_capacity(8)));
    let budget = ProcessingBudget::default();
    let images = vec![tinted(20, 20, 40), tinted(20, 20, 200), tinted(20, 20, 40)];

    let results = coordinator
        .process_batch(&images, &budget, true)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0], results[2]);
    assert_eq!(count(&calls), 2);
}

#[tokio::test]
async fn test_batch_progress_counts_every_item() {
    let coordinator = PipelineCoordinator::with_cache(Arc::new(ResultCache::with_capacity(8)));
    let images: Vec<_> = (0..4u8).map(|seed| tinted(12, 12, seed)).collect();
    let (tx, mut rx) = progress::channel();

    coordinator
        .process_batch_with_progress(&images, &ProcessingBudget::default(), false, &tx)
        .await
        .unwrap();

    let fractions: Vec<f64> = rx.drain().iter().map(ProgressEvent::fraction).collect();
    assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
}
