//! Cache effectiveness integration tests.
//!
//! Tests verify:
//! - A repeated image is served from cache without re-encoding
//! - Capacity-bounded LRU eviction through the coordinator
//! - Coordinators sharing one cache deduplicate across each other

use std::sync::Arc;

use photo_prep::pipeline::progress::{self, ProgressEvent, Stage};
use photo_prep::{PipelineCoordinator, ProcessingBudget, ResultCache};

use super::test_utils::{count, gradient, result_key, tinted, CountingEncoder};

#[tokio::test]
async fn test_second_call_served_from_cache_without_encoding() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let coordinator =
        PipelineCoordinator::with_encoder(encoder, Arc::new(ResultCache::with_capacity(4)));
    let budget = ProcessingBudget::default();
    let image = gradient(200, 150);

    let first = coordinator.process_one(&image, &budget, true).await.unwrap();
    assert_eq!(count(&calls), 1);

    let (tx, mut rx) = progress::channel();
    let second = coordinator
        .process_one_with_progress(&image, &budget, true, &tx)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.encoded_payload, second.encoded_payload);
    assert_eq!(count(&calls), 1);
    assert_eq!(
        rx.drain(),
        vec![
            ProgressEvent::Stage {
                stage: Stage::Started
            },
            ProgressEvent::Stage {
                stage: Stage::Finished
            },
        ]
    );
}

#[tokio::test]
async fn test_equal_content_in_distinct_buffers_hits() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let coordinator =
        PipelineCoordinator::with_encoder(encoder, Arc::new(ResultCache::with_capacity(4)));
    let budget = ProcessingBudget::default();

    coordinator
        .process_one(&tinted(64, 64, 9), &budget, true)
        .await
        .unwrap();
    coordinator
        .process_one(&tinted(64, 64, 9), &budget, true)
        .await
        .unwrap();

    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn test_use_cache_false_always_encodes() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let cache = Arc::new(ResultCache::with_capacity(4));
    let coordinator = PipelineCoordinator::with_encoder(encoder, Arc::clone(&cache));
    let budget = ProcessingBudget::default();
    let image = gradient(32, 32);

    coordinator.process_one(&image, &budget, true).await.unwrap();
    coordinator.process_one(&image, &budget, false).await.unwrap();

    assert_eq!(count(&calls), 2);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_capacity_two_evicts_least_recent() {
    let cache = Arc::new(ResultCache::with_capacity(2));
    let coordinator = PipelineCoordinator::with_cache(Arc::clone(&cache));
    let budget = ProcessingBudget::default();

    let a = tinted(24, 24, 0);
    let b = tinted(24, 24, 100);
    let c = tinted(24, 24, 200);

    for image in [&a, &b, &c] {
        coordinator.process_one(image, &budget, true).await.unwrap();
    }

    let key_a = result_key(&a, &budget);
    let key_b = result_key(&b, &budget);
    let key_c = result_key(&c, &budget);

    assert!(cache.get(&key_a).await.is_none());
    assert!(cache.get(&key_b).await.is_some());
    assert!(cache.get(&key_c).await.is_some());
}

#[tokio::test]
async fn test_overfill_leaves_most_recently_accessed() {
    let capacity = 3;
    let cache = Arc::new(ResultCache::with_capacity(capacity));
    let coordinator = PipelineCoordinator::with_cache(Arc::clone(&cache));
    let budget = ProcessingBudget::default();

    let images: Vec<_> = (0..5u8).map(|seed| tinted(16, 16, seed * 50)).collect();
    for image in &images[..3] {
        coordinator.process_one(image, &budget, true).await.unwrap();
    }

    // touch the oldest entry so it survives the next two inserts
    coordinator
        .process_one(&images[0], &budget, true)
        .await
        .unwrap();
    for image in &images[3..] {
        coordinator.process_one(image, &budget, true).await.unwrap();
    }

    let expected = vec![
        result_key(&images[4], &budget),
        result_key(&images[3], &budget),
        result_key(&images[0], &budget),
    ];
    assert_eq!(cache.len().await, capacity);
    assert_eq!(cache.keys().await, expected);
}

#[tokio::test]
async fn test_shared_cache_across_coordinators() {
    let cache = Arc::new(ResultCache::with_capacity(8));
    let budget = ProcessingBudget::default();
    let image = gradient(50, 50);

    let first = PipelineCoordinator::with_encoder(CountingEncoder::new(), Arc::clone(&cache));
    first.process_one(&image, &budget, true).await.unwrap();

    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let second = PipelineCoordinator::with_encoder(encoder, Arc::clone(&cache));
    second.process_one(&image, &budget, true).await.unwrap();

    assert_eq!(count(&calls), 0);
}

#[tokio::test]
async fn test_clear_forces_reencode() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let coordinator =
        PipelineCoordinator::with_encoder(encoder, Arc::new(ResultCache::with_capacity(4)));
    let budget = ProcessingBudget::default();
    let image = gradient(20, 20);

    coordinator.process_one(&image, &budget, true).await.unwrap();
    coordinator.clear_cache().await;
    coordinator.process_one(&image, &budget, true).await.unwrap();

    assert_eq!(count(&calls), 2);
}

#[tokio::test]
async fn test_same_image_under_two_budgets_encodes_twice() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let cache = Arc::new(ResultCache::with_capacity(4));
    let coordinator = PipelineCoordinator::with_encoder(encoder, Arc::clone(&cache));
    let image = gradient(400, 300);

    let loose = ProcessingBudget::default();
    let first = coordinator.process_one(&image, &loose, true).await.unwrap();

    let tight = loose
        .with_max_dimension(64)
        .with_max_output_bytes(first.encoded_byte_size / 2);
    let second = coordinator.process_one(&image, &tight, true).await.unwrap();

    assert_eq!(first.output_dimensions, (400, 300));
    assert!(second.output_dimensions.0.max(second.output_dimensions.1) <= 64);
    assert!(second.encoded_byte_size <= tight.max_output_bytes);
    assert_eq!(count(&calls), 2);
    assert!(cache.contains(&result_key(&image, &loose)).await);
    assert!(cache.contains(&result_key(&image, &tight)).await);
}

#[tokio::test]
async fn test_near_identical_images_get_separate_entries() {
    let encoder = CountingEncoder::new();
    let calls = encoder.counter();
    let coordinator =
        PipelineCoordinator::with_encoder(encoder, Arc::new(ResultCache::with_capacity(4)));
    let budget = ProcessingBudget::default();

    let base = gradient(64, 64);
    let mut pixels = base.as_dynamic().to_rgb8();
    let red = pixels.get_pixel(10, 10).0[0];
    pixels.get_pixel_mut(10, 10).0[0] = red.wrapping_add(1);
    let nudged = photo_prep::RawImage::new(image::DynamicImage::ImageRgb8(pixels));

    let a = coordinator.process_one(&base, &budget, true).await.unwrap();
    let b = coordinator.process_one(&nudged, &budget, true).await.unwrap();

    assert_eq!(count(&calls), 2);
    assert_ne!(result_key(&base, &budget), result_key(&nudged, &budget));
    assert_eq!(a.output_dimensions, b.output_dimensions);
}
