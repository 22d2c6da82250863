//! Pipeline layer.
//!
//! This module ties the bitmap and encode layers together and adds
//! content-addressed caching and progress reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Caller (UI / upload client)      │
//! └────────────────────┬────────────────────┘
//!                      │  RawImage + ProcessingBudget
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          PipelineCoordinator            │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ ResultCache  │  │  ImageEncoder   │  │
//! │  │ (LRU, keyed  │  │  + budget       │  │
//! │  │  by content) │  │    ladder)      │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │  EncodingResult
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │      Request construction (external)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`PipelineCoordinator`]: entry point for single and batch calls
//! - [`ResultCache`]: bounded LRU cache of encoded results, keyed by [`ResultKey`]
//! - [`EncodingResult`]: immutable upload-ready payload plus size metadata
//! - [`progress`]: per-call progress channels
//!
//! # Example
//!
//! ```
//! use photo_prep::pipeline::{progress, PipelineCoordinator};
//! use photo_prep::{ProcessingBudget, RawImage};
//! use image::DynamicImage;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = PipelineCoordinator::with_cache_capacity(16);
//!     let image = RawImage::new(DynamicImage::new_rgb8(640, 480));
//!     let budget = ProcessingBudget::default().with_max_dimension(320);
//!
//!     let (tx, mut rx) = progress::channel();
//!     let result = coordinator
//!         .process_one_with_progress(&image, &budget, true, &tx)
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(result.output_dimensions, (320, 240));
//!     assert_eq!(rx.drain().last().map(|e| e.fraction()), Some(1.0));
//! }
//! ```

mod cache;
pub mod progress;
mod result;
mod service;

pub use cache::{ResultCache, ResultKey, DEFAULT_RESULT_CACHE_CAPACITY};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender, Stage};
pub use result::EncodingResult;
pub use service::PipelineCoordinator;
