//! # photo-prep
//!
//! Prepare user photographs for upload: fit them inside a size envelope,
//! compress them under a byte budget, and never compress the same image
//! twice.
//!
//! The crate is a pure CPU/memory transform. It does no network or disk I/O
//! of its own; callers decode images, hand them to the pipeline, and pass
//! the encoded payload on to whatever builds the upload request.
//!
//! ## Features
//!
//! - **Geometry normalization**: aspect-preserving Lanczos3 downscale to a max dimension
//! - **Adaptive encoding**: JPEG first, PNG for images with transparency
//! - **Budget ladder**: one retry at a fallback quality, then a hard `FileTooLarge`
//! - **Content-addressed caching**: bounded LRU cache keyed by image content and budget
//! - **Progress reporting**: per-call event channels for UIs
//!
//! ## Architecture
//!
//! - [`bitmap`] - caller images, content keys, geometry
//! - [`encode`] - codecs, codec chain and the budget ladder
//! - [`pipeline`] - coordinator, result cache and progress
//! - [`budget`] - per-call processing limits
//! - [`config`] - CLI configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use photo_prep::{PipelineCoordinator, ProcessingBudget, RawImage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), photo_prep::PipelineError> {
//!     let coordinator = PipelineCoordinator::new();
//!     let image = RawImage::open("holiday.jpg")?;
//!
//!     let result = coordinator
//!         .process_one(&image, &ProcessingBudget::default(), true)
//!         .await?;
//!
//!     let body = serde_json::json!({ "image_base64": result.to_base64() });
//!     println!("{}", body);
//!     Ok(())
//! }
//! ```

pub mod bitmap;
pub mod budget;
pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use bitmap::{compute_key, normalize, target_dimensions, ContentKey, RawImage};
pub use budget::ProcessingBudget;
pub use config::{Cli, Command, EncodeConfig, FingerprintConfig, OutputFormat};
pub use encode::{
    encode_within_budget, Codec, CodecChain, EncodedImage, ImageEncoder, LadderOutcome,
    LadderStep,
};
pub use error::PipelineError;
pub use pipeline::{
    progress, EncodingResult, PipelineCoordinator, ProgressEvent, ProgressReceiver,
    ProgressSender, ResultCache, ResultKey, Stage,
};
