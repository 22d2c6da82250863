//! Bitmap layer: caller images, content keys and geometry.
//!
//! - [`RawImage`]: decoded, caller-owned pixels plus a display scale
//! - [`compute_key`]: deterministic [`ContentKey`] used to index the result cache
//! - [`normalize`]: aspect-preserving downscale into a max-dimension envelope

mod fingerprint;
mod geometry;
mod raw;

pub use fingerprint::{compute_key, ContentKey};
pub use geometry::{normalize, target_dimensions, RESIZE_FILTER};
pub use raw::{RawImage, ESTIMATE_BYTES_PER_PIXEL};
