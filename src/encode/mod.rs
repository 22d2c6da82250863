//! Adaptive encoding.
//!
//! # Components
//!
//! - [`Codec`]: one output format (JPEG, PNG)
//! - [`CodecChain`]: codecs tried in priority order, the production [`ImageEncoder`]
//! - [`encode_within_budget`]: the two-step quality ladder against a byte limit

mod codec;
mod ladder;

pub use codec::{
    has_transparency, is_valid_quality, jpeg_quality, Codec, CodecChain, EncodedImage,
    ImageEncoder, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use ladder::{encode_within_budget, LadderOutcome, LadderStep};
