use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::encode::{Codec, LadderOutcome};

/// A successfully compressed, upload-ready image.
///
/// Values handed out by the cache are clones; the payload is reference
/// counted, so cloning never copies the encoded bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodingResult {
    /// Encoded file bytes (serialized as base64 under `image_base64`)
    #[serde(rename = "image_base64", serialize_with = "serialize_base64")]
    pub encoded_payload: Bytes,

    /// `width * height * scale² * 4` of the source image
    pub original_byte_estimate: u64,

    /// Length of `encoded_payload`
    pub encoded_byte_size: usize,

    /// `(width, height)` after normalization
    pub output_dimensions: (u32, u32),

    /// `original_byte_estimate / encoded_byte_size`
    pub compression_ratio: f64,

    /// Codec that produced the payload
    pub codec: Codec,

    /// Normalized quality that satisfied the byte budget
    pub quality: f32,
}

impl EncodingResult {
    pub(crate) fn from_outcome(
        outcome: LadderOutcome,
        original_byte_estimate: u64,
        output_dimensions: (u32, u32),
    ) -> Self {
        let encoded_byte_size = outcome.encoded.len();
        let compression_ratio = if encoded_byte_size == 0 {
            0.0
        } else {
            original_byte_estimate as f64 / encoded_byte_size as f64
        };

        Self {
            encoded_payload: outcome.encoded.data,
            original_byte_estimate,
            encoded_byte_size,
            output_dimensions,
            compression_ratio,
            codec: outcome.encoded.codec,
            quality: outcome.quality,
        }
    }

    /// Payload as standard base64 text, ready to embed in a request body.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.encoded_payload)
    }

    pub fn mime_type(&self) -> &'static str {
        self.codec.mime_type()
    }
}

fn serialize_base64<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(payload))
}
