//! Codecs and the priority-ordered codec chain.
//!
//! # Design Decisions
//!
//! - **Lossy first**: JPEG is tried first because it gives the smallest
//!   payloads for photographs.
//!
//! - **Lossless fallback**: images with real transparency cannot go through
//!   JPEG without losing it, so JPEG refuses them and the chain moves on to
//!   PNG. An alpha channel that is fully opaque is dropped and the image
//!   stays on JPEG.
//!
//! - **Normalized quality**: callers always pass 0.0-1.0; each codec maps it
//!   to its own knob (JPEG quality 1-100, PNG compression effort).

use std::borrow::Cow;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageEncoder as _};
use serde::Serialize;
use tracing::debug;

use crate::bitmap::RawImage;
use crate::error::PipelineError;

/// Minimum JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Below this normalized quality PNG spends extra effort on compression.
const PNG_BEST_COMPRESSION_BELOW: f32 = 0.5;

// =============================================================================
// Codec
// =============================================================================

/// A single output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Lossy, no transparency
    Jpeg,
    /// Lossless, keeps transparency
    Png,
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Jpeg => "jpeg",
            Codec::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Codec::Jpeg => "image/jpeg",
            Codec::Png => "image/png",
        }
    }

    /// Encode `image` at normalized `quality`.
    ///
    /// # Errors
    ///
    /// `EncodingFailure` when this codec cannot represent the image or the
    /// underlying encoder fails.
    pub fn encode(&self, image: &DynamicImage, quality: f32) -> Result<Bytes, PipelineError> {
        match self {
            Codec::Jpeg => encode_jpeg(image, quality),
            Codec::Png => encode_png(image, quality),
        }
    }
}

fn encode_jpeg(image: &DynamicImage, quality: f32) -> Result<Bytes, PipelineError> {
    if has_transparency(image) {
        return Err(PipelineError::encoding(format!(
            "jpeg cannot represent transparency ({:?})",
            image.color()
        )));
    }

    let flat = flatten_for_jpeg(image);
    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, jpeg_quality(quality))
        .encode(
            flat.as_bytes(),
            flat.width(),
            flat.height(),
            flat.color().into(),
        )
        .map_err(|e| PipelineError::encoding(format!("jpeg: {}", e)))?;

    Ok(Bytes::from(output))
}

fn encode_png(image: &DynamicImage, quality: f32) -> Result<Bytes, PipelineError> {
    let compression = if quality < PNG_BEST_COMPRESSION_BELOW {
        CompressionType::Best
    } else {
        CompressionType::Default
    };

    // PNG has no float sample formats
    let input: Cow<'_, DynamicImage> = match image {
        DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        DynamicImage::ImageRgba32F(_) => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Borrowed(image),
    };

    let mut output = Vec::new();
    PngEncoder::new_with_quality(&mut output, compression, PngFilter::Adaptive)
        .write_image(
            input.as_bytes(),
            input.width(),
            input.height(),
            input.color().into(),
        )
        .map_err(|e| PipelineError::encoding(format!("png: {}", e)))?;

    Ok(Bytes::from(output))
}

/// Whether any pixel is not fully opaque.
pub fn has_transparency(image: &DynamicImage) -> bool {
    match image {
        DynamicImage::ImageRgba8(buf) => buf.pixels().any(|p| p[3] < u8::MAX),
        DynamicImage::ImageLumaA8(buf) => buf.pixels().any(|p| p[1] < u8::MAX),
        DynamicImage::ImageRgba16(buf) => buf.pixels().any(|p| p[3] < u16::MAX),
        DynamicImage::ImageLumaA16(buf) => buf.pixels().any(|p| p[1] < u16::MAX),
        DynamicImage::ImageRgba32F(buf) => buf.pixels().any(|p| p[3] < 1.0),
        other => other.color().has_alpha(),
    }
}

/// View `image` as 8-bit gray or RGB, the layouts the JPEG encoder accepts.
///
/// Alpha is discarded. Already-compatible images are borrowed, not copied.
fn flatten_for_jpeg(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

/// Map a normalized 0.0-1.0 quality onto JPEG's 1-100 scale.
#[inline]
pub fn jpeg_quality(quality: f32) -> u8 {
    let scaled = (quality * 100.0).round();
    if scaled.is_nan() {
        return MIN_JPEG_QUALITY;
    }
    scaled.clamp(MIN_JPEG_QUALITY as f32, MAX_JPEG_QUALITY as f32) as u8
}

/// Validate a normalized quality parameter.
#[inline]
pub fn is_valid_quality(quality: f32) -> bool {
    quality.is_finite() && (0.0..=1.0).contains(&quality)
}

// =============================================================================
// Encoder seam
// =============================================================================

/// Output of one successful encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// Encoded file bytes
    pub data: Bytes,

    /// Codec that produced `data`
    pub codec: Codec,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Compresses an image at a given normalized quality.
///
/// Implementations must be pure: the same image and quality always give the
/// same bytes. The coordinator runs them on a blocking worker thread.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &RawImage, quality: f32) -> Result<EncodedImage, PipelineError>;
}

/// Codecs tried in priority order; the first one that accepts the image wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecChain {
    codecs: Vec<Codec>,
}

impl CodecChain {
    pub fn new(codecs: Vec<Codec>) -> Self {
        Self { codecs }
    }

    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }
}

impl Default for CodecChain {
    /// JPEG, then PNG.
    fn default() -> Self {
        Self::new(vec![Codec::Jpeg, Codec::Png])
    }
}

impl ImageEncoder for CodecChain {
    fn encode(&self, image: &RawImage, quality: f32) -> Result<EncodedImage, PipelineError> {
        let mut rejections = Vec::new();

        for &codec in &self.codecs {
            match codec.encode(image.as_dynamic(), quality) {
                Ok(data) => return Ok(EncodedImage { data, codec }),
                Err(err) => {
                    debug!(codec = codec.name(), "Codec rejected image: {}", err);
                    rejections.push(err.to_string());
                }
            }
        }

        if rejections.is_empty() {
            return Err(PipelineError::encoding("no codecs configured"));
        }
        Err(PipelineError::encoding(rejections.join("; ")))
    }
}

// =============================================================================
// Tests
// =============================================================================
