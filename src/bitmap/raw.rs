//! Caller-owned decoded bitmaps.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageReader};

use crate::error::PipelineError;

/// Bytes-per-pixel assumed when estimating the uncompressed size of an image.
pub const ESTIMATE_BYTES_PER_PIXEL: f64 = 4.0;

/// A decoded in-memory bitmap handed to the pipeline.
///
/// Pixels live behind an `Arc`, so cloning a `RawImage` (for example to move
/// it onto a blocking worker) never copies pixel memory. The pipeline only
/// ever reads from it.
///
/// `scale` is the display pixel scale of the source (1.0 for plain bitmaps,
/// 2.0 or 3.0 for high-density screenshots). It only feeds the raw size
/// estimate.
#[derive(Debug, Clone)]
pub struct RawImage {
    pixels: Arc<DynamicImage>,
    scale: f32,
}

impl RawImage {
    /// Wrap a decoded image with a pixel scale of 1.0.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            pixels: Arc::new(image),
            scale: 1.0,
        }
    }

    /// Set the pixel scale. Non-finite or non-positive values fall back to 1.0.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        self
    }

    /// Decode an encoded image (JPEG, PNG, WebP) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::invalid_input("empty image data"));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| PipelineError::invalid_input(format!("undecodable image: {}", e)))?;

        Ok(Self::new(image))
    }

    /// Open and decode an image file, guessing the format from its contents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                PipelineError::invalid_input(format!("cannot read {}: {}", path.display(), e))
            })?
            .decode()
            .map_err(|e| {
                PipelineError::invalid_input(format!("cannot decode {}: {}", path.display(), e))
            })?;

        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn has_alpha(&self) -> bool {
        self.pixels.color().has_alpha()
    }

    /// Borrow the decoded pixels.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.pixels
    }

    /// Approximate uncompressed size: `width * height * scale² * 4`.
    ///
    /// Only used to report a compression ratio; it is not the real memory
    /// footprint of the decoded buffer.
    pub fn estimated_byte_size(&self) -> u64 {
        let scale = self.scale as f64;
        (self.width() as f64 * self.height() as f64 * scale * scale * ESTIMATE_BYTES_PER_PIXEL)
            .round() as u64
    }

    /// True when both values share the same pixel buffer.
    #[cfg(test)]
    pub(crate) fn shares_pixels_with(&self, other: &RawImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl From<DynamicImage> for RawImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}
