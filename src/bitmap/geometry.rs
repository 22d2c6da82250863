//! Fit images inside a maximum-dimension envelope.

use image::imageops::FilterType;
use tracing::debug;

use super::RawImage;
use crate::error::PipelineError;

/// Resampling filter used when downscaling.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Compute the output size for an image fitted to `max_dimension`.
///
/// Sizes that already fit are returned unchanged. Otherwise the longer side
/// becomes exactly `max_dimension` and the shorter side is scaled by the same
/// factor, rounded to the nearest pixel and never below 1.
pub fn target_dimensions(
    width: u32,
    height: u32,
    max_dimension: u32,
) -> Result<(u32, u32), PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid_input(format!(
            "zero-area image ({}x{})",
            width, height
        )));
    }
    if max_dimension == 0 {
        return Err(PipelineError::ResizeFailure {
            reason: "max dimension must be greater than 0".to_string(),
        });
    }

    if width <= max_dimension && height <= max_dimension {
        return Ok((width, height));
    }

    let long = width.max(height) as u64;
    let short = width.min(height) as u64;
    let max = max_dimension as u64;
    let scaled_short = ((short * max + long / 2) / long).max(1) as u32;

    if width >= height {
        Ok((max_dimension, scaled_short))
    } else {
        Ok((scaled_short, max_dimension))
    }
}

/// Scale `image` to fit within `max_dimension`, preserving aspect ratio.
///
/// Returns a cheap clone of the input (same pixel buffer) when no resize is
/// needed, so at most one resized copy exists per call.
pub fn normalize(image: &RawImage, max_dimension: u32) -> Result<RawImage, PipelineError> {
    let (width, height) = image.dimensions();
    let (target_width, target_height) = target_dimensions(width, height, max_dimension)?;

    if (target_width, target_height) == (width, height) {
        return Ok(image.clone());
    }

    debug!(
        from_width = width,
        from_height = height,
        to_width = target_width,
        to_height = target_height,
        "Downscaling image"
    );

    let resized = image
        .as_dynamic()
        .resize_exact(target_width, target_height, RESIZE_FILTER);

    Ok(RawImage::new(resized).with_scale(image.scale()))
}
