//! Per-call processing budget.

use crate::encode::is_valid_quality;
use crate::error::PipelineError;

/// Default longest output side, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Default first-attempt quality (0.0-1.0).
pub const DEFAULT_TARGET_QUALITY: f32 = 0.85;

/// Default upload limit: 5MB.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 5_000_000;

/// Default second-attempt quality (0.0-1.0).
pub const DEFAULT_FALLBACK_QUALITY: f32 = 0.5;

/// Limits applied to one `process_one` / `process_batch` call.
///
/// Qualities are expressed on a 0.0-1.0 scale and mapped onto each codec's
/// native range by the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingBudget {
    /// Longest allowed output side in pixels
    pub max_dimension: u32,

    /// Quality of the first encode attempt
    pub target_quality: f32,

    /// Hard upper bound on the encoded size in bytes
    pub max_output_bytes: usize,

    /// Quality of the single retry when the first attempt is over budget
    pub fallback_quality: f32,
}

impl ProcessingBudget {
    pub fn new(
        max_dimension: u32,
        target_quality: f32,
        max_output_bytes: usize,
        fallback_quality: f32,
    ) -> Self {
        Self {
            max_dimension,
            target_quality,
            max_output_bytes,
            fallback_quality,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn with_qualities(mut self, target_quality: f32, fallback_quality: f32) -> Self {
        self.target_quality = target_quality;
        self.fallback_quality = fallback_quality;
        self
    }

    /// Check quality ranges and the byte limit.
    ///
    /// A zero `max_dimension` is not rejected here; the normalizer reports it
    /// as a `ResizeFailure` when the image is actually processed.
    pub fn validate(&self) -> Result<(), PipelineError> {
        check_quality("target_quality", self.target_quality)?;
        check_quality("fallback_quality", self.fallback_quality)?;

        if self.max_output_bytes == 0 {
            return Err(PipelineError::InvalidBudget {
                reason: "max_output_bytes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ProcessingBudget {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_DIMENSION,
            DEFAULT_TARGET_QUALITY,
            DEFAULT_MAX_OUTPUT_BYTES,
            DEFAULT_FALLBACK_QUALITY,
        )
    }
}

fn check_quality(name: &str, quality: f32) -> Result<(), PipelineError> {
    if is_valid_quality(quality) {
        Ok(())
    } else {
        Err(PipelineError::InvalidBudget {
            reason: format!("{} must be between 0.0 and 1.0, got {}", name, quality),
        })
    }
}
