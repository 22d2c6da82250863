//! Two-step quality ladder against a byte budget.
//!
//! The image is encoded at the target quality; if the result is over the
//! byte limit it is re-encoded exactly once at the fallback quality. If that
//! is still too large the call fails with `FileTooLarge`. There is no search
//! over intermediate qualities, so the worst case is always two encodes.

use tracing::{debug, warn};

use super::codec::{EncodedImage, ImageEncoder};
use crate::bitmap::RawImage;
use crate::budget::ProcessingBudget;
use crate::error::PipelineError;

/// Which rung of the ladder produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    Target,
    Fallback,
}

/// A result that fits the byte budget.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderOutcome {
    pub encoded: EncodedImage,

    /// Normalized quality that produced `encoded`
    pub quality: f32,

    pub step: LadderStep,
}

/// Encode `image` so that it fits `budget.max_output_bytes`.
///
/// `on_attempt` is called after each encode with the rung and the byte size
/// it produced, before the size is checked.
///
/// # Errors
///
/// Encoder errors are returned as-is. `FileTooLarge` when both rungs are over
/// the limit.
pub fn encode_within_budget<E, F>(
    encoder: &E,
    image: &RawImage,
    budget: &ProcessingBudget,
    mut on_attempt: F,
) -> Result<LadderOutcome, PipelineError>
where
    E: ImageEncoder + ?Sized,
    F: FnMut(LadderStep, usize),
{
    let limit = budget.max_output_bytes;

    let first = encoder.encode(image, budget.target_quality)?;
    on_attempt(LadderStep::Target, first.len());

    if first.len() <= limit {
        debug!(
            bytes = first.len(),
            limit,
            quality = budget.target_quality,
            "Encoded within budget"
        );
        return Ok(LadderOutcome {
            encoded: first,
            quality: budget.target_quality,
            step: LadderStep::Target,
        });
    }

    warn!(
        bytes = first.len(),
        limit,
        fallback_quality = budget.fallback_quality,
        "Over budget at target quality, retrying at fallback"
    );

    let second = encoder.encode(image, budget.fallback_quality)?;
    on_attempt(LadderStep::Fallback, second.len());

    if second.len() <= limit {
        return Ok(LadderOutcome {
            encoded: second,
            quality: budget.fallback_quality,
            step: LadderStep::Fallback,
        });
    }

    Err(PipelineError::FileTooLarge { limit })
}
