use thiserror::Error;

/// Errors raised while preparing an image for upload.
///
/// Every variant is terminal for the item that produced it. The only retry
/// the pipeline performs is the single quality fallback inside the budget
/// ladder, and a failed item is never written to the result cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Image has zero area or could not be decoded
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Every codec in the chain rejected the image
    #[error("Encoding failed: {message}")]
    EncodingFailure { message: String },

    /// Budget ladder exhausted: still over the byte limit at fallback quality
    #[error("Encoded image exceeds the upload limit of {limit} bytes")]
    FileTooLarge { limit: usize },

    /// Target geometry cannot be produced (e.g. a zero max dimension)
    #[error("Resize failed: {reason}")]
    ResizeFailure { reason: String },

    /// Budget parameters are out of range
    #[error("Invalid budget: {reason}")]
    InvalidBudget { reason: String },

    /// Blocking worker panicked or was cancelled before finishing
    #[error("Worker error: {0}")]
    Worker(String),
}

impl PipelineError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        Self::EncodingFailure {
            message: message.into(),
        }
    }

    /// Short machine-readable tag, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::EncodingFailure { .. } => "encoding_failure",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::ResizeFailure { .. } => "resize_failure",
            Self::InvalidBudget { .. } => "invalid_budget",
            Self::Worker(_) => "worker",
        }
    }
}
