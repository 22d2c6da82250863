//! Content keys for cache lookup.
//!
//! A key is the SHA-256 of the image's dimensions, color type and exact
//! pixel bytes, so a one-level change to a single pixel gives a new key.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::RawImage;
use crate::error::PipelineError;

/// Deterministic identity of an image's content (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey(Arc<str>);

impl ContentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentKey {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

/// Compute the content key of an image.
///
/// # Errors
///
/// `InvalidInput` for a zero-area image.
pub fn compute_key(image: &RawImage) -> Result<ContentKey, PipelineError> {
    if image.is_empty() {
        return Err(PipelineError::invalid_input(format!(
            "zero-area image ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let pixels = image.as_dynamic();

    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(format!("{:?}", pixels.color()).as_bytes());
    hasher.update(pixels.as_bytes());

    Ok(ContentKey(Arc::from(hex::encode(hasher.finalize()))))
}
