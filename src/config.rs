//! Configuration management for photo-prep.
//!
//! This module provides the command-line configuration, which supports:
//! - Command-line arguments via clap
//! - Environment variables with `PHOTO_PREP_` prefix
//! - Defaults matching [`ProcessingBudget::default`]
//!
//! # Example
//!
//! ```ignore
//! use photo_prep::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! if let Command::Encode(config) = cli.command {
//!     let budget = config.budget();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `PHOTO_PREP_MAX_DIMENSION` - Longest output side in pixels (default: 2048)
//! - `PHOTO_PREP_TARGET_QUALITY` - First-attempt quality 0.0-1.0 (default: 0.85)
//! - `PHOTO_PREP_MAX_UPLOAD_BYTES` - Upload limit in bytes (default: 5000000)
//! - `PHOTO_PREP_FALLBACK_QUALITY` - Retry quality 0.0-1.0 (default: 0.5)
//! - `PHOTO_PREP_CACHE_CAPACITY` - Cached results (default: 64)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::budget::{
    ProcessingBudget, DEFAULT_FALLBACK_QUALITY, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_TARGET_QUALITY,
};
use crate::encode::is_valid_quality;
use crate::pipeline::DEFAULT_RESULT_CACHE_CAPACITY;

// =============================================================================
// CLI
// =============================================================================

/// photo-prep - Prepare photographs for upload.
///
/// Downscales and re-encodes images so they fit an upload byte budget,
/// skipping work for images it has already processed.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-prep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Encode images and write upload-ready payloads to stdout.
    Encode(EncodeConfig),

    /// Print the content key of each image.
    Fingerprint(FingerprintConfig),
}

/// Output format for `encode`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per image, payload under `image_base64`
    #[default]
    Json,
    /// Human-readable size report, no payload
    Summary,
}

// =============================================================================
// Encode Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct EncodeConfig {
    /// Image files to encode, processed in order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    // =========================================================================
    // Budget
    // =========================================================================
    /// Longest output side in pixels.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION, env = "PHOTO_PREP_MAX_DIMENSION")]
    pub max_dimension: u32,

    /// Quality of the first encode attempt (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_TARGET_QUALITY, env = "PHOTO_PREP_TARGET_QUALITY")]
    pub target_quality: f32,

    /// Maximum encoded size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_BYTES, env = "PHOTO_PREP_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Quality of the single retry when over budget (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_FALLBACK_QUALITY, env = "PHOTO_PREP_FALLBACK_QUALITY")]
    pub fallback_quality: f32,

    /// Display pixel scale of the inputs (affects the size estimate only).
    #[arg(long, default_value_t = 1.0)]
    pub scale: f32,

    // =========================================================================
    // Cache
    // =========================================================================
    /// Maximum number of cached results.
    #[arg(long, default_value_t = DEFAULT_RESULT_CACHE_CAPACITY, env = "PHOTO_PREP_CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Skip the result cache.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    // =========================================================================
    // Output
    // =========================================================================
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl EncodeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_dimension == 0 {
            return Err("max_dimension must be greater than 0".to_string());
        }

        if !is_valid_quality(self.target_quality) {
            return Err("target_quality must be between 0.0 and 1.0".to_string());
        }
        if !is_valid_quality(self.fallback_quality) {
            return Err("fallback_quality must be between 0.0 and 1.0".to_string());
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err("scale must be a positive number".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Build the processing budget from the command-line values.
    pub fn budget(&self) -> ProcessingBudget {
        ProcessingBudget::new(
            self.max_dimension,
            self.target_quality,
            self.max_upload_bytes,
            self.fallback_quality,
        )
    }

    pub fn use_cache(&self) -> bool {
        !self.no_cache
    }
}

// =============================================================================
// Fingerprint Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct FingerprintConfig {
    /// Image files to fingerprint.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
