//! photo-prep - Prepare photographs for upload.
//!
//! This binary decodes image files, runs them through the pipeline and
//! writes the results to stdout. Logs go to stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_prep::{
    compute_key,
    config::{Cli, Command, EncodeConfig, FingerprintConfig, OutputFormat},
    progress, EncodingResult, PipelineCoordinator, RawImage,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Encode(config) => run_encode(config).await,
        Command::Fingerprint(config) => run_fingerprint(config),
    }
}

// =============================================================================
// Encode Command
// =============================================================================

async fn run_encode(config: EncodeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let budget = config.budget();
    info!(
        max_dimension = budget.max_dimension,
        target_quality = budget.target_quality,
        max_upload_bytes = budget.max_output_bytes,
        fallback_quality = budget.fallback_quality,
        cache = config.use_cache(),
        "Encoding {} image(s)",
        config.files.len()
    );

    let mut images = Vec::with_capacity(config.files.len());
    for path in &config.files {
        match RawImage::open(path) {
            Ok(image) => images.push(image.with_scale(config.scale)),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let coordinator = PipelineCoordinator::with_cache_capacity(config.cache_capacity);
    let (tx, mut rx) = progress::channel();

    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!("Progress: {:.0}%", event.fraction() * 100.0);
        }
    });

    let outcome = coordinator
        .process_batch_with_progress(&images, &budget, config.use_cache(), &tx)
        .await;
    drop(tx);
    let _ = reporter.await;

    let results = match outcome {
        Ok(results) => results,
        Err(e) => {
            error!(error_type = e.kind(), "Batch failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_results(&config, &results) {
        error!("Failed to write output: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Write one line per result to stdout.
fn write_results(config: &EncodeConfig, results: &[EncodingResult]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (path, result) in config.files.iter().zip(results) {
        match config.format {
            OutputFormat::Json => {
                let mut value = serde_json::to_value(result)?;
                value["source"] = serde_json::Value::String(path.display().to_string());
                value["mime_type"] = serde_json::Value::String(result.mime_type().to_string());
                serde_json::to_writer(&mut out, &value)?;
                writeln!(out)?;
            }
            OutputFormat::Summary => {
                let (width, height) = result.output_dimensions;
                writeln!(
                    out,
                    "{}: {}x{} {} q={:.2} {} bytes (estimated raw {} bytes, ratio {:.1}x)",
                    path.display(),
                    width,
                    height,
                    result.codec.name(),
                    result.quality,
                    result.encoded_byte_size,
                    result.original_byte_estimate,
                    result.compression_ratio
                )?;
            }
        }
    }

    out.flush()
}

// =============================================================================
// Fingerprint Command
// =============================================================================

fn run_fingerprint(config: FingerprintConfig) -> ExitCode {
    init_logging(config.verbose);

    let mut status = ExitCode::SUCCESS;
    for path in &config.files {
        match RawImage::open(path).and_then(|image| compute_key(&image)) {
            Ok(key) => println!("{}  {}", key, path.display()),
            Err(e) => {
                error!("{}", e);
                status = ExitCode::FAILURE;
            }
        }
    }

    status
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_prep=debug"
    } else {
        "photo_prep=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
