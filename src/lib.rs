//! # Image Optimizer Library
//!
//! Batch re-encoding of raster images into modern formats (WEBP/AVIF, plus
//! JPEG/PNG) with per-image tracking, optional AI-generated accessibility
//! captions, and zip bundling of the results.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `intake`: file reading and image sniffing
//! - `convert`: target formats and the re-encoding backend
//! - `caption`: client for the remote alt-text endpoint
//! - `archive`: zip bundling with collision-free entry names
//! - `controller`: the tracked-image collection and its state machine
//! - `session`: high-level orchestration of one run
//! - `config`: run configuration and per-item settings
//! - `core`: shared blob, id, preview-resource, and data-URL primitives
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use image_optimizer::{OptimizerConfig, optimize_files};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = OptimizerConfig::default();
//! let report = optimize_files(config, &[PathBuf::from("photo.jpg")]).await?;
//! println!("{} converted, {} failed", report.converted, report.failed);
//! # Ok(())
//! # }
//! ```

// External crate imports
use std::path::PathBuf;

use anyhow::Result;

// Internal module imports
pub mod archive;
pub mod caption;
pub mod config;
pub mod controller;
pub mod convert;
pub mod core;
pub mod error;
pub mod intake;
pub mod session;

/// Re-export error types for convenience
pub use error::{OptimizeError, OptimizeResult, classify};

/// Re-export commonly used types
pub use caption::{CaptionBackend, GeminiCaptionClient};
pub use config::{ConversionSettings, OptimizerConfig, SettingsPatch};
pub use controller::{AppliedEvent, ImageListController, ItemStatus, TrackedImage};
pub use convert::{ConvertBackend, ImageCodecConverter, OutputFormat};
pub use crate::core::{ImageBlob, ImageId};
pub use session::{OptimizerSession, SessionReport};

/// Main entry point for one optimization run.
///
/// Validates the configuration, builds a session over the default backends
/// (codec converter, Gemini caption client), and runs it over `inputs`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or if the output
/// directory cannot be created. Per-file problems never fail the run; they
/// are reported in the returned [`SessionReport`].
pub async fn optimize_files(config: OptimizerConfig, inputs: &[PathBuf]) -> Result<SessionReport> {
    let session = OptimizerSession::builder().with_config(config).build()?;
    session.run(inputs).await
}
