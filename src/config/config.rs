//! # Run Configuration
//!
//! Configuration structures for one optimizer run. `OptimizerConfig` is the
//! interface between the CLI and the library: it is validated up front and
//! then split into per-item `ConversionSettings`.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `format` | `OutputFormat` | webp/avif/jpeg/png | Target format for new items |
//! | `quality` | `f32` | (0.0, 1.0] | Encoder quality fraction |
//! | `output_dir` | `PathBuf` | Any writable path | Where converted files land |
//! | `archive` | `bool` | true/false | Also write one zip bundle |
//! | `captions` | `bool` | true/false | Request an alt-text caption per image |
//!
//! Settings are snapshotted onto each tracked item at creation time.
//! Mutating the defaults afterwards never retroactively changes existing
//! items; only their own settings patches do.

use std::path::PathBuf;

use crate::convert::OutputFormat;

/// Per-item conversion settings: target format plus quality fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionSettings {
    /// Target output format.
    pub format: OutputFormat,
    /// Quality fraction in `(0.0, 1.0]`. Ignored by lossless targets.
    pub quality: f32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::WebP,
            quality: 0.8,
        }
    }
}

impl ConversionSettings {
    /// Apply a partial change, leaving unspecified fields untouched.
    pub fn merged(self, patch: SettingsPatch) -> Self {
        Self {
            format: patch.format.unwrap_or(self.format),
            quality: patch.quality.unwrap_or(self.quality),
        }
    }
}

/// Partial settings change for one tracked item.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPatch {
    pub format: Option<OutputFormat>,
    pub quality: Option<f32>,
}

/// Configuration for one optimizer run.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Default target format for newly added images.
    pub format: OutputFormat,
    /// Default quality fraction for newly added images.
    pub quality: f32,
    /// Directory converted files are written into.
    pub output_dir: PathBuf,
    /// Also bundle every completed output into one zip archive.
    pub archive: bool,
    /// Request an AI-generated alt-text caption for each image.
    pub captions: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::WebP,
            quality: 0.8,
            output_dir: PathBuf::from("optimized"),
            archive: false,
            captions: false,
        }
    }
}

impl OptimizerConfig {
    /// Create a configuration with explicit values.
    pub fn new(
        format: OutputFormat,
        quality: f32,
        output_dir: PathBuf,
        archive: bool,
        captions: bool,
    ) -> Self {
        Self {
            format,
            quality,
            output_dir,
            archive,
            captions,
        }
    }

    /// Validate the configuration, returning a human-readable message for
    /// the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(format!(
                "quality must be a fraction in (0.0, 1.0], got {}",
                self.quality
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err("output directory must not be empty".to_string());
        }
        Ok(())
    }

    /// The default conversion settings snapshotted onto new items.
    pub fn to_settings(&self) -> ConversionSettings {
        ConversionSettings {
            format: self.format,
            quality: self.quality,
        }
    }
}
