//! # Format Conversion Module
//!
//! Target-format definitions and the conversion backend interface. The
//! controller talks to a [`ConvertBackend`] trait object so the real
//! codec-based converter and the mock encoders used in tests are
//! interchangeable.

pub mod encoder;

pub use encoder::ImageCodecConverter;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::ImageBlob;
use crate::error::OptimizeResult;

/// Target formats the optimizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Avif,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// MIME type this format is tagged with.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Canonical lowercase name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// Parse a format name. Case-insensitive; `jpg` is accepted for `jpeg`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "webp" => Ok(Self::WebP),
            "avif" => Ok(Self::Avif),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(anyhow::anyhow!(
                "Unknown output format: {}. Use: webp, avif, jpeg, png",
                name
            )),
        }
    }

    /// Whether the underlying encoder honors a quality fraction. Lossless
    /// targets ignore it; that policy belongs to the encoder, not us.
    pub fn supports_quality(&self) -> bool {
        matches!(self, Self::Avif | Self::Jpeg)
    }
}

/// File extension for a produced MIME type. `image/jpeg` maps to `jpg`,
/// everything else passes its subtype through.
pub fn extension_for_mime(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        other => other.strip_prefix("image/").unwrap_or(other),
    }
}

/// Abstract interface for image re-encoding backends.
/// Implement this trait to plug in custom or mock encoders.
#[async_trait]
pub trait ConvertBackend: Send + Sync {
    /// Decode `source` and re-encode it as `format` at `quality` (a
    /// fraction in `(0, 1]`). Returns the encoded bytes tagged with the
    /// MIME type that was actually produced.
    ///
    /// A single failed attempt is final; the caller marks the item ERROR
    /// and only a settings change retries.
    async fn convert(
        &self,
        source: &ImageBlob,
        format: OutputFormat,
        quality: f32,
    ) -> OptimizeResult<ImageBlob>;
}
