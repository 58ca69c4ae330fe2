//! Common test utilities and helpers for the image optimizer tests
//!
//! This module provides shared fixtures and mock backends for testing the
//! controller, archive, and session layers without real codecs or network.

use async_trait::async_trait;

use image_optimizer::core::ImageBlob;
use image_optimizer::error::{OptimizeError, OptimizeResult};
use image_optimizer::intake::IntakeFile;
use image_optimizer::{CaptionBackend, ConvertBackend, OutputFormat};

/// A 1x1 transparent PNG, byte for byte. Small enough to decode anywhere,
/// real enough to exercise the actual codecs.
pub fn tiny_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, // IHDR chunk length
        0x49, 0x48, 0x44, 0x52, // IHDR
        0x00, 0x00, 0x00, 0x01, // width: 1
        0x00, 0x00, 0x00, 0x01, // height: 1
        0x08, 0x06, 0x00, 0x00, 0x00, // depth 8, RGBA
        0x1F, 0xF3, 0xFF, 0x61, // IHDR CRC
        0x00, 0x00, 0x00, 0x0C, // IDAT chunk length
        0x49, 0x44, 0x41, 0x54, // IDAT
        0x78, 0x9C, 0x62, 0x60, 0x60, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, // compressed data
        0x27, 0x6B, 0xB1, 0x42, // IDAT CRC
        0x00, 0x00, 0x00, 0x00, // IEND chunk length
        0x49, 0x45, 0x4E, 0x44, // IEND
        0xAE, 0x42, 0x60, 0x82, // IEND CRC
    ]
}

/// An intake file wrapping the tiny PNG under the given name.
pub fn png_intake(name: &str) -> IntakeFile {
    IntakeFile {
        name: name.to_string(),
        blob: ImageBlob::new(tiny_png(), "image/png"),
    }
}

/// Mock converter with scriptable behavior:
/// - `fail`: every conversion returns an encode error
/// - `produce_mime`: overrides the MIME type of the produced blob,
///   simulating an encoder that silently fell back to another format
#[derive(Debug, Default)]
pub struct MockConverter {
    pub fail: bool,
    pub produce_mime: Option<&'static str>,
}

impl MockConverter {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn producing(mime: &'static str) -> Self {
        Self {
            produce_mime: Some(mime),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ConvertBackend for MockConverter {
    async fn convert(
        &self,
        _source: &ImageBlob,
        format: OutputFormat,
        _quality: f32,
    ) -> OptimizeResult<ImageBlob> {
        if self.fail {
            return Err(OptimizeError::encode(format.name(), "mock failure"));
        }
        let mime = self.produce_mime.unwrap_or_else(|| format.mime());
        Ok(ImageBlob::new(vec![0xCD; 32], mime))
    }
}

/// Mock caption backend answering with a fixed caption, or failing.
#[derive(Debug, Default)]
pub struct MockCaptioner {
    pub fail: bool,
}

#[async_trait]
impl CaptionBackend for MockCaptioner {
    async fn caption(&self, _data_url: &str, _mime: &str) -> OptimizeResult<String> {
        if self.fail {
            Err(OptimizeError::caption("mock endpoint down"))
        } else {
            Ok("A single transparent pixel.".to_string())
        }
    }
}
