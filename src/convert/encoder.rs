//! # Codec-Based Converter
//!
//! The production [`ConvertBackend`]: decodes the source with the `image`
//! crate and re-encodes it with the codec matching the requested target.
//! Encoding is CPU-bound, so each call runs on the blocking pool and only
//! suspends the calling task.
//!
//! Quality handling follows the host encoders: the fraction in `(0, 1]` is
//! mapped onto the 1-100 scale for AVIF and JPEG; WEBP and PNG are encoded
//! losslessly and ignore it.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};

use crate::convert::{ConvertBackend, OutputFormat};
use crate::core::ImageBlob;
use crate::error::{OptimizeError, OptimizeResult};

/// AVIF encoder speed, on ravif's 1 (slowest) to 10 (fastest) scale.
const AVIF_SPEED: u8 = 6;

/// Converter backed by the `image` crate's decoders and encoders.
#[derive(Debug, Default, Clone)]
pub struct ImageCodecConverter;

impl ImageCodecConverter {
    /// Create a new codec converter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConvertBackend for ImageCodecConverter {
    async fn convert(
        &self,
        source: &ImageBlob,
        format: OutputFormat,
        quality: f32,
    ) -> OptimizeResult<ImageBlob> {
        let data = Arc::clone(&source.data);
        let source_mime = source.mime.clone();

        tokio::task::spawn_blocking(move || encode(&data, &source_mime, format, quality))
            .await
            .map_err(|e| OptimizeError::encode(format.name(), format!("encoder task failed: {}", e)))?
    }
}

/// Map a quality fraction in `(0, 1]` onto the encoder's 1-100 scale.
fn quality_scale(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode(
    data: &[u8],
    source_mime: &str,
    format: OutputFormat,
    quality: f32,
) -> OptimizeResult<ImageBlob> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| OptimizeError::decode(source_mime, e.to_string()))?;

    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::WebP => {
            // The webp encoder only accepts 8-bit RGB(A) input.
            let rgba = DynamicImage::ImageRgba8(decoded.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))
        }
        OutputFormat::Avif => {
            let rgba = DynamicImage::ImageRgba8(decoded.to_rgba8());
            rgba.write_with_encoder(AvifEncoder::new_with_speed_quality(
                &mut buffer,
                AVIF_SPEED,
                quality_scale(quality),
            ))
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buffer,
                quality_scale(quality),
            ))
        }
        OutputFormat::Png => decoded.write_to(&mut buffer, ImageFormat::Png),
    };

    result.map_err(|e| OptimizeError::encode(format.name(), e.to_string()))?;
    Ok(ImageBlob::new(buffer.into_inner(), format.mime()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 transparent PNG, byte for byte.
    fn tiny_png() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
            0x00, 0x00, 0x00, 0x0D, // IHDR chunk length
            0x49, 0x48, 0x44, 0x52, // IHDR
            0x00, 0x00, 0x00, 0x01, // width: 1
            0x00, 0x00, 0x00, 0x01, // height: 1
            0x08, 0x06, 0x00, 0x00, 0x00, // depth 8, RGBA
            0x1F, 0x15, 0xC4, 0x89, // IHDR CRC
            0x00, 0x00, 0x00, 0x0B, // IDAT chunk length
            0x49, 0x44, 0x41, 0x54, // IDAT
            0x78, 0xDA, 0x63, 0x60, 0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01,
            0xE9, 0xFA, 0xDC, 0xD8, // IDAT CRC
            0x00, 0x00, 0x00, 0x00, // IEND chunk length
            0x49, 0x45, 0x4E, 0x44, // IEND
            0xAE, 0x42, 0x60, 0x82, // IEND CRC
        ]
    }

    #[test]
    fn test_quality_scale_bounds() {
        assert_eq!(quality_scale(1.0), 100);
        assert_eq!(quality_scale(0.8), 80);
        assert_eq!(quality_scale(0.001), 1);
    }

    #[tokio::test]
    async fn test_encode_webp_from_png() {
        let converter = ImageCodecConverter::new();
        let source = ImageBlob::new(tiny_png(), "image/png");

        let out = converter
            .convert(&source, OutputFormat::WebP, 0.8)
            .await
            .unwrap();
        assert_eq!(out.mime, "image/webp");
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn test_encode_jpeg_drops_alpha() {
        let converter = ImageCodecConverter::new();
        let source = ImageBlob::new(tiny_png(), "image/png");

        let out = converter
            .convert(&source, OutputFormat::Jpeg, 0.7)
            .await
            .unwrap();
        assert_eq!(out.mime, "image/jpeg");
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_input_is_decode_error() {
        let converter = ImageCodecConverter::new();
        let source = ImageBlob::new(vec![0xDE, 0xAD, 0xBE, 0xEF], "image/png");

        let err = converter
            .convert(&source, OutputFormat::WebP, 0.8)
            .await
            .unwrap_err();
        assert_eq!(err.category(), "decode");
    }
}
