use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use image_optimizer::{OptimizerConfig, convert::OutputFormat};

/// Re-encode images into modern formats, client-side style:
/// - webp/avif/jpeg/png output via the bundled codecs
/// - optional AI alt-text captions and a zip bundle of the results
#[derive(Parser, Debug)]
#[command(name = "opti")]
#[command(about = "🖼️  Re-encode images into modern formats at a chosen quality")]
#[command(
    long_about = "Re-encode raster images into WEBP, AVIF, JPEG, or PNG at a chosen quality.
Optionally requests an AI-generated accessibility caption per image and bundles
all outputs into a single zip archive."
)]
struct Args {
    /// Input image files
    #[arg(required = true, help = "Image files to optimize")]
    inputs: Vec<PathBuf>,

    /// Target format
    #[arg(short, long, default_value = "webp",
          help = "Output format: webp, avif, jpeg, png")]
    format: String,

    /// Encoder quality as a fraction
    #[arg(short, long, default_value_t = 0.8,
          help = "Quality fraction in (0.0, 1.0]; ignored by lossless formats")]
    quality: f32,

    /// Output directory
    #[arg(short, long, default_value = "optimized",
          help = "Directory converted files are written into")]
    out_dir: PathBuf,

    /// Bundle all outputs into one zip archive
    #[arg(long, help = "Also write a single zip bundle of every output")]
    zip: bool,

    /// Request an alt-text caption for each image
    #[arg(long, help = "Request an AI-generated accessibility caption per image (needs GEMINI_API_KEY)")]
    captions: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let format = OutputFormat::parse(&args.format)?;
    let quality = parse_quality(args.quality)?;

    let config = OptimizerConfig::new(format, quality, args.out_dir, args.zip, args.captions);
    let report = image_optimizer::optimize_files(config, &args.inputs).await?;

    println!(
        "Done: {} converted, {} failed, {} skipped",
        report.converted, report.failed, report.skipped
    );
    if report.converted_bytes > 0 && report.original_bytes > 0 {
        let saved = 100.0
            - (report.converted_bytes as f64 / report.original_bytes as f64) * 100.0;
        println!(
            "Size: {} → {} bytes ({:.1}% saved)",
            report.original_bytes, report.converted_bytes, saved
        );
    }
    for (name, caption) in &report.captions {
        println!("  {}: {}", name, caption);
    }
    if let Some(path) = &report.archive_path {
        println!("Archive: {}", path.display());
    }

    Ok(())
}

/// Validate the quality fraction with a friendlier message than the
/// config-level check.
fn parse_quality(quality: f32) -> Result<f32> {
    if quality > 0.0 && quality <= 1.0 {
        Ok(quality)
    } else {
        Err(anyhow::anyhow!(
            "Invalid quality: {}. Use a fraction in (0.0, 1.0], e.g. 0.8",
            quality
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality_bounds() {
        assert!(parse_quality(0.8).is_ok());
        assert!(parse_quality(1.0).is_ok());
        assert!(parse_quality(0.0).is_err());
        assert!(parse_quality(1.5).is_err());
    }
}
