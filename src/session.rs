//! # Optimizer Session
//!
//! High-level orchestration of one run: intake, conversion, optional
//! captioning, output writing, and optional archiving. Provides a
//! builder-pattern API so embeddings can swap the conversion and caption
//! backends without touching the run loop.

// Standard library imports
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

// External crate imports
use anyhow::{Context, Result};
use tracing::warn;

// Internal module imports
use crate::archive::{ARCHIVE_FILE_NAME, build_archive, unique_output_name};
use crate::caption::{CaptionBackend, GeminiCaptionClient};
use crate::config::OptimizerConfig;
use crate::controller::{AppliedEvent, ImageListController, ItemStatus};
use crate::convert::{ConvertBackend, ImageCodecConverter};
use crate::intake;

/// Summary of one completed session run.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// Items that reached COMPLETED.
    pub converted: usize,
    /// Items that reached ERROR.
    pub failed: usize,
    /// Inputs intake dropped (unreadable or not images).
    pub skipped: usize,
    /// Total bytes across accepted originals.
    pub original_bytes: u64,
    /// Total bytes across produced outputs.
    pub converted_bytes: u64,
    /// Captions gathered, as `(file name, caption)` pairs.
    pub captions: Vec<(String, String)>,
    /// Where the archive landed, when one was requested and built.
    pub archive_path: Option<PathBuf>,
}

/// One optimizer run over a set of input paths.
pub struct OptimizerSession {
    controller: ImageListController,
    config: OptimizerConfig,
}

impl OptimizerSession {
    /// Create a new session using the builder pattern.
    pub fn builder() -> OptimizerSessionBuilder {
        OptimizerSessionBuilder::new()
    }

    /// Run the session: take in `inputs`, convert everything, then write
    /// outputs (and captions/archive when configured) under the output
    /// directory.
    pub async fn run(mut self, inputs: &[PathBuf]) -> Result<SessionReport> {
        let files = intake::collect_files(inputs).await;
        let skipped = inputs.len() - files.len();

        println!("Optimizing {} image(s):", files.len());
        println!(
            "  Target: {} @ quality {:.2}",
            self.config.format.name(),
            self.config.quality
        );

        self.controller.add_files(files);
        self.controller.run_until_settled().await;

        if self.config.captions {
            self.gather_captions().await;
        }

        let mut report = SessionReport {
            skipped,
            ..Default::default()
        };
        for item in self.controller.items() {
            match item.status() {
                ItemStatus::Completed => report.converted += 1,
                ItemStatus::Error => report.failed += 1,
                _ => {}
            }
            report.original_bytes += item.original_size() as u64;
            if let Some(output) = item.output() {
                report.converted_bytes += output.size as u64;
            }
            if let Some(text) = item.alt_text() {
                report
                    .captions
                    .push((item.name().to_string(), text.to_string()));
            }
        }

        self.write_outputs().await?;
        if self.config.archive {
            report.archive_path = self.write_archive().await;
        }

        Ok(report)
    }

    /// Request a caption for every tracked item and wait for all of them.
    /// Failures surface as notices; the affected captions stay absent.
    async fn gather_captions(&mut self) {
        let ids: Vec<_> = self.controller.items().iter().map(|i| i.id()).collect();
        for id in ids {
            self.controller.request_caption(id);
        }

        for event in self.controller.run_until_settled().await {
            if let AppliedEvent::CaptionFailed(id, error) = event {
                let name = self
                    .controller
                    .item(id)
                    .map(|i| i.name().to_string())
                    .unwrap_or_else(|| format!("item {}", id));
                eprintln!("Caption unavailable for {}: {}", name, error);
            }
        }
    }

    /// Write every completed output into the output directory, using the
    /// same de-duplicated naming the archive uses. A single failed write
    /// is logged and skipped; the other files still land.
    async fn write_outputs(&self) -> Result<()> {
        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let mut used = HashSet::new();
        for item in self.controller.items() {
            let Some(output) = item.output() else {
                continue;
            };
            let name = unique_output_name(&mut used, item.name(), &output.blob.mime);
            let path = dir.join(&name);
            if let Err(e) = tokio::fs::write(&path, output.blob.data.as_slice()).await {
                warn!("could not write {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    /// Build and write the zip bundle. On failure a notice is printed and
    /// nothing partial is written.
    async fn write_archive(&self) -> Option<PathBuf> {
        let bytes = match build_archive(self.controller.items()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Could not build archive: {}", e);
                return None;
            }
        };

        let path = self.config.output_dir.join(ARCHIVE_FILE_NAME);
        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => Some(path),
            Err(e) => {
                eprintln!("Could not write archive {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Builder for creating optimizer sessions with a fluent API.
pub struct OptimizerSessionBuilder {
    converter: Option<Arc<dyn ConvertBackend>>,
    captioner: Option<Arc<dyn CaptionBackend>>,
    config: OptimizerConfig,
}

impl Default for OptimizerSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerSessionBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            converter: None,
            captioner: None,
            config: OptimizerConfig::default(),
        }
    }

    /// Set the run configuration.
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the conversion backend.
    pub fn with_converter(mut self, converter: Arc<dyn ConvertBackend>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Replace the caption backend.
    pub fn with_captioner(mut self, captioner: Arc<dyn CaptionBackend>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    /// Build the session, falling back to the codec converter and the
    /// Gemini caption client when no backend was supplied.
    pub fn build(self) -> Result<OptimizerSession> {
        self.config.validate().map_err(anyhow::Error::msg)?;

        let converter = self
            .converter
            .unwrap_or_else(|| Arc::new(ImageCodecConverter::new()));
        let captioner = self
            .captioner
            .unwrap_or_else(|| Arc::new(GeminiCaptionClient::new()));

        let controller = ImageListController::new(converter, captioner, self.config.to_settings());
        Ok(OptimizerSession {
            controller,
            config: self.config,
        })
    }
}
