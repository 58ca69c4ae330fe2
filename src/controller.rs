//! # Image List Controller
//!
//! Sole owner of the tracked-image collection. Every status transition in
//! the crate happens here, which keeps the item lifecycle auditable:
//!
//! ```text
//! IDLE ──schedule──▶ CONVERTING ──completion──▶ COMPLETED
//!   ▲                                      └──▶ ERROR
//!   └────────── settings change (any state) ◀──┘
//! ```
//!
//! ## Scheduling
//!
//! Conversion work is explicit rather than re-scanned: whenever items enter
//! IDLE (on add or on a settings reset), the controller marks every IDLE
//! item CONVERTING in one pass — so an overlapping trigger can never pick
//! the same item twice — and then spawns one independent conversion task
//! per item. Tasks report back over a single completion channel and the
//! controller applies completions one at a time as they arrive.
//!
//! ## Stale results
//!
//! There is no cancellation primitive for in-flight work. Instead each item
//! carries a version counter: a settings change bumps it, and a completion
//! whose spawn-time version no longer matches is discarded on arrival. The
//! reschedule caused by the settings reset produces the authoritative
//! result. Completions for removed items are discarded the same way.
//!
//! ## Preview resources
//!
//! Every preview handle an item holds is released exactly once: on item
//! removal, on clear, or when a new output replaces an old one — in which
//! case the old handle is released before the new one is installed.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::caption::CaptionBackend;
use crate::config::{ConversionSettings, SettingsPatch};
use crate::convert::ConvertBackend;
use crate::core::data_url::encode_data_url;
use crate::core::preview::{PreviewHandle, PreviewStore};
use crate::core::{ImageBlob, ImageId};
use crate::error::{OptimizeError, OptimizeResult};
use crate::intake::IntakeFile;

/// Lifecycle status of a tracked image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Queued for conversion but not yet started.
    Idle,
    /// A conversion task for the current settings is in flight.
    Converting,
    /// A valid output matching the current settings is installed.
    Completed,
    /// The last conversion attempt failed; retried only on settings change.
    Error,
}

/// Output of a successful conversion, exclusively owned by its item.
#[derive(Debug)]
pub struct ConvertedOutput {
    /// Encoded bytes tagged with the MIME type actually produced.
    pub blob: ImageBlob,
    /// Byte size of the output.
    pub size: usize,
    /// Preview handle for the output blob.
    pub preview: PreviewHandle,
}

/// One uploaded image and everything the session knows about it.
#[derive(Debug)]
pub struct TrackedImage {
    id: ImageId,
    name: String,
    original: ImageBlob,
    original_size: usize,
    original_preview: PreviewHandle,
    status: ItemStatus,
    output: Option<ConvertedOutput>,
    settings: ConversionSettings,
    alt_text: Option<String>,
    generating_alt: bool,
    version: u64,
}

impl TrackedImage {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original(&self) -> &ImageBlob {
        &self.original
    }

    pub fn original_size(&self) -> usize {
        self.original_size
    }

    pub fn original_preview_id(&self) -> u64 {
        self.original_preview.id()
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Present exactly when status is [`ItemStatus::Completed`].
    pub fn output(&self) -> Option<&ConvertedOutput> {
        self.output.as_ref()
    }

    pub fn settings(&self) -> ConversionSettings {
        self.settings
    }

    pub fn alt_text(&self) -> Option<&str> {
        self.alt_text.as_deref()
    }

    pub fn is_generating_alt(&self) -> bool {
        self.generating_alt
    }
}

/// Completion messages sent by spawned conversion and caption tasks.
enum CompletionEvent {
    Converted {
        id: ImageId,
        version: u64,
        result: OptimizeResult<ImageBlob>,
    },
    Captioned {
        id: ImageId,
        result: OptimizeResult<String>,
    },
}

/// What applying one completion did, for the embedding to log or surface.
#[derive(Debug)]
pub enum AppliedEvent {
    /// An item moved to COMPLETED.
    Converted(ImageId),
    /// An item moved to ERROR.
    ConversionFailed(ImageId),
    /// A completion arrived for a superseded version or a removed item.
    StaleResultDiscarded(ImageId),
    /// A caption was stored on the item.
    Captioned(ImageId),
    /// The caption call failed; the item's caption stays absent. Carries
    /// the error so the embedding can show a user-visible notice.
    CaptionFailed(ImageId, OptimizeError),
}

/// Owner and single mutator of the tracked-image collection.
pub struct ImageListController {
    items: Vec<TrackedImage>,
    previews: PreviewStore,
    converter: Arc<dyn ConvertBackend>,
    captioner: Arc<dyn CaptionBackend>,
    default_settings: ConversionSettings,
    next_id: ImageId,
    completions_tx: UnboundedSender<CompletionEvent>,
    completions_rx: UnboundedReceiver<CompletionEvent>,
}

impl ImageListController {
    /// Create a controller over the given backends.
    pub fn new(
        converter: Arc<dyn ConvertBackend>,
        captioner: Arc<dyn CaptionBackend>,
        default_settings: ConversionSettings,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            items: Vec::new(),
            previews: PreviewStore::new(),
            converter,
            captioner,
            default_settings,
            next_id: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// Current default settings for newly added items.
    pub fn default_settings(&self) -> ConversionSettings {
        self.default_settings
    }

    /// Change the defaults. Applies to items created afterwards only;
    /// existing items keep their own settings.
    pub fn set_default_settings(&mut self, settings: ConversionSettings) {
        self.default_settings = settings;
    }

    /// All tracked items, in intake order.
    pub fn items(&self) -> &[TrackedImage] {
        &self.items
    }

    /// Look up one item by id.
    pub fn item(&self, id: ImageId) -> Option<&TrackedImage> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Read access to preview-resource accounting.
    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Track a batch of accepted files. Each item starts IDLE with a
    /// snapshot of the current default settings, and conversion is
    /// scheduled before this call returns.
    pub fn add_files(&mut self, files: Vec<IntakeFile>) -> Vec<ImageId> {
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let id = self.next_id;
            self.next_id += 1;

            let original_preview = self.previews.register(&file.blob);
            self.items.push(TrackedImage {
                id,
                name: file.name,
                original_size: file.blob.len(),
                original: file.blob,
                original_preview,
                status: ItemStatus::Idle,
                output: None,
                settings: self.default_settings,
                alt_text: None,
                generating_alt: false,
                version: 0,
            });
            ids.push(id);
        }

        self.schedule_idle();
        ids
    }

    /// Remove one item, releasing both of its preview resources. An
    /// in-flight conversion for it is not cancelled; its completion is
    /// discarded on arrival.
    pub fn remove(&mut self, id: ImageId) -> bool {
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };

        let item = self.items.remove(pos);
        self.previews.release(item.original_preview);
        if let Some(output) = item.output {
            self.previews.release(output.preview);
        }
        true
    }

    /// Drop every item and release every preview resource.
    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            self.previews.release(item.original_preview);
            if let Some(output) = item.output {
                self.previews.release(output.preview);
            }
        }
    }

    /// Merge a partial settings change into one item. Any previous output
    /// is discarded (its preview released first), the item is forced back
    /// to IDLE, and conversion is rescheduled. The version bump makes any
    /// still-outstanding completion for the old settings stale.
    pub fn update_settings(&mut self, id: ImageId, patch: SettingsPatch) -> bool {
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };

        {
            let item = &mut self.items[pos];
            item.settings = item.settings.merged(patch);
            item.version += 1;
            if let Some(output) = item.output.take() {
                self.previews.release(output.preview);
            }
            item.status = ItemStatus::Idle;
        }

        self.schedule_idle();
        true
    }

    /// Request an alt-text caption for one item, independent of its
    /// conversion status. No-op when the item is unknown or a caption
    /// request for it is already in flight.
    pub fn request_caption(&mut self, id: ImageId) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        if item.generating_alt {
            return false;
        }
        item.generating_alt = true;

        let captioner = Arc::clone(&self.captioner);
        let tx = self.completions_tx.clone();
        let data_url = encode_data_url(&item.original);
        let mime = item.original.mime.clone();

        tokio::spawn(async move {
            let result = captioner.caption(&data_url, &mime).await;
            let _ = tx.send(CompletionEvent::Captioned { id, result });
        });
        true
    }

    /// True while any conversion or caption task is outstanding.
    pub fn busy(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == ItemStatus::Converting || item.generating_alt)
    }

    /// Wait for the next completion and apply it. Returns `None` once
    /// nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<AppliedEvent> {
        if !self.busy() {
            return None;
        }
        // The controller holds a sender, so the channel cannot close while
        // a task is outstanding.
        let event = self.completions_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Apply completions until every outstanding task has reported.
    pub async fn run_until_settled(&mut self) -> Vec<AppliedEvent> {
        let mut applied = Vec::new();
        while let Some(event) = self.next_event().await {
            applied.push(event);
        }
        applied
    }

    /// Mark every IDLE item CONVERTING in one pass, then spawn one
    /// conversion task per marked item. The single pass is what guarantees
    /// an item is never picked up twice.
    fn schedule_idle(&mut self) {
        let mut scheduled = Vec::new();
        for item in &mut self.items {
            if item.status == ItemStatus::Idle {
                item.status = ItemStatus::Converting;
                scheduled.push((
                    item.id,
                    item.version,
                    item.original.clone(),
                    item.settings,
                ));
            }
        }

        for (id, version, source, settings) in scheduled {
            let converter = Arc::clone(&self.converter);
            let tx = self.completions_tx.clone();
            tokio::spawn(async move {
                let result = converter
                    .convert(&source, settings.format, settings.quality)
                    .await;
                let _ = tx.send(CompletionEvent::Converted {
                    id,
                    version,
                    result,
                });
            });
        }
    }

    fn apply(&mut self, event: CompletionEvent) -> AppliedEvent {
        match event {
            CompletionEvent::Converted {
                id,
                version,
                result,
            } => self.apply_conversion(id, version, result),
            CompletionEvent::Captioned { id, result } => self.apply_caption(id, result),
        }
    }

    fn apply_conversion(
        &mut self,
        id: ImageId,
        version: u64,
        result: OptimizeResult<ImageBlob>,
    ) -> AppliedEvent {
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            debug!("discarding conversion result for removed item {}", id);
            return AppliedEvent::StaleResultDiscarded(id);
        };
        if self.items[pos].version != version {
            debug!("discarding stale conversion result for item {}", id);
            return AppliedEvent::StaleResultDiscarded(id);
        }

        match result {
            Ok(blob) => {
                if let Some(previous) = self.items[pos].output.take() {
                    self.previews.release(previous.preview);
                }
                let preview = self.previews.register(&blob);
                let item = &mut self.items[pos];
                item.output = Some(ConvertedOutput {
                    size: blob.len(),
                    blob,
                    preview,
                });
                item.status = ItemStatus::Completed;
                AppliedEvent::Converted(id)
            }
            Err(e) => {
                let item = &mut self.items[pos];
                warn!("conversion failed for '{}': {}", item.name, e);
                item.status = ItemStatus::Error;
                AppliedEvent::ConversionFailed(id)
            }
        }
    }

    fn apply_caption(&mut self, id: ImageId, result: OptimizeResult<String>) -> AppliedEvent {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!("discarding caption result for removed item {}", id);
            return AppliedEvent::StaleResultDiscarded(id);
        };

        item.generating_alt = false;
        match result {
            Ok(text) => {
                item.alt_text = Some(text);
                AppliedEvent::Captioned(id)
            }
            Err(e) => {
                warn!("caption request failed for '{}': {}", item.name, e);
                AppliedEvent::CaptionFailed(id, e)
            }
        }
    }
}
