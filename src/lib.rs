//! Per-line edit timestamp tracking.
//!
//! Tracks, for every line of a text document, the instant that line was
//! last edited, and keeps those timestamps attached to the right lines as
//! the document changes. On every content change the engine diffs the new
//! snapshot against the last-known one, carries timestamps across line
//! shifts, stamps inserted and rewritten lines, and persists the result.
//!
//! The host editor supplies content through [`ContentSource`] and forwards
//! change notifications to [`Engine::on_content_changed`]; everything else
//! (rendering, command surface, which document is active) stays on the
//! host's side.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

mod diff;
mod document;
mod error;
mod settings;
mod store;

pub use diff::{compute_edit_script, EditOp, EditScript};
pub use document::{split_lines, BaselineCache};
pub use error::{EngineError, Result};
pub use settings::{
    discover_settings, load_settings, ColdStart, Settings, StoreSettings, TrackingSettings,
    DEFAULT_STORE_PATH, SETTINGS_FILE,
};
pub use store::{EntryMap, StoreSnapshot, TimestampStore};

/// Provides the current full content of a document on demand.
///
/// The engine always works from complete snapshots: a single reported edit
/// point is insufficient because insertions and deletions shift every line
/// after them. Returning `None` means the document cannot be read right
/// now; the engine surfaces that as [`EngineError::ContentUnavailable`].
pub trait ContentSource {
    /// Current full text of the document identified by `document_id`.
    fn full_content(&self, document_id: &str) -> Option<String>;
}

impl<C: ContentSource + ?Sized> ContentSource for Arc<C> {
    fn full_content(&self, document_id: &str) -> Option<String> {
        (**self).full_content(document_id)
    }
}

/// The line-timestamp tracking engine.
///
/// Owns the last-known-content baseline for each tracked document and the
/// durable [`TimestampStore`]. All mutating operations are serialized by
/// the store's internal lock, so a host may call them from concurrent
/// tasks without losing updates.
pub struct Engine<C> {
    content: C,
    settings: Settings,
    store: TimestampStore,
    baselines: BaselineCache,
}

impl<C: ContentSource> Engine<C> {
    /// Create an engine from settings, resolving the store location
    /// against `settings_dir` (the directory the settings were found in,
    /// as returned by [`discover_settings`]).
    pub fn new(content: C, settings: Settings, settings_dir: &Path) -> Self {
        let store = TimestampStore::new(settings.store_file(settings_dir));
        Self {
            content,
            settings,
            store,
            baselines: BaselineCache::new(),
        }
    }

    /// Create an engine whose store lives at an explicit path, with
    /// default settings otherwise.
    pub fn with_store_path(content: C, store_path: PathBuf) -> Self {
        Self {
            content,
            settings: Settings::default(),
            store: TimestampStore::new(store_path),
            baselines: BaselineCache::new(),
        }
    }

    /// The underlying store, for hosts that drive `record_change` with
    /// their own snapshots or clocks.
    pub fn store(&self) -> &TimestampStore {
        &self.store
    }

    /// Resume tracking a document.
    ///
    /// Seeds the baseline according to the cold-start policy: with
    /// [`ColdStart::Seed`] the document's current content becomes the
    /// baseline, so a restart causes no timestamp churn for untouched
    /// lines; with [`ColdStart::Reset`] the baseline is empty and the
    /// first change stamps every line.
    pub fn open_document(&self, document_id: &str) -> Result<()> {
        let baseline = match self.settings.cold_start() {
            ColdStart::Seed => self.fetch_lines(document_id)?,
            ColdStart::Reset => Vec::new(),
        };
        debug!(document_id, lines = baseline.len(), "tracking resumed");
        self.baselines.insert(document_id, baseline);
        Ok(())
    }

    /// Handle a content-change notification for a document.
    ///
    /// Fetches the current content, diffs it against the baseline (seeding
    /// one per the cold-start policy if the document was never opened),
    /// remaps and persists the document's timestamps, and only then
    /// advances the baseline. If persistence fails the baseline stays
    /// put, so the next attempt retries against the same prior content.
    pub async fn on_content_changed(&self, document_id: &str) -> Result<()> {
        let new_lines = self.fetch_lines(document_id)?;
        let old_lines = match self.baselines.get(document_id) {
            Some(lines) => lines.as_slice().to_vec(),
            None => match self.settings.cold_start() {
                ColdStart::Seed => new_lines.clone(),
                ColdStart::Reset => Vec::new(),
            },
        };

        self.store
            .record_change(document_id, &old_lines, &new_lines, Utc::now())
            .await?;
        self.baselines.insert(document_id, new_lines);
        Ok(())
    }

    /// Stop tracking a document. Drops only the in-memory baseline; the
    /// persisted history is kept.
    pub fn close_document(&self, document_id: &str) {
        self.baselines.remove(document_id);
        debug!(document_id, "tracking stopped");
    }

    /// Recorded per-line timestamps for a document, for a rendering layer
    /// to overlay. Returns an empty map (not an error) if the document has
    /// no recorded history.
    pub async fn timestamps_for_document(&self, document_id: &str) -> Result<EntryMap> {
        let snapshot = self.store.load().await?;
        Ok(snapshot
            .entries(document_id)
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_lines(&self, document_id: &str) -> Result<Vec<String>> {
        let text = self
            .content
            .full_content(document_id)
            .ok_or_else(|| EngineError::ContentUnavailable(document_id.to_owned()))?;
        Ok(split_lines(&text))
    }
}
