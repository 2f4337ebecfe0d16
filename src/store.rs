//! Durable per-document line timestamp storage.
//!
//! The store is a single JSON file mapping document identifier to a map
//! from line index to the instant that line was last edited. It is the
//! sole source of truth: in-memory state elsewhere in the crate is derived
//! and can be rebuilt by reloading.
//!
//! Every mutation rewrites the file in full; snapshots are bounded by line
//! count per document, and the rewrite goes through a temp file + rename so
//! readers never observe a partially written store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::diff::{compute_edit_script, EditOp, EditScript};
use crate::error::{EngineError, Result};

/// Per-document mapping from line index to last-edit instant.
///
/// Indices are zero-based; in JSON they appear as string keys and the
/// instants as ISO-8601 strings. `BTreeMap` keeps serialization order
/// canonical so saving a loaded snapshot is byte-stable.
pub type EntryMap = BTreeMap<u32, DateTime<Utc>>;

/// The full in-memory representation of the persisted store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSnapshot {
    documents: BTreeMap<String, EntryMap>,
}

impl StoreSnapshot {
    /// Entry map for a document, if any edits were ever recorded for it.
    pub fn entries(&self, document_id: &str) -> Option<&EntryMap> {
        self.documents.get(document_id)
    }

    /// Replace a document's entry map in full.
    pub fn set_entries(&mut self, document_id: &str, entries: EntryMap) {
        self.documents.insert(document_id.to_owned(), entries);
    }

    /// Identifiers of all documents with recorded history.
    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// True when no document has recorded history.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// On-disk timestamp store.
///
/// All mutations run under one internal lock held across the whole
/// load-modify-save cycle, so concurrent changes to different documents
/// cannot lose each other's updates through read-modify-write races.
#[derive(Debug)]
pub struct TimestampStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TimestampStore {
    /// Create a store backed by the given file. The file and its parent
    /// directories are created lazily on the first save.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full persisted mapping.
    ///
    /// A store that was never created yields an empty snapshot; an
    /// unreadable file yields `StorageUnavailable` and unparseable content
    /// yields `Deserialization`; neither is silently replaced.
    pub async fn load(&self) -> Result<StoreSnapshot> {
        let _guard = self.lock.lock().await;
        self.read_snapshot().await
    }

    /// Persist the full mapping atomically.
    pub async fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_snapshot(snapshot).await
    }

    /// Record a content change for one document: diff the snapshots, remap
    /// the document's entries, stamp changed lines with `now`, and persist.
    /// Returns the updated, already-persisted snapshot.
    pub async fn record_change(
        &self,
        document_id: &str,
        old_lines: &[String],
        new_lines: &[String],
        now: DateTime<Utc>,
    ) -> Result<StoreSnapshot> {
        let _guard = self.lock.lock().await;

        let mut snapshot = self.read_snapshot().await?;
        let script = compute_edit_script(old_lines, new_lines);
        if let Err(e) = validate_script(&script, old_lines.len(), new_lines.len()) {
            warn!(document_id, error = %e, "edit script rejected, change not applied");
            return Err(e);
        }

        let prior = snapshot
            .entries(document_id)
            .cloned()
            .unwrap_or_default();
        let next = remap_entries(&prior, &script, now);
        snapshot.set_entries(document_id, next);

        self.write_snapshot(&snapshot).await?;
        debug!(
            document_id,
            ops = script.ops().len(),
            lines = new_lines.len(),
            "recorded content change"
        );
        Ok(snapshot)
    }

    async fn read_snapshot(&self) -> Result<StoreSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreSnapshot::default()),
            Err(e) => return Err(EngineError::StorageUnavailable(e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_snapshot(&self, snapshot: &StoreSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Carry, drop and freshly stamp a document's entries according to an edit
/// script.
///
/// Only inserted and replaced lines receive `now`; lines merely shifted by
/// edits elsewhere keep their original instant. Entries at old indices not
/// covered by an `Equal` run (deleted, replaced, or stale beyond the old
/// line count) are not carried forward.
pub(crate) fn remap_entries(
    prior: &EntryMap,
    script: &EditScript,
    now: DateTime<Utc>,
) -> EntryMap {
    let mut next = EntryMap::new();
    for op in script.ops() {
        match op {
            EditOp::Equal { old, new } => {
                for (&index, &stamp) in prior.range(old.start as u32..old.end as u32) {
                    let shifted = new.start as u32 + (index - old.start as u32);
                    next.insert(shifted, stamp);
                }
            }
            EditOp::Insert { new } | EditOp::Replace { new, .. } => {
                for index in new.clone() {
                    next.insert(index as u32, now);
                }
            }
            EditOp::Delete { .. } => {}
        }
    }
    next
}

/// Check that the script's operations, in order, exactly tile the old and
/// new line ranges. A gap or overlap means the diff/remap pipeline broke an
/// invariant and the change must not be applied.
pub(crate) fn validate_script(
    script: &EditScript,
    old_len: usize,
    new_len: usize,
) -> Result<()> {
    let mut old_pos = 0;
    let mut new_pos = 0;
    for op in script.ops() {
        match op {
            EditOp::Equal { old, new } => {
                if old.start != old_pos || new.start != new_pos || old.len() != new.len() {
                    return Err(malformed(op, old_pos, new_pos));
                }
                old_pos = old.end;
                new_pos = new.end;
            }
            EditOp::Insert { new } => {
                if new.start != new_pos {
                    return Err(malformed(op, old_pos, new_pos));
                }
                new_pos = new.end;
            }
            EditOp::Delete { old } => {
                if old.start != old_pos {
                    return Err(malformed(op, old_pos, new_pos));
                }
                old_pos = old.end;
            }
            EditOp::Replace { old, new } => {
                if old.start != old_pos || new.start != new_pos {
                    return Err(malformed(op, old_pos, new_pos));
                }
                old_pos = old.end;
                new_pos = new.end;
            }
        }
    }
    if old_pos != old_len || new_pos != new_len {
        return Err(EngineError::MalformedEditScript(format!(
            "script covers {old_pos}/{old_len} old and {new_pos}/{new_len} new lines"
        )));
    }
    Ok(())
}

fn malformed(op: &EditOp, old_pos: usize, new_pos: usize) -> EngineError {
    EngineError::MalformedEditScript(format!(
        "op {op:?} does not continue at old={old_pos}, new={new_pos}"
    ))
}
