//! Snapshot undo/redo, the milestone list, and import diagnostics.
//!
//! Undo and milestones are independent: undo replays whole-scene snapshots
//! taken before each recorded mutation, while milestones are rendered SVG
//! checkpoints appended on load and restored by index.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::doc::{Document, ElementStore};

/// Deep copy of the scene taken before a mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub doc: Document,
    pub elements: ElementStore,
    pub defs: Option<String>,
}

// =============================================================
// Undo stack
// =============================================================

/// Bounded past/future stacks of [`EditorSnapshot`]s.
///
/// Pushing clears the future. When the past exceeds the limit the oldest
/// snapshot is dropped.
#[derive(Debug, Clone)]
pub struct UndoStack {
    past: VecDeque<EditorSnapshot>,
    future: Vec<EditorSnapshot>,
    limit: usize,
}

impl UndoStack {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { past: VecDeque::new(), future: Vec::new(), limit: limit.max(1) }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the state prior to a mutation.
    pub fn push(&mut self, snapshot: EditorSnapshot) {
        self.past.push_back(snapshot);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Swap `current` for the most recent past snapshot. `None` when there
    /// is nothing to undo.
    pub fn undo(&mut self, current: EditorSnapshot) -> Option<EditorSnapshot> {
        let prev = self.past.pop_back()?;
        self.future.push(current);
        if self.future.len() > self.limit {
            self.future.remove(0);
        }
        Some(prev)
    }

    /// Swap `current` for the next future snapshot. `None` when there is
    /// nothing to redo.
    pub fn redo(&mut self, current: EditorSnapshot) -> Option<EditorSnapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

// =============================================================
// Milestones
// =============================================================

/// A rendered checkpoint in the milestone list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub svg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl HistoryEntry {
    /// Entry for `svg` with a thumbnail and the current time.
    #[must_use]
    pub fn capture(svg: String) -> Self {
        let data_url = Some(svg_data_url(&svg));
        Self { svg, data_url, timestamp: now_millis() }
    }
}

/// `data:image/svg+xml;base64,` URL for `svg`.
#[must_use]
pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Append-only milestone list capped at a limit, with the active index
/// pointing at the entry the scene was last loaded or restored from.
#[derive(Debug, Clone)]
pub struct Milestones {
    entries: VecDeque<HistoryEntry>,
    active: Option<usize>,
    limit: usize,
}

impl Milestones {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { entries: VecDeque::new(), active: None, limit: limit.max(1) }
    }

    /// Append `entry` and make it active. Evicts the oldest entry past the
    /// limit, shifting the active index with it.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.active = Some(self.entries.len() - 1);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.entries.len() {
            self.active = Some(index);
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    #[must_use]
    pub fn entries(&self) -> Vec<&HistoryEntry> {
        self.entries.iter().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.active = None;
    }
}

// =============================================================
// Import records
// =============================================================

/// Diagnostic row describing one imported file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub element_count: usize,
    pub path_count: usize,
    pub width: f64,
    pub height: f64,
}

/// Caller-supplied identity of an import; counts are filled in by the load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportMeta {
    pub name: String,
    pub kind: String,
}

impl ImportMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into() }
    }

    /// Build the record for a loaded scene.
    #[must_use]
    pub fn record(&self, doc: &Document, elements: &ElementStore) -> ImportRecord {
        ImportRecord {
            name: self.name.clone(),
            kind: self.kind.clone(),
            element_count: elements.total_len(),
            path_count: elements.path_count(),
            width: doc.width,
            height: doc.height,
        }
    }
}
