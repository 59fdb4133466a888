//! Most-recently-used list of played media with resume offsets.
//!
//! The list is written to a small JSON file after every change and read back
//! once at start-up. Field names match the files written by earlier releases
//! (`Path` / `Time`), so existing histories keep working.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Maximum number of entries retained.
pub const MAX_HISTORY: usize = 5;

/// A previously played item and the offset to resume from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Time")]
    pub resume_ms: u64,
}

impl HistoryEntry {
    /// Label for menus: the file name, or the whole identifier when it has none.
    pub fn label(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }
}

/// JSON file backing the history list.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored list. A missing file is an empty history.
    pub fn read(&self) -> Result<Vec<HistoryEntry>, PlayerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PlayerError::PersistenceUnavailable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| PlayerError::PersistenceCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the stored list.
    pub fn write(&self, entries: &[HistoryEntry]) -> Result<(), PlayerError> {
        let unavailable = |source| PlayerError::PersistenceUnavailable {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(unavailable)?;
        }

        let json = serde_json::to_string(entries).map_err(|e| unavailable(e.into()))?;
        std::fs::write(&self.path, json).map_err(unavailable)
    }
}

/// Bounded MRU list keyed by path.
#[derive(Debug)]
pub struct HistoryTracker {
    entries: Vec<HistoryEntry>,
    file: HistoryFile,
}

impl HistoryTracker {
    /// An empty tracker that persists to `file`. Nothing is read.
    pub fn new(file: HistoryFile) -> Self {
        Self {
            entries: Vec::new(),
            file,
        }
    }

    /// Load the tracker from `file`. Unreadable or corrupt storage starts an
    /// empty history instead of failing.
    pub fn load(file: HistoryFile) -> Self {
        let entries = match file.read() {
            Ok(entries) => normalize(entries),
            Err(e) => {
                tracing::warn!("Starting with empty history: {e}");
                Vec::new()
            }
        };
        tracing::debug!(
            count = entries.len(),
            path = %file.path().display(),
            "Loaded playback history"
        );
        Self { entries, file }
    }

    /// Move `path` to the front with a fresh resume offset, evicting the oldest
    /// entry past [`MAX_HISTORY`], then persist the list.
    ///
    /// The in-memory list is updated even when the write fails; the write
    /// error is returned for the caller to report.
    pub fn record(&mut self, path: &str, resume_ms: u64) -> Result<(), PlayerError> {
        self.entries.retain(|entry| entry.path != path);
        self.entries.insert(
            0,
            HistoryEntry {
                path: path.to_owned(),
                resume_ms,
            },
        );
        self.entries.truncate(MAX_HISTORY);
        self.file.write(&self.entries)
    }

    /// Entries, most recent first.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop duplicate paths (first occurrence wins) and enforce the bound.
fn normalize(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut out: Vec<HistoryEntry> = Vec::with_capacity(MAX_HISTORY);
    for entry in entries {
        if out.len() == MAX_HISTORY {
            break;
        }
        if !out.iter().any(|e| e.path == entry.path) {
            out.push(entry);
        }
    }
    out
}
