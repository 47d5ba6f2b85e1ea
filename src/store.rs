//! Persistence for completed decks.
//!
//! The store is a capped history, newest last: saving beyond the cap
//! evicts the oldest entries. [`FileSummaryStore`] keeps the whole history
//! as one JSON array on disk and rewrites it atomically on each save;
//! [`MemorySummaryStore`] backs tests and embedders that manage their own
//! persistence.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::DeckError;
use crate::output::SummaryResult;

/// Default history cap for the bundled stores.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Sink for completed decks.
pub trait SummaryStore: Send + Sync {
    /// Persist one result. Blank results (no document, no cards) are
    /// silently discarded rather than written.
    fn save(&self, result: &SummaryResult) -> Result<(), DeckError>;

    /// All persisted results, oldest first.
    fn load_all(&self) -> Result<Vec<SummaryResult>, DeckError>;
}

/// JSON-file-backed store. The file holds a single JSON array; writes go
/// through a temp file and rename so a crash never leaves a torn history.
pub struct FileSummaryStore {
    path: PathBuf,
    cap: usize,
}

impl FileSummaryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cap: DEFAULT_HISTORY_CAP,
        }
    }

    pub fn with_cap(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_history(&self) -> Result<Vec<SummaryResult>, DeckError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DeckError::StoreWriteFailed {
                    path: self.path.clone(),
                    detail: e.to_string(),
                })
            }
        };
        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                // A corrupt history should not brick summarization; start
                // over and let the next save rewrite the file.
                warn!("history at '{}' unreadable ({e}), starting fresh", self.path.display());
                Ok(Vec::new())
            }
        }
    }

    fn write_history(&self, history: &[SummaryResult]) -> Result<(), DeckError> {
        let json = serde_json::to_string_pretty(history).map_err(|e| DeckError::StoreWriteFailed {
            path: self.path.clone(),
            detail: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| DeckError::StoreWriteFailed {
                path: self.path.clone(),
                detail: e.to_string(),
            })
    }
}

impl SummaryStore for FileSummaryStore {
    fn save(&self, result: &SummaryResult) -> Result<(), DeckError> {
        if result.is_blank() {
            warn!("discarding blank summary result {}", result.id);
            return Ok(());
        }
        let mut history = self.read_history()?;
        history.push(result.clone());
        if history.len() > self.cap {
            let evict = history.len() - self.cap;
            history.drain(..evict);
        }
        self.write_history(&history)?;
        debug!("saved summary {} ({} in history)", result.id, history.len());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SummaryResult>, DeckError> {
        self.read_history()
    }
}

/// In-memory store with the same cap/blank semantics as the file store.
pub struct MemorySummaryStore {
    history: Mutex<Vec<SummaryResult>>,
    cap: usize,
}

impl Default for MemorySummaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            cap: cap.max(1),
        }
    }
}

impl SummaryStore for MemorySummaryStore {
    fn save(&self, result: &SummaryResult) -> Result<(), DeckError> {
        if result.is_blank() {
            return Ok(());
        }
        let mut history = self
            .history
            .lock()
            .map_err(|_| DeckError::Internal("summary store lock poisoned".into()))?;
        history.push(result.clone());
        if history.len() > self.cap {
            let evict = history.len() - self.cap;
            history.drain(..evict);
        }
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SummaryResult>, DeckError> {
        self.history
            .lock()
            .map(|h| h.clone())
            .map_err(|_| DeckError::Internal("summary store lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryConfig;
    use crate::document::{DocumentFormat, DocumentInfo};
    use crate::output::{CardContent, SummaryResult, TokenUsage};
    use std::path::Path;

    fn sample(title: &str) -> SummaryResult {
        let info = DocumentInfo::new(Path::new("/tmp/report.pdf"), DocumentFormat::Pdf, 1024);
        SummaryResult::new(
            SummaryConfig::default(),
            info,
            vec![CardContent {
                number: 1,
                title: title.to_string(),
                body: "body".to_string(),
                illustration: None,
                background: None,
                foreground: None,
            }],
            TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        )
    }

    fn blank() -> SummaryResult {
        let info = DocumentInfo::new(Path::new("/tmp/empty.pdf"), DocumentFormat::Pdf, 0);
        SummaryResult::new(
            SummaryConfig::default(),
            info,
            Vec::new(),
            TokenUsage::default(),
        )
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSummaryStore::new(dir.path().join("history.json"));
        store.save(&sample("first")).unwrap();
        store.save(&sample("second")).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].cards[0].title, "first");
        assert_eq!(all[1].cards[0].title, "second");
    }

    #[test]
    fn file_store_evicts_oldest_past_cap() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSummaryStore::with_cap(dir.path().join("history.json"), 2);
        store.save(&sample("a")).unwrap();
        store.save(&sample("b")).unwrap();
        store.save(&sample("c")).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].cards[0].title, "b");
        assert_eq!(all[1].cards[0].title, "c");
    }

    #[test]
    fn blank_results_are_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSummaryStore::new(dir.path().join("history.json"));
        store.save(&blank()).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn corrupt_history_file_is_replaced_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json[").unwrap();
        let store = FileSummaryStore::new(&path);
        assert!(store.load_all().unwrap().is_empty());
        store.save(&sample("recovered")).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn memory_store_caps_like_file_store() {
        let store = MemorySummaryStore::with_cap(1);
        store.save(&sample("old")).unwrap();
        store.save(&sample("new")).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].cards[0].title, "new");
    }
}
