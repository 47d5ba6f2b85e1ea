//! Progress notifications for long-running summarizations.
//!
//! Callers that want to surface progress (a spinner, a status line, a UI
//! update) implement [`SummaryObserver`] and hand it to
//! [`crate::DeckConfigBuilder::observer`]. Every method has a no-op
//! default, so implementors override only the events they care about.

use crate::document::DocumentInfo;
use crate::error::DeckError;
use crate::output::{SummaryResult, TokenUsage};

/// Receives stage events as a summarization progresses.
///
/// Methods are called from the task driving the pipeline; implementations
/// should return quickly and never block.
pub trait SummaryObserver: Send + Sync {
    /// A summarization has been accepted for `file_name`.
    fn on_start(&self, _file_name: &str) {}

    /// The file reference resolved to readable content.
    fn on_resolved(&self, _document: &DocumentInfo) {}

    /// Text extraction finished.
    fn on_extracted(&self, _word_count: usize, _char_count: usize) {}

    /// The model replied; repair is about to run.
    fn on_model_reply(&self, _usage: &TokenUsage) {}

    /// The deck is complete (and, when a store is in play, persisted).
    fn on_complete(&self, _result: &SummaryResult) {}

    /// The pipeline failed. `error.user_message()` is safe to display.
    fn on_error(&self, _error: &DeckError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SummaryObserver for NoopObserver {}
