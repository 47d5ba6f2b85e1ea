//! Document data model: format tags, resolution records, processed text.
//!
//! [`DocumentInfo`] is created exactly once, when resolution succeeds, and is
//! never mutated afterwards; [`ProcessedDocument`] is created exactly once,
//! when extraction succeeds. Both are plain owned records so results can be
//! serialised, stored, and handed across task boundaries freely.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum characters kept in [`ProcessedDocument::preview`].
const PREVIEW_CHARS: usize = 200;

/// Declared format of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Legacy binary Word format. Recognised but never decoded.
    Doc,
    Txt,
}

impl DocumentFormat {
    /// Map a file extension (case-insensitive, no dot) to a format tag.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" | "text" | "md" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of a successfully resolved document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: Uuid,
    /// Display name — the original file name, not the resolved copy's.
    pub file_name: String,
    pub format: DocumentFormat,
    pub size_bytes: u64,
    /// The original reference the caller handed in.
    pub source: PathBuf,
    pub discovered_at: DateTime<Utc>,
}

impl DocumentInfo {
    /// Record a resolution. `source` is the caller's reference; `size_bytes`
    /// comes from the resolved (readable) path.
    pub fn new(source: &Path, format: DocumentFormat, size_bytes: u64) -> Self {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        Self {
            id: Uuid::new_v4(),
            file_name,
            format,
            size_bytes,
            source: source.to_path_buf(),
            discovered_at: Utc::now(),
        }
    }
}

/// A document after text extraction, with derived counts and a preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub info: DocumentInfo,
    /// Normalised extracted text. Invariant: non-empty.
    pub text: String,
    pub word_count: usize,
    pub char_count: usize,
    /// First ~200 characters, ellipsis-suffixed if truncated.
    pub preview: String,
}

impl ProcessedDocument {
    /// Derive counts and preview from already-normalised text.
    pub fn new(info: DocumentInfo, text: String) -> Self {
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();
        let preview = make_preview(&text);
        Self {
            info,
            text,
            word_count,
            char_count,
            preview,
        }
    }
}

fn make_preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}…")
}

// ── Normalisation ────────────────────────────────────────────────────────

static RE_INLINE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\x0b\x0c\r]+").unwrap());
static RE_NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n[\n ]*").unwrap());

/// Normalise extracted text: collapse runs of inline whitespace to a single
/// space, collapse runs of newlines (and the spaces around them) to a single
/// newline, and trim. Applied uniformly after every format-specific
/// extractor. Idempotent: normalising already-normalised text is a no-op.
pub fn normalize_text(raw: &str) -> String {
    let s = raw.replace("\r\n", "\n");
    let s = RE_INLINE_WS.replace_all(&s, " ");
    let s = RE_NEWLINE_RUNS.replace_all(&s, "\n");
    s.trim().to_string()
}
