//! Text extraction: resolved path + format tag → normalised plain text.
//!
//! Each format has its own decoder, but all of them funnel through the same
//! normalisation ([`crate::document::normalize_text`]) and the same
//! empty-content check: an extraction that produces no text is a terminal
//! failure, never an empty-string success.
//!
//! Failures split along the retry boundary: I/O errors while reading the
//! file map to [`FileAccessError`] (the orchestrator retries the whole
//! resolve-then-extract sequence for those), while content-shape problems
//! map to [`ExtractionError`] and are never retried.

use std::io::{Cursor, Read};
use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::document::{normalize_text, DocumentFormat};
use crate::error::{DeckError, ExtractionError, FileAccessError};

/// The zip entry holding a DOCX file's body XML.
const DOCX_BODY_ENTRY: &str = "word/document.xml";

/// Extract and normalise the text of the document at `path`.
///
/// `file_name` is the display name carried into error context; it may differ
/// from the resolved path's final component when a sanitised copy was made.
pub fn extract_text(
    path: &Path,
    format: DocumentFormat,
    file_name: &str,
) -> Result<String, DeckError> {
    let raw = match format {
        DocumentFormat::Pdf => extract_pdf(path, file_name)?,
        DocumentFormat::Docx => extract_docx(path, file_name)?,
        DocumentFormat::Doc => {
            return Err(ExtractionError::UnsupportedFormat {
                file_name: file_name.to_string(),
                format: format.to_string(),
            }
            .into())
        }
        DocumentFormat::Txt => {
            let bytes = read_bytes(path)?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(ExtractionError::EmptyContent {
            file_name: file_name.to_string(),
        }
        .into());
    }
    debug!(
        "extracted {} chars from '{}' ({})",
        text.chars().count(),
        file_name,
        format
    );
    Ok(text)
}

/// Read the whole file, mapping I/O failures to the access taxonomy.
fn read_bytes(path: &Path) -> Result<Vec<u8>, FileAccessError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FileAccessError::NotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => FileAccessError::Denied {
            path: path.to_path_buf(),
        },
        _ => FileAccessError::Corrupted {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Page-by-page PDF extraction.
///
/// A single unloadable page is skipped, not fatal: a damaged page 17 should
/// not cost the reader the other 200. Page order is preserved; each page's
/// text is followed by a newline so page boundaries survive normalisation
/// as line breaks.
fn extract_pdf(path: &Path, file_name: &str) -> Result<String, DeckError> {
    // Surface read errors as access failures before lopdf's own parse error
    // can mask them as "malformed".
    let bytes = read_bytes(path)?;

    let doc = Document::load_mem(&bytes).map_err(|e| ExtractionError::Malformed {
        file_name: file_name.to_string(),
        detail: e.to_string(),
    })?;

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(ExtractionError::EmptyContent {
            file_name: file_name.to_string(),
        }
        .into());
    }

    let mut text = String::new();
    for (&page_num, _) in &pages {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!("skipping unreadable page {} of '{}': {}", page_num, file_name, e);
            }
        }
    }

    Ok(text)
}

// ── DOCX ─────────────────────────────────────────────────────────────────

/// DOCX extraction: unpack the zip container, read the body XML entry, and
/// scan it for text runs.
fn extract_docx(path: &Path, file_name: &str) -> Result<String, DeckError> {
    let bytes = read_bytes(path)?;

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Malformed {
            file_name: file_name.to_string(),
            detail: format!("not a zip container: {e}"),
        })?;

    let mut entry = archive
        .by_name(DOCX_BODY_ENTRY)
        .map_err(|_| ExtractionError::Malformed {
            file_name: file_name.to_string(),
            detail: format!("missing {DOCX_BODY_ENTRY}"),
        })?;

    let mut xml_bytes = Vec::new();
    entry
        .read_to_end(&mut xml_bytes)
        .map_err(|e| ExtractionError::Malformed {
            file_name: file_name.to_string(),
            detail: format!("unreadable {DOCX_BODY_ENTRY}: {e}"),
        })?;
    let xml = String::from_utf8_lossy(&xml_bytes);

    Ok(scan_body_xml(&xml))
}

/// Scan the body XML for `<w:t>`…`</w:t>` text runs, concatenating the text
/// between matching markers and decoding the five standard XML entities.
/// A newline is inserted at every paragraph-close `</w:p>`, whether or not
/// the paragraph held a text run; normalisation collapses the resulting
/// blank lines afterwards.
fn scan_body_xml(xml: &str) -> String {
    let mut out = String::new();
    let mut pos = 0usize;

    while pos < xml.len() {
        let rest = &xml[pos..];
        let next_run = find_text_open(rest);
        let next_para_close = rest.find("</w:p>");

        match (next_run, next_para_close) {
            (Some((run_at, _)), Some(para_at)) if para_at < run_at => {
                out.push('\n');
                pos += para_at + "</w:p>".len();
            }
            (Some((_, content_at)), _) => {
                let content_start = pos + content_at;
                match xml[content_start..].find("</w:t>") {
                    Some(close_at) => {
                        out.push_str(&decode_entities(&xml[content_start..content_start + close_at]));
                        pos = content_start + close_at + "</w:t>".len();
                    }
                    None => break, // unterminated run; stop scanning
                }
            }
            (None, Some(para_at)) => {
                out.push('\n');
                pos += para_at + "</w:p>".len();
            }
            (None, None) => break,
        }
    }

    out
}

/// Locate the next `<w:t>` or `<w:t …>` open tag in `s`.
///
/// Returns `(tag_offset, content_offset)`, both relative to `s`. Matching on
/// the prefix alone would also hit `<w:tbl>` and friends, so the character
/// after the prefix must be `>` or whitespace.
fn find_text_open(s: &str) -> Option<(usize, usize)> {
    let mut search_from = 0usize;
    loop {
        let at = search_from + s[search_from..].find("<w:t")?;
        let after = &s[at + 4..];
        match after.chars().next() {
            Some('>') => return Some((at, at + 5)),
            Some(c) if c.is_ascii_whitespace() => {
                // Attributed open tag, e.g. <w:t xml:space="preserve">.
                let close = after.find('>')?;
                return Some((at, at + 4 + close + 1));
            }
            _ => search_from = at + 4,
        }
    }
}

/// Decode the five standard XML entities. `&amp;` is decoded last so that
/// `&amp;lt;` correctly becomes the literal `&lt;`.
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
