//! End-to-end orchestration: reference in, card deck out.
//!
//! [`summarize`] drives the full pipeline — resolve, extract, prompt,
//! complete, repair — reporting stage events to the configured observer
//! along the way. [`summarize_text`] skips resolution and extraction for
//! callers that already hold plain text, and [`summarize_and_store`]
//! persists the deck before announcing completion.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::DeckConfig;
use crate::document::{self, DocumentFormat, DocumentInfo, ProcessedDocument};
use crate::error::{DeckError, ExtractionError};
use crate::output::SummaryResult;
use crate::pipeline::access::FileAccessResolver;
use crate::pipeline::extract;
use crate::pipeline::llm::SummarizationClient;
use crate::pipeline::repair;
use crate::prompts;
use crate::retry;
use crate::store::SummaryStore;

/// Summarize the document at `reference` into a card deck.
///
/// Resolution and extraction run on the blocking pool and are retried as
/// a unit with the access profile: a transiently unreadable file (cloud
/// placeholder still downloading, scoped token briefly refused) gets a
/// second chance, while unsupported formats and malformed content fail
/// immediately.
pub async fn summarize(
    reference: impl AsRef<Path>,
    config: &DeckConfig,
) -> Result<SummaryResult, DeckError> {
    let reference = reference.as_ref().to_path_buf();
    let file_name = display_name(&reference);
    notify(config, |o| o.on_start(&file_name));

    let result = run_pipeline(reference, config).await;
    match &result {
        Ok(summary) => info!(
            "summary {} complete: {} cards, {} tokens",
            summary.id,
            summary.cards.len(),
            summary.usage.total()
        ),
        Err(e) => {
            warn!("summarization of '{file_name}' failed: {e}");
            notify(config, |o| o.on_error(e));
        }
    }
    result
}

async fn run_pipeline(
    reference: PathBuf,
    config: &DeckConfig,
) -> Result<SummaryResult, DeckError> {
    let format = format_of(&reference)?;

    let doc = resolve_and_extract(reference, format, config).await?;
    notify(config, |o| o.on_resolved(&doc.info));
    notify(config, |o| o.on_extracted(doc.word_count, doc.char_count));

    complete_and_repair(doc, config).await
}

/// Summarize already-extracted text, e.g. pasted by the user.
pub async fn summarize_text(
    text: &str,
    config: &DeckConfig,
) -> Result<SummaryResult, DeckError> {
    let normalized = document::normalize_text(text);
    if normalized.is_empty() {
        return Err(ExtractionError::EmptyContent {
            file_name: "pasted text".to_string(),
        }
        .into());
    }
    let info = DocumentInfo::new(
        Path::new("pasted.txt"),
        DocumentFormat::Txt,
        normalized.len() as u64,
    );
    let doc = ProcessedDocument::new(info, normalized);
    notify(config, |o| o.on_extracted(doc.word_count, doc.char_count));

    let result = complete_and_repair(doc, config).await;
    if let Err(e) = &result {
        notify(config, |o| o.on_error(e));
    }
    result
}

/// Summarize and persist in one step. The observer's completion event
/// fires only after the store accepted the result, so listeners never see
/// a deck that later failed to persist.
pub async fn summarize_and_store(
    reference: impl AsRef<Path>,
    config: &DeckConfig,
    store: &dyn SummaryStore,
) -> Result<SummaryResult, DeckError> {
    let result = summarize(reference, config).await?;
    if let Err(e) = store.save(&result) {
        notify(config, |o| o.on_error(&e));
        return Err(e);
    }
    notify(config, |o| o.on_complete(&result));
    Ok(result)
}

async fn resolve_and_extract(
    reference: PathBuf,
    format: DocumentFormat,
    config: &DeckConfig,
) -> Result<ProcessedDocument, DeckError> {
    let private_dir = config.private_dir.clone();
    let scoped = config.scoped_access.clone();
    let bookmarks = config.bookmarks.clone();

    retry::run(config.access_retry, DeckError::is_access_failure, || {
        let reference = reference.clone();
        let resolver =
            FileAccessResolver::new(private_dir.clone(), scoped.clone(), bookmarks.clone());
        async move {
            tokio::task::spawn_blocking(move || {
                let file_name = display_name(&reference);
                // The resolved copy (and its scoped token) lives only as
                // long as this closure; extraction reads it before drop.
                let resolved = resolver.resolve(&reference)?;
                let size = std::fs::metadata(resolved.path()).map(|m| m.len()).unwrap_or(0);
                let text = extract::extract_text(resolved.path(), format, &file_name)?;
                let info = DocumentInfo::new(&reference, format, size);
                Ok(ProcessedDocument::new(info, text))
            })
            .await
            .map_err(|e| DeckError::Internal(format!("extraction task failed: {e}")))?
        }
    })
    .await
}

async fn complete_and_repair(
    doc: ProcessedDocument,
    config: &DeckConfig,
) -> Result<SummaryResult, DeckError> {
    let payload = prompts::build_request(&doc, &config.summary, config.input_char_budget);

    let client = SummarizationClient::new(config)?;
    let reply = client.summarize(&payload).await?;
    notify(config, |o| o.on_model_reply(&reply.usage));

    let cards = repair::repair(&reply.text, config.summary.card_count.as_usize())?;
    Ok(SummaryResult::new(config.summary, doc.info, cards, reply.usage))
}

fn format_of(reference: &Path) -> Result<DocumentFormat, DeckError> {
    let extension = reference
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    DocumentFormat::from_extension(&extension).ok_or_else(|| {
        ExtractionError::UnsupportedFormat {
            file_name: display_name(reference),
            format: extension,
        }
        .into()
    })
}

fn display_name(reference: &Path) -> String {
    reference
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.display().to_string())
}

fn notify(config: &DeckConfig, f: impl FnOnce(&dyn crate::observer::SummaryObserver)) {
    if let Some(observer) = &config.observer {
        f(observer.as_ref());
    }
}
