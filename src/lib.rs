//! # docdeck
//!
//! Summarize documents into fixed-size decks of typed cards using a
//! remote completion endpoint.
//!
//! Feed it a PDF, DOCX, or plain-text file (or pasted text) and get back
//! exactly 4, 6, or 8 cards — each with a number, title, and body, plus
//! optional illustration and colour hints for the illustrated style. The
//! deck size is a hard contract: model shortfalls are padded, surpluses
//! truncated, numbering rewritten, so callers can lay out a deck without
//! defensive length checks.
//!
//! ## Pipeline
//!
//! ```text
//! file reference ──▶ access ──▶ extract ──▶ prompt ──▶ llm ──▶ repair ──▶ SummaryResult
//!                   (resolve)  (to text)   (build)   (HTTP)   (N cards)
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docdeck::{summarize, CardCount, DeckConfig, SummaryStyle};
//!
//! # async fn demo() -> Result<(), docdeck::DeckError> {
//! let config = DeckConfig::builder()
//!     .api_key(std::env::var("ANTHROPIC_API_KEY").unwrap_or_default())
//!     .card_count(CardCount::Four)
//!     .style(SummaryStyle::Plain)
//!     .build()?;
//!
//! let result = summarize("report.pdf", &config).await?;
//! for card in &result.cards {
//!     println!("{}. {}\n{}\n", card.number, card.title, card.body);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Effect |
//! |---------|---------|--------|
//! | `cli`   | yes     | Builds the `docdeck` binary (clap, anyhow, tracing-subscriber) |

pub mod config;
pub mod document;
pub mod entitlement;
pub mod error;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod store;
pub mod summarize;

pub use config::{
    CardCount, DeckConfig, DeckConfigBuilder, Language, SummaryConfig, SummaryStyle, Tone,
    DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use document::{normalize_text, DocumentFormat, DocumentInfo, ProcessedDocument};
pub use entitlement::{AllowAll, EntitlementGate, PlanGate};
pub use error::{ApiError, DeckError, ExtractionError, FileAccessError};
pub use observer::{NoopObserver, SummaryObserver};
pub use output::{CardContent, SummaryResult, TokenUsage};
pub use pipeline::access::{
    BookmarkResolver, FileAccessResolver, NoBookmarks, OpenAccess, ResolvedFile, ScopedAccess,
    ScopedGuard,
};
pub use retry::RetryProfile;
pub use store::{FileSummaryStore, MemorySummaryStore, SummaryStore};
pub use summarize::{summarize, summarize_and_store, summarize_text};
