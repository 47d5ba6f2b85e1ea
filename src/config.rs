//! Configuration types for document summarisation.
//!
//! Two layers, deliberately separate:
//!
//! * [`SummaryConfig`] — the caller's request: how many cards, in which
//!   style, language, and tone. A pure value type with equality by fields;
//!   it is stored verbatim inside every [`crate::SummaryResult`].
//!
//! * [`DeckConfig`] — everything the pipeline needs to run: endpoint
//!   credentials, model, budgets, retry profiles, and the platform hooks for
//!   scoped file access. Built via [`DeckConfig::builder()`] so callers set
//!   only what they care about and rely on documented defaults for the rest.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::observer::SummaryObserver;
use crate::pipeline::access::{BookmarkResolver, NoBookmarks, OpenAccess, ScopedAccess};
use crate::retry::RetryProfile;

/// Default completion endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
/// Protocol version header value the endpoint requires.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

// ── Summary request enums ────────────────────────────────────────────────

/// How many cards the caller wants. Closed set: a deck is 4, 6, or 8 cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCount {
    Four,
    #[default]
    Six,
    Eight,
}

impl CardCount {
    pub fn as_usize(&self) -> usize {
        match self {
            CardCount::Four => 4,
            CardCount::Six => 6,
            CardCount::Eight => 8,
        }
    }

    pub fn from_usize(n: usize) -> Option<Self> {
        match n {
            4 => Some(CardCount::Four),
            6 => Some(CardCount::Six),
            8 => Some(CardCount::Eight),
            _ => None,
        }
    }
}

/// Output style of the generated cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    /// Plain titled text cards. (default)
    #[default]
    Plain,
    /// Narrative dialogue between two voices.
    Dialogue,
    /// Plain cards annotated with illustration and colour hints.
    Illustrated,
}

impl SummaryStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Plain => "plain",
            SummaryStyle::Dialogue => "dialogue",
            SummaryStyle::Illustrated => "illustrated",
        }
    }
}

/// Target language of the generated cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
    Japanese,
}

impl Language {
    /// English name, as written into the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Japanese => "Japanese",
        }
    }
}

/// Tone of voice for the generated cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Friendly,
    Professional,
    Playful,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Playful => "playful",
        }
    }
}

/// The caller's summary request. Equality by field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub card_count: CardCount,
    pub style: SummaryStyle,
    pub language: Language,
    pub tone: Tone,
}

// ── Pipeline configuration ───────────────────────────────────────────────

/// Configuration for the summarisation pipeline.
///
/// Built via [`DeckConfig::builder()`].
///
/// # Example
/// ```rust
/// use docdeck::{DeckConfig, CardCount};
///
/// let config = DeckConfig::builder()
///     .api_key("sk-ant-...")
///     .card_count(CardCount::Four)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// API key sent in the `x-api-key` header. Required.
    pub api_key: String,

    /// Base endpoint URL. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Protocol version header value. Default: [`DEFAULT_API_VERSION`].
    pub api_version: String,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// Eight illustrated cards with colour hints stay well under 2 500
    /// output tokens; 4096 leaves headroom without letting a runaway reply
    /// inflate the bill.
    pub max_output_tokens: usize,

    /// Character budget for the document prefix embedded in the prompt.
    /// Default: 6000.
    ///
    /// Summaries work from the opening of the document; shipping a 400-page
    /// book verbatim would blow the model's input limit and cost without
    /// improving the cards.
    pub input_char_budget: usize,

    /// The summary request (card count, style, language, tone).
    pub summary: SummaryConfig,

    /// Per-call HTTP timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Attempts and backoff for the completion call. Default: 3 attempts,
    /// 2 s base delay.
    pub network_retry: RetryProfile,

    /// Attempts and backoff for resolve-then-extract. Default: 2 attempts,
    /// 500 ms base delay.
    pub access_retry: RetryProfile,

    /// Directory treated as the process's private storage area. References
    /// already inside it are readable directly; scoped copies land in it.
    /// Default: the OS temp directory.
    pub private_dir: PathBuf,

    /// Platform hook for scoped (security-scoped) file access.
    /// Default: [`OpenAccess`], a no-op for ordinary filesystems.
    pub scoped_access: Arc<dyn ScopedAccess>,

    /// Platform hook for durable-bookmark resolution.
    /// Default: [`NoBookmarks`].
    pub bookmarks: Arc<dyn BookmarkResolver>,

    /// Observer for pipeline stage events. Default: none.
    pub observer: Option<Arc<dyn SummaryObserver>>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_output_tokens: 4096,
            input_char_budget: 6000,
            summary: SummaryConfig::default(),
            api_timeout_secs: 60,
            network_retry: RetryProfile::network(),
            access_retry: RetryProfile::file_access(),
            private_dir: std::env::temp_dir(),
            scoped_access: Arc::new(OpenAccess),
            bookmarks: Arc::new(NoBookmarks),
            observer: None,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("input_char_budget", &self.input_char_budget)
            .field("summary", &self.summary)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("network_retry", &self.network_retry)
            .field("access_retry", &self.access_retry)
            .field("private_dir", &self.private_dir)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SummaryObserver>"))
            .finish()
    }
}

impl DeckConfig {
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DeckConfig`].
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl DeckConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn input_char_budget(mut self, n: usize) -> Self {
        self.config.input_char_budget = n.max(1);
        self
    }

    pub fn summary(mut self, summary: SummaryConfig) -> Self {
        self.config.summary = summary;
        self
    }

    pub fn card_count(mut self, count: CardCount) -> Self {
        self.config.summary.card_count = count;
        self
    }

    pub fn style(mut self, style: SummaryStyle) -> Self {
        self.config.summary.style = style;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.summary.language = language;
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.config.summary.tone = tone;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn network_retry(mut self, profile: RetryProfile) -> Self {
        self.config.network_retry = profile;
        self
    }

    pub fn access_retry(mut self, profile: RetryProfile) -> Self {
        self.config.access_retry = profile;
        self
    }

    pub fn private_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.private_dir = dir.into();
        self
    }

    pub fn scoped_access(mut self, hook: Arc<dyn ScopedAccess>) -> Self {
        self.config.scoped_access = hook;
        self
    }

    pub fn bookmarks(mut self, resolver: Arc<dyn BookmarkResolver>) -> Self {
        self.config.bookmarks = resolver;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SummaryObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, DeckError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(DeckError::InvalidConfig(
                "api_key must be set (see ANTHROPIC_API_KEY)".into(),
            ));
        }
        if c.base_url.trim().is_empty() {
            return Err(DeckError::InvalidConfig("base_url must not be empty".into()));
        }
        if c.max_output_tokens == 0 {
            return Err(DeckError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
