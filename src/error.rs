//! Error types for the docdeck library.
//!
//! The taxonomy mirrors the pipeline stages:
//!
//! * [`FileAccessError`] — the file reference could not be turned into a
//!   byte-readable path. The orchestrator treats these as transient (the OS
//!   can deny access for a moment) and retries the whole resolve-then-extract
//!   sequence a bounded number of times.
//!
//! * [`ExtractionError`] — the bytes were readable but the content is wrong
//!   (unsupported format, empty document, broken container). These are never
//!   retried: re-reading a malformed file yields the same malformed file.
//!
//! * [`ApiError`] — the completion endpoint failed. Each variant is classified
//!   retryable or fatal by [`ApiError::is_retryable`]; the classification is
//!   the predicate handed to the retry executor.
//!
//! Everything converges on [`DeckError`], which also owns the one-error-kind
//! → one-user-message mapping so callers never surface raw internals.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to resolve a file reference into a readable local path.
#[derive(Debug, Error)]
pub enum FileAccessError {
    /// The process was refused read access to the reference.
    #[error("access denied: '{path}'")]
    Denied { path: PathBuf },

    /// Nothing exists at the referenced location.
    #[error("file not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The file exists but could not be read intact (zero bytes, I/O error).
    #[error("file unreadable: '{path}': {detail}")]
    Corrupted { path: PathBuf, detail: String },
}

/// Failure to turn a resolved file into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The declared format has no decoder (legacy binary .doc).
    #[error("unsupported format '{format}' for '{file_name}'")]
    UnsupportedFormat { file_name: String, format: String },

    /// The document parsed but yielded no text after normalisation.
    #[error("no readable text in '{file_name}'")]
    EmptyContent { file_name: String },

    /// The container or page structure is broken.
    #[error("malformed document '{file_name}': {detail}")]
    Malformed { file_name: String, detail: String },
}

/// Failure reported by (or on the way to) the completion endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 401 — the API key was rejected.
    #[error("API key rejected")]
    InvalidKey,

    /// HTTP 400 — the request itself was malformed.
    #[error("invalid request: {detail}")]
    InvalidRequest { detail: String },

    /// HTTP 429 — back off and retry.
    #[error("rate limit exceeded")]
    RateLimited,

    /// HTTP 402 — the account has no remaining credit.
    #[error("insufficient credit on the API account")]
    InsufficientCredit,

    /// Any other non-2xx status. Retryable only when `status >= 500`.
    #[error("server error (HTTP {status})")]
    ServerError { status: u16 },

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("network error: {detail}")]
    Network { detail: String },

    /// 2xx status but the body did not match the response schema.
    #[error("response decoding failed: {detail}")]
    Decoding { detail: String },
}

impl ApiError {
    /// Retry eligibility used by the summarization client.
    ///
    /// Overloaded backends (5xx), transport blips, and rate limits are worth
    /// re-attempting; authorization, request-shape, credit, and decoding
    /// failures will fail identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::ServerError { status } => *status >= 500,
            ApiError::Network { .. } | ApiError::RateLimited => true,
            ApiError::InvalidKey
            | ApiError::InvalidRequest { .. }
            | ApiError::InsufficientCredit
            | ApiError::Decoding { .. } => false,
        }
    }
}

/// All errors returned by the docdeck library.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error(transparent)]
    FileAccess(#[from] FileAccessError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// No well-formed card data could be recovered from the model reply.
    #[error("no usable card data in model reply (failed at: {stage})")]
    Parsing { stage: &'static str },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not write to the summary store.
    #[error("failed to write summary store '{path}': {detail}")]
    StoreWriteFailed { path: PathBuf, detail: String },

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// True when the failure came from the filesystem-access layer.
    ///
    /// This is the predicate for the orchestrator's bounded retry around the
    /// resolve-then-extract sequence. Content-shape failures are excluded by
    /// construction.
    pub fn is_access_failure(&self) -> bool {
        matches!(self, DeckError::FileAccess(_))
    }

    /// One fixed, human-readable message per error kind.
    ///
    /// This is what a host application shows the user; raw internal error
    /// text (paths, status bodies, parse positions) stays in the `Display`
    /// impls and the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            DeckError::FileAccess(FileAccessError::Denied { .. }) => {
                "The file could not be opened. Please grant access and try again."
            }
            DeckError::FileAccess(FileAccessError::NotFound { .. }) => {
                "The file could not be found. It may have been moved or deleted."
            }
            DeckError::FileAccess(FileAccessError::Corrupted { .. }) => {
                "The file could not be read. It may be damaged."
            }
            DeckError::Extraction(ExtractionError::UnsupportedFormat { .. }) => {
                "This file format is not supported."
            }
            DeckError::Extraction(ExtractionError::EmptyContent { .. }) => {
                "No readable text was found in the document."
            }
            DeckError::Extraction(ExtractionError::Malformed { .. }) => {
                "The document appears to be damaged and could not be processed."
            }
            DeckError::Api(ApiError::InvalidKey) => {
                "The API key was rejected. Check your configuration."
            }
            DeckError::Api(ApiError::InvalidRequest { .. }) => {
                "The request was rejected by the summarization service."
            }
            DeckError::Api(ApiError::RateLimited) => {
                "The service is busy. Please try again in a moment."
            }
            DeckError::Api(ApiError::InsufficientCredit) => {
                "The API account has run out of credit."
            }
            DeckError::Api(ApiError::ServerError { .. }) => {
                "The summarization service had a problem. Please try again later."
            }
            DeckError::Api(ApiError::Network { .. }) => {
                "A network problem interrupted the request. Check your connection."
            }
            DeckError::Api(ApiError::Decoding { .. }) => {
                "The service returned an unexpected response."
            }
            DeckError::Parsing { .. } => {
                "The summary could not be assembled from the model's reply."
            }
            DeckError::InvalidConfig(_) => "The configuration is invalid.",
            DeckError::StoreWriteFailed { .. } => "The summary could not be saved.",
            DeckError::Internal(_) => "An unexpected internal error occurred.",
        }
    }
}
