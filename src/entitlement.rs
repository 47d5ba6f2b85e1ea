//! Plan gating for summary options.
//!
//! Embedders with paid tiers implement [`EntitlementGate`] to restrict
//! which styles and deck sizes a caller may request. The library itself
//! never consults a global: gating state is owned by the gate value the
//! embedder constructs and passes in, and any persistence (usage counts,
//! plan flags) is loaded at construction and written back explicitly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CardCount, SummaryStyle};
use crate::error::DeckError;

/// Decides whether a summary option is available to the caller.
pub trait EntitlementGate: Send + Sync {
    fn allows_style(&self, style: SummaryStyle) -> bool;
    fn allows_card_count(&self, count: CardCount) -> bool;
}

/// Gate that permits everything. The default for library embedders.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl EntitlementGate for AllowAll {
    fn allows_style(&self, _style: SummaryStyle) -> bool {
        true
    }
    fn allows_card_count(&self, _count: CardCount) -> bool {
        true
    }
}

/// Persisted state behind a [`PlanGate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanState {
    /// Paid plans unlock illustrated summaries and eight-card decks.
    pub premium: bool,
    /// Completed summarizations, for free-tier metering by the embedder.
    pub summaries_used: u64,
}

/// File-backed gate: state is read once at construction and written only
/// by explicit [`PlanGate::record_use`] / [`PlanGate::set_premium`] calls.
pub struct PlanGate {
    path: PathBuf,
    state: Mutex<PlanState>,
}

impl PlanGate {
    /// Load gate state from `path`, starting from defaults when the file
    /// does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, DeckError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| DeckError::StoreWriteFailed {
                path: path.clone(),
                detail: format!("plan state unreadable: {e}"),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PlanState::default(),
            Err(e) => {
                return Err(DeckError::StoreWriteFailed {
                    path,
                    detail: e.to_string(),
                })
            }
        };
        debug!("plan state loaded from '{}': premium={}", path.display(), state.premium);
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn state(&self) -> PlanState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Count one completed summarization and persist the new state.
    pub fn record_use(&self) -> Result<(), DeckError> {
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| DeckError::Internal("plan state lock poisoned".into()))?;
            state.summaries_used += 1;
            state.clone()
        };
        self.persist(&snapshot)
    }

    /// Flip the premium flag and persist the new state.
    pub fn set_premium(&self, premium: bool) -> Result<(), DeckError> {
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| DeckError::Internal("plan state lock poisoned".into()))?;
            state.premium = premium;
            state.clone()
        };
        self.persist(&snapshot)
    }

    fn persist(&self, state: &PlanState) -> Result<(), DeckError> {
        let json = serde_json::to_string_pretty(state).map_err(|e| DeckError::StoreWriteFailed {
            path: self.path.clone(),
            detail: e.to_string(),
        })?;
        write_atomic(&self.path, &json)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), DeckError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| DeckError::StoreWriteFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

impl EntitlementGate for PlanGate {
    fn allows_style(&self, style: SummaryStyle) -> bool {
        match style {
            SummaryStyle::Plain | SummaryStyle::Dialogue => true,
            SummaryStyle::Illustrated => self.state().premium,
        }
    }

    fn allows_card_count(&self, count: CardCount) -> bool {
        match count {
            CardCount::Four | CardCount::Six => true,
            CardCount::Eight => self.state().premium,
        }
    }
}
