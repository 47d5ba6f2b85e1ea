//! Output types: cards, token accounting, and the finished summary.
//!
//! A [`SummaryResult`] is constructed once by the pipeline and handed off;
//! nothing in this crate mutates one after creation. The card-sequence
//! invariant (numbers contiguous `1..=N`, `N` equal to the requested card
//! count) is enforced by the repair stage before a result is ever built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SummaryConfig;
use crate::document::DocumentInfo;

/// One unit of the final structured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    /// 1-based sequence position.
    pub number: u32,
    pub title: String,
    pub body: String,
    /// Free-text hint for an illustration, when the style asks for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration: Option<String>,
    /// Background colour hint (e.g. "#1E2A3A").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Foreground colour hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
}

impl CardContent {
    /// A card is blank when title and body are both empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.body.trim().is_empty()
    }
}

/// Token accounting reported by the completion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A finished, contract-satisfying summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    pub id: Uuid,
    pub config: SummaryConfig,
    pub document: DocumentInfo,
    /// Ordered by sequence position, exactly `config.card_count` entries.
    pub cards: Vec<CardContent>,
    pub created_at: DateTime<Utc>,
    pub usage: TokenUsage,
}

impl SummaryResult {
    pub fn new(
        config: SummaryConfig,
        document: DocumentInfo,
        cards: Vec<CardContent>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            document,
            cards,
            created_at: Utc::now(),
            usage,
        }
    }

    /// True when the card list is empty or every card is blank.
    /// Stores skip blank results instead of persisting them.
    pub fn is_blank(&self) -> bool {
        self.cards.is_empty() || self.cards.iter().all(CardContent::is_blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentFormat;
    use std::path::Path;

    fn card(number: u32, title: &str, body: &str) -> CardContent {
        CardContent {
            number,
            title: title.to_string(),
            body: body.to_string(),
            illustration: None,
            background: None,
            foreground: None,
        }
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 1200,
            output_tokens: 340,
        };
        assert_eq!(usage.total(), 1540);
    }

    #[test]
    fn blank_detection() {
        assert!(card(1, "  ", "\t").is_blank());
        assert!(!card(1, "Title", "").is_blank());

        let info = DocumentInfo::new(Path::new("a.txt"), DocumentFormat::Txt, 1);
        let empty = SummaryResult::new(SummaryConfig::default(), info.clone(), vec![], TokenUsage::default());
        assert!(empty.is_blank());

        let all_blank = SummaryResult::new(
            SummaryConfig::default(),
            info.clone(),
            vec![card(1, "", " "), card(2, " ", "")],
            TokenUsage::default(),
        );
        assert!(all_blank.is_blank());

        let ok = SummaryResult::new(
            SummaryConfig::default(),
            info,
            vec![card(1, "Intro", "Body")],
            TokenUsage::default(),
        );
        assert!(!ok.is_blank());
    }

    #[test]
    fn optional_hints_are_omitted_from_json() {
        let json = serde_json::to_string(&card(1, "T", "B")).unwrap();
        assert!(!json.contains("illustration"));
        assert!(!json.contains("background"));
    }
}
