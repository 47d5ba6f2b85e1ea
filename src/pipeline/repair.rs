//! Turn free-form model output into exactly the requested number of cards.
//!
//! Models do not reliably emit bare JSON: replies arrive wrapped in code
//! fences, prefixed with chatter, or with cards missing or in surplus.
//! Repair runs a candidate-extraction chain over the raw text, parses the
//! first candidate that exists, validates each card entry, and then
//! reconciles the survivor list against the requested deck size.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DeckError;
use crate::output::CardContent;

/// Title used for cards synthesised to fill a shortfall.
pub const PLACEHOLDER_TITLE: &str = "More in the document";
const PLACEHOLDER_BODY: &str =
    "The summary for this card could not be generated. The source document may contain further detail.";

static RE_FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)```").unwrap());

/// Repair `raw` into exactly `expected` cards, numbered 1..=expected.
pub fn repair(raw: &str, expected: usize) -> Result<Vec<CardContent>, DeckError> {
    let candidate = extract_candidate(raw).ok_or(DeckError::Parsing {
        stage: "no JSON candidate in model output",
    })?;

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        debug!("candidate rejected by JSON parser: {e}");
        DeckError::Parsing {
            stage: "candidate is not valid JSON",
        }
    })?;

    let entries = value
        .get("cards")
        .and_then(Value::as_array)
        .ok_or(DeckError::Parsing {
            stage: "missing 'cards' array",
        })?;

    let cards: Vec<CardContent> = entries.iter().filter_map(parse_card).collect();
    if cards.is_empty() {
        return Err(DeckError::Parsing {
            stage: "no valid card entries",
        });
    }

    Ok(reconcile(cards, expected))
}

/// Candidate-extraction chain, most specific first. The first rule that
/// yields a candidate wins; later rules never see the text.
fn extract_candidate(raw: &str) -> Option<&str> {
    // 1. A ```json fenced block, even with prose around it.
    if let Some(caps) = RE_FENCED_JSON.captures(raw) {
        return caps.get(1).map(|m| m.as_str().trim());
    }
    // 2. Outermost brace span.
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return Some(raw[start..=end].trim());
        }
    }
    // 3. The whole text, trimmed.
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Validate one card entry. Entries without a numeric `number` or with an
/// empty `title` or `body` are dropped, not patched.
fn parse_card(entry: &Value) -> Option<CardContent> {
    let number = entry.get("number")?.as_u64()?;
    let title = non_empty_str(entry, "title")?;
    let body = non_empty_str(entry, "body")?;
    Some(CardContent {
        number: number as u32,
        title,
        body,
        illustration: opt_str(entry, "illustration"),
        background: opt_str(entry, "background"),
        foreground: opt_str(entry, "foreground"),
    })
}

fn non_empty_str(entry: &Value, key: &str) -> Option<String> {
    let s = entry.get(key)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn opt_str(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Force the card list to exactly `expected` entries: surplus cards are
/// truncated, shortfalls padded with placeholders, and every card is
/// renumbered sequentially in its original order.
fn reconcile(mut cards: Vec<CardContent>, expected: usize) -> Vec<CardContent> {
    if cards.len() > expected {
        warn!("model returned {} cards, truncating to {expected}", cards.len());
        cards.truncate(expected);
    }
    while cards.len() < expected {
        cards.push(CardContent {
            number: 0,
            title: PLACEHOLDER_TITLE.to_string(),
            body: PLACEHOLDER_BODY.to_string(),
            illustration: None,
            background: None,
            foreground: None,
        });
    }
    for (i, card) in cards.iter_mut().enumerate() {
        card.number = (i + 1) as u32;
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_json(n: u32) -> String {
        format!(r#"{{"number": {n}, "title": "Card {n}", "body": "Body {n}"}}"#)
    }

    fn deck_json(count: u32) -> String {
        let cards: Vec<String> = (1..=count).map(card_json).collect();
        format!(r#"{{"cards": [{}]}}"#, cards.join(","))
    }

    #[test]
    fn bare_json_parses() {
        let cards = repair(&deck_json(6), 6).unwrap();
        assert_eq!(cards.len(), 6);
        assert_eq!(cards[0].title, "Card 1");
    }

    #[test]
    fn fenced_block_wins_over_stray_braces() {
        let raw = format!(
            "Here is {{an aside}} before the answer.\n```json\n{}\n```\nDone.",
            deck_json(4)
        );
        let cards = repair(&raw, 4).unwrap();
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[3].title, "Card 4");
    }

    #[test]
    fn brace_span_recovers_json_with_chatter() {
        let raw = format!("Sure! Here is the summary:\n{}\nHope that helps.", deck_json(4));
        let cards = repair(&raw, 4).unwrap();
        assert_eq!(cards.len(), 4);
    }

    #[test]
    fn shortfall_is_padded_with_placeholders() {
        let cards = repair(&deck_json(4), 6).unwrap();
        assert_eq!(cards.len(), 6);
        assert_eq!(cards[4].title, PLACEHOLDER_TITLE);
        assert_eq!(cards[5].title, PLACEHOLDER_TITLE);
        // Numbering stays contiguous through the padding.
        let numbers: Vec<u32> = cards.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn surplus_is_truncated_in_order() {
        let cards = repair(&deck_json(8), 4).unwrap();
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[3].title, "Card 4");
        assert_eq!(cards[3].number, 4);
    }

    #[test]
    fn garbled_numbering_is_rewritten() {
        let raw = r#"{"cards": [
            {"number": 9, "title": "A", "body": "a"},
            {"number": 2, "title": "B", "body": "b"},
            {"number": 2, "title": "C", "body": "c"}
        ]}"#;
        let cards = repair(raw, 3).unwrap();
        let numbers: Vec<u32> = cards.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        // Original order preserved.
        assert_eq!(cards[0].title, "A");
        assert_eq!(cards[2].title, "C");
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let raw = r#"{"cards": [
            {"number": 1, "title": "Good", "body": "kept"},
            {"number": "one", "title": "Bad number", "body": "dropped"},
            {"number": 3, "title": "", "body": "empty title dropped"},
            {"number": 4, "title": "No body"}
        ]}"#;
        let cards = repair(raw, 4).unwrap();
        assert_eq!(cards[0].title, "Good");
        assert_eq!(cards[1].title, PLACEHOLDER_TITLE);
    }

    #[test]
    fn optional_fields_survive() {
        let raw = r##"{"cards": [{
            "number": 1, "title": "T", "body": "B",
            "illustration": "a lighthouse at dusk",
            "background": "#1a2b3c",
            "foreground": "#ffffff"
        }]}"##;
        let cards = repair(raw, 1).unwrap();
        assert_eq!(cards[0].illustration.as_deref(), Some("a lighthouse at dusk"));
        assert_eq!(cards[0].background.as_deref(), Some("#1a2b3c"));
        assert_eq!(cards[0].foreground.as_deref(), Some("#ffffff"));
    }

    #[test]
    fn no_cards_array_is_a_parse_error() {
        let err = repair(r#"{"summary": "prose instead"}"#, 4).unwrap_err();
        assert!(matches!(err, DeckError::Parsing { .. }));
    }

    #[test]
    fn all_entries_invalid_is_a_parse_error() {
        let raw = r#"{"cards": [{"title": "no number", "body": "x"}]}"#;
        assert!(matches!(repair(raw, 4), Err(DeckError::Parsing { .. })));
    }

    #[test]
    fn empty_text_is_a_parse_error() {
        assert!(matches!(repair("   \n ", 4), Err(DeckError::Parsing { .. })));
        assert!(matches!(repair("no json here", 4), Err(DeckError::Parsing { .. })));
    }
}
