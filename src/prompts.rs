//! Prompt construction for card-deck summarisation.
//!
//! Centralising every prompt here serves two purposes: a single source of
//! truth for the output contract the repair stage depends on, and direct
//! testability — unit tests can inspect the generated payload without
//! touching a live endpoint.
//!
//! [`build_request`] is a pure function: document + summary request in,
//! [`RequestPayload`] out. No I/O, no clock, no randomness.

use crate::config::{SummaryConfig, SummaryStyle};
use crate::document::ProcessedDocument;

/// The two logical halves of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    /// System-level instruction block: contract, style, language, tone.
    pub system: String,
    /// Content block: document identity, counts, and the text prefix.
    pub user: String,
}

/// Build the request payload for one summarisation call.
///
/// The document text is truncated to `char_budget` characters (on a char
/// boundary) to respect the remote model's input limits; the truncation is
/// announced inside the content block so the model does not treat a cut-off
/// sentence as the end of the document.
pub fn build_request(
    doc: &ProcessedDocument,
    summary: &SummaryConfig,
    char_budget: usize,
) -> RequestPayload {
    RequestPayload {
        system: system_block(summary),
        user: content_block(doc, char_budget),
    }
}

fn system_block(summary: &SummaryConfig) -> String {
    let n = summary.card_count.as_usize();

    let style_rules = match summary.style {
        SummaryStyle::Plain => {
            "Each card is a short, self-contained prose summary of one aspect of the document."
        }
        SummaryStyle::Dialogue => {
            "Write each card body as a short dialogue between two voices, \"A:\" and \"B:\", \
             that together explain one aspect of the document. The dialogue may continue \
             naturally from one card to the next."
        }
        SummaryStyle::Illustrated => {
            "Each card is a short prose summary of one aspect of the document. Additionally \
             give every card an \"illustration\" field (a one-sentence description of a fitting \
             illustration) and \"background\"/\"foreground\" fields (hex colour hints that suit \
             the card's mood)."
        }
    };

    format!(
        r##"You are an expert document summarizer. Your task is to condense a document into exactly {n} summary cards.

Follow these rules precisely:

1. CARD COUNT
   - Produce exactly {n} cards, no more, no fewer.
   - Number them contiguously from 1 to {n}.

2. CONTENT
   - Each card must stand on its own: a reader should understand it without the others.
   - Together the cards must cover the document's main points in order.
   - {style_rules}

3. LANGUAGE AND TONE
   - Write every title and body in {language}.
   - Use a {tone} tone throughout.

4. OUTPUT FORMAT
   - Reply with a single JSON object of the shape:
     {{"cards": [{{"number": 1, "title": "...", "body": "...", "illustration": "...", "background": "#RRGGBB", "foreground": "#RRGGBB"}}]}}
   - "number", "title", and "body" are required on every card; the other fields are optional.
   - Output ONLY the JSON object. No commentary, no prose outside it."##,
        n = n,
        style_rules = style_rules,
        language = summary.language.as_str(),
        tone = summary.tone.as_str(),
    )
}

fn content_block(doc: &ProcessedDocument, char_budget: usize) -> String {
    let (prefix, truncated) = truncate_chars(&doc.text, char_budget);

    let mut block = format!(
        "Document: {}\nWords: {}  Characters: {}\n\n{}",
        doc.info.file_name, doc.word_count, doc.char_count, prefix
    );
    if truncated {
        block.push_str("\n\n[document truncated for length]");
    }
    block
}

/// Take at most `budget` characters, reporting whether anything was cut.
fn truncate_chars(text: &str, budget: usize) -> (&str, bool) {
    match text.char_indices().nth(budget) {
        Some((byte_at, _)) => (&text[..byte_at], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CardCount, Language, Tone};
    use crate::document::{DocumentFormat, DocumentInfo};
    use std::path::Path;

    fn doc(text: &str) -> ProcessedDocument {
        ProcessedDocument::new(
            DocumentInfo::new(Path::new("paper.pdf"), DocumentFormat::Pdf, 1000),
            text.to_string(),
        )
    }

    fn summary() -> SummaryConfig {
        SummaryConfig {
            card_count: CardCount::Four,
            style: SummaryStyle::Plain,
            language: Language::Spanish,
            tone: Tone::Friendly,
        }
    }

    #[test]
    fn system_block_encodes_the_contract() {
        let payload = build_request(&doc("body text"), &summary(), 6000);
        assert!(payload.system.contains("exactly 4 summary cards"));
        assert!(payload.system.contains("from 1 to 4"));
        assert!(payload.system.contains("Spanish"));
        assert!(payload.system.contains("friendly"));
        assert!(payload.system.contains("\"cards\""));
    }

    #[test]
    fn dialogue_style_changes_instructions() {
        let mut s = summary();
        s.style = SummaryStyle::Dialogue;
        let payload = build_request(&doc("body"), &s, 6000);
        assert!(payload.system.contains("dialogue"));
        assert!(payload.system.contains("\"A:\""));
    }

    #[test]
    fn illustrated_style_asks_for_hints() {
        let mut s = summary();
        s.style = SummaryStyle::Illustrated;
        let payload = build_request(&doc("body"), &s, 6000);
        assert!(payload.system.contains("illustration"));
        assert!(payload.system.contains("background"));
    }

    #[test]
    fn content_block_carries_identity_and_counts() {
        let payload = build_request(&doc("one two three"), &summary(), 6000);
        assert!(payload.user.contains("paper.pdf"));
        assert!(payload.user.contains("Words: 3"));
        assert!(payload.user.contains("one two three"));
        assert!(!payload.user.contains("[document truncated"));
    }

    #[test]
    fn long_text_is_truncated_on_char_boundary() {
        let text = "é".repeat(50);
        let payload = build_request(&doc(&text), &summary(), 10);
        assert!(payload.user.contains(&"é".repeat(10)));
        assert!(!payload.user.contains(&"é".repeat(11)));
        assert!(payload.user.contains("[document truncated for length]"));
    }

    #[test]
    fn build_is_deterministic() {
        let d = doc("stable input");
        let s = summary();
        assert_eq!(build_request(&d, &s, 100), build_request(&d, &s, 100));
    }
}
