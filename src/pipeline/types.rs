//! Core types for the narrative-processing pipeline.
//!
//! These types model the full lifecycle:
//! RawNote → SectionBlocks → FilteredNote → SymptomMentions → NoteSymptomRecord → Vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════
// Input
// ═══════════════════════════════════════════

/// One discharge narrative per encounter, already deduplicated upstream.
/// `text` is `None` when the source cell was null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNote {
    pub id: String,
    pub text: Option<String>,
}

impl RawNote {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
        }
    }
}

// ═══════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════

/// A contiguous, header-delimited region of a note.
///
/// `header_line` holds the header line verbatim (including its newline) and is
/// empty for the preamble. `header_line + content` of every block, in order,
/// is the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBlock {
    /// Trimmed header name without the colon. `None` only for the preamble.
    pub header: Option<String>,
    pub header_line: String,
    pub content: String,
    pub order: usize,
}

impl SectionBlock {
    pub fn is_preamble(&self) -> bool {
        self.header.is_none()
    }

    /// Header line and content exactly as they appeared in the note.
    pub fn verbatim(&self) -> String {
        let mut out = String::with_capacity(self.header_line.len() + self.content.len());
        out.push_str(&self.header_line);
        out.push_str(&self.content);
        out
    }
}

/// A note after removal of configured sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredNote {
    pub id: String,
    pub text: String,
}

// ═══════════════════════════════════════════
// Symptoms
// ═══════════════════════════════════════════

/// A detected occurrence of a lexicon term. Dedup key is `(term, negated)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymptomMention {
    pub term: String,
    pub negated: bool,
}

impl SymptomMention {
    pub fn affirmed(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            negated: false,
        }
    }

    pub fn negated(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            negated: true,
        }
    }
}

/// Affirmed terms of one note, distinct, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSymptomRecord {
    pub note_id: String,
    pub affirmed_terms: Vec<String>,
}

impl NoteSymptomRecord {
    /// Discard negated mentions, keeping the first occurrence of each term.
    pub fn from_mentions(note_id: impl Into<String>, mentions: &[SymptomMention]) -> Self {
        let mut affirmed_terms: Vec<String> = Vec::new();
        for mention in mentions.iter().filter(|m| !m.negated) {
            if !affirmed_terms.contains(&mention.term) {
                affirmed_terms.push(mention.term.clone());
            }
        }
        Self {
            note_id: note_id.into(),
            affirmed_terms,
        }
    }
}

// ═══════════════════════════════════════════
// Vocabulary
// ═══════════════════════════════════════════

/// Term → 0-based index, ordered lexicographically. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    index: BTreeMap<String, usize>,
}

impl Vocabulary {
    /// Assign each distinct term its rank in sorted order.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: std::collections::BTreeSet<String> =
            terms.into_iter().map(Into::into).collect();
        let index = sorted
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        Self { index }
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Terms in index order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }
}

// ═══════════════════════════════════════════
// Failures
// ═══════════════════════════════════════════

/// A note excluded from the corpus because its processing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFailure {
    pub note_id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_only_affirmed_terms_in_order() {
        let mentions = vec![
            SymptomMention::affirmed("chills"),
            SymptomMention::negated("fever"),
            SymptomMention::affirmed("cough"),
            SymptomMention::negated("chills"),
        ];
        let record = NoteSymptomRecord::from_mentions("n1", &mentions);
        assert_eq!(record.affirmed_terms, vec!["chills", "cough"]);
    }

    #[test]
    fn vocabulary_indices_follow_sorted_order() {
        let vocab = Vocabulary::from_terms(["nausea", "cough", "fever", "cough"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("cough"), Some(0));
        assert_eq!(vocab.index_of("fever"), Some(1));
        assert_eq!(vocab.index_of("nausea"), Some(2));
        assert_eq!(vocab.index_of("rash"), None);
    }

    #[test]
    fn vocabulary_serializes_as_plain_map() {
        let vocab = Vocabulary::from_terms(["fever", "cough"]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"{"cough":0,"fever":1}"#);
        let parsed: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vocab);
    }

    #[test]
    fn verbatim_joins_header_line_and_content() {
        let block = SectionBlock {
            header: Some("Chief Complaint".into()),
            header_line: "Chief Complaint:\n".into(),
            content: "cough\n".into(),
            order: 1,
        };
        assert_eq!(block.verbatim(), "Chief Complaint:\ncough\n");
        assert!(!block.is_preamble());
    }
}
