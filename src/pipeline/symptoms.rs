//! Symptom extractor: lexicon matches tagged affirmed or negated.
//!
//! The text is lowercased once. Every lexicon term is searched, in sorted term
//! order, with its whole-word pattern. A match is negated when a cue appears
//! in the fixed-size window of characters before it. The window stops after
//! its last contrastive conjunction, so "denies fever but reports chills"
//! leaves chills affirmed. Punctuation does not end the scope: abbreviations
//! such as "abd." or "h.o." are common in clinical notes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::error::PipelineError;
use super::lexicon::{CompiledLexicon, Lexicon, NegationCues};
use super::types::{NoteSymptomRecord, SymptomMention};

/// Characters inspected before each match.
pub const NEGATION_WINDOW_CHARS: usize = 50;

/// Contrastive conjunctions that end the scope of a negation cue.
static SCOPE_TERMINATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:but|however|although|though|except|yet)\b")
        .expect("Invalid scope terminator pattern")
});

/// The `chars` characters immediately preceding byte offset `start`, clamped
/// at the start of the text.
pub fn negation_window(lower: &str, start: usize, chars: usize) -> &str {
    let prefix = &lower[..start];
    if chars == 0 {
        return &prefix[prefix.len()..];
    }
    let from = prefix
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &prefix[from..]
}

/// Part of the window after its last contrastive conjunction.
fn in_scope(window: &str) -> &str {
    match SCOPE_TERMINATOR.find_iter(window).last() {
        Some(m) => &window[m.end()..],
        None => window,
    }
}

/// Scans text for lexicon terms. Immutable and shared across threads.
#[derive(Debug, Clone)]
pub struct SymptomExtractor {
    lexicon: CompiledLexicon,
    cues: NegationCues,
    window_chars: usize,
}

impl SymptomExtractor {
    pub fn new(lexicon: &Lexicon, cues: NegationCues) -> Result<Self, PipelineError> {
        Ok(Self {
            lexicon: lexicon.compile()?,
            cues,
            window_chars: NEGATION_WINDOW_CHARS,
        })
    }

    pub fn with_window(mut self, window_chars: usize) -> Self {
        self.window_chars = window_chars;
        self
    }

    /// Deduplicated mentions: by term in sorted order, then by first
    /// occurrence in the text.
    pub fn extract(&self, text: &str) -> Vec<SymptomMention> {
        let lower = text.to_lowercase();
        let mut seen: HashSet<(&str, bool)> = HashSet::new();
        let mut mentions = Vec::new();

        for pattern in self.lexicon.patterns() {
            for mat in pattern.regex.find_iter(&lower) {
                let window = negation_window(&lower, mat.start(), self.window_chars);
                let negated = self.cues.matches(in_scope(window));

                if seen.insert((pattern.term.as_str(), negated)) {
                    mentions.push(SymptomMention {
                        term: pattern.term.clone(),
                        negated,
                    });
                }
                if seen.contains(&(pattern.term.as_str(), !negated)) {
                    // Both states recorded; later matches add nothing.
                    break;
                }
            }
        }
        mentions
    }

    /// Affirmed terms of a note.
    pub fn record(&self, note_id: &str, text: &str) -> NoteSymptomRecord {
        NoteSymptomRecord::from_mentions(note_id, &self.extract(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(terms: &[&str]) -> SymptomExtractor {
        SymptomExtractor::new(&Lexicon::new(terms).unwrap(), NegationCues::default()).unwrap()
    }

    #[test]
    fn negation_scoping_across_but() {
        let mentions = extractor(&["fever", "chills"]).extract("Patient denies fever but reports chills.");
        assert_eq!(
            mentions,
            vec![SymptomMention::affirmed("chills"), SymptomMention::negated("fever")]
        );
    }

    #[test]
    fn mentions_follow_sorted_term_order() {
        let mentions = extractor(&["vomiting", "cough", "nausea"])
            .extract("Vomiting since Monday, then nausea and a dry cough.");
        let terms: Vec<&str> = mentions.iter().map(|m| m.term.as_str()).collect();
        assert_eq!(terms, vec!["cough", "nausea", "vomiting"]);
    }

    #[test]
    fn repeated_identical_mentions_collapse() {
        let mentions = extractor(&["headache"])
            .extract("Headache on admission. Headache improved. Headache resolved.");
        assert_eq!(mentions, vec![SymptomMention::affirmed("headache")]);
    }

    #[test]
    fn same_term_affirmed_and_negated() {
        let mentions = extractor(&["nausea"])
            .extract("Reports nausea at night. Today without nausea.");
        assert_eq!(
            mentions,
            vec![SymptomMention::affirmed("nausea"), SymptomMention::negated("nausea")]
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_whole_word() {
        let ex = extractor(&["pain", "rash"]);
        assert_eq!(ex.extract("Severe PAIN in the leg"), vec![SymptomMention::affirmed("pain")]);
        assert!(ex.extract("painful rashes on arms").is_empty());
    }

    #[test]
    fn multi_word_term_matches_across_line_wrap() {
        let mentions = extractor(&["shortness of breath"])
            .extract("Presented with worsening shortness\n   of breath.");
        assert_eq!(mentions, vec![SymptomMention::affirmed("shortness of breath")]);
    }

    #[test]
    fn each_negation_cue_negates() {
        let ex = extractor(&["fever"]);
        for prefix in [
            "Denies",
            "She denied",
            "He deny",
            "No",
            "No history of",
            "Without",
            "Never had",
            "Not complaining of",
            "Did not report",
            "Does not have",
            "Not experiencing",
            "Absence of",
        ] {
            let mentions = ex.extract(&format!("{prefix} fever"));
            assert_eq!(mentions, vec![SymptomMention::negated("fever")], "cue: {prefix}");
        }
    }

    #[test]
    fn cue_outside_window_does_not_negate() {
        let ex = extractor(&["fever"]);
        let far = format!("No {}fever", "word ".repeat(12));
        assert_eq!(ex.extract(&far), vec![SymptomMention::affirmed("fever")]);

        let near = format!("No {}fever", "word ".repeat(9));
        assert_eq!(ex.extract(&near), vec![SymptomMention::negated("fever")]);
    }

    #[test]
    fn cue_inside_other_word_does_not_negate() {
        let ex = extractor(&["fever"]);
        assert_eq!(ex.extract("Noted fever overnight"), vec![SymptomMention::affirmed("fever")]);
        assert_eq!(ex.extract("Known fever"), vec![SymptomMention::affirmed("fever")]);
    }

    #[test]
    fn abbreviation_periods_keep_negation() {
        assert_eq!(
            extractor(&["pain"]).extract("Pt denies abd. pain"),
            vec![SymptomMention::negated("pain")]
        );
        assert_eq!(
            extractor(&["fever"]).extract("No h.o. fever"),
            vec![SymptomMention::negated("fever")]
        );
    }

    #[test]
    fn sentence_end_inside_window_keeps_negation() {
        assert_eq!(
            extractor(&["pain"]).extract("Denies fever. Pain in knee."),
            vec![SymptomMention::negated("pain")]
        );
    }

    #[test]
    fn contrastive_conjunction_closes_negation_scope() {
        let ex = extractor(&["cough"]);
        assert_eq!(ex.extract("No chest pain, however cough"), vec![SymptomMention::affirmed("cough")]);
        assert_eq!(ex.extract("No fever yet cough"), vec![SymptomMention::affirmed("cough")]);
    }

    #[test]
    fn window_is_clamped_and_char_based() {
        assert_eq!(negation_window("abc fever", 4, 50), "abc ");
        assert_eq!(negation_window("abcdef", 6, 3), "def");
        assert_eq!(negation_window("héllo fever", 7, 6), "héllo ");
        assert_eq!(negation_window("abc", 3, 0), "");
    }

    #[test]
    fn record_keeps_affirmed_terms_only() {
        let record = extractor(&["fever", "chills", "cough"]).record(
            "n1",
            "Has chills and cough on admission, but denies fever and has had no cough at night.",
        );
        assert_eq!(record.note_id, "n1");
        assert_eq!(record.affirmed_terms, vec!["chills", "cough"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let ex = SymptomExtractor::new(&Lexicon::default(), NegationCues::default()).unwrap();
        let text = "Fever, chills, nausea and vomiting. Denies chest pain. Mild headache and fatigue.";
        let first = ex.extract(text);
        for _ in 0..5 {
            assert_eq!(ex.extract(text), first);
        }
    }
}
