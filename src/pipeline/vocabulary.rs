//! Corpus vocabulary builder.
//!
//! Runs after every note has been extracted. Counts the notes each term
//! appears in, keeps terms meeting the frequency threshold, caps and filters
//! each note's term list, then indexes the surviving terms in sorted order.

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;

use super::types::{NoteSymptomRecord, Vocabulary};

/// Number of notes each distinct term appears in.
///
/// A single reduction over the whole corpus; repeats inside one note count once.
pub fn term_frequencies(records: &[NoteSymptomRecord]) -> BTreeMap<String, usize> {
    let counts: HashMap<&str, usize> = records
        .par_iter()
        .fold(HashMap::new, |mut acc, record| {
            let distinct: HashSet<&str> =
                record.affirmed_terms.iter().map(String::as_str).collect();
            for term in distinct {
                *acc.entry(term).or_insert(0) += 1;
            }
            acc
        })
        .reduce(HashMap::new, |mut left, right| {
            for (term, count) in right {
                *left.entry(term).or_insert(0) += count;
            }
            left
        });

    counts
        .into_iter()
        .map(|(term, count)| (term.to_string(), count))
        .collect()
}

/// Observational counts from a vocabulary build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VocabularyStats {
    pub notes_in: usize,
    pub notes_retained: usize,
    pub notes_dropped: usize,
    pub distinct_terms: usize,
    pub valid_terms: usize,
    pub vocabulary_size: usize,
}

/// Retained notes, the vocabulary over them and the counts.
#[derive(Debug, Clone)]
pub struct CorpusVocabulary {
    pub records: Vec<NoteSymptomRecord>,
    pub dropped_note_ids: Vec<String>,
    pub vocabulary: Vocabulary,
    pub stats: VocabularyStats,
}

/// Frequency and per-note length thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularyBuilder {
    pub min_term_frequency: usize,
    pub min_terms_per_note: usize,
    pub max_terms_per_note: usize,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self {
            min_term_frequency: 10,
            min_terms_per_note: 2,
            max_terms_per_note: 50,
        }
    }
}

impl VocabularyBuilder {
    pub fn build(&self, records: Vec<NoteSymptomRecord>) -> CorpusVocabulary {
        let notes_in = records.len();
        let frequencies = term_frequencies(&records);

        let valid: HashSet<&str> = frequencies
            .iter()
            .filter(|&(_, &count)| count >= self.min_term_frequency)
            .map(|(term, _)| term.as_str())
            .collect();

        if valid.is_empty() && notes_in > 0 {
            tracing::warn!(
                min_term_frequency = self.min_term_frequency,
                distinct_terms = frequencies.len(),
                "No term meets the frequency threshold; output will be empty"
            );
        }

        let mut retained = Vec::new();
        let mut dropped_note_ids = Vec::new();

        for record in records {
            let kept: Vec<String> = record
                .affirmed_terms
                .into_iter()
                .filter(|term| valid.contains(term.as_str()))
                .take(self.max_terms_per_note)
                .collect();

            if kept.len() < self.min_terms_per_note {
                dropped_note_ids.push(record.note_id);
            } else {
                retained.push(NoteSymptomRecord {
                    note_id: record.note_id,
                    affirmed_terms: kept,
                });
            }
        }

        let vocabulary = build_index(&retained);

        let stats = VocabularyStats {
            notes_in,
            notes_retained: retained.len(),
            notes_dropped: dropped_note_ids.len(),
            distinct_terms: frequencies.len(),
            valid_terms: valid.len(),
            vocabulary_size: vocabulary.len(),
        };

        tracing::info!(
            notes_in = stats.notes_in,
            notes_retained = stats.notes_retained,
            notes_dropped = stats.notes_dropped,
            valid_terms = stats.valid_terms,
            vocabulary_size = stats.vocabulary_size,
            "Built corpus vocabulary"
        );

        CorpusVocabulary {
            records: retained,
            dropped_note_ids,
            vocabulary,
            stats,
        }
    }
}

/// Sorted, deduplicated terms of the retained notes, indexed by rank.
pub fn build_index(records: &[NoteSymptomRecord]) -> Vocabulary {
    Vocabulary::from_terms(
        records
            .iter()
            .flat_map(|r| r.affirmed_terms.iter().map(String::as_str)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(id: &str, terms: &[&str]) -> NoteSymptomRecord {
        NoteSymptomRecord {
            note_id: id.to_string(),
            affirmed_terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn builder(min_freq: usize, min_per_note: usize, max_per_note: usize) -> VocabularyBuilder {
        VocabularyBuilder {
            min_term_frequency: min_freq,
            min_terms_per_note: min_per_note,
            max_terms_per_note: max_per_note,
        }
    }

    #[test]
    fn frequencies_count_notes_not_occurrences() {
        let records = vec![
            make_record("a", &["fever", "cough"]),
            make_record("b", &["fever"]),
            make_record("c", &["rash"]),
        ];
        let freq = term_frequencies(&records);
        assert_eq!(freq["fever"], 2);
        assert_eq!(freq["cough"], 1);
        assert_eq!(freq["rash"], 1);
    }

    #[test]
    fn frequency_threshold_boundary() {
        // "fever" in 3 notes, "cough" in 2 notes, threshold 3.
        let records = vec![
            make_record("a", &["fever", "cough"]),
            make_record("b", &["fever", "cough"]),
            make_record("c", &["fever"]),
        ];
        let out = builder(3, 1, 50).build(records);
        assert_eq!(out.stats.valid_terms, 1);
        assert_eq!(out.vocabulary.index_of("fever"), Some(0));
        assert_eq!(out.vocabulary.index_of("cough"), None);
        assert!(out.records.iter().all(|r| r.affirmed_terms == vec!["fever"]));
    }

    #[test]
    fn per_note_minimum_boundary() {
        let records = vec![
            make_record("one", &["fever"]),
            make_record("two", &["fever", "cough"]),
            make_record("three", &["fever", "cough", "rash"]),
        ];
        let out = builder(1, 2, 50).build(records);
        let ids: Vec<&str> = out.records.iter().map(|r| r.note_id.as_str()).collect();
        assert_eq!(ids, vec!["two", "three"]);
        assert_eq!(out.dropped_note_ids, vec!["one"]);
        assert_eq!(out.stats.notes_dropped, 1);
    }

    #[test]
    fn minimum_applies_after_invalid_terms_removed() {
        let records = vec![
            make_record("a", &["fever", "rare"]),
            make_record("b", &["fever", "cough"]),
            make_record("c", &["fever", "cough"]),
        ];
        let out = builder(2, 2, 50).build(records);
        assert_eq!(out.dropped_note_ids, vec!["a"]);
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn truncation_keeps_first_terms_in_extraction_order() {
        let records = vec![
            make_record("a", &["nausea", "cough", "fever", "rash", "edema"]),
            make_record("b", &["edema", "rash"]),
        ];
        let out = builder(1, 1, 3).build(records);
        assert_eq!(out.records[0].affirmed_terms, vec!["nausea", "cough", "fever"]);
        assert_eq!(out.records[1].affirmed_terms, vec!["edema", "rash"]);
    }

    #[test]
    fn truncation_happens_after_validity_filter() {
        let records = vec![
            make_record("a", &["rare", "fever", "cough", "rash"]),
            make_record("b", &["fever", "cough", "rash"]),
        ];
        let out = builder(2, 1, 2).build(records);
        assert_eq!(out.records[0].affirmed_terms, vec!["fever", "cough"]);
    }

    #[test]
    fn vocabulary_is_sorted_and_covers_only_retained_terms() {
        let records = vec![
            make_record("a", &["nausea", "cough", "fever", "rash"]),
            make_record("b", &["rash", "cough"]),
        ];
        let out = builder(1, 1, 2).build(records);
        let terms: Vec<&str> = out.vocabulary.terms().collect();
        // "fever" survives validity but is truncated away from every note.
        assert_eq!(terms, vec!["cough", "nausea", "rash"]);
        assert_eq!(out.vocabulary.index_of("rash"), Some(2));
    }

    #[test]
    fn vocabulary_build_is_stable() {
        let records = vec![
            make_record("a", &["wheezing", "cough", "fever"]),
            make_record("b", &["fever", "cough", "dyspnea"]),
            make_record("c", &["dyspnea", "wheezing"]),
        ];
        let first = builder(1, 2, 50).build(records.clone());
        let second = builder(1, 2, 50).build(records);
        assert_eq!(first.vocabulary, second.vocabulary);
        assert_eq!(first.records, second.records);
        assert_eq!(build_index(&first.records), first.vocabulary);
    }

    #[test]
    fn zero_valid_terms_yields_empty_output() {
        let records = vec![make_record("a", &["fever", "cough"])];
        let out = builder(5, 2, 50).build(records);
        assert!(out.records.is_empty());
        assert!(out.vocabulary.is_empty());
        assert_eq!(out.stats.valid_terms, 0);
        assert_eq!(out.stats.notes_dropped, 1);
    }

    #[test]
    fn empty_corpus() {
        let out = VocabularyBuilder::default().build(Vec::new());
        assert_eq!(out.stats, VocabularyStats::default());
    }
}
