//! Batch runner for the full narrative pipeline.
//!
//! Segment → Filter → Extract runs per note in parallel. Failed notes are
//! recorded and excluded. The vocabulary step waits for every note, then runs
//! once over the whole corpus.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use super::error::PipelineError;
use super::sections::{asymmetric_headers, segment, HeaderRule, SectionFilter};
use super::symptoms::SymptomExtractor;
use super::types::{FilteredNote, NoteFailure, NoteSymptomRecord, RawNote};
use super::vocabulary::{CorpusVocabulary, VocabularyBuilder, VocabularyStats};
use crate::config::{PipelineConfig, APP_VERSION};

/// Per-note result of the parallel stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteOutcome {
    pub filtered: FilteredNote,
    pub record: NoteSymptomRecord,
    pub sections_removed: usize,
    /// Headers only the listing rule recognises, kept only when recognising
    /// them changes the filtered text.
    pub asymmetric_headers: Vec<String>,
}

/// Check that a note has usable text.
fn note_text(note: &RawNote) -> Result<&str, PipelineError> {
    let malformed = |reason: &str| PipelineError::MalformedRecord {
        note_id: note.id.clone(),
        reason: reason.to_string(),
    };

    let text = note.text.as_deref().ok_or_else(|| malformed("null text"))?;
    if text.trim().is_empty() {
        return Err(malformed("empty text"));
    }
    if text.contains('\0') {
        return Err(malformed("unreadable text (NUL byte)"));
    }
    Ok(text)
}

/// Segment, filter and extract one note.
pub fn process_note(
    note: &RawNote,
    filter: &SectionFilter,
    extractor: &SymptomExtractor,
) -> Result<NoteOutcome, PipelineError> {
    let text = note_text(note)?;

    let blocks = segment(text, filter.rule());
    let (filtered_text, sections_removed) = filter.apply_blocks(&blocks);
    let record = extractor.record(&note.id, &filtered_text);

    let mut asymmetric = asymmetric_headers(text);
    if !asymmetric.is_empty() {
        let other = match filter.rule() {
            HeaderRule::Listing => HeaderRule::Strict,
            HeaderRule::Strict => HeaderRule::Listing,
        };
        let (other_text, _) = filter.apply_blocks(&segment(text, other));
        if other_text == filtered_text {
            asymmetric.clear();
        }
    }

    Ok(NoteOutcome {
        filtered: FilteredNote {
            id: note.id.clone(),
            text: filtered_text,
        },
        record,
        sections_removed,
        asymmetric_headers: asymmetric,
    })
}

/// Summary counts reported after a run. Observational only.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub app_version: String,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub notes_in: usize,
    pub notes_segmented: usize,
    pub notes_malformed: usize,
    pub sections_removed: usize,
    pub notes_with_header_asymmetry: usize,
    pub min_term_frequency: usize,
    pub min_symptoms_per_note: usize,
    pub max_symptoms_per_note: usize,
    #[serde(flatten)]
    pub vocabulary: VocabularyStats,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Filtered text of every successfully segmented note.
    pub filtered_notes: Vec<FilteredNote>,
    pub corpus: CorpusVocabulary,
    pub failures: Vec<NoteFailure>,
    pub report: PipelineReport,
}

/// Orchestrates a full batch run.
pub struct BatchRunner {
    filter: SectionFilter,
    extractor: SymptomExtractor,
    vocabulary: VocabularyBuilder,
}

impl BatchRunner {
    pub fn new(
        filter: SectionFilter,
        extractor: SymptomExtractor,
        vocabulary: VocabularyBuilder,
    ) -> Self {
        Self {
            filter,
            extractor,
            vocabulary,
        }
    }

    /// Validates the config and compiles all patterns up front.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self::new(
            config.section_filter(),
            config.symptom_extractor()?,
            config.vocabulary_builder(),
        ))
    }

    pub fn run(&self, notes: &[RawNote]) -> BatchOutput {
        let start = Instant::now();
        let total = notes.len();
        let counter = AtomicUsize::new(0);

        tracing::info!(
            notes = total,
            threads = rayon::current_num_threads(),
            "Processing notes"
        );

        let results: Vec<Result<NoteOutcome, PipelineError>> = notes
            .par_iter()
            .map(|note| {
                let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10_000 == 0 {
                    tracing::info!(done, total, "Notes processed");
                }
                process_note(note, &self.filter, &self.extractor)
            })
            .collect();

        let mut filtered_notes = Vec::with_capacity(total);
        let mut records = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut sections_removed = 0;
        let mut notes_with_header_asymmetry = 0;

        for (note, result) in notes.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    sections_removed += outcome.sections_removed;
                    if !outcome.asymmetric_headers.is_empty() {
                        notes_with_header_asymmetry += 1;
                        tracing::debug!(
                            note_id = %note.id,
                            headers = ?outcome.asymmetric_headers,
                            "Header rule changes the filtered text"
                        );
                    }
                    filtered_notes.push(outcome.filtered);
                    records.push(outcome.record);
                }
                Err(e) => {
                    tracing::warn!(note_id = %note.id, error = %e, "Excluding note");
                    failures.push(NoteFailure {
                        note_id: note.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Barrier: every note is extracted before frequencies are counted.
        let corpus = self.vocabulary.build(records);

        let report = PipelineReport {
            app_version: APP_VERSION.to_string(),
            generated_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            notes_in: total,
            notes_segmented: filtered_notes.len(),
            notes_malformed: failures.len(),
            sections_removed,
            notes_with_header_asymmetry,
            min_term_frequency: self.vocabulary.min_term_frequency,
            min_symptoms_per_note: self.vocabulary.min_terms_per_note,
            max_symptoms_per_note: self.vocabulary.max_terms_per_note,
            vocabulary: corpus.stats.clone(),
        };

        tracing::info!(
            notes_in = report.notes_in,
            notes_segmented = report.notes_segmented,
            notes_malformed = report.notes_malformed,
            notes_removed = report.vocabulary.notes_dropped,
            notes_retained = report.vocabulary.notes_retained,
            retained_terms = report.vocabulary.vocabulary_size,
            header_asymmetry = report.notes_with_header_asymmetry,
            duration_ms = report.duration_ms,
            "Batch complete"
        );

        BatchOutput {
            filtered_notes,
            corpus,
            failures,
            report,
        }
    }
}
