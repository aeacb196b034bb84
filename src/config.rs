use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::error::PipelineError;
use crate::pipeline::lexicon::{Lexicon, NegationCues, DEFAULT_NEGATION_CUES};
use crate::pipeline::sections::{HeaderRule, SectionFilter, DEFAULT_REMOVED_SECTIONS};
use crate::pipeline::symptoms::{SymptomExtractor, NEGATION_WINDOW_CHARS};
use crate::pipeline::vocabulary::VocabularyBuilder;

/// Application-level constants
pub const APP_NAME: &str = "notesift";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "notesift=info,notesift_lib=info"
}

/// Run configuration. Every field has a default; a JSON file may override any
/// subset and CLI flags override the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Exact section names to remove (compared after trimming).
    pub removed_sections: Vec<String>,
    /// Header detection used when removing sections.
    pub header_rule: HeaderRule,
    pub negation_cues: Vec<String>,
    /// Characters inspected before each match for a negation cue.
    pub negation_window_chars: usize,
    /// One term per line; the built-in lexicon is used when absent.
    pub lexicon_path: Option<PathBuf>,
    /// Minimum number of notes a term must appear in.
    pub min_term_frequency: usize,
    pub min_symptoms_per_note: usize,
    pub max_symptoms_per_note: usize,
    /// Number of 3-digit ICD9 categories used to select admissions.
    pub top_diseases: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            removed_sections: DEFAULT_REMOVED_SECTIONS.iter().map(|s| s.to_string()).collect(),
            header_rule: HeaderRule::Strict,
            negation_cues: DEFAULT_NEGATION_CUES.iter().map(|s| s.to_string()).collect(),
            negation_window_chars: NEGATION_WINDOW_CHARS,
            lexicon_path: None,
            min_term_frequency: 10,
            min_symptoms_per_note: 2,
            max_symptoms_per_note: 50,
            top_diseases: 50,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject contradictory settings before any note is processed.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_term_frequency == 0 {
            return Err(PipelineError::Config(
                "min_term_frequency must be at least 1".into(),
            ));
        }
        if self.max_symptoms_per_note == 0 {
            return Err(PipelineError::Config(
                "max_symptoms_per_note must be at least 1".into(),
            ));
        }
        if self.max_symptoms_per_note < self.min_symptoms_per_note {
            return Err(PipelineError::Config(format!(
                "max_symptoms_per_note ({}) is below min_symptoms_per_note ({})",
                self.max_symptoms_per_note, self.min_symptoms_per_note
            )));
        }
        if self.top_diseases == 0 {
            return Err(PipelineError::Config("top_diseases must be at least 1".into()));
        }
        Ok(())
    }

    pub fn lexicon(&self) -> Result<Lexicon, PipelineError> {
        match &self.lexicon_path {
            Some(path) => Lexicon::from_file(path),
            None => Ok(Lexicon::default()),
        }
    }

    pub fn section_filter(&self) -> SectionFilter {
        SectionFilter::new(&self.removed_sections, self.header_rule)
    }

    /// Compiles every pattern; fails at startup on a bad term or cue.
    pub fn symptom_extractor(&self) -> Result<SymptomExtractor, PipelineError> {
        let cues = NegationCues::new(&self.negation_cues)?;
        Ok(SymptomExtractor::new(&self.lexicon()?, cues)?.with_window(self.negation_window_chars))
    }

    pub fn vocabulary_builder(&self) -> VocabularyBuilder {
        VocabularyBuilder {
            min_term_frequency: self.min_term_frequency,
            min_terms_per_note: self.min_symptoms_per_note,
            max_terms_per_note: self.max_symptoms_per_note,
        }
    }
}
