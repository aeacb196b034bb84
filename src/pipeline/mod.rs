//! Discharge-narrative pipeline
//!
//! ```text
//! raw note → Segmenter → Filter → Extractor → affirmed terms ─┐
//!                                                              ├→ Vocabulary Builder
//! raw note → Segmenter → Filter → Extractor → affirmed terms ─┘
//! ```
//!
//! The per-note stages share only read-only lexicon and cue data.

pub mod error;
pub mod types;
pub mod lexicon;
pub mod sections;
pub mod symptoms;
pub mod vocabulary;
pub mod runner;

pub use error::PipelineError;
pub use types::*;
pub use lexicon::{Lexicon, NegationCues};
pub use sections::{HeaderRule, SectionFilter};
pub use symptoms::SymptomExtractor;
pub use vocabulary::{CorpusVocabulary, VocabularyBuilder};
pub use runner::{process_note, BatchOutput, BatchRunner, PipelineReport};
