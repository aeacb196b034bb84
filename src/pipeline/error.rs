//! Error types for the narrative-processing pipeline.
//!
//! Startup failures (bad patterns, contradictory config) are fatal.
//! `MalformedRecord` is the only per-note kind: the runner catches it at the
//! note boundary, records it and moves on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Malformed record {note_id}: {reason}")]
    MalformedRecord { note_id: String, reason: String },

    #[error("Pattern for '{term}' failed to compile: {source}")]
    PatternCompile {
        term: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for errors that only affect a single note.
    pub fn is_per_note(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
