//! Persists run outputs as JSON and JSON Lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::diagnoses::DiseaseSelection;
use super::error::CorpusError;
use crate::pipeline::BatchOutput;

pub const FILTERED_NOTES_FILE: &str = "filtered_notes.jsonl";
pub const SYMPTOM_RECORDS_FILE: &str = "symptom_records.jsonl";
pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const FAILURES_FILE: &str = "failures.jsonl";
pub const DISEASES_FILE: &str = "diseases.json";
pub const REPORT_FILE: &str = "report.json";

fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), CorpusError> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CorpusError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Write every output of a run into `out_dir`, creating it if needed.
/// Returns the paths written.
pub fn write_outputs(
    out_dir: &Path,
    output: &BatchOutput,
    diseases: Option<&DiseaseSelection>,
) -> Result<Vec<PathBuf>, CorpusError> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let path = out_dir.join(FILTERED_NOTES_FILE);
    write_jsonl(&path, &output.filtered_notes)?;
    written.push(path);

    let path = out_dir.join(SYMPTOM_RECORDS_FILE);
    write_jsonl(&path, &output.corpus.records)?;
    written.push(path);

    let path = out_dir.join(VOCABULARY_FILE);
    write_json(&path, &output.corpus.vocabulary)?;
    written.push(path);

    let path = out_dir.join(FAILURES_FILE);
    write_jsonl(&path, &output.failures)?;
    written.push(path);

    if let Some(selection) = diseases {
        let path = out_dir.join(DISEASES_FILE);
        write_json(&path, selection)?;
        written.push(path);
    }

    let path = out_dir.join(REPORT_FILE);
    write_json(&path, &output.report)?;
    written.push(path);

    tracing::info!(dir = %out_dir.display(), files = written.len(), "Wrote outputs");
    Ok(written)
}
