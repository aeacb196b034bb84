//! Source tables and run outputs around the narrative pipeline.
//!
//! Loads the gz CSV export, selects one discharge summary per admission,
//! restricts admissions to the most frequent disease categories and writes
//! the pipeline's results to disk.

pub mod error;
pub mod tables;
pub mod discharge;
pub mod diagnoses;
pub mod writer;

pub use error::CorpusError;
pub use tables::{load_tables, SourceTables};
pub use discharge::{filter_discharges, to_raw_notes};
pub use diagnoses::{filter_top_diseases, select_top_diseases, truncate_icd9_codes, DiseaseSelection};
pub use writer::write_outputs;

use std::path::Path;

use crate::pipeline::RawNote;
use tables::IcdDefinition;

/// Notes selected for a run, with the disease selection that chose them.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    pub notes: Vec<RawNote>,
    pub diseases: DiseaseSelection,
}

/// Code and short title describing an ICD9 category: the category's own
/// definition when present, otherwise the first subcode's.
fn category_title<'a>(definitions: &'a [IcdDefinition], category: &str) -> Option<(&'a str, &'a str)> {
    definitions
        .iter()
        .find(|d| d.icd9_code == category)
        .or_else(|| definitions.iter().find(|d| d.icd9_code.starts_with(category)))
        .and_then(|d| Some((d.icd9_code.as_str(), d.short_title.as_deref()?)))
}

/// Load the tables and select discharge notes of top-disease admissions.
pub fn prepare_corpus(data_dir: &Path, top_diseases: usize) -> Result<PreparedCorpus, CorpusError> {
    let tables = load_tables(data_dir)?;
    tracing::info!(
        admissions = tables.admissions.len(),
        note_events = tables.note_events.len(),
        diagnoses = tables.diagnoses.len(),
        icd_definitions = tables.icd_definitions.len(),
        "Dataset summary"
    );

    let discharges = filter_discharges(tables.note_events);
    let coded = truncate_icd9_codes(&tables.diagnoses);
    let diseases = select_top_diseases(&coded, top_diseases);

    for (rank, category) in diseases.top_diseases.iter().take(10).enumerate() {
        let (title_code, title) = category_title(&tables.icd_definitions, category).unwrap_or(("", ""));
        tracing::info!(rank = rank + 1, category = %category, title_code, title, "Top disease");
    }

    let (_, notes) = filter_top_diseases(&coded, discharges, &diseases);
    Ok(PreparedCorpus {
        notes: to_raw_notes(&notes),
        diseases,
    })
}

#[cfg(test)]
mod tests {
    use super::tables::test_support::write_minimal_tables;
    use super::*;

    #[test]
    fn prepares_notes_from_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_tables(dir.path());

        let corpus = prepare_corpus(dir.path(), 50).unwrap();
        assert_eq!(corpus.diseases.top_diseases, vec!["428"]);
        assert_eq!(corpus.notes, vec![RawNote::new("100", "Chief Complaint:\nfever and cough\n")]);
    }

    fn make_definition(code: &str, title: &str) -> IcdDefinition {
        IcdDefinition {
            icd9_code: code.to_string(),
            short_title: Some(title.to_string()),
        }
    }

    #[test]
    fn category_title_prefers_exact_code() {
        let defs = vec![
            make_definition("4280", "CHF NOS"),
            make_definition("428", "Heart failure"),
        ];
        assert_eq!(category_title(&defs, "428"), Some(("428", "Heart failure")));
    }

    #[test]
    fn category_title_falls_back_to_subcode() {
        let defs = vec![make_definition("4019", "Hypertension NOS"), make_definition("4280", "CHF NOS")];
        assert_eq!(category_title(&defs, "428"), Some(("4280", "CHF NOS")));
        assert_eq!(category_title(&defs, "250"), None);
    }

    #[test]
    fn missing_directory_is_missing_input() {
        let err = prepare_corpus(Path::new("/nonexistent/data"), 50).unwrap_err();
        assert!(matches!(err, CorpusError::MissingInput(_)));
    }
}
