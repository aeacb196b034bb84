//! Gzip-compressed CSV source tables.
//!
//! Each table lives in the data directory as `<TABLE>.csv.gz`. Columns not
//! named here are ignored; empty cells become `None`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::CorpusError;

pub const ADMISSIONS: &str = "ADMISSIONS";
pub const NOTEEVENTS: &str = "NOTEEVENTS";
pub const DIAGNOSES_ICD: &str = "DIAGNOSES_ICD";
pub const D_ICD_DIAGNOSES: &str = "D_ICD_DIAGNOSES";

/// Tables required for a run, in load order.
pub const REQUIRED_TABLES: &[&str] = &[ADMISSIONS, NOTEEVENTS, DIAGNOSES_ICD, D_ICD_DIAGNOSES];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Admission {
    #[serde(rename = "HADM_ID")]
    pub hadm_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoteEvent {
    #[serde(rename = "ROW_ID", default)]
    pub row_id: Option<u64>,
    #[serde(rename = "HADM_ID")]
    pub hadm_id: Option<u64>,
    #[serde(rename = "CATEGORY")]
    pub category: Option<String>,
    #[serde(rename = "TEXT")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Diagnosis {
    #[serde(rename = "HADM_ID")]
    pub hadm_id: Option<u64>,
    #[serde(rename = "ICD9_CODE")]
    pub icd9_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IcdDefinition {
    #[serde(rename = "ICD9_CODE")]
    pub icd9_code: String,
    #[serde(rename = "SHORT_TITLE", default)]
    pub short_title: Option<String>,
}

/// All source tables of a run.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub admissions: Vec<Admission>,
    pub note_events: Vec<NoteEvent>,
    pub diagnoses: Vec<Diagnosis>,
    pub icd_definitions: Vec<IcdDefinition>,
}

pub fn table_path(data_dir: &Path, table: &str) -> PathBuf {
    data_dir.join(format!("{table}.csv.gz"))
}

/// Read every row of a gzip-compressed CSV table.
pub fn read_table<T: DeserializeOwned>(data_dir: &Path, table: &str) -> Result<Vec<T>, CorpusError> {
    let path = table_path(data_dir, table);
    if !path.exists() {
        return Err(CorpusError::MissingInput(path));
    }

    let file = File::open(&path)?;
    let mut reader = csv::Reader::from_reader(GzDecoder::new(BufReader::new(file)));
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| CorpusError::Csv {
            table: table.to_string(),
            source,
        })?;

    tracing::info!(table, rows = rows.len(), "Loaded table");
    Ok(rows)
}

/// Load all required tables. The first missing table aborts the load.
pub fn load_tables(data_dir: &Path) -> Result<SourceTables, CorpusError> {
    for table in REQUIRED_TABLES {
        let path = table_path(data_dir, table);
        if !path.exists() {
            return Err(CorpusError::MissingInput(path));
        }
    }

    Ok(SourceTables {
        admissions: read_table(data_dir, ADMISSIONS)?,
        note_events: read_table(data_dir, NOTEEVENTS)?,
        diagnoses: read_table(data_dir, DIAGNOSES_ICD)?,
        icd_definitions: read_table(data_dir, D_ICD_DIAGNOSES)?,
    })
}
