//! Command-line interface.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::corpus::{self, CorpusError};
use crate::pipeline::sections::{list_section_headers, HeaderRule};
use crate::pipeline::{BatchRunner, PipelineError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "notesift", version)]
#[command(about = "Prepare discharge narratives for symptom-based modeling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline over a gz CSV export and write the outputs
    Run {
        /// Directory holding ADMISSIONS, NOTEEVENTS, DIAGNOSES_ICD and D_ICD_DIAGNOSES (.csv.gz)
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Lexicon file, one term per line
        #[arg(long)]
        lexicon: Option<PathBuf>,
        #[arg(long)]
        top_diseases: Option<usize>,
        #[arg(long)]
        min_term_frequency: Option<usize>,
        #[arg(long)]
        min_symptoms: Option<usize>,
        #[arg(long)]
        max_symptoms: Option<usize>,
    },
    /// List the section headers of a note file
    Sections {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = HeaderRule::Listing)]
        rule: HeaderRule,
    },
    /// Print the symptom mentions of a note file as JSON
    Extract {
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        lexicon: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, PipelineError> {
    match path {
        Some(path) => PipelineConfig::from_file(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn read_note(path: &Path) -> Result<String, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run {
            data_dir,
            out,
            config,
            lexicon,
            top_diseases,
            min_term_frequency,
            min_symptoms,
            max_symptoms,
        } => {
            let mut config = load_config(config.as_deref())?;
            if lexicon.is_some() {
                config.lexicon_path = lexicon;
            }
            if let Some(n) = top_diseases {
                config.top_diseases = n;
            }
            if let Some(n) = min_term_frequency {
                config.min_term_frequency = n;
            }
            if let Some(n) = min_symptoms {
                config.min_symptoms_per_note = n;
            }
            if let Some(n) = max_symptoms {
                config.max_symptoms_per_note = n;
            }

            // Patterns and thresholds are checked before any table is read.
            let runner = BatchRunner::from_config(&config)?;
            let prepared = corpus::prepare_corpus(&data_dir, config.top_diseases)?;
            let output = runner.run(&prepared.notes);
            corpus::write_outputs(&out, &output, Some(&prepared.diseases))?;

            println!(
                "{} notes in, {} segmented, {} malformed, {} removed by vocabulary filter, {} retained, {} terms",
                output.report.notes_in,
                output.report.notes_segmented,
                output.report.notes_malformed,
                output.report.vocabulary.notes_dropped,
                output.report.vocabulary.notes_retained,
                output.report.vocabulary.vocabulary_size,
            );
        }
        Commands::Sections { file, rule } => {
            let text = read_note(&file)?;
            for header in list_section_headers(&text, rule) {
                println!("{header}");
            }
        }
        Commands::Extract {
            file,
            config,
            lexicon,
        } => {
            let mut config = load_config(config.as_deref())?;
            if lexicon.is_some() {
                config.lexicon_path = lexicon;
            }
            let text = read_note(&file)?;
            let filtered = config.section_filter().apply(&text);
            let mentions = config.symptom_extractor()?.extract(&filtered);
            println!("{}", serde_json::to_string_pretty(&mentions)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "notesift",
            "run",
            "--data-dir",
            "mimic",
            "--min-term-frequency",
            "3",
            "--max-symptoms",
            "20",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                data_dir,
                min_term_frequency,
                max_symptoms,
                min_symptoms,
                ..
            } => {
                assert_eq!(data_dir, PathBuf::from("mimic"));
                assert_eq!(min_term_frequency, Some(3));
                assert_eq!(max_symptoms, Some(20));
                assert_eq!(min_symptoms, None);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn sections_defaults_to_listing_rule() {
        let cli = Cli::try_parse_from(["notesift", "sections", "note.txt"]).unwrap();
        match cli.command {
            Commands::Sections { rule, .. } => {
                assert_eq!(rule, HeaderRule::Listing)
            }
            _ => panic!("expected sections"),
        }
    }

    #[test]
    fn extract_missing_file_is_error() {
        let cli = Cli::try_parse_from(["notesift", "extract", "/nonexistent/note.txt"]).unwrap();
        let err = execute(cli).unwrap_err();
        assert!(matches!(err, CliError::Pipeline(PipelineError::MissingInput(_))));
    }

    #[test]
    fn run_with_missing_data_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "notesift",
            "run",
            "--data-dir",
            "/nonexistent/data",
            "--out",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        let err = execute(cli).unwrap_err();
        assert!(matches!(err, CliError::Corpus(CorpusError::MissingInput(_))));
    }
}
