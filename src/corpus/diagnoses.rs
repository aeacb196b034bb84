//! ICD9 category truncation and top-N disease selection.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::tables::{Diagnosis, NoteEvent};

/// A diagnosis row reduced to its 3-character ICD9 category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedDiagnosis {
    pub hadm_id: Option<u64>,
    pub category: String,
}

/// First three characters of each code; rows with no code are dropped.
pub fn truncate_icd9_codes(diagnoses: &[Diagnosis]) -> Vec<CodedDiagnosis> {
    let coded: Vec<CodedDiagnosis> = diagnoses
        .iter()
        .filter_map(|d| {
            let category: String = d.icd9_code.as_deref().unwrap_or("").chars().take(3).collect();
            (!category.is_empty()).then_some(CodedDiagnosis {
                hadm_id: d.hadm_id,
                category,
            })
        })
        .collect();

    let distinct: HashSet<&str> = coded.iter().map(|d| d.category.as_str()).collect();
    tracing::info!(
        rows = coded.len(),
        categories = distinct.len(),
        "Truncated ICD9 codes to 3-character categories"
    );
    coded
}

/// Most frequent disease categories and how many admissions they cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseSelection {
    /// Most frequent first; ties keep first-seen order.
    pub top_diseases: Vec<String>,
    pub disease_to_index: BTreeMap<String, usize>,
    /// Share of admissions with at least one top disease.
    pub coverage: f64,
}

pub fn select_top_diseases(diagnoses: &[CodedDiagnosis], top_n: usize) -> DiseaseSelection {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for d in diagnoses {
        let idx = *position.entry(d.category.as_str()).or_insert_with(|| {
            order.push((d.category.as_str(), 0));
            order.len() - 1
        });
        order[idx].1 += 1;
    }
    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let top_diseases: Vec<String> = order
        .iter()
        .take(top_n)
        .map(|(category, _)| category.to_string())
        .collect();
    let disease_to_index = top_diseases
        .iter()
        .enumerate()
        .map(|(idx, category)| (category.clone(), idx))
        .collect();

    let top: HashSet<&str> = top_diseases.iter().map(String::as_str).collect();
    let all_admissions: HashSet<u64> = diagnoses.iter().filter_map(|d| d.hadm_id).collect();
    let covered: HashSet<u64> = diagnoses
        .iter()
        .filter(|d| top.contains(d.category.as_str()))
        .filter_map(|d| d.hadm_id)
        .collect();
    let coverage = if all_admissions.is_empty() {
        0.0
    } else {
        covered.len() as f64 / all_admissions.len() as f64
    };

    tracing::info!(
        top_n,
        selected = top_diseases.len(),
        coverage_pct = coverage * 100.0,
        "Selected top diseases"
    );

    DiseaseSelection {
        top_diseases,
        disease_to_index,
        coverage,
    }
}

/// Diagnoses in the selected categories and the notes of those admissions.
pub fn filter_top_diseases(
    diagnoses: &[CodedDiagnosis],
    notes: Vec<NoteEvent>,
    selection: &DiseaseSelection,
) -> (Vec<CodedDiagnosis>, Vec<NoteEvent>) {
    let filtered: Vec<CodedDiagnosis> = diagnoses
        .iter()
        .filter(|d| selection.disease_to_index.contains_key(&d.category))
        .cloned()
        .collect();

    let admissions: HashSet<u64> = filtered.iter().filter_map(|d| d.hadm_id).collect();
    let notes: Vec<NoteEvent> = notes
        .into_iter()
        .filter(|n| n.hadm_id.is_some_and(|id| admissions.contains(&id)))
        .collect();

    tracing::info!(
        admissions = admissions.len(),
        notes = notes.len(),
        "Restricted notes to top-disease admissions"
    );
    (filtered, notes)
}
