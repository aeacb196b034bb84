//! Discharge-note selection from the note events table.

use std::collections::HashSet;

use super::tables::NoteEvent;
use crate::pipeline::RawNote;

pub const DISCHARGE_CATEGORY: &str = "Discharge summary";

/// Keep discharge summaries with text, one per admission.
///
/// When an admission has several summaries the last one in table order wins;
/// surviving rows keep their relative order. Rows without an admission id
/// are treated as one group.
pub fn filter_discharges(events: Vec<NoteEvent>) -> Vec<NoteEvent> {
    let total = events.len();
    let candidates: Vec<NoteEvent> = events
        .into_iter()
        .filter(|e| e.category.as_deref() == Some(DISCHARGE_CATEGORY))
        .filter(|e| e.text.as_deref().is_some_and(|t| !t.is_empty()))
        .collect();
    let with_text = candidates.len();

    let mut seen: HashSet<Option<u64>> = HashSet::new();
    let mut kept: Vec<NoteEvent> = candidates
        .into_iter()
        .rev()
        .filter(|e| seen.insert(e.hadm_id))
        .collect();
    kept.reverse();

    tracing::info!(
        total,
        discharge_with_text = with_text,
        kept = kept.len(),
        duplicates = with_text - kept.len(),
        "Filtered discharge summaries"
    );
    kept
}

/// Pipeline input: one note per admission, keyed by admission id.
pub fn to_raw_notes(events: &[NoteEvent]) -> Vec<RawNote> {
    events
        .iter()
        .map(|e| RawNote {
            id: note_id(e),
            text: e.text.clone(),
        })
        .collect()
}

fn note_id(event: &NoteEvent) -> String {
    match (event.hadm_id, event.row_id) {
        (Some(hadm), _) => hadm.to_string(),
        (None, Some(row)) => format!("row-{row}"),
        (None, None) => "unknown".to_string(),
    }
}
