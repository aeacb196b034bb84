//! Section filter: drops blocks whose header is in the removal set.

use std::collections::BTreeSet;

use super::segment::{segment, HeaderRule};
use crate::pipeline::types::{FilteredNote, SectionBlock};

/// Administrative and social-history sections of a discharge summary.
pub const DEFAULT_REMOVED_SECTIONS: &[&str] = &[
    "Admission Date",
    "Attending",
    "Completed by",
    "Date of Birth",
    "Dictated By",
    "Discharge Date",
    "Discharge Disposition",
    "Facility",
    "Family History",
    "Followup Instructions",
    "Provider",
    "Service",
    "Social History",
];

/// Removes configured sections from note text.
///
/// Header names are compared exactly (case-sensitive) after trimming.
#[derive(Debug, Clone)]
pub struct SectionFilter {
    removed: BTreeSet<String>,
    rule: HeaderRule,
}

impl SectionFilter {
    pub fn new<I, S>(removed: I, rule: HeaderRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            removed: removed
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rule,
        }
    }

    pub fn rule(&self) -> HeaderRule {
        self.rule
    }

    pub fn removes(&self, header: &str) -> bool {
        self.removed.contains(header)
    }

    /// Concatenate the preamble and every retained block, verbatim and in
    /// order. Returns the text and the number of blocks removed.
    pub fn apply_blocks(&self, blocks: &[SectionBlock]) -> (String, usize) {
        let mut text = String::new();
        let mut removed = 0;

        for block in blocks {
            match &block.header {
                Some(header) if self.removes(header) => removed += 1,
                _ => {
                    text.push_str(&block.header_line);
                    text.push_str(&block.content);
                }
            }
        }
        (text, removed)
    }

    pub fn apply(&self, text: &str) -> String {
        self.apply_blocks(&segment(text, self.rule)).0
    }

    pub fn filter_note(&self, id: &str, text: &str) -> FilteredNote {
        FilteredNote {
            id: id.to_string(),
            text: self.apply(text),
        }
    }
}

impl Default for SectionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_REMOVED_SECTIONS, HeaderRule::default())
    }
}
