//! Section segmenter: splits a note into header-delimited blocks.
//!
//! Walks the note line by line with a two-state scanner (preamble / inside a
//! section) and emits each block as soon as the next header opens. No
//! characters are added or dropped: joining every block's header line and
//! content gives back the input.

use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::types::SectionBlock;

/// A header line with its newline stripped: optional leading whitespace, an
/// uppercase initial, letters/spaces/slashes/ampersands/hyphens, a colon and
/// optional trailing whitespace.
static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z][A-Za-z /&-]+):\s*$").expect("Invalid header regex pattern")
});

/// Which lines count as headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HeaderRule {
    /// Also accepts a header on the last line when no newline follows it.
    Listing,
    /// Requires a newline after the header line.
    #[default]
    Strict,
}

impl HeaderRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Strict => "strict",
        }
    }
}

impl std::fmt::Display for HeaderRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Header name of a line (newline already stripped), trimmed and without the
/// colon.
pub fn header_name(line: &str) -> Option<String> {
    HEADER_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

enum ScanState {
    Preamble {
        content: String,
    },
    Section {
        header: String,
        header_line: String,
        content: String,
    },
}

impl ScanState {
    fn push_str(&mut self, line: &str) {
        match self {
            Self::Preamble { content } | Self::Section { content, .. } => content.push_str(line),
        }
    }

    fn into_block(self, order: usize) -> SectionBlock {
        match self {
            Self::Preamble { content } => SectionBlock {
                header: None,
                header_line: String::new(),
                content,
                order,
            },
            Self::Section {
                header,
                header_line,
                content,
            } => SectionBlock {
                header: Some(header),
                header_line,
                content,
                order,
            },
        }
    }
}

/// Split `text` into ordered blocks. The preamble block (order 0) is always
/// present, possibly empty.
pub fn segment(text: &str, rule: HeaderRule) -> Vec<SectionBlock> {
    let mut blocks = Vec::new();
    let mut state = ScanState::Preamble {
        content: String::new(),
    };

    for line in text.split_inclusive('\n') {
        let terminated = line.ends_with('\n');
        let bare = line.strip_suffix('\n').unwrap_or(line);

        let opened = match header_name(bare) {
            Some(name) if terminated || rule == HeaderRule::Listing => Some(name),
            _ => None,
        };

        match opened {
            Some(header) => {
                let finished = std::mem::replace(
                    &mut state,
                    ScanState::Section {
                        header,
                        header_line: line.to_string(),
                        content: String::new(),
                    },
                );
                let order = blocks.len();
                blocks.push(finished.into_block(order));
            }
            None => state.push_str(line),
        }
    }

    let order = blocks.len();
    blocks.push(state.into_block(order));
    blocks
}

/// Header names of a note, in order.
pub fn list_section_headers(text: &str, rule: HeaderRule) -> Vec<String> {
    segment(text, rule)
        .into_iter()
        .filter_map(|b| b.header)
        .collect()
}

/// Headers recognised by the listing rule but not by the strict rule.
/// A non-empty result means the two rules segment this note differently.
pub fn asymmetric_headers(text: &str) -> Vec<String> {
    let mut strict = list_section_headers(text, HeaderRule::Strict);
    let mut only_listing = Vec::new();

    for header in list_section_headers(text, HeaderRule::Listing) {
        match strict.iter().position(|h| *h == header) {
            Some(pos) => {
                strict.remove(pos);
            }
            None => only_listing.push(header),
        }
    }
    only_listing
}
