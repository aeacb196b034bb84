//! Structural segmentation of discharge notes and removal of named sections.

pub mod filter;
pub mod segment;

pub use filter::{SectionFilter, DEFAULT_REMOVED_SECTIONS};
pub use segment::{asymmetric_headers, header_name, list_section_headers, segment, HeaderRule};
