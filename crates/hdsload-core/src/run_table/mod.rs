//! Run table parsing.
//!
//! Turns the text printed by the bootstrap inspector into typed segment and
//! fragment run entries. The inspector prints `key:value` lines; the run
//! table records sit five lines below the `segments` and `fragments`
//! headers and are comma-separated `field=value` lists.

mod record;
mod sections;

use std::fmt;

use thiserror::Error;

pub use record::{FragmentRunEntry, SegmentRunEntry};
pub use sections::{split_sections, RawSections};

/// Which half of the run table a record or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Segments,
    Fragments,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Segments => write!(f, "segment"),
            Section::Fragments => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunTableError {
    /// The section header was missing or the section held no records.
    #[error("run table has no {0} entries")]
    EmptySection(Section),
    #[error("malformed {section} record `{record}`: {reason}")]
    MalformedRecord {
        section: Section,
        record: String,
        reason: String,
    },
    /// Fragment numbers too far apart to project the live fragment.
    #[error("fragment numbers out of range: {0}")]
    OutOfRange(String),
}

/// Parse result of one poll. Consumed by the reconciler and discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTableSnapshot {
    pub segments: Vec<SegmentRunEntry>,
    pub fragments: Vec<FragmentRunEntry>,
}

impl RunTableSnapshot {
    /// Parse inspector output. A missing header yields an empty section;
    /// a record that does not parse is an error.
    pub fn parse(text: &str) -> Result<Self, RunTableError> {
        let raw = split_sections(text);
        let segments = raw
            .segments
            .iter()
            .map(|line| SegmentRunEntry::parse(line))
            .collect::<Result<Vec<_>, _>>()?;
        let fragments = raw
            .fragments
            .iter()
            .map(|line| FragmentRunEntry::parse(line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            segments,
            fragments,
        })
    }

    /// Look up a fragment run entry by fragment number.
    pub fn fragment(&self, number: i64) -> Option<&FragmentRunEntry> {
        self.fragments.iter().find(|f| f.fragment == number)
    }
}
