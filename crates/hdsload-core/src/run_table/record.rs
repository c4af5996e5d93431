//! Typed run table records.

use std::str::FromStr;

use super::{RunTableError, Section};

/// One segment run table record: `segment=<n>,fragments=<count>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRunEntry {
    pub segment: u32,
    pub fragments_per_segment: u32,
}

/// One fragment run table record:
/// `fragment=<n>,timestamp=<t>,duration=<ms>[,discontinuity=<d>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRunEntry {
    pub fragment: i64,
    pub timestamp: u64,
    pub duration_ms: u32,
    /// Present only when the server flagged the entry.
    pub discontinuity: Option<i32>,
}

impl FragmentRunEntry {
    /// Discontinuity indicator, 0 when absent.
    pub fn discontinuity_or_zero(&self) -> i32 {
        self.discontinuity.unwrap_or(0)
    }
}

impl SegmentRunEntry {
    pub(crate) fn parse(record: &str) -> Result<Self, RunTableError> {
        let values = field_values(Section::Segments, record, 2)?;
        Ok(Self {
            segment: number(Section::Segments, record, values[0])?,
            fragments_per_segment: number(Section::Segments, record, values[1])?,
        })
    }
}

impl FragmentRunEntry {
    pub(crate) fn parse(record: &str) -> Result<Self, RunTableError> {
        let values = field_values(Section::Fragments, record, 3)?;
        let discontinuity = match values.get(3) {
            Some(v) => Some(number(Section::Fragments, record, v)?),
            None => None,
        };
        Ok(Self {
            fragment: number(Section::Fragments, record, values[0])?,
            timestamp: number(Section::Fragments, record, values[1])?,
            duration_ms: number(Section::Fragments, record, values[2])?,
            discontinuity,
        })
    }
}

fn malformed(section: Section, record: &str, reason: impl Into<String>) -> RunTableError {
    RunTableError::MalformedRecord {
        section,
        record: record.to_string(),
        reason: reason.into(),
    }
}

/// Values of a comma-separated `field=value` list, read positionally.
fn field_values<'a>(
    section: Section,
    record: &'a str,
    min_fields: usize,
) -> Result<Vec<&'a str>, RunTableError> {
    let values = record
        .split(',')
        .map(|field| {
            field
                .split_once('=')
                .map(|(_, value)| value.trim())
                .ok_or_else(|| malformed(section, record, format!("field `{}` has no value", field.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() < min_fields {
        return Err(malformed(
            section,
            record,
            format!("expected at least {} fields, got {}", min_fields, values.len()),
        ));
    }
    Ok(values)
}

fn number<T: FromStr>(section: Section, record: &str, value: &str) -> Result<T, RunTableError> {
    value
        .parse::<T>()
        .map_err(|_| malformed(section, record, format!("`{}` is not a number", value)))
}
