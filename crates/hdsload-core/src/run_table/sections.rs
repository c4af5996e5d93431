//! Locate the segment and fragment sections in inspector output.

/// Records start this many lines below their section header.
const RECORD_OFFSET: usize = 5;

/// Raw record lines of both sections, trimmed, blank lines dropped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RawSections<'a> {
    pub segments: Vec<&'a str>,
    pub fragments: Vec<&'a str>,
}

/// Text before the first `:` of a line.
fn line_key(line: &str) -> &str {
    line.split(':').next().unwrap_or("").trim()
}

fn section<'a>(lines: &[&'a str], start: usize, end: usize) -> Vec<&'a str> {
    if start >= end {
        return Vec::new();
    }
    lines[start..end]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Split inspector output into its two record sections.
///
/// `segments` runs from five lines after its header to the line before the
/// `fragments` header; `fragments` runs from five lines after its header to
/// the end. Without a `fragments` header both sections are empty.
pub fn split_sections(text: &str) -> RawSections<'_> {
    let lines: Vec<&str> = text.lines().collect();
    let segment_header = lines.iter().position(|l| line_key(l) == "segments");
    let fragment_header = lines.iter().position(|l| line_key(l) == "fragments");

    let segments = match (segment_header, fragment_header) {
        (Some(s), Some(f)) => section(&lines, s + RECORD_OFFSET, f),
        _ => Vec::new(),
    };
    let fragments = match fragment_header {
        Some(f) => section(&lines, f + RECORD_OFFSET, lines.len()),
        None => Vec::new(),
    };
    RawSections {
        segments,
        fragments,
    }
}
