//! Fragment reconciliation.
//!
//! Each poll exposes only a recent slice of the server's run table. The
//! reconciler projects the absolute newest fragment number from that slice,
//! appends it to the stream's window, backfills any fragments skipped since
//! the previous poll, and reports every fragment that has not been
//! dispatched yet. It never flips `pulled`; the poller does that when it
//! dispatches.

mod window;


pub use window::{FragmentDescriptor, StreamWindow, WINDOW_CAPACITY};

use crate::run_table::{FragmentRunEntry, RunTableError, RunTableSnapshot, Section};

/// What one reconciliation learned about the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Projected newest fragment number.
    pub current_fragment: i64,
    /// Segment number of the last segment run entry.
    pub segment: u32,
    pub total_fragments_in_segment: u32,
    /// Duration of the live (last) fragment run entry.
    pub duration_ms: u32,
    pub discontinuity: i32,
    /// Fragments in the window not yet dispatched, ascending.
    pub newly_discovered: Vec<FragmentDescriptor>,
}

/// Totals from the segment run table: summed fragment counts and the
/// segment number of the last entry.
fn segment_totals(snapshot: &RunTableSnapshot) -> Result<(u32, u32), RunTableError> {
    let last = snapshot
        .segments
        .last()
        .ok_or(RunTableError::EmptySection(Section::Segments))?;
    let total = snapshot
        .segments
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.fragments_per_segment));
    Ok((total, last.segment))
}

/// Project the newest fragment number.
///
/// With several fragment entries the distance between the first and the
/// live entry is discounted from the segment total; with a single entry the
/// live number simply offsets the total. Fails if the arithmetic leaves the
/// `i64` range.
pub fn project_current_fragment(
    total_fragments_in_segment: u32,
    first: &FragmentRunEntry,
    live: &FragmentRunEntry,
    fragment_entries: usize,
) -> Result<i64, RunTableError> {
    let total = i64::from(total_fragments_in_segment);
    let projected = if fragment_entries > 1 {
        live.fragment
            .checked_sub(first.fragment)
            .and_then(|spread| total.checked_sub(spread))
            .and_then(|base| base.checked_add(live.fragment))
    } else {
        total.checked_add(live.fragment)
    };
    projected.and_then(|n| n.checked_sub(1)).ok_or_else(|| {
        RunTableError::OutOfRange(format!(
            "total={} first={} live={}",
            total, first.fragment, live.fragment
        ))
    })
}

/// Every fragment of a complete (non-live) run table, undispatched, in table order.
///
/// Fragments carry the segment number of the last segment run entry, or 0
/// when the table has none.
pub fn list_fragments(snapshot: &RunTableSnapshot) -> Result<Vec<FragmentDescriptor>, RunTableError> {
    if snapshot.fragments.is_empty() {
        return Err(RunTableError::EmptySection(Section::Fragments));
    }
    let segment = snapshot.segments.last().map_or(0, |s| s.segment);
    Ok(snapshot
        .fragments
        .iter()
        .map(|f| FragmentDescriptor {
            segment,
            fragment: f.fragment,
            duration_ms: f.duration_ms,
            discontinuity: f.discontinuity_or_zero(),
            pulled: false,
        })
        .collect())
}

/// Fold one poll's run table into `window` and return what is left to dispatch.
///
/// Fails when a section is empty or the projection leaves the `i64` range;
/// the window is untouched in that case.
pub fn reconcile(
    snapshot: &RunTableSnapshot,
    window: &mut StreamWindow,
) -> Result<ReconcileOutcome, RunTableError> {
    let (total, segment) = segment_totals(snapshot)?;
    let (first, live) = match (snapshot.fragments.first(), snapshot.fragments.last()) {
        (Some(first), Some(live)) => (first, live),
        _ => return Err(RunTableError::EmptySection(Section::Fragments)),
    };
    let current = project_current_fragment(total, first, live, snapshot.fragments.len())?;
    let live_descriptor = |fragment: i64| FragmentDescriptor {
        segment,
        fragment,
        duration_ms: live.duration_ms,
        discontinuity: live.discontinuity_or_zero(),
        pulled: false,
    };

    match window.last().map(|d| d.fragment) {
        Some(last) if !window.is_fresh() => {
            if current.checked_sub(last) == Some(1) {
                window.push(live_descriptor(current));
            } else {
                // Anything below the top WINDOW_CAPACITY numbers would be trimmed by settle().
                let floor = current.saturating_sub(WINDOW_CAPACITY as i64 - 1);
                for fragment in last.saturating_add(1).max(floor)..=current {
                    if window.contains(fragment) {
                        continue;
                    }
                    let descriptor = match snapshot.fragment(fragment) {
                        Some(entry) => FragmentDescriptor {
                            segment,
                            fragment,
                            duration_ms: entry.duration_ms,
                            discontinuity: entry.discontinuity_or_zero(),
                            pulled: false,
                        },
                        None => live_descriptor(fragment),
                    };
                    window.push(descriptor);
                }
            }
        }
        _ => window.push(live_descriptor(current)),
    }

    window.settle();

    Ok(ReconcileOutcome {
        current_fragment: current,
        segment,
        total_fragments_in_segment: total,
        duration_ms: live.duration_ms,
        discontinuity: live.discontinuity_or_zero(),
        newly_discovered: window.unpulled(),
    })
}
