//! Bounded, sorted per-stream history of fragment descriptors.

/// Number of most recent fragments a stream keeps.
pub const WINDOW_CAPACITY: usize = 20;

/// One fragment known for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentDescriptor {
    pub segment: u32,
    pub fragment: i64,
    pub duration_ms: u32,
    pub discontinuity: i32,
    /// True once a load test has been dispatched for this fragment.
    pub pulled: bool,
}

impl FragmentDescriptor {
    /// Placeholder every window starts with; never dispatched.
    pub const SEED: FragmentDescriptor = FragmentDescriptor {
        segment: 0,
        fragment: 0,
        duration_ms: 0,
        discontinuity: 0,
        pulled: true,
    };
}

/// Sorted (ascending fragment number), duplicate-free, at most
/// [`WINDOW_CAPACITY`] entries once a reconciliation has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamWindow {
    entries: Vec<FragmentDescriptor>,
    fresh: bool,
}

impl Default for StreamWindow {
    fn default() -> Self {
        Self::seeded()
    }
}

impl StreamWindow {
    /// A window holding only the seed placeholder.
    pub fn seeded() -> Self {
        Self {
            entries: vec![FragmentDescriptor::SEED],
            fresh: true,
        }
    }

    /// True until the first successful reconciliation.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn entries(&self) -> &[FragmentDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&FragmentDescriptor> {
        self.entries.last()
    }

    pub fn contains(&self, fragment: i64) -> bool {
        self.entries.iter().any(|d| d.fragment == fragment)
    }

    /// Descriptors not yet dispatched, ascending.
    pub fn unpulled(&self) -> Vec<FragmentDescriptor> {
        self.entries.iter().filter(|d| !d.pulled).copied().collect()
    }

    /// Flip `pulled` for `fragment`. Returns false if it is unknown or already pulled.
    pub fn mark_pulled(&mut self, fragment: i64) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|d| d.fragment == fragment && !d.pulled)
        {
            Some(d) => {
                d.pulled = true;
                true
            }
            None => false,
        }
    }

    /// Append without ordering; callers must [`settle`](Self::settle) before
    /// the window is observed again.
    pub(crate) fn push(&mut self, descriptor: FragmentDescriptor) {
        self.entries.push(descriptor);
    }

    /// Restore the invariants: sort ascending and keep the most recent
    /// entries. Ends the fresh state.
    pub(crate) fn settle(&mut self) {
        self.entries.sort_by_key(|d| d.fragment);
        // Stable sort: on equal numbers the later push replaces the earlier
        // entry, so a real fragment 0 displaces the seed.
        self.entries.dedup_by(|later, kept| {
            if later.fragment == kept.fragment {
                *kept = *later;
                true
            } else {
                false
            }
        });
        self.fresh = false;
        if self.entries.len() > WINDOW_CAPACITY {
            let excess = self.entries.len() - WINDOW_CAPACITY;
            self.entries.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(fragment: i64) -> FragmentDescriptor {
        FragmentDescriptor {
            segment: 1,
            fragment,
            duration_ms: 4000,
            discontinuity: 0,
            pulled: false,
        }
    }

    #[test]
    fn seeded_window_is_fresh() {
        let w = StreamWindow::seeded();
        assert!(w.is_fresh());
        assert_eq!(w.len(), 1);
        assert!(w.unpulled().is_empty());
    }

    #[test]
    fn settle_sorts_and_trims_oldest() {
        let mut w = StreamWindow::seeded();
        for f in (1..=25).rev() {
            w.push(descriptor(f));
        }
        w.settle();
        assert_eq!(w.len(), WINDOW_CAPACITY);
        assert_eq!(w.entries()[0].fragment, 6);
        assert_eq!(w.last().unwrap().fragment, 25);
        assert!(!w.is_fresh());
    }

    #[test]
    fn real_fragment_zero_replaces_seed() {
        let mut w = StreamWindow::seeded();
        w.push(descriptor(0));
        w.settle();
        assert!(!w.is_fresh());
        assert_eq!(w.entries(), &[descriptor(0)]);
        assert_eq!(w.unpulled(), vec![descriptor(0)]);
    }

    #[test]
    fn mark_pulled_flips_once() {
        let mut w = StreamWindow::seeded();
        w.push(descriptor(7));
        w.settle();
        assert!(w.mark_pulled(7));
        assert!(!w.mark_pulled(7));
        assert!(!w.mark_pulled(8));
        assert!(w.unpulled().is_empty());
    }
}
