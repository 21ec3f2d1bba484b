//! # Interval Index
//!
//! Answers "which molecules elute at time `t`" for half-open windows
//! `[start, end)`.
//!
//! Two query paths are provided:
//!
//! - [`IntervalIndex::at`]: arbitrary point queries on a static centred
//!   interval tree, `O(log n + k)`.
//! - [`ElutionSweep`]: a cursor for monotonically increasing query times, as
//!   issued by the scan generator. Each interval enters and leaves the active
//!   set exactly once, so a whole run costs `O(n log n)`.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

/// One indexed elution window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEntry {
    /// Inclusive start
    pub start: f64,
    /// Exclusive end
    pub end: f64,
    /// Caller-defined key (molecule position)
    pub key: usize,
}

impl IntervalEntry {
    /// Whether `t` lies in `[start, end)`
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug)]
struct Node {
    center: f64,
    /// Entries overlapping `center`, ascending by start
    by_start: Vec<IntervalEntry>,
    /// Same entries, descending by end
    by_end: Vec<IntervalEntry>,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn build(mut entries: Vec<IntervalEntry>) -> Option<Box<Node>> {
        if entries.is_empty() {
            return None;
        }
        entries.sort_by(|a, b| a.start.total_cmp(&b.start));
        let center = entries[entries.len() / 2].start;

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut here = Vec::new();
        for entry in entries {
            if entry.end <= center {
                left.push(entry);
            } else if entry.start > center {
                right.push(entry);
            } else {
                here.push(entry);
            }
        }

        let by_start = here.clone();
        let mut by_end = here;
        by_end.sort_by(|a, b| b.end.total_cmp(&a.end));

        Some(Box::new(Node {
            center,
            by_start,
            by_end,
            left: Node::build(left),
            right: Node::build(right),
        }))
    }

    fn query(&self, t: f64, out: &mut Vec<usize>) {
        if t < self.center {
            for entry in self.by_start.iter().take_while(|e| e.start <= t) {
                out.push(entry.key);
            }
            if let Some(left) = &self.left {
                left.query(t, out);
            }
        } else {
            for entry in self.by_end.iter().take_while(|e| e.end > t) {
                out.push(entry.key);
            }
            if let Some(right) = &self.right {
                right.query(t, out);
            }
        }
    }
}

/// Static index over elution windows
#[derive(Debug)]
pub struct IntervalIndex {
    root: Option<Box<Node>>,
    /// All entries ascending by start, used by sweeps
    entries: Vec<IntervalEntry>,
}

impl IntervalIndex {
    /// Build from `(key, start, width)` triples. Empty windows are dropped.
    pub fn from_windows<I>(windows: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64, f64)>,
    {
        let mut entries: Vec<IntervalEntry> = windows
            .into_iter()
            .map(|(key, start, width)| IntervalEntry {
                start,
                end: start + width,
                key,
            })
            .filter(|e| e.end > e.start)
            .collect();
        entries.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.key.cmp(&b.key)));
        let root = Node::build(entries.clone());
        Self { root, entries }
    }

    /// Number of indexed (non-empty) windows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no window is indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose window contains `t`, ascending
    pub fn at(&self, t: f64) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.query(t, &mut out);
        }
        out.sort_unstable();
        out
    }

    /// Cursor for non-decreasing query times
    pub fn sweep(&self) -> ElutionSweep<'_> {
        ElutionSweep {
            entries: &self.entries,
            next: 0,
            ends: BinaryHeap::new(),
            active: BTreeSet::new(),
            last_t: f64::NEG_INFINITY,
        }
    }
}

/// Ordering wrapper so `f64` ends can live in a heap
#[derive(Debug, Clone, Copy, PartialEq)]
struct EndTime(f64);

impl Eq for EndTime {}

impl PartialOrd for EndTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EndTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Active-set cursor over an [`IntervalIndex`]
#[derive(Debug)]
pub struct ElutionSweep<'a> {
    entries: &'a [IntervalEntry],
    next: usize,
    ends: BinaryHeap<Reverse<(EndTime, usize)>>,
    active: BTreeSet<usize>,
    last_t: f64,
}

impl ElutionSweep<'_> {
    /// Advance to `t` and return the active keys, ascending.
    ///
    /// Query times must not decrease; an earlier `t` falls back to a
    /// full rebuild of the active set.
    pub fn advance(&mut self, t: f64) -> Vec<usize> {
        if t < self.last_t {
            self.next = 0;
            self.ends.clear();
            self.active.clear();
        }
        self.last_t = t;

        while let Some(entry) = self.entries.get(self.next) {
            if entry.start > t {
                break;
            }
            self.ends.push(Reverse((EndTime(entry.end), entry.key)));
            self.active.insert(entry.key);
            self.next += 1;
        }
        while let Some(Reverse((EndTime(end), key))) = self.ends.peek().copied() {
            if end > t {
                break;
            }
            self.ends.pop();
            self.active.remove(&key);
        }
        self.active.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force(windows: &[(usize, f64, f64)], t: f64) -> Vec<usize> {
        let mut keys: Vec<usize> = windows
            .iter()
            .filter(|(_, s, w)| *s <= t && t < s + w)
            .map(|(k, _, _)| *k)
            .collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_half_open_boundaries() {
        let index = IntervalIndex::from_windows([(0, 1.0, 2.0)]);
        assert!(index.at(0.999).is_empty());
        assert_eq!(index.at(1.0), vec![0]);
        assert_eq!(index.at(2.999), vec![0]);
        assert!(index.at(3.0).is_empty());
    }

    #[test]
    fn test_zero_width_is_never_active() {
        let index = IntervalIndex::from_windows([(0, 1.0, 0.0), (1, 0.0, 5.0)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.at(1.0), vec![1]);
    }

    #[test]
    fn test_overlapping_windows() {
        let windows = [(0, 0.0, 10.0), (1, 5.0, 10.0), (2, 12.0, 1.0)];
        let index = IntervalIndex::from_windows(windows);
        assert_eq!(index.at(7.0), vec![0, 1]);
        assert_eq!(index.at(12.5), vec![1, 2]);
        assert!(index.at(20.0).is_empty());
    }

    #[test]
    fn test_sweep_matches_point_queries() {
        let windows = [(0, 0.0, 0.06), (1, 0.03, 0.06), (2, 0.2, 0.1)];
        let index = IntervalIndex::from_windows(windows);
        let mut sweep = index.sweep();
        for step in 0..20 {
            let t = step as f64 * 0.03;
            assert_eq!(sweep.advance(t), index.at(t), "t = {}", t);
        }
    }

    #[test]
    fn test_sweep_rewind() {
        let index = IntervalIndex::from_windows([(0, 0.0, 1.0), (1, 2.0, 1.0)]);
        let mut sweep = index.sweep();
        assert_eq!(sweep.advance(2.5), vec![1]);
        assert_eq!(sweep.advance(0.5), vec![0]);
    }

    fn windows_strategy() -> impl Strategy<Value = Vec<(usize, f64, f64)>> {
        prop::collection::vec((0.0f64..100.0, 0.0f64..20.0), 0..60).prop_map(|v| {
            v.into_iter()
                .enumerate()
                .map(|(k, (s, w))| (k, s, w))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_tree_matches_brute_force(windows in windows_strategy(), t in -5.0f64..130.0) {
            let index = IntervalIndex::from_windows(windows.clone());
            prop_assert_eq!(index.at(t), brute_force(&windows, t));
        }

        #[test]
        fn prop_sweep_matches_brute_force(
            windows in windows_strategy(),
            mut times in prop::collection::vec(0.0f64..130.0, 1..40),
        ) {
            times.sort_by(|a, b| a.total_cmp(b));
            let index = IntervalIndex::from_windows(windows.clone());
            let mut sweep = index.sweep();
            for t in times {
                prop_assert_eq!(sweep.advance(t), brute_force(&windows, t));
            }
        }
    }
}
