//! The mutable per-series record owned by the store.
//!
//! A [`Series`] keeps two parallel vectors, `times` and `values`, in arrival
//! order. Producers are expected to feed non-decreasing timestamps; range
//! reads and pruning binary-search `times` and return meaningless (but
//! memory-safe) bounds when that expectation is broken.
//!
//! Reads go through a [`SeriesView`], a borrowed window over either a live
//! series or a frozen snapshot, so the range/tail logic exists once.

use std::ops::Range;
use std::time::Duration;

use crate::snapshot::{Labels, SeriesSnapshot};

/// Live storage for one named series.
///
/// Eviction advances `head`, the first live index, instead of shifting the
/// vectors. The dead prefix is compacted once it is at least as long as the
/// live part, so the backing vectors stay under twice the live length plus
/// one.
#[derive(Debug, Clone, Default)]
pub(crate) struct Series {
    times: Vec<u64>,
    values: Vec<f64>,
    /// Index of the oldest live sample in `times`/`values`.
    head: usize,
    /// Per-series age limit; zero means the store default applies.
    retention: Duration,
    labels: Labels,
}

impl Series {
    /// Number of samples held.
    pub(crate) fn len(&self) -> usize {
        self.values.len() - self.head
    }

    /// Live timestamps, oldest first.
    fn times(&self) -> &[u64] {
        &self.times[self.head..]
    }

    /// Live values, paired with [`times`](Self::times).
    fn values(&self) -> &[f64] {
        &self.values[self.head..]
    }

    pub(crate) fn set_labels(&mut self, labels: Labels) {
        self.labels = labels;
    }

    pub(crate) fn set_retention(&mut self, retention: Duration) {
        self.retention = retention;
    }

    /// Returns the per-series retention if set, otherwise `default`.
    pub(crate) fn effective_retention(&self, default: Duration) -> Duration {
        if self.retention.is_zero() {
            default
        } else {
            self.retention
        }
    }

    /// Appends one sample and evicts from the head past `max_points`.
    pub(crate) fn push(&mut self, time: u64, value: f64, max_points: usize) {
        self.times.push(time);
        self.values.push(value);
        self.enforce_max_points(max_points);
    }

    /// Appends paired samples and evicts from the head past `max_points`.
    ///
    /// Callers guarantee `times.len() == values.len()`.
    pub(crate) fn extend(&mut self, times: &[u64], values: &[f64], max_points: usize) {
        debug_assert_eq!(times.len(), values.len());
        self.times.extend_from_slice(times);
        self.values.extend_from_slice(values);
        self.enforce_max_points(max_points);
    }

    /// Drops the oldest samples until at most `max_points` remain.
    ///
    /// Returns the number of samples evicted.
    pub(crate) fn enforce_max_points(&mut self, max_points: usize) -> usize {
        let excess = self.len().saturating_sub(max_points);
        self.discard_oldest(excess);
        excess
    }

    /// Drops every sample with a timestamp strictly before `cutoff_ns`.
    ///
    /// Returns the number of samples removed.
    pub(crate) fn expire_before(&mut self, cutoff_ns: u64) -> usize {
        let expired = self.times().partition_point(|&t| t < cutoff_ns);
        self.discard_oldest(expired);
        expired
    }

    /// Moves `head` past the `n` oldest live samples, compacting the backing
    /// vectors once the dead prefix outgrows the live part.
    fn discard_oldest(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.head += n;
        if self.head >= self.len() {
            self.times.drain(..self.head);
            self.values.drain(..self.head);
            self.head = 0;
        }
    }

    /// Borrows this series as a read view under `name`.
    pub(crate) fn view<'a>(&'a self, name: &'a str) -> SeriesView<'a> {
        SeriesView {
            name,
            times: self.times(),
            values: self.values(),
            labels: &self.labels,
        }
    }
}

/// Borrowed, read-only window over series data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeriesView<'a> {
    name: &'a str,
    times: &'a [u64],
    values: &'a [f64],
    labels: &'a Labels,
}

impl<'a> SeriesView<'a> {
    /// Borrows a snapshot as a view.
    pub(crate) fn of_snapshot(snapshot: &'a SeriesSnapshot) -> Self {
        Self {
            name: &snapshot.name,
            times: &snapshot.times,
            values: &snapshot.values,
            labels: &snapshot.labels,
        }
    }

    /// Copies the whole view into an owned snapshot.
    pub(crate) fn to_snapshot(self) -> SeriesSnapshot {
        self.slice(0..self.values.len())
    }

    /// Copies the samples with `start <= t <= end`.
    pub(crate) fn range(self, start: u64, end: u64) -> SeriesSnapshot {
        self.slice(time_bounds(self.times, start, end))
    }

    /// Copies the last `min(n, len)` samples.
    pub(crate) fn tail(self, n: usize) -> SeriesSnapshot {
        let len = self.values.len();
        self.slice(len.saturating_sub(n)..len)
    }

    /// Labels as readers of this view observe them.
    pub(crate) fn labels(self) -> &'a Labels {
        self.labels
    }

    /// Returns the most recent sample.
    pub(crate) fn latest(self) -> Option<(u64, f64)> {
        Some((*self.times.last()?, *self.values.last()?))
    }

    fn slice(self, range: Range<usize>) -> SeriesSnapshot {
        if range.is_empty() {
            return SeriesSnapshot::empty(self.name, self.labels.clone());
        }
        SeriesSnapshot {
            name: self.name.to_string(),
            times: self.times[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
            labels: self.labels.clone(),
        }
    }
}

/// Index range of samples with `start <= t <= end`, assuming `times` is
/// non-decreasing.
/// Returns an empty range when nothing matches, including `start > end`.
pub(crate) fn time_bounds(times: &[u64], start: u64, end: u64) -> Range<usize> {
    let lo = times.partition_point(|&t| t < start);
    let hi = times.partition_point(|&t| t <= end);
    if lo >= hi { lo..lo } else { lo..hi }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_with(values: std::ops::Range<u32>) -> Series {
        let mut series = Series::default();
        for i in values {
            series.push(u64::from(i) * 10, f64::from(i), usize::MAX);
        }
        series
    }

    #[test]
    fn test_push_keeps_lengths_paired() {
        let series = series_with(0..5);
        assert_eq!(series.times().len(), series.values().len());
        assert_eq!(series.len(), 5);
    }

    #[test]
    fn test_enforce_max_points_evicts_oldest() {
        let mut series = Series::default();
        for i in 0u32..10 {
            series.push(u64::from(i), f64::from(i), 5);
            assert!(series.len() <= 5);
        }
        assert_eq!(series.values(), [5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(series.times(), [5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_extend_enforces_once() {
        let mut series = Series::default();
        series.extend(&[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(series.values(), [2.0, 3.0, 4.0]);
        assert_eq!(series.enforce_max_points(3), 0);
    }

    #[test]
    fn test_expire_before() {
        let mut series = series_with(0..10); // times 0, 10, .., 90
        assert_eq!(series.expire_before(35), 4);
        assert_eq!(series.times().first(), Some(&40));
        // Idempotent with the same cutoff.
        assert_eq!(series.expire_before(35), 0);
        // Cutoff equal to a timestamp keeps that sample.
        assert_eq!(series.expire_before(50), 1);
        assert_eq!(series.times().first(), Some(&50));
        assert_eq!(series.len(), 5);

        assert_eq!(series.expire_before(u64::MAX), 5);
        assert_eq!(series.len(), 0);
        assert!(series.times.is_empty(), "fully expired series releases its storage");
    }

    #[test]
    fn test_eviction_at_capacity_does_not_shift_live_samples() {
        let cap = 1_000;
        let mut series = Series::default();
        let times: Vec<u64> = (0..cap).collect();
        let values: Vec<f64> = (0u32..1_000).map(f64::from).collect();
        series.extend(&times, &values, 1_000);

        // One write at capacity only advances the head.
        series.push(cap, 1_000.0, 1_000);
        assert_eq!(series.head, 1);
        assert_eq!(series.times.len(), 1_001);

        for t in cap + 1..cap * 10 {
            series.push(t, 0.0, 1_000);
            assert_eq!(series.len(), 1_000);
            assert!(series.times.len() <= 2 * 1_000 + 1);
            assert_eq!(series.times.len(), series.values.len());
        }
        assert_eq!(series.times().first(), Some(&(cap * 9)));
        assert_eq!(series.times().last(), Some(&(cap * 10 - 1)));
    }

    #[test]
    fn test_view_skips_evicted_prefix() {
        let mut series = Series::default();
        for i in 0u32..6 {
            series.push(u64::from(i), f64::from(i), 4);
        }
        assert_eq!(series.head, 2);

        let view = series.view("cpu");
        assert_eq!(view.to_snapshot().values, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(view.range(0, 2).values, vec![2.0]);
        assert_eq!(view.latest(), Some((5, 5.0)));
    }

    #[test]
    fn test_effective_retention() {
        let mut series = Series::default();
        let default = Duration::from_secs(600);
        assert_eq!(series.effective_retention(default), default);

        series.set_retention(Duration::from_secs(20));
        assert_eq!(series.effective_retention(default), Duration::from_secs(20));

        series.set_retention(Duration::ZERO);
        assert_eq!(series.effective_retention(default), default);
    }

    #[test]
    fn test_time_bounds_inclusive() {
        let times = [0, 10, 20, 30, 40];
        assert_eq!(time_bounds(&times, 10, 30), 1..4);
        assert_eq!(time_bounds(&times, 11, 29), 2..3);
        assert_eq!(time_bounds(&times, 0, u64::MAX), 0..5);
        assert!(time_bounds(&times, 41, 100).is_empty());
        assert!(time_bounds(&times, 30, 10).is_empty());
        assert!(time_bounds(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_time_bounds_with_duplicate_timestamps() {
        let times = [5, 10, 10, 10, 15];
        assert_eq!(time_bounds(&times, 10, 10), 1..4);
    }

    #[test]
    fn test_view_range_and_tail() {
        let mut series = series_with(0..10);
        series.set_labels(Labels::from([("host".to_string(), "honey".to_string())]));
        let view = series.view("cpu");

        let range = view.range(30, 60);
        assert_eq!(range.values, vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(range.name, "cpu");

        let empty = view.range(1_000, 2_000);
        assert!(empty.is_empty());
        assert_eq!(empty.name, "cpu");
        assert_eq!(empty.labels.get("host").map(String::as_str), Some("honey"));

        assert_eq!(view.tail(3).values, vec![7.0, 8.0, 9.0]);
        assert_eq!(view.tail(100).len(), 10);
        assert!(view.tail(0).is_empty());
        assert_eq!(view.latest(), Some((90, 9.0)));
    }

    #[test]
    fn test_view_of_snapshot_matches_live() {
        let series = series_with(0..4);
        let snapshot = series.view("mem").to_snapshot();
        let view = SeriesView::of_snapshot(&snapshot);
        assert_eq!(view.to_snapshot(), snapshot);
        assert_eq!(view.latest(), Some((30, 3.0)));
    }
}
