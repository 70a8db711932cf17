//! Age-based retention.
//!
//! Each series keeps samples no older than its effective retention: its own
//! override when set, otherwise the store's `default_retention`. Expiry is a
//! binary search for the first sample inside the window followed by a single
//! head drain, so a prune pass costs O(log n) per untouched series.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::duration_nanos;
use crate::series::Series;

/// Outcome of the most recent prune pass.
///
/// All fields are zero before the first [`Store::prune`](crate::Store::prune).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// Samples removed across all series.
    pub points_removed: usize,
    /// Series that lost at least one sample.
    pub series_pruned: usize,
    /// Wall-clock time spent pruning.
    pub duration: Duration,
}

/// Oldest timestamp a series with `retention` keeps at `now_ns`.
pub(crate) fn retention_cutoff(now_ns: u64, retention: Duration) -> u64 {
    now_ns.saturating_sub(duration_nanos(retention))
}

/// Expires old samples from every series.
pub(crate) fn prune_all<'a>(
    series: impl IntoIterator<Item = &'a mut Series>,
    default_retention: Duration,
    now_ns: u64,
) -> PruneStats {
    let started = Instant::now();
    let mut stats = PruneStats::default();

    for series in series {
        let cutoff = retention_cutoff(now_ns, series.effective_retention(default_retention));
        let removed = series.expire_before(cutoff);
        if removed > 0 {
            stats.points_removed += removed;
            stats.series_pruned += 1;
        }
    }

    stats.duration = started.elapsed();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: u64 = 1_000_000_000;

    fn series_spanning(now_ns: u64, seconds: u64) -> Series {
        let mut series = Series::default();
        for i in (0..=seconds).rev() {
            series.push(now_ns - i * SEC, 1.0, usize::MAX);
        }
        series
    }

    #[test]
    fn test_retention_cutoff_saturates() {
        assert_eq!(retention_cutoff(10 * SEC, Duration::from_secs(4)), 6 * SEC);
        assert_eq!(retention_cutoff(SEC, Duration::from_secs(600)), 0);
    }

    #[test]
    fn test_prune_all_uses_effective_retention() {
        let now = 1_700_000_000 * SEC;
        let mut short = series_spanning(now, 10);
        let mut long = series_spanning(now, 10);
        long.set_retention(Duration::from_secs(20));

        let stats = prune_all([&mut short, &mut long], Duration::from_secs(5), now);

        // Samples at now-5s ..= now survive the default window.
        assert_eq!(short.len(), 6);
        assert_eq!(long.len(), 11);
        assert_eq!(stats.points_removed, 5);
        assert_eq!(stats.series_pruned, 1);
    }

    #[test]
    fn test_prune_all_twice_removes_nothing() {
        let now = 1_700_000_000 * SEC;
        let mut series = series_spanning(now, 30);

        let first = prune_all([&mut series], Duration::from_secs(10), now);
        assert_eq!(first.points_removed, 20);

        let second = prune_all([&mut series], Duration::from_secs(10), now);
        assert_eq!(second.points_removed, 0);
        assert_eq!(second.series_pruned, 0);
    }

    #[test]
    fn test_default_stats_are_zero() {
        let stats = PruneStats::default();
        assert_eq!(stats.points_removed, 0);
        assert_eq!(stats.series_pruned, 0);
        assert_eq!(stats.duration, Duration::ZERO);
    }
}
