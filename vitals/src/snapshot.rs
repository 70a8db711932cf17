//! Immutable series snapshots handed to readers.
//!
//! Every read on the [`Store`](crate::Store) copies the requested samples
//! into a [`SeriesSnapshot`] while holding the lock. The caller owns the
//! copy outright: it can be kept across frames, mutated, or sent to another
//! thread without affecting the store.
//!
//! Aggregates treat an empty snapshot as "no signal" and return `0.0`.
//! Absent series are `None`; `store.get_series(name).unwrap_or_default()`
//! yields an empty snapshot with the same zero answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label metadata attached to a series.
pub type Labels = BTreeMap<String, String>;

/// A point-in-time copy of a series.
///
/// `times[i]` and `values[i]` form one sample. Timestamps are nanoseconds
/// since the Unix epoch, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    /// The series name.
    pub name: String,
    /// Sample timestamps in nanoseconds since the Unix epoch.
    pub times: Vec<u64>,
    /// Sample values, paired positionally with `times`.
    pub values: Vec<f64>,
    /// Labels at the time of the snapshot.
    pub labels: Labels,
}

impl SeriesSnapshot {
    /// Creates an empty snapshot carrying only a name and labels.
    pub fn empty(name: impl Into<String>, labels: Labels) -> Self {
        Self {
            name: name.into(),
            times: Vec::new(),
            values: Vec::new(),
            labels,
        }
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the snapshot holds no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the smallest value, or `0.0` when empty.
    pub fn min(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Returns the largest value, or `0.0` when empty.
    pub fn max(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Returns the most recent value, or `0.0` when empty.
    pub fn last(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Returns the arithmetic mean, or `0.0` when empty.
    #[allow(clippy::cast_precision_loss)] // sample counts are far below 2^52
    pub fn avg(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Iterates over `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Returns the most recent `(timestamp, value)` pair.
    pub fn latest(&self) -> Option<(u64, f64)> {
        Some((*self.times.last()?, *self.values.last()?))
    }
}
