//! Reference-counted freezing of series.
//!
//! A renderer that draws several panels from one consistent moment freezes
//! the series it needs. While frozen, reads of a series return the snapshot
//! captured at the first freeze, and writes are parked in a pending buffer
//! instead of touching live storage. Producers never block on a freeze.
//!
//! # Lifecycle
//!
//! ```text
//! freeze(a)  ──► entry{a}: snapshot, count=1, tokens={t1}
//! freeze(a)  ──► entry{a}: count=2, tokens={t1,t2}
//! add_point  ──► pending += sample
//! unfreeze(t1) ► count=1
//! unfreeze(t2) ► count=0 ─► pending merged into live series, entry dropped
//! ```
//!
//! Tokens come from a process-wide counter and are never reused, so a stale
//! token (released already, or whose series was deleted) is simply not found.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::snapshot::SeriesSnapshot;

/// Next token id. Starts at 1 so that 0 never names a real freeze.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque handle returned by [`Store::freeze`](crate::Store::freeze).
///
/// Pass it to [`Store::unfreeze`](crate::Store::unfreeze) to release every
/// series the freeze covered. Tokens are unique and strictly increasing for
/// the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FreezeToken(u64);

impl FreezeToken {
    /// Allocates a fresh token.
    pub(crate) fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric token id.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FreezeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "freeze#{}", self.0)
    }
}

/// Freeze bookkeeping for a single series.
#[derive(Debug)]
pub(crate) struct FrozenState {
    snapshot: SeriesSnapshot,
    pending_times: Vec<u64>,
    pending_values: Vec<f64>,
    count: usize,
    tokens: HashSet<FreezeToken>,
}

impl FrozenState {
    fn new(snapshot: SeriesSnapshot) -> Self {
        Self {
            snapshot,
            pending_times: Vec::new(),
            pending_values: Vec::new(),
            count: 0,
            tokens: HashSet::new(),
        }
    }

    /// The view readers observe while frozen.
    pub(crate) fn snapshot(&self) -> &SeriesSnapshot {
        &self.snapshot
    }

    pub(crate) fn is_active(&self) -> bool {
        self.count > 0
    }

    /// Number of samples waiting to be merged.
    pub(crate) fn pending_len(&self) -> usize {
        self.pending_values.len()
    }

    /// Parks one sample until the freeze is released.
    ///
    /// Only the newest `max_points` pending samples are kept: anything older
    /// would be evicted by the merge anyway.
    pub(crate) fn buffer(&mut self, time: u64, value: f64, max_points: usize) {
        self.pending_times.push(time);
        self.pending_values.push(value);
        self.trim_pending(max_points);
    }

    /// Parks paired samples until the freeze is released.
    pub(crate) fn buffer_all(&mut self, times: &[u64], values: &[f64], max_points: usize) {
        debug_assert_eq!(times.len(), values.len());
        self.pending_times.extend_from_slice(times);
        self.pending_values.extend_from_slice(values);
        self.trim_pending(max_points);
    }

    fn trim_pending(&mut self, max_points: usize) {
        let excess = self.pending_values.len().saturating_sub(max_points);
        if excess > 0 {
            self.pending_times.drain(..excess);
            self.pending_values.drain(..excess);
        }
    }

    /// Registers `token` as a holder. A token holds an entry at most once.
    fn hold(&mut self, token: FreezeToken) {
        if self.tokens.insert(token) {
            self.count += 1;
        }
    }

    /// Drops `token` as a holder. Returns `true` if it was holding.
    fn release(&mut self, token: FreezeToken) -> bool {
        if self.tokens.remove(&token) {
            self.count -= 1;
            true
        } else {
            false
        }
    }

    /// Consumes the entry, yielding the pending samples in arrival order.
    pub(crate) fn into_pending(self) -> (Vec<u64>, Vec<f64>) {
        (self.pending_times, self.pending_values)
    }
}

/// All frozen entries of a store, keyed by series name.
#[derive(Debug, Default)]
pub(crate) struct FreezeTable {
    entries: HashMap<String, FrozenState>,
}

impl FreezeTable {
    /// Adds `token` as a holder of `name`, capturing a snapshot with
    /// `capture` if the series is not frozen yet.
    pub(crate) fn hold(
        &mut self,
        token: FreezeToken,
        name: &str,
        capture: impl FnOnce() -> SeriesSnapshot,
    ) {
        match self.entries.get_mut(name) {
            Some(state) => state.hold(token),
            None => {
                let mut state = FrozenState::new(capture());
                state.hold(token);
                self.entries.insert(name.to_string(), state);
            }
        }
    }

    /// Releases `token` everywhere it is held.
    ///
    /// Returns the entries whose last holder just left, which the caller must
    /// merge back into live storage.
    pub(crate) fn release(&mut self, token: FreezeToken) -> Vec<(String, FrozenState)> {
        let mut dissolved = Vec::new();
        for (name, state) in &mut self.entries {
            if state.release(token) && !state.is_active() {
                dissolved.push(name.clone());
            }
        }

        dissolved
            .into_iter()
            .filter_map(|name| self.entries.remove_entry(&name))
            .collect()
    }

    /// Returns the entry for `name` if it is currently frozen.
    pub(crate) fn active(&self, name: &str) -> Option<&FrozenState> {
        self.entries.get(name).filter(|state| state.is_active())
    }

    /// Mutable variant of [`active`](Self::active).
    pub(crate) fn active_mut(&mut self, name: &str) -> Option<&mut FrozenState> {
        self.entries.get_mut(name).filter(|state| state.is_active())
    }

    /// Discards the entry for `name`, pending samples included.
    pub(crate) fn remove(&mut self, name: &str) -> Option<FrozenState> {
        self.entries.remove(name)
    }

    /// Number of frozen series.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
