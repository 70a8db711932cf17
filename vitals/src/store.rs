//! Store module for the vitals time-series store.
//!
//! This module provides the top-level API that ties all components together.
//! The [`Store`] owns every series, the freeze table, and the statistics of
//! the last prune pass, all behind a single readers-writer lock.
//!
//! # Design
//!
//! - Writes (`add_point*`, `set_*`, `delete_series`, `freeze`, `unfreeze`,
//!   `prune`) take the lock exclusively.
//! - Reads (`get_*`, `list_series`, `is_frozen`, `prune_stats`, query
//!   execution) share it and copy what they return before releasing it.
//! - Nothing ever hands out a reference into internal storage, so callers
//!   hold no lock once a call returns.
//! - There are no background threads: pruning happens when the embedding
//!   application calls [`Store::prune`], typically every
//!   [`StoreConfig::prune_interval`].
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use vitals::{Store, StoreConfig};
//!
//! let store = Arc::new(Store::new(StoreConfig::default()));
//!
//! // A collector thread feeds samples.
//! let producer = {
//!     let store = Arc::clone(&store);
//!     thread::spawn(move || {
//!         for i in 0u32..10 {
//!             store.add_point("cpu", 1_700_000_000_000_000_000 + u64::from(i), f64::from(i));
//!         }
//!     })
//! };
//! producer.join().unwrap();
//!
//! // The renderer reads an owned snapshot.
//! let cpu = store.get_series("cpu").unwrap_or_default();
//! assert_eq!(cpu.len(), 10);
//! assert_eq!(cpu.last(), 9.0);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::freeze::{FreezeTable, FreezeToken};
use crate::query::QueryBuilder;
use crate::retention::{self, PruneStats};
use crate::series::{Series, SeriesView};
use crate::snapshot::{Labels, SeriesSnapshot};

/// In-memory time-series store shared by producers and renderers.
///
/// `Store` is `Send + Sync`; share it with `Arc<Store>`. Every method takes
/// `&self`.
#[derive(Debug)]
pub struct Store {
    /// Resolved configuration (no zero fields).
    config: StoreConfig,
    /// Time source for pruning and `since` queries.
    clock: Arc<dyn Clock>,
    /// All mutable state, guarded by one lock.
    inner: RwLock<Inner>,
}

/// State guarded by the store lock.
#[derive(Debug, Default)]
pub(crate) struct Inner {
    /// Live series keyed by name; ordered so listing is already sorted.
    series: BTreeMap<String, Series>,
    /// Frozen entries keyed by series name.
    frozen: FreezeTable,
    /// Result of the most recent prune pass.
    prune_stats: PruneStats,
}

impl Inner {
    /// Returns what readers of `name` observe: the frozen snapshot while a
    /// freeze is active, the live series otherwise.
    pub(crate) fn view<'a>(&'a self, name: &'a str) -> Option<SeriesView<'a>> {
        if let Some(state) = self.frozen.active(name) {
            return Some(SeriesView::of_snapshot(state.snapshot()));
        }
        self.series.get(name).map(|series| series.view(name))
    }

    /// Views of every series whose observed labels contain `key = value`,
    /// ordered by name.
    ///
    /// A frozen series is matched against its frozen labels, so every view
    /// returned satisfies the filter.
    pub(crate) fn views_with_label<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = SeriesView<'a>> + 'a {
        self.series
            .keys()
            .filter_map(move |name| self.view(name))
            .filter(move |view| view.labels().get(key).is_some_and(|v| v == value))
    }
}

impl Store {
    /// Creates a store, replacing zero configuration fields by defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vitals::{Store, StoreConfig};
    ///
    /// let store = Store::new(StoreConfig { max_points: 5, ..StoreConfig::default() });
    /// assert_eq!(store.config().max_points, 5);
    /// ```
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Validates `config`, then creates a store.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if the
    /// configuration is out of range.
    pub fn try_new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Creates a store that reads the current time from `clock`.
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: config.resolved(),
            clock,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the store's time source.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Acquires the shared lock for query execution.
    pub(crate) fn read_inner(&self) -> parking_lot::RwLockReadGuard<'_, Inner> {
        self.inner.read()
    }

    // --- Writes --------------------------------------------------------

    /// Appends one sample to `name`, creating the series if needed.
    ///
    /// If the series is frozen the sample is parked and merged when the last
    /// freeze is released. Otherwise the oldest samples beyond `max_points`
    /// are evicted.
    pub fn add_point(&self, name: &str, time_ns: u64, value: f64) {
        let max_points = self.config.max_points;
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Some(state) = inner.frozen.active_mut(name) {
            state.buffer(time_ns, value, max_points);
            return;
        }

        inner
            .series
            .entry(name.to_string())
            .or_default()
            .push(time_ns, value, max_points);
    }

    /// Appends paired samples to `name` in one atomic step.
    ///
    /// A length mismatch between `times_ns` and `values` makes the call a
    /// no-op: nothing is written and no series is created.
    pub fn add_points(&self, name: &str, times_ns: &[u64], values: &[f64]) {
        if times_ns.len() != values.len() {
            return;
        }

        let max_points = self.config.max_points;
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Some(state) = inner.frozen.active_mut(name) {
            state.buffer_all(times_ns, values, max_points);
            return;
        }

        inner
            .series
            .entry(name.to_string())
            .or_default()
            .extend(times_ns, values, max_points);
    }

    /// Sets the retention of `name`, creating the series if needed.
    ///
    /// `Duration::ZERO` removes the override so the store default applies.
    pub fn set_retention(&self, name: &str, retention: Duration) {
        self.inner
            .write()
            .series
            .entry(name.to_string())
            .or_default()
            .set_retention(retention);
    }

    /// Replaces the labels of `name`, creating the series if needed.
    ///
    /// The labels are copied; the caller's collection is not retained.
    pub fn set_labels<I, K, V>(&self, name: &str, labels: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels: Labels = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.inner
            .write()
            .series
            .entry(name.to_string())
            .or_default()
            .set_labels(labels);
    }

    /// Removes `name` along with any freeze state and pending samples.
    ///
    /// Outstanding freeze tokens for the series become no-ops.
    pub fn delete_series(&self, name: &str) {
        let mut inner = self.inner.write();
        let removed = inner.series.remove(name).is_some();
        let unfrozen = inner.frozen.remove(name).is_some();
        if removed || unfrozen {
            tracing::trace!("deleted series {name} (was frozen: {unfrozen})");
        }
    }

    // --- Reads ---------------------------------------------------------

    /// Returns a copy of `name`, or `None` if the series does not exist.
    ///
    /// A frozen series returns the snapshot taken when it was frozen.
    pub fn get_series(&self, name: &str) -> Option<SeriesSnapshot> {
        self.inner.read().view(name).map(SeriesView::to_snapshot)
    }

    /// Returns the samples of `name` with `start_ns <= t <= end_ns`.
    ///
    /// An empty window yields an empty snapshot that still carries the name
    /// and labels. Timestamps are assumed non-decreasing.
    pub fn get_range(&self, name: &str, start_ns: u64, end_ns: u64) -> Option<SeriesSnapshot> {
        self.inner
            .read()
            .view(name)
            .map(|view| view.range(start_ns, end_ns))
    }

    /// Returns the most recent `(timestamp, value)` of `name`.
    ///
    /// `None` if the series does not exist or holds no samples.
    pub fn get_latest(&self, name: &str) -> Option<(u64, f64)> {
        self.inner.read().view(name).and_then(SeriesView::latest)
    }

    /// Returns the last `min(n, len)` samples of `name`.
    pub fn get_latest_n(&self, name: &str, n: usize) -> Option<SeriesSnapshot> {
        self.inner.read().view(name).map(|view| view.tail(n))
    }

    /// Returns all series names in lexicographic order.
    pub fn list_series(&self) -> Vec<String> {
        self.inner.read().series.keys().cloned().collect()
    }

    /// Returns the number of series.
    pub fn series_count(&self) -> usize {
        self.inner.read().series.len()
    }

    /// Returns the number of live samples across all series.
    ///
    /// Samples parked by an active freeze are not counted.
    pub fn point_count(&self) -> usize {
        self.inner.read().series.values().map(Series::len).sum()
    }

    // --- Freeze --------------------------------------------------------

    /// Freezes the named series, or every existing series when `names` is
    /// empty, and returns the token that releases them.
    ///
    /// Names that do not exist are skipped. Freezing an already frozen series
    /// stacks: each token must be released before writes resume.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vitals::{Store, StoreConfig};
    ///
    /// let store = Store::new(StoreConfig::default());
    /// store.add_point("cpu", 1, 10.0);
    ///
    /// let token = store.freeze(&["cpu"]);
    /// store.add_point("cpu", 2, 20.0);
    /// assert_eq!(store.get_series("cpu").unwrap().len(), 1);
    ///
    /// store.unfreeze(token);
    /// assert_eq!(store.get_series("cpu").unwrap().len(), 2);
    /// ```
    pub fn freeze(&self, names: &[&str]) -> FreezeToken {
        let token = FreezeToken::next();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let targets: Vec<&str> = if names.is_empty() {
            inner.series.keys().map(String::as_str).collect()
        } else {
            names.to_vec()
        };

        let mut held = 0usize;
        for name in targets {
            let Some(series) = inner.series.get(name) else {
                continue;
            };
            inner
                .frozen
                .hold(token, name, || series.view(name).to_snapshot());
            held += 1;
        }

        tracing::debug!("{token} holds {held} series");
        token
    }

    /// Releases every series held by `token`.
    ///
    /// Series whose last holder this was get their pending samples appended
    /// in arrival order, then `max_points` is enforced. Unknown, released or
    /// deleted tokens are ignored.
    pub fn unfreeze(&self, token: FreezeToken) {
        let max_points = self.config.max_points;
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        for (name, state) in inner.frozen.release(token) {
            let pending = state.pending_len();
            let (times, values) = state.into_pending();
            if let Some(series) = inner.series.get_mut(&name) {
                series.extend(&times, &values, max_points);
            }
            tracing::debug!("{token} released {name}, merged {pending} pending sample(s)");
        }
    }

    /// Returns `true` while at least one unreleased freeze holds `name`.
    pub fn is_frozen(&self, name: &str) -> bool {
        self.inner.read().frozen.active(name).is_some()
    }

    /// Returns the number of currently frozen series.
    pub fn frozen_count(&self) -> usize {
        self.inner.read().frozen.len()
    }

    // --- Query ---------------------------------------------------------

    /// Starts a query over the series `name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vitals::{Store, StoreConfig};
    ///
    /// let store = Store::new(StoreConfig::default());
    /// for i in 0u32..10 {
    ///     store.add_point("cpu", u64::from(i), f64::from(i));
    /// }
    ///
    /// let results = store.query("cpu").last(3).execute();
    /// assert_eq!(results[0].values, vec![7.0, 8.0, 9.0]);
    /// ```
    pub fn query<'a>(&'a self, name: &'a str) -> QueryBuilder<'a> {
        QueryBuilder::by_name(self, name)
    }

    /// Starts a query over every series labelled `key = value`.
    pub fn query_by_label<'a>(&'a self, key: &'a str, value: &'a str) -> QueryBuilder<'a> {
        QueryBuilder::by_label(self, key, value)
    }

    // --- Retention -----------------------------------------------------

    /// Removes samples older than each series' retention, measured against
    /// the store clock.
    pub fn prune(&self) -> PruneStats {
        self.prune_at(self.clock.now_ns())
    }

    /// Removes samples older than each series' retention as of `now_ns`.
    pub fn prune_at(&self, now_ns: u64) -> PruneStats {
        let mut inner = self.inner.write();
        let stats = retention::prune_all(
            inner.series.values_mut(),
            self.config.default_retention,
            now_ns,
        );
        inner.prune_stats = stats;

        tracing::debug!(
            "pruned {} point(s) from {} series in {:?}",
            stats.points_removed,
            stats.series_pruned,
            stats.duration
        );
        stats
    }

    /// Returns the statistics of the most recent prune pass.
    pub fn prune_stats(&self) -> PruneStats {
        self.inner.read().prune_stats
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
