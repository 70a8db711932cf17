//! Fluent query composition over the store's read primitives.
//!
//! A query picks its targets, either one series by name or every series
//! carrying a label, and a selection mode:
//!
//! - **Full** (default) - whole snapshots, as [`Store::get_series`]
//! - **Since** - samples from the last `d` before the store clock's "now"
//! - **Between** - an inclusive time window, as [`Store::get_range`]
//! - **Last** - the newest `n` samples, as [`Store::get_latest_n`]
//!
//! Setting a mode replaces the previous one. Targets that do not exist are
//! left out of the results rather than reported.
//!
//! # Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use vitals::{Store, StoreConfig};
//!
//! let store = Store::new(StoreConfig::default());
//! store.set_labels("cpu.honey", [("host", "honey")]);
//! store.set_labels("mem.honey", [("host", "honey")]);
//! store.set_labels("cpu.yoga", [("host", "yoga")]);
//!
//! let honey = store.query_by_label("host", "honey").execute();
//! let names: Vec<_> = honey.iter().map(|s| s.name.as_str()).collect();
//! assert_eq!(names, vec!["cpu.honey", "mem.honey"]);
//!
//! // Everything cpu.honey recorded in the last minute.
//! let recent = store.query("cpu.honey").since(Duration::from_secs(60)).execute();
//! assert_eq!(recent.len(), 1);
//! ```

use std::time::Duration;

use crate::retention::retention_cutoff;
use crate::series::SeriesView;
use crate::snapshot::SeriesSnapshot;
use crate::store::Store;

/// How a query selects samples from each target series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Every sample.
    #[default]
    Full,
    /// Samples no older than the duration, relative to the clock at
    /// execution time.
    Since(Duration),
    /// Samples with `start <= t <= end`, in nanoseconds.
    Between {
        /// Inclusive lower bound.
        start: u64,
        /// Inclusive upper bound.
        end: u64,
    },
    /// The newest `n` samples.
    Last(usize),
}

/// Which series a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target<'a> {
    Name(&'a str),
    Label { key: &'a str, value: &'a str },
}

/// Builder returned by [`Store::query`] and [`Store::query_by_label`].
///
/// The builder borrows the store and can be executed any number of times;
/// each execution takes a fresh read lock.
#[derive(Debug, Clone, Copy)]
#[must_use = "a query does nothing until `execute` is called"]
pub struct QueryBuilder<'a> {
    store: &'a Store,
    target: Target<'a>,
    mode: QueryMode,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn by_name(store: &'a Store, name: &'a str) -> Self {
        Self {
            store,
            target: Target::Name(name),
            mode: QueryMode::Full,
        }
    }

    pub(crate) fn by_label(store: &'a Store, key: &'a str, value: &'a str) -> Self {
        Self {
            store,
            target: Target::Label { key, value },
            mode: QueryMode::Full,
        }
    }

    /// Selects samples from the last `window` before now.
    pub fn since(mut self, window: Duration) -> Self {
        self.mode = QueryMode::Since(window);
        self
    }

    /// Selects samples with `start_ns <= t <= end_ns`.
    pub fn between(mut self, start_ns: u64, end_ns: u64) -> Self {
        self.mode = QueryMode::Between {
            start: start_ns,
            end: end_ns,
        };
        self
    }

    /// Selects the newest `n` samples.
    pub fn last(mut self, n: usize) -> Self {
        self.mode = QueryMode::Last(n);
        self
    }

    /// Returns the selection mode currently set.
    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Runs the query.
    ///
    /// Label queries return matches ordered by series name. Frozen series
    /// answer from their frozen snapshot and are matched on the labels it
    /// carries.
    pub fn execute(&self) -> Vec<SeriesSnapshot> {
        // The clock is read before locking so it never extends the critical
        // section.
        let selection = Selection::resolve(self.mode, || self.store.clock().now_ns());

        let inner = self.store.read_inner();
        match self.target {
            Target::Name(name) => inner
                .view(name)
                .map(|view| selection.apply(view))
                .into_iter()
                .collect(),
            Target::Label { key, value } => inner
                .views_with_label(key, value)
                .map(|view| selection.apply(view))
                .collect(),
        }
    }
}

/// A [`QueryMode`] with "now" pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    All,
    Range { start: u64, end: u64 },
    Tail(usize),
}

impl Selection {
    fn resolve(mode: QueryMode, now_ns: impl FnOnce() -> u64) -> Self {
        match mode {
            QueryMode::Full => Self::All,
            QueryMode::Since(window) => {
                let now = now_ns();
                Self::Range {
                    start: retention_cutoff(now, window),
                    end: now,
                }
            }
            QueryMode::Between { start, end } => Self::Range { start, end },
            QueryMode::Last(n) => Self::Tail(n),
        }
    }

    fn apply(self, view: SeriesView<'_>) -> SeriesSnapshot {
        match self {
            Self::All => view.to_snapshot(),
            Self::Range { start, end } => view.range(start, end),
            Self::Tail(n) => view.tail(n),
        }
    }
}
