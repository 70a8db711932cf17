//! # vitals
//!
//! Embedded in-memory time-series store for terminal dashboards.
//!
//! vitals keeps a bounded recent window of named scalar samples for a
//! process that both collects and renders telemetry. Metric collectors push
//! samples from any thread; renderers pull owned snapshots for sparklines,
//! latest values and aggregates without ever holding a lock across a frame.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Bounded memory: a per-series sample cap with FIFO eviction on write
//! - Age-based retention, per series or store-wide, applied by [`Store::prune`]
//! - Snapshot reads: every read returns copies, never references
//! - Reference-counted freezes give renderers a stable view while writes continue
//! - No background threads, no persistence, no surprises
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use vitals::{Store, StoreConfig};
//!
//! let store = Store::new(StoreConfig {
//!     default_retention: Duration::from_secs(300),
//!     max_points: 300,
//!     ..StoreConfig::default()
//! });
//!
//! // Collectors feed samples (nanosecond timestamps).
//! let t0 = 1_700_000_000_000_000_000u64;
//! store.set_labels("cpu", [("host", "honey")]);
//! store.add_points("cpu", &[t0, t0 + 1_000_000_000], &[12.5, 17.0]);
//!
//! // A renderer draws every panel from one consistent moment.
//! let token = store.freeze(&[]);
//! let cpu = store.get_series("cpu").unwrap_or_default();
//! println!("cpu avg={:.1} max={:.1}", cpu.avg(), cpu.max());
//! store.unfreeze(token);
//!
//! // Some scheduler calls this every `prune_interval`.
//! let stats = store.prune();
//! println!("pruned {} point(s)", stats.points_removed);
//! ```
//!
//! ## Architecture
//!
//! - [`Store`] — Owns every series behind one readers-writer lock
//! - [`SeriesSnapshot`] — Owned copy of a series with zero-on-empty aggregates
//! - [`FreezeToken`] — Releases a freeze taken with [`Store::freeze`]
//! - [`QueryBuilder`] — Fluent name/label queries with since/between/last modes
//! - [`PruneStats`] — Outcome of the latest retention pass
//!
//! ## Modules
//!
//! - [`store`] — Store lifecycle, writes, reads, freeze and prune entry points
//! - [`snapshot`] — Snapshot value type and aggregates
//! - [`freeze`] — Freeze tokens
//! - [`query`] — Query builder
//! - [`retention`] — Pruning and its statistics
//! - [`config`] — Store configuration and JSON loading
//! - [`clock`] — Wall-clock abstraction used for ages
//! - [`error`] — Error types

pub mod clock;
pub mod config;
pub mod error;
pub mod freeze;
pub mod query;
pub mod retention;
mod series;
pub mod snapshot;
pub mod store;

// Re-export primary API types at crate root for convenience.
pub use clock::{Clock, MockClock, SystemClock};
pub use config::StoreConfig;
pub use error::{ConfigError, Result, VitalsError};
pub use freeze::FreezeToken;
pub use query::{QueryBuilder, QueryMode};
pub use retention::PruneStats;
pub use snapshot::{Labels, SeriesSnapshot};
pub use store::Store;
