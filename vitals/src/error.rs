//! Error types for the vitals time-series store.
//!
//! The store operations themselves are infallible: unknown series, stale
//! freeze tokens and empty reads are reported through `Option` and zero
//! aggregates. Errors only arise while building a configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The main error type for all vitals operations.
#[derive(Error, Debug)]
pub enum VitalsError {
    /// Error loading or validating a store configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur while loading or validating a [`StoreConfig`].
///
/// [`StoreConfig`]: crate::config::StoreConfig
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for a `StoreConfig`.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// `max_points` exceeds the supported per-series capacity.
    #[error("invalid max_points {count}: must be at most {max}")]
    InvalidMaxPoints {
        /// The configured value.
        count: usize,
        /// The largest accepted value.
        max: usize,
    },

    /// A duration field is outside the supported range.
    #[error("invalid {field} {duration:?}: {reason}")]
    InvalidDuration {
        /// Name of the offending field.
        field: &'static str,
        /// The configured duration.
        duration: Duration,
        /// Why the duration was rejected.
        reason: String,
    },
}

/// Type alias for `Result<T, VitalsError>`.
pub type Result<T> = std::result::Result<T, VitalsError>;
