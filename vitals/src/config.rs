//! Store configuration.
//!
//! A [`StoreConfig`] bounds how much history each series keeps: an age limit
//! enforced by [`Store::prune`](crate::Store::prune) and a hard point count
//! enforced on every write. Zero-valued fields fall back to the defaults, so
//! a zeroed config behaves exactly like [`StoreConfig::default`].
//!
//! Configurations can be loaded from JSON. Durations use serde's standard
//! `{ "secs": .., "nanos": .. }` representation and missing fields take
//! their defaults:
//!
//! ```json
//! {
//!   "default_retention": { "secs": 300, "nanos": 0 },
//!   "max_points": 1200
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default maximum sample age (10 minutes).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);

/// Default per-series sample cap.
pub const DEFAULT_MAX_POINTS: usize = 600;

/// Default suggested pruning period (30 seconds).
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(30);

/// Largest accepted `max_points`.
///
/// Each sample costs 16 bytes, so this caps a single series at ~160MB.
pub const MAX_POINTS_LIMIT: usize = 10_000_000;

/// Longest accepted duration (100 years).
///
/// Keeps `now - retention` arithmetic in nanoseconds well inside `u64`.
pub const MAX_DURATION: Duration = Duration::from_secs(100 * 365 * 86_400);

/// Configuration for a [`Store`](crate::Store).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use vitals::StoreConfig;
///
/// let config = StoreConfig {
///     default_retention: Duration::from_secs(60),
///     max_points: 0, // falls back to the default
///     ..StoreConfig::default()
/// }
/// .resolved();
///
/// assert_eq!(config.max_points, 600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum age of samples in series without their own retention.
    pub default_retention: Duration,

    /// Maximum number of samples kept per series; older samples are evicted
    /// first.
    pub max_points: usize,

    /// How often the embedding application should call
    /// [`Store::prune`](crate::Store::prune). The store itself never
    /// schedules anything.
    pub prune_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_retention: DEFAULT_RETENTION,
            max_points: DEFAULT_MAX_POINTS,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Returns a copy with every zero field replaced by its default.
    pub fn resolved(self) -> Self {
        let mut config = self;

        if config.default_retention.is_zero() {
            tracing::debug!("default_retention is zero, using {DEFAULT_RETENTION:?}");
            config.default_retention = DEFAULT_RETENTION;
        }
        if config.max_points == 0 {
            tracing::debug!("max_points is zero, using {DEFAULT_MAX_POINTS}");
            config.max_points = DEFAULT_MAX_POINTS;
        }
        if config.prune_interval.is_zero() {
            tracing::debug!("prune_interval is zero, using {DEFAULT_PRUNE_INTERVAL:?}");
            config.prune_interval = DEFAULT_PRUNE_INTERVAL;
        }

        config
    }

    /// Validates the configuration.
    ///
    /// Zero values are valid (they mean "use the default").
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidMaxPoints`] if `max_points` exceeds
    ///   [`MAX_POINTS_LIMIT`]
    /// - [`ConfigError::InvalidDuration`] if a duration exceeds
    ///   [`MAX_DURATION`]
    pub fn validate(&self) -> Result<()> {
        if self.max_points > MAX_POINTS_LIMIT {
            return Err(ConfigError::InvalidMaxPoints {
                count: self.max_points,
                max: MAX_POINTS_LIMIT,
            }
            .into());
        }

        for (field, duration) in [
            ("default_retention", self.default_retention),
            ("prune_interval", self.prune_interval),
        ] {
            if duration > MAX_DURATION {
                return Err(ConfigError::InvalidDuration {
                    field,
                    duration,
                    reason: format!("must be at most {MAX_DURATION:?}"),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Parses, validates and resolves a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error from
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config.resolved())
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the same errors as [`from_json_str`](Self::from_json_str).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }
}
