// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use gateway_store::{ConsistencyLevel, Error, Result};

/// Per-request options of a gateway dispatch.
///
/// Options are immutable values; every `with_*` method returns a modified copy.
///
/// | Option          | Default                    |
/// |-----------------|----------------------------|
/// | `consistency`   | [`ConsistencyLevel::Session`] |
/// | `bypass_cache`  | `false`                    |
/// | `max_staleness` | unset (gateway default TTL) |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use dedicated_gateway::RequestOptions;
/// use gateway_store::ConsistencyLevel;
///
/// let options = RequestOptions::new()
///     .with_consistency(ConsistencyLevel::Eventual)
///     .with_max_staleness(Duration::from_secs(5));
///
/// assert!(!options.bypass_cache());
/// assert_eq!(options.max_staleness(), Some(Duration::from_secs(5)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    consistency: ConsistencyLevel,
    bypass_cache: bool,
    max_staleness: Option<Duration>,
}

impl RequestOptions {
    /// Creates options with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the consistency level forwarded to the backing store.
    #[must_use]
    pub fn with_consistency(self, consistency: ConsistencyLevel) -> Self {
        Self { consistency, ..self }
    }

    /// Forces reads to go to the backing store and refresh the cache.
    ///
    /// A bypassing read ignores [`max_staleness`](Self::max_staleness).
    #[must_use]
    pub fn with_bypass_cache(self, bypass_cache: bool) -> Self {
        Self { bypass_cache, ..self }
    }

    /// Sets the maximum age a cached entry may have to be served.
    #[must_use]
    pub fn with_max_staleness(self, max_staleness: Duration) -> Self {
        Self {
            max_staleness: Some(max_staleness),
            ..self
        }
    }

    /// Sets the maximum staleness from fractional seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidOperation`](gateway_store::ErrorKind::InvalidOperation)
    /// if `seconds` is negative, NaN or too large for a [`Duration`].
    pub fn with_max_staleness_secs(self, seconds: f64) -> Result<Self> {
        let max_staleness = Duration::try_from_secs_f64(seconds).map_err(Error::invalid_operation)?;
        Ok(self.with_max_staleness(max_staleness))
    }

    /// Returns the consistency level.
    #[must_use]
    pub fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    /// Returns `true` if reads skip the cache.
    #[must_use]
    pub fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    /// Returns the explicitly configured maximum staleness, if any.
    #[must_use]
    pub fn max_staleness(&self) -> Option<Duration> {
        self.max_staleness
    }

    pub(crate) fn staleness_or(&self, default_ttl: Duration) -> Duration {
        self.max_staleness.unwrap_or(default_ttl)
    }
}
