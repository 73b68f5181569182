// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`GatewayDispatcher`].

use std::time::Duration;

use gateway_store::{BackingStore, RequestCharge};
#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};
use tick::Clock;

use crate::{CostAccounting, GatewayDispatcher, IntegratedCache, telemetry::GatewayTelemetry};

const DEFAULT_NAME: &str = "gateway";
const DEFAULT_TTL: Duration = Duration::from_secs(300);
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configures and builds a [`GatewayDispatcher`].
///
/// Created by [`GatewayDispatcher::builder`].
///
/// | Setting            | Default   |
/// |--------------------|-----------|
/// | `name`             | `gateway` |
/// | `default_ttl`      | 300 s     |
/// | `cache_hit_charge` | 0 RU      |
/// | `store_timeout`    | 30 s      |
/// | `max_capacity`     | unbounded |
/// | logs / metrics     | disabled  |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use dedicated_gateway::GatewayDispatcher;
/// use gateway_store::{InMemoryStore, RequestCharge};
/// use tick::Clock;
///
/// let gateway = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen())
///     .name("orders")
///     .default_ttl(Duration::from_secs(60))
///     .cache_hit_charge(RequestCharge::new(0.1))
///     .max_capacity(10_000)
///     .logs()
///     .build();
///
/// assert_eq!(gateway.name(), "orders");
/// ```
#[derive(Debug)]
pub struct GatewayBuilder<S> {
    store: S,
    clock: Clock,
    name: &'static str,
    default_ttl: Duration,
    cache_hit_charge: RequestCharge,
    store_timeout: Duration,
    max_capacity: Option<u64>,
    logs: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl<S> GatewayBuilder<S> {
    pub(crate) fn new(store: S, clock: Clock) -> Self {
        Self {
            store,
            clock,
            name: DEFAULT_NAME,
            default_ttl: DEFAULT_TTL,
            cache_hit_charge: RequestCharge::ZERO,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_capacity: None,
            logs: false,
            #[cfg(any(feature = "metrics", test))]
            meter: None,
        }
    }

    /// Sets the name reported in telemetry.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the staleness bound used when a request does not set one.
    #[must_use]
    pub fn default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Sets the charge of a read answered from the cache.
    #[must_use]
    pub fn cache_hit_charge(mut self, charge: RequestCharge) -> Self {
        self.cache_hit_charge = charge;
        self
    }

    /// Sets how long a single store call may take before it fails with
    /// [`StoreUnavailable`](gateway_store::ErrorKind::StoreUnavailable).
    #[must_use]
    pub fn store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Bounds the number of cache entries.
    #[must_use]
    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Emits a `tracing` event for every dispatch.
    #[must_use]
    pub fn logs(mut self) -> Self {
        self.logs = true;
        self
    }

    /// Records OpenTelemetry metrics through the given provider.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the dispatcher.
    #[must_use]
    pub fn build(self) -> GatewayDispatcher<S>
    where
        S: BackingStore,
    {
        let cache = match self.max_capacity {
            Some(max_capacity) => IntegratedCache::with_max_capacity(self.clock.clone(), max_capacity),
            None => IntegratedCache::new(self.clock.clone()),
        };

        #[cfg(any(feature = "metrics", test))]
        let telemetry = GatewayTelemetry::new(self.logs, self.meter.as_ref());
        #[cfg(not(any(feature = "metrics", test)))]
        let telemetry = GatewayTelemetry::new(self.logs);

        GatewayDispatcher {
            name: self.name,
            store: self.store,
            cache,
            clock: self.clock,
            default_ttl: self.default_ttl,
            cache_hit_charge: self.cache_hit_charge,
            store_timeout: self.store_timeout,
            accounting: CostAccounting::new(),
            telemetry,
        }
    }
}

#[cfg(test)]
mod tests {
    use gateway_store::InMemoryStore;

    use super::*;

    #[test]
    fn defaults() {
        let gateway = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen()).build();

        assert_eq!(gateway.name(), DEFAULT_NAME);
        assert_eq!(gateway.default_ttl(), DEFAULT_TTL);
        assert_eq!(gateway.cache_hit_charge(), RequestCharge::ZERO);
        assert_eq!(gateway.store_timeout(), DEFAULT_STORE_TIMEOUT);
        assert!(gateway.cache().is_empty());
        assert!(gateway.accounting().is_empty());
    }

    #[test]
    fn settings_are_applied() {
        let gateway = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen())
            .name("custom")
            .default_ttl(Duration::from_secs(1))
            .cache_hit_charge(RequestCharge::new(0.5))
            .store_timeout(Duration::from_millis(10))
            .max_capacity(1)
            .build();

        assert_eq!(gateway.name(), "custom");
        assert_eq!(gateway.default_ttl(), Duration::from_secs(1));
        assert_eq!(gateway.cache_hit_charge(), RequestCharge::new(0.5));
        assert_eq!(gateway.store_timeout(), Duration::from_millis(10));
    }

    #[test]
    fn builder_debug() {
        let builder = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen()).logs();
        let debug = format!("{builder:?}");

        assert!(debug.contains("GatewayBuilder"));
        assert!(debug.contains("logs: true"));
    }
}
