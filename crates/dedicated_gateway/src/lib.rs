// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A dedicated gateway with an integrated, read-through cache.
//!
//! The gateway sits in front of a [`BackingStore`](gateway_store::BackingStore)
//! and routes every [`Operation`] either to its in-memory cache or to the
//! store:
//!
//! - Point reads, queries and batched reads are served from the cache while
//!   the cached result is younger than the request's maximum staleness.
//! - Misses, bypassed reads and stale entries go to the store and refresh the
//!   cache.
//! - Creates and replaces always go to the store and invalidate the written
//!   item's point-read entry before the dispatch returns.
//!
//! Every dispatch returns a [`Response`] that carries the request charge, in
//! request units, and reports whether the result came from the cache or the
//! store. All charges are collected in the [`CostAccounting`] log.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use dedicated_gateway::{GatewayDispatcher, Operation, RequestOptions, ServedFrom};
//! use gateway_store::{InMemoryStore, Payload, RequestCharge};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let gateway = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen())
//!     .default_ttl(Duration::from_secs(60))
//!     .build();
//!
//! let mut payload = Payload::new();
//! payload.insert("isDemo", true);
//! gateway.dispatch(Operation::create("doc-1", "doc-1", payload), &RequestOptions::new()).await?;
//!
//! let query = Operation::query("SELECT * FROM c");
//! let first = gateway.dispatch(query.clone(), &RequestOptions::new()).await?;
//! let second = gateway.dispatch(query.clone(), &RequestOptions::new()).await?;
//! assert_eq!(second.served_from(), ServedFrom::Cache);
//!
//! // Bypassing the cache always reaches the store.
//! let bypassed = gateway
//!     .dispatch(query, &RequestOptions::new().with_bypass_cache(true))
//!     .await?;
//! assert_eq!(bypassed.served_from(), ServedFrom::Store);
//! assert_eq!(bypassed.request_charge(), first.request_charge());
//!
//! let total: RequestCharge = gateway.accounting().total();
//! assert!(total > RequestCharge::ZERO);
//! # Ok::<(), gateway_store::Error>(())
//! # });
//! ```
//!
//! # Features
//!
//! - `metrics`: records OpenTelemetry counters and histograms through
//!   [`GatewayBuilder::metrics`].
//! - `service`: implements [`layered::Service`] for [`GatewayDispatcher`].
//! - `test-util`: enables the controllable clock of `tick` for tests.

mod accounting;
mod builder;
mod cache;
mod dispatcher;
mod key;
mod operation;
mod options;
mod response;
#[cfg(feature = "service")]
mod service;
mod telemetry;

#[doc(inline)]
pub use accounting::{AccountingMark, AccountingSummary, ChargeRecord, CostAccounting, ServedFrom};
#[doc(inline)]
pub use builder::GatewayBuilder;
#[doc(inline)]
pub use cache::{CacheEntry, CachedPayload, IntegratedCache};
#[doc(inline)]
pub use dispatcher::GatewayDispatcher;
#[doc(inline)]
pub use key::{CacheKey, CacheKeyBuilder, QueryScope};
#[doc(inline)]
pub use operation::{Operation, OperationKind};
#[doc(inline)]
pub use options::RequestOptions;
#[doc(inline)]
pub use response::{Output, Response};
#[cfg(feature = "service")]
#[doc(inline)]
pub use service::GatewayRequest;
