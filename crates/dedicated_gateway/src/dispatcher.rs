// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The gateway dispatcher.

use std::{collections::HashMap, time::Duration};

use gateway_store::{BackingStore, Error, Item, ItemIdentity, NewItem, Payload, QueryRequest, RequestCharge, Result, StoreResponse};
use tick::{Clock, FutureExt};

use crate::{
    CacheKey, CacheKeyBuilder, CachedPayload, ChargeRecord, CostAccounting, GatewayBuilder, IntegratedCache, Operation,
    OperationKind, Output, RequestOptions, Response, ServedFrom,
    telemetry::{GatewayActivity, GatewayEvent, GatewayTelemetry},
};

type Dispatched = (Response, GatewayActivity);

/// Routes operations between the integrated cache and the backing store.
///
/// Writes always reach the store and invalidate the written item's
/// point-read entry before the dispatch returns. Reads are served from the
/// cache while the cached result is younger than the request's maximum
/// staleness; otherwise they go to the store and refresh the cache.
///
/// Store errors are returned unchanged. The gateway never retries and never
/// falls back to stale data. Every completed dispatch is appended to the
/// [`CostAccounting`] log.
///
/// The dispatcher is `Send + Sync`; share it between tasks with an `Arc`.
///
/// # Examples
///
/// ```
/// use dedicated_gateway::{GatewayDispatcher, Operation, RequestOptions, ServedFrom};
/// use gateway_store::{InMemoryStore, Payload};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let gateway = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen()).build();
/// let options = RequestOptions::new();
///
/// gateway.dispatch(Operation::create("doc", "doc", Payload::new()), &options).await?;
///
/// let first = gateway.dispatch(Operation::point_read("doc", "doc"), &options).await?;
/// let second = gateway.dispatch(Operation::point_read("doc", "doc"), &options).await?;
///
/// assert_eq!(first.served_from(), ServedFrom::Store);
/// assert_eq!(second.served_from(), ServedFrom::Cache);
/// assert!(second.request_charge() < first.request_charge());
/// # Ok::<(), gateway_store::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct GatewayDispatcher<S> {
    pub(crate) name: &'static str,
    pub(crate) store: S,
    pub(crate) cache: IntegratedCache,
    pub(crate) clock: Clock,
    pub(crate) default_ttl: Duration,
    pub(crate) cache_hit_charge: RequestCharge,
    pub(crate) store_timeout: Duration,
    pub(crate) accounting: CostAccounting,
    pub(crate) telemetry: GatewayTelemetry,
}

impl<S> GatewayDispatcher<S> {
    /// Starts configuring a dispatcher in front of `store`.
    ///
    /// The clock drives staleness checks and store timeouts.
    pub fn builder(store: S, clock: Clock) -> GatewayBuilder<S> {
        GatewayBuilder::new(store, clock)
    }

    /// Returns the telemetry name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the integrated cache.
    #[must_use]
    pub fn cache(&self) -> &IntegratedCache {
        &self.cache
    }

    /// Returns the charge log.
    #[must_use]
    pub fn accounting(&self) -> &CostAccounting {
        &self.accounting
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the staleness bound of requests that do not set one.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the charge of a cache hit.
    #[must_use]
    pub fn cache_hit_charge(&self) -> RequestCharge {
        self.cache_hit_charge
    }

    /// Returns the timeout of a single store call.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }
}

impl<S> GatewayDispatcher<S>
where
    S: BackingStore,
{
    /// Dispatches one operation.
    ///
    /// # Errors
    ///
    /// - [`InvalidOperation`](gateway_store::ErrorKind::InvalidOperation) for
    ///   malformed operations (empty id, blank query, empty batch)
    /// - [`StoreUnavailable`](gateway_store::ErrorKind::StoreUnavailable) if a
    ///   store call exceeds the store timeout
    /// - any error the backing store returns, unchanged
    pub async fn dispatch(&self, operation: Operation, options: &RequestOptions) -> Result<Response> {
        let kind = operation.kind();
        let start = self.clock.instant();
        let outcome = self.execute(operation, options).await;
        let duration = self.clock.instant().saturating_duration_since(start);

        match outcome {
            Ok((response, activity)) => {
                self.accounting.record(response.charge());
                self.telemetry.record(
                    self.name,
                    &GatewayEvent {
                        served_from: Some(response.served_from()),
                        charge: Some(response.request_charge()),
                        duration: Some(duration),
                        ..GatewayEvent::new(kind, activity)
                    },
                );
                Ok(response)
            }
            Err(error) => {
                self.telemetry.record(
                    self.name,
                    &GatewayEvent {
                        duration: Some(duration),
                        error_kind: Some(error.kind()),
                        ..GatewayEvent::new(kind, GatewayActivity::Error)
                    },
                );
                Err(error)
            }
        }
    }

    async fn execute(&self, operation: Operation, options: &RequestOptions) -> Result<Dispatched> {
        operation.validate()?;

        match operation {
            Operation::Create(item) => self.create(item).await,
            Operation::Replace { identity, payload } => self.replace(&identity, payload).await,
            Operation::PointRead(identity) => self.point_read(&identity, options).await,
            Operation::Query { text, partition_key } => self.query(text, partition_key, options).await,
            Operation::ReadMany(identities) => self.read_many(&identities, options).await,
        }
    }

    async fn create(&self, item: NewItem) -> Result<Dispatched> {
        let identity = item.identity().clone();
        let response = self.call_store(self.store.create_item(item)).await?;
        Ok(self.written(OperationKind::Create, &identity, response).await)
    }

    async fn replace(&self, identity: &ItemIdentity, payload: Payload) -> Result<Dispatched> {
        let response = self.call_store(self.store.replace_item(identity, payload)).await?;
        Ok(self.written(OperationKind::Replace, identity, response).await)
    }

    async fn written(&self, kind: OperationKind, identity: &ItemIdentity, response: StoreResponse<Item>) -> Dispatched {
        self.cache.invalidate(identity).await;
        self.telemetry
            .record(self.name, &GatewayEvent::new(kind, GatewayActivity::Invalidated));

        let (item, charge) = response.into_parts();
        (Self::served_from_store(kind, Output::Item(item), charge), GatewayActivity::Written)
    }

    async fn point_read(&self, identity: &ItemIdentity, options: &RequestOptions) -> Result<Dispatched> {
        let kind = OperationKind::PointRead;
        let key = CacheKeyBuilder::item_key(identity);

        if !options.bypass_cache()
            && let Some(CachedPayload::Item(item)) = self.lookup(&key, options).await
        {
            return Ok((self.served_from_cache(kind, Output::Item(item)), GatewayActivity::Hit));
        }

        let ticket = self.cache.begin_fill(identity);
        let (item, charge) = self
            .call_store(self.store.read_item(identity, options.consistency()))
            .await?
            .into_parts();
        self.cache.complete_fill(&ticket, item.clone()).await;

        Ok((Self::served_from_store(kind, Output::Item(item), charge), miss_activity(options)))
    }

    async fn query(&self, text: String, partition_key: Option<String>, options: &RequestOptions) -> Result<Dispatched> {
        let kind = OperationKind::Query;
        let key = CacheKeyBuilder::query_key(&text, partition_key.as_deref());

        if !options.bypass_cache()
            && let Some(CachedPayload::Items(items)) = self.lookup(&key, options).await
        {
            return Ok((self.served_from_cache(kind, Output::Items(items)), GatewayActivity::Hit));
        }

        let mut request = QueryRequest::new(text).with_consistency(options.consistency());
        if let Some(partition_key) = partition_key {
            request = request.with_partition_key(partition_key);
        }

        let mut items = Vec::new();
        let mut page_charges = Vec::new();
        let mut continuation = None;
        loop {
            let (page, charge) = self
                .call_store(self.store.query(&request, continuation.take()))
                .await?
                .into_parts();
            page_charges.push(charge);

            let (page_items, next) = page.into_parts();
            items.extend(page_items);
            match next {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        let source_version = items.iter().map(Item::version).max().unwrap_or_default();
        self.cache
            .store(key, CachedPayload::Items(items.clone()), source_version)
            .await;

        let charge = page_charges.iter().sum();
        let response = Self::served_from_store(kind, Output::Items(items), charge).with_page_charges(page_charges);
        Ok((response, miss_activity(options)))
    }

    async fn read_many(&self, identities: &[ItemIdentity], options: &RequestOptions) -> Result<Dispatched> {
        let mut cached: HashMap<&ItemIdentity, Item> = HashMap::new();
        if !options.bypass_cache() {
            for identity in identities {
                if let Some(CachedPayload::Item(item)) = self.lookup(&CacheKeyBuilder::item_key(identity), options).await {
                    cached.insert(identity, item);
                }
            }
        }

        let misses: Vec<ItemIdentity> = identities
            .iter()
            .filter(|identity| !cached.contains_key(identity))
            .cloned()
            .collect();
        let hits = identities.len() - misses.len();
        let mut charge = self.cache_hit_charge * hits;

        let mut fetched: HashMap<ItemIdentity, Item> = HashMap::new();
        if !misses.is_empty() {
            let tickets: HashMap<&ItemIdentity, _> = misses
                .iter()
                .map(|identity| (identity, self.cache.begin_fill(identity)))
                .collect();
            let (items, store_charge) = self
                .call_store(self.store.read_many(&misses, options.consistency()))
                .await?
                .into_parts();
            charge += store_charge;

            for item in items {
                let identity = item.identity();
                if let Some(ticket) = tickets.get(&identity) {
                    self.cache.complete_fill(ticket, item.clone()).await;
                }
                fetched.insert(identity, item);
            }
        }

        let mut items = Vec::with_capacity(identities.len());
        let mut sources = Vec::with_capacity(identities.len());
        for identity in identities {
            if let Some(item) = cached.get(identity) {
                items.push(item.clone());
                sources.push(ServedFrom::Cache);
            } else if let Some(item) = fetched.get(identity) {
                items.push(item.clone());
                sources.push(ServedFrom::Store);
            }
        }

        let (served_from, activity) = match (hits, misses.len()) {
            (_, 0) => (ServedFrom::Cache, GatewayActivity::Hit),
            (0, _) => (ServedFrom::Store, miss_activity(options)),
            _ => (ServedFrom::Store, GatewayActivity::PartialHit),
        };
        let record = ChargeRecord::new(OperationKind::ReadMany, charge, served_from);
        Ok((Response::new(Output::Items(items), record, sources), activity))
    }

    async fn lookup(&self, key: &CacheKey, options: &RequestOptions) -> Option<CachedPayload> {
        self.cache
            .lookup(key, options.staleness_or(self.default_ttl))
            .await
            .map(|entry| entry.payload().clone())
    }

    async fn call_store<T>(&self, call: impl Future<Output = Result<StoreResponse<T>>>) -> Result<StoreResponse<T>> {
        call.timeout(&self.clock, self.store_timeout)
            .await
            .map_err(Error::unavailable)?
    }

    fn served_from_cache(&self, kind: OperationKind, output: Output) -> Response {
        let sources = vec![ServedFrom::Cache; output.items().len()];
        Response::new(output, ChargeRecord::new(kind, self.cache_hit_charge, ServedFrom::Cache), sources)
    }

    fn served_from_store(kind: OperationKind, output: Output, charge: RequestCharge) -> Response {
        let sources = vec![ServedFrom::Store; output.items().len()];
        Response::new(output, ChargeRecord::new(kind, charge, ServedFrom::Store), sources)
    }
}

fn miss_activity(options: &RequestOptions) -> GatewayActivity {
    if options.bypass_cache() {
        GatewayActivity::Bypass
    } else {
        GatewayActivity::Miss
    }
}
