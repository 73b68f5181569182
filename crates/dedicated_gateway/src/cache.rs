// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The integrated cache.
//!
//! [`IntegratedCache`] stores point-read and query results keyed by
//! [`CacheKey`]. Freshness is decided per lookup against the caller's maximum
//! staleness, so one entry can be fresh for one request and stale for another.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use gateway_store::{Item, ItemIdentity};
use moka::{future::Cache, ops::compute::Op};
use parking_lot::Mutex;
use tick::Clock;

use crate::{CacheKey, CacheKeyBuilder};

/// The result stored in a cache entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CachedPayload {
    /// A point-read result.
    Item(Item),
    /// A query result, in store order.
    Items(Vec<Item>),
}

/// A cached result together with its insertion metadata.
///
/// Entries are cheap to clone; clones share the payload.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    payload: Arc<CachedPayload>,
    inserted_at: SystemTime,
    source_version: u64,
}

impl CacheEntry {
    fn new(payload: CachedPayload, inserted_at: SystemTime, source_version: u64) -> Self {
        Self {
            payload: Arc::new(payload),
            inserted_at,
            source_version,
        }
    }

    /// Returns the cached result.
    #[must_use]
    pub fn payload(&self) -> &CachedPayload {
        &self.payload
    }

    /// Returns the time the entry was inserted.
    #[must_use]
    pub fn inserted_at(&self) -> SystemTime {
        self.inserted_at
    }

    /// Returns the store version the entry was filled from.
    ///
    /// For query results this is the highest version among the returned items.
    #[must_use]
    pub fn source_version(&self) -> u64 {
        self.source_version
    }

    /// Returns `true` if the entry is younger than `max_staleness` at `now`.
    ///
    /// An entry inserted after `now` (the clock went backwards) is never fresh.
    #[must_use]
    pub fn is_fresh(&self, now: SystemTime, max_staleness: Duration) -> bool {
        now.duration_since(self.inserted_at)
            .is_ok_and(|age| age < max_staleness)
    }

    fn is_same_fill(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// Marks the start of a point-read fill for one item.
///
/// A fill completed with [`IntegratedCache::complete_fill`] is discarded if
/// the item was invalidated, or the cache cleared, after the ticket was taken.
/// Writes to other items do not affect the ticket.
#[derive(Debug)]
pub(crate) struct FillTicket<'a> {
    cache: &'a IntegratedCache,
    identity: ItemIdentity,
    generation: u64,
    epoch: u64,
}

impl FillTicket<'_> {
    pub(crate) fn identity(&self) -> &ItemIdentity {
        &self.identity
    }

    fn is_current(&self) -> bool {
        self.cache.epoch.load(Ordering::SeqCst) == self.epoch
            && self
                .cache
                .fills
                .lock()
                .get(&self.identity)
                .is_some_and(|fill| fill.generation == self.generation)
    }
}

impl Drop for FillTicket<'_> {
    fn drop(&mut self) {
        let mut fills = self.cache.fills.lock();
        if let Some(fill) = fills.get_mut(&self.identity) {
            fill.tickets = fill.tickets.saturating_sub(1);
            if fill.tickets == 0 {
                fills.remove(&self.identity);
            }
        }
    }
}

/// Invalidation count of an item with fills in flight.
#[derive(Debug, Default)]
struct PendingFill {
    generation: u64,
    tickets: usize,
}

/// A concurrent cache of point-read and query results.
///
/// The cache never talks to the backing store itself; the dispatcher decides
/// what to look up, store and invalidate. Only point-read entries are
/// invalidated on writes; query entries age out.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use dedicated_gateway::{CacheKeyBuilder, CachedPayload, IntegratedCache};
/// use gateway_store::{Item, ItemIdentity, Payload};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let cache = IntegratedCache::new(Clock::new_frozen());
/// let identity = ItemIdentity::new("doc", "doc");
/// let key = CacheKeyBuilder::item_key(&identity);
///
/// cache
///     .store(key.clone(), CachedPayload::Item(Item::new(identity.clone(), Payload::new(), 1)), 1)
///     .await;
/// assert!(cache.lookup(&key, Duration::from_secs(5)).await.is_some());
///
/// cache.invalidate(&identity).await;
/// assert!(cache.lookup(&key, Duration::from_secs(5)).await.is_none());
/// # });
/// ```
#[derive(Debug)]
pub struct IntegratedCache {
    entries: Cache<CacheKey, CacheEntry>,
    clock: Clock,
    // Only items with a fill in flight are tracked here.
    fills: Mutex<HashMap<ItemIdentity, PendingFill>>,
    epoch: AtomicU64,
}

impl IntegratedCache {
    /// Creates an unbounded cache.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::from_moka(Cache::builder().build(), clock)
    }

    /// Creates a cache that holds at most `max_capacity` entries.
    ///
    /// Entries beyond the capacity are evicted by moka's TinyLFU policy.
    #[must_use]
    pub fn with_max_capacity(clock: Clock, max_capacity: u64) -> Self {
        Self::from_moka(Cache::builder().max_capacity(max_capacity).build(), clock)
    }

    fn from_moka(entries: Cache<CacheKey, CacheEntry>, clock: Clock) -> Self {
        Self {
            entries,
            clock,
            fills: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Returns the entry for `key` if it is younger than `max_staleness`.
    ///
    /// A stale entry is a miss and is removed.
    pub async fn lookup(&self, key: &CacheKey, max_staleness: Duration) -> Option<CacheEntry> {
        let entry = self.entries.get(key).await?;
        if entry.is_fresh(self.clock.system_time(), max_staleness) {
            return Some(entry);
        }

        self.remove_if_same(key.clone(), &entry).await;
        None
    }

    /// Inserts or overwrites the entry for `key`, timestamped with the current time.
    pub async fn store(&self, key: CacheKey, payload: CachedPayload, source_version: u64) {
        self.insert(key, payload, source_version).await;
    }

    /// Removes the point-read entry of `identity`, if any.
    ///
    /// Query entries are left untouched. Fills of this item that started
    /// before this call are discarded.
    pub async fn invalidate(&self, identity: &ItemIdentity) {
        if let Some(fill) = self.fills.lock().get_mut(identity) {
            fill.generation += 1;
        }
        self.entries.invalidate(&CacheKeyBuilder::item_key(identity)).await;
    }

    /// Removes all entries and discards every fill in flight.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate_all();
    }

    /// Returns `true` if an entry for `key` is present, fresh or not.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of entries currently present.
    ///
    /// This walks every entry, so it costs O(n). Meant for inspection and
    /// tests, not for the request path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    /// Returns `true` if the cache holds no entries.
    ///
    /// Like [`len`](Self::len), this iterates the entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().next().is_none()
    }

    pub(crate) fn begin_fill(&self, identity: &ItemIdentity) -> FillTicket<'_> {
        let mut fills = self.fills.lock();
        let fill = fills.entry(identity.clone()).or_default();
        fill.tickets += 1;
        FillTicket {
            cache: self,
            identity: identity.clone(),
            generation: fill.generation,
            epoch: self.epoch.load(Ordering::SeqCst),
        }
    }

    /// Stores a point-read result unless an invalidation of the same item
    /// raced the fill.
    ///
    /// Returns `true` if the entry was kept.
    pub(crate) async fn complete_fill(&self, ticket: &FillTicket<'_>, item: Item) -> bool {
        if !ticket.is_current() {
            return false;
        }

        let key = CacheKeyBuilder::item_key(ticket.identity());
        let version = item.version();
        let entry = self.insert(key.clone(), CachedPayload::Item(item), version).await;

        // An invalidation that ran after the check above may have run before
        // the insert; undo the insert in that case.
        if !ticket.is_current() {
            self.remove_if_same(key, &entry).await;
            return false;
        }
        true
    }

    #[cfg(test)]
    fn pending_fills(&self) -> usize {
        self.fills.lock().len()
    }

    async fn insert(&self, key: CacheKey, payload: CachedPayload, source_version: u64) -> CacheEntry {
        let entry = CacheEntry::new(payload, self.clock.system_time(), source_version);
        self.entries.insert(key, entry.clone()).await;
        entry
    }

    async fn remove_if_same(&self, key: CacheKey, expected: &CacheEntry) {
        self.entries
            .entry(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) if current.value().is_same_fill(expected) => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
    }
}
