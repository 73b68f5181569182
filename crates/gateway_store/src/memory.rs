// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory backing store.
//!
//! [`InMemoryStore`] keeps items in an ordered map, charges every call
//! according to a [`ChargeSchedule`], records all operations and supports
//! failure and stall injection for exercising error paths.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::{Mutex, RwLock};

use crate::{
    BackingStore, ConsistencyLevel, Continuation, Error, Item, ItemIdentity, NewItem, Payload, QueryPage, QueryRequest,
    RequestCharge, Result, StoreResponse,
};

const DEFAULT_PAGE_SIZE: usize = 100;
const OFFSET_PREFIX: &str = "offset:";

/// The request charges an [`InMemoryStore`] reports.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChargeSchedule {
    /// Charge of a create or replace.
    pub write: RequestCharge,
    /// Charge of a point read.
    pub point_read: RequestCharge,
    /// Charge per requested identity of a batched read.
    pub read_many_per_item: RequestCharge,
    /// Fixed charge of every query page.
    pub query_page: RequestCharge,
    /// Additional charge per item returned by a query page.
    pub query_per_item: RequestCharge,
}

impl Default for ChargeSchedule {
    fn default() -> Self {
        Self {
            write: RequestCharge::new(6.0),
            point_read: RequestCharge::new(1.0),
            read_many_per_item: RequestCharge::new(1.0),
            query_page: RequestCharge::new(2.5),
            query_per_item: RequestCharge::new(0.5),
        }
    }
}

/// A call recorded by [`InMemoryStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// `create_item` for the given identity.
    Create(ItemIdentity),
    /// `read_item` for the given identity.
    Read(ItemIdentity),
    /// `replace_item` for the given identity.
    Replace(ItemIdentity),
    /// `query` with the given text and partition scope.
    Query {
        /// The query text.
        text: String,
        /// The partition the query was scoped to.
        partition_key: Option<String>,
    },
    /// `read_many` for the given identities.
    ReadMany(Vec<ItemIdentity>),
}

type OpPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A backing store that keeps items in memory.
///
/// Clones share the same items, operation log and injection rules.
///
/// The store does not evaluate query text: every query returns all items in
/// its partition scope, ordered by id, split into pages of
/// [`page_size`](Self::with_page_size) items.
///
/// # Examples
///
/// ```
/// use gateway_store::{BackingStore, ConsistencyLevel, InMemoryStore, ItemIdentity, NewItem, Payload};
/// # futures::executor::block_on(async {
///
/// let store = InMemoryStore::new();
/// let identity = ItemIdentity::new("doc-1", "doc-1");
///
/// store.create_item(NewItem::new(identity.clone(), Payload::new())).await?;
/// let response = store.read_item(&identity, ConsistencyLevel::Session).await?;
/// assert_eq!(response.value().version(), 1);
/// # Ok::<(), gateway_store::Error>(())
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use gateway_store::{BackingStore, ConsistencyLevel, ErrorKind, InMemoryStore, ItemIdentity, StoreOp};
/// # futures::executor::block_on(async {
///
/// let store = InMemoryStore::new();
/// store.fail_when(|op| matches!(op, StoreOp::Read(_)));
///
/// let error = store
///     .read_item(&ItemIdentity::new("a", "a"), ConsistencyLevel::Session)
///     .await
///     .unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::StoreUnavailable);
/// # });
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    items: Arc<RwLock<BTreeMap<ItemIdentity, Item>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<OpPredicate>>>,
    stall_when: Arc<Mutex<Option<OpPredicate>>>,
    charges: ChargeSchedule,
    page_size: usize,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("items", &self.items.read().len())
            .field("charges", &self.charges)
            .field("page_size", &self.page_size)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("stall_when", &self.stall_when.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with the default charge schedule.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(BTreeMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            stall_when: Arc::new(Mutex::new(None)),
            charges: ChargeSchedule::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Replaces the charge schedule.
    #[must_use]
    pub fn with_charges(mut self, charges: ChargeSchedule) -> Self {
        self.charges = charges;
        self
    }

    /// Sets the maximum number of items per query page. Zero is treated as one.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the charge schedule.
    #[must_use]
    pub fn charges(&self) -> &ChargeSchedule {
        &self.charges
    }

    /// Returns a copy of a stored item without recording an operation.
    #[must_use]
    pub fn peek(&self, identity: &ItemIdentity) -> Option<Item> {
        self.items.read().get(identity).cloned()
    }

    /// Returns the number of stored items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.read().len()
    }

    /// Makes operations matching the predicate fail with
    /// [`StoreUnavailable`](crate::ErrorKind::StoreUnavailable).
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Makes operations matching the predicate never complete.
    pub fn stall_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.stall_when.lock() = Some(Box::new(predicate));
    }

    /// Removes all failure and stall rules.
    pub fn clear_injections(&self) {
        *self.fail_when.lock() = None;
        *self.stall_when.lock() = None;
    }

    /// Returns a copy of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears the operation log.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    async fn intercept(&self, op: StoreOp) -> Result<()> {
        let stall = Self::matches(&self.stall_when, &op);
        let fail = Self::matches(&self.fail_when, &op);
        self.operations.lock().push(op);

        if stall {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(Error::unavailable("injected store failure"));
        }
        Ok(())
    }

    fn matches(rule: &Mutex<Option<OpPredicate>>, op: &StoreOp) -> bool {
        rule.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn parse_offset(continuation: Option<&Continuation>) -> Result<usize> {
        let Some(continuation) = continuation else {
            return Ok(0);
        };

        continuation
            .as_str()
            .strip_prefix(OFFSET_PREFIX)
            .and_then(|offset| offset.parse().ok())
            .ok_or_else(|| Error::invalid_operation(format!("malformed continuation token `{}`", continuation.as_str())))
    }
}

impl BackingStore for InMemoryStore {
    async fn create_item(&self, item: NewItem) -> Result<StoreResponse<Item>> {
        item.identity().validate()?;
        self.intercept(StoreOp::Create(item.identity().clone())).await?;

        let (identity, payload) = item.into_parts();
        let mut items = self.items.write();
        if items.contains_key(&identity) {
            return Err(Error::duplicate_key(&identity));
        }

        let created = Item::new(identity.clone(), payload, 1);
        items.insert(identity, created.clone());
        Ok(StoreResponse::new(created, self.charges.write))
    }

    async fn read_item(&self, identity: &ItemIdentity, _consistency: ConsistencyLevel) -> Result<StoreResponse<Item>> {
        identity.validate()?;
        self.intercept(StoreOp::Read(identity.clone())).await?;

        self.peek(identity)
            .map(|item| StoreResponse::new(item, self.charges.point_read))
            .ok_or_else(|| Error::not_found(identity))
    }

    async fn replace_item(&self, identity: &ItemIdentity, payload: Payload) -> Result<StoreResponse<Item>> {
        identity.validate()?;
        self.intercept(StoreOp::Replace(identity.clone())).await?;

        let mut items = self.items.write();
        let existing = items.get_mut(identity).ok_or_else(|| Error::not_found(identity))?;
        *existing = Item::new(identity.clone(), payload, existing.version() + 1);
        Ok(StoreResponse::new(existing.clone(), self.charges.write))
    }

    async fn query(&self, request: &QueryRequest, continuation: Option<Continuation>) -> Result<StoreResponse<QueryPage>> {
        request.validate()?;
        let offset = Self::parse_offset(continuation.as_ref())?;
        self.intercept(StoreOp::Query {
            text: request.text().to_owned(),
            partition_key: request.partition_key().map(str::to_owned),
        })
        .await?;

        let items = self.items.read();
        let in_scope: Vec<&Item> = items
            .values()
            .filter(|item| request.partition_key().is_none_or(|pk| item.partition_key() == pk))
            .collect();

        let page: Vec<Item> = in_scope.iter().skip(offset).take(self.page_size).map(|item| (*item).clone()).collect();
        let next = offset + page.len();
        let continuation = (next < in_scope.len()).then(|| Continuation::new(format!("{OFFSET_PREFIX}{next}")));

        let charge = self.charges.query_page + self.charges.query_per_item * page.len();
        Ok(StoreResponse::new(QueryPage::new(page, continuation), charge))
    }

    async fn read_many(&self, identities: &[ItemIdentity], _consistency: ConsistencyLevel) -> Result<StoreResponse<Vec<Item>>> {
        for identity in identities {
            identity.validate()?;
        }
        self.intercept(StoreOp::ReadMany(identities.to_vec())).await?;

        let items = self.items.read();
        let found = identities.iter().filter_map(|identity| items.get(identity).cloned()).collect();
        Ok(StoreResponse::new(found, self.charges.read_many_per_item * identities.len()))
    }
}
