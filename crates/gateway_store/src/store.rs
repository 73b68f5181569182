// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The backing store abstraction.
//!
//! [`BackingStore`] is the interface the gateway forwards cache misses and
//! writes to. Every call reports the [`RequestCharge`] it consumed.

use std::sync::Arc;

use crate::{ConsistencyLevel, Error, Item, ItemIdentity, NewItem, Payload, RequestCharge, Result};

/// A store result together with the charge the call consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreResponse<T> {
    value: T,
    charge: RequestCharge,
}

impl<T> StoreResponse<T> {
    /// Creates a response.
    pub fn new(value: T, charge: RequestCharge) -> Self {
        Self { value, charge }
    }

    /// Returns the response value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the charge of the call.
    #[must_use]
    pub fn charge(&self) -> RequestCharge {
        self.charge
    }

    /// Splits the response into its value and charge.
    #[must_use]
    pub fn into_parts(self) -> (T, RequestCharge) {
        (self.value, self.charge)
    }

    /// Maps the value, keeping the charge.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StoreResponse<U> {
        StoreResponse::new(f(self.value), self.charge)
    }
}

/// An opaque token that resumes a paged query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Continuation(String);

impl Continuation {
    /// Wraps a store-specific continuation token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A query as sent to the backing store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    text: String,
    partition_key: Option<String>,
    consistency: ConsistencyLevel,
}

impl QueryRequest {
    /// Creates a container-wide query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            partition_key: None,
            consistency: ConsistencyLevel::default(),
        }
    }

    /// Restricts the query to a single logical partition.
    #[must_use]
    pub fn with_partition_key(mut self, partition_key: impl Into<String>) -> Self {
        self.partition_key = Some(partition_key.into());
        self
    }

    /// Sets the consistency level the query runs under.
    #[must_use]
    pub fn with_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = consistency;
        self
    }

    /// Returns the query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the partition the query is scoped to, if any.
    #[must_use]
    pub fn partition_key(&self) -> Option<&str> {
        self.partition_key.as_deref()
    }

    /// Returns the consistency level.
    #[must_use]
    pub fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    /// Checks that the query is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidOperation`](crate::ErrorKind::InvalidOperation) if the text is blank.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::invalid_operation("query text must not be empty"));
        }
        Ok(())
    }
}

/// One page of query results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPage {
    items: Vec<Item>,
    continuation: Option<Continuation>,
}

impl QueryPage {
    /// Creates a page. A page without continuation is the last one.
    #[must_use]
    pub fn new(items: Vec<Item>, continuation: Option<Continuation>) -> Self {
        Self { items, continuation }
    }

    /// Returns the items of this page.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the token for the next page, or `None` on the last page.
    #[must_use]
    pub fn continuation(&self) -> Option<&Continuation> {
        self.continuation.as_ref()
    }

    /// Splits the page into its items and continuation.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Item>, Option<Continuation>) {
        (self.items, self.continuation)
    }
}

/// The item store that sits behind the gateway.
///
/// Implementations own all items. Every method resolves to a
/// [`StoreResponse`] carrying the request charge of the call, or to an
/// [`Error`] whose kind describes the failure:
///
/// - `create_item`: [`DuplicateKey`](crate::ErrorKind::DuplicateKey) if the identity exists
/// - `read_item` / `replace_item`: [`NotFound`](crate::ErrorKind::NotFound) if it does not
/// - any method: [`StoreUnavailable`](crate::ErrorKind::StoreUnavailable) on transport failures
///
/// Queries are paged: callers keep calling `query` with the continuation of
/// the previous page until a page without continuation arrives. The sequence
/// is always finite.
///
/// `read_many` silently omits identities that do not exist.
pub trait BackingStore: Send + Sync {
    /// Creates a new item with version `1`.
    fn create_item(&self, item: NewItem) -> impl Future<Output = Result<StoreResponse<Item>>> + Send;

    /// Reads a single item.
    fn read_item(&self, identity: &ItemIdentity, consistency: ConsistencyLevel) -> impl Future<Output = Result<StoreResponse<Item>>> + Send;

    /// Replaces the payload of an existing item, bumping its version.
    fn replace_item(&self, identity: &ItemIdentity, payload: Payload) -> impl Future<Output = Result<StoreResponse<Item>>> + Send;

    /// Fetches one page of query results.
    fn query(
        &self,
        request: &QueryRequest,
        continuation: Option<Continuation>,
    ) -> impl Future<Output = Result<StoreResponse<QueryPage>>> + Send;

    /// Reads several items in one round trip.
    fn read_many(
        &self,
        identities: &[ItemIdentity],
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<StoreResponse<Vec<Item>>>> + Send;
}

impl<S> BackingStore for Arc<S>
where
    S: BackingStore,
{
    fn create_item(&self, item: NewItem) -> impl Future<Output = Result<StoreResponse<Item>>> + Send {
        (**self).create_item(item)
    }

    fn read_item(&self, identity: &ItemIdentity, consistency: ConsistencyLevel) -> impl Future<Output = Result<StoreResponse<Item>>> + Send {
        (**self).read_item(identity, consistency)
    }

    fn replace_item(&self, identity: &ItemIdentity, payload: Payload) -> impl Future<Output = Result<StoreResponse<Item>>> + Send {
        (**self).replace_item(identity, payload)
    }

    fn query(
        &self,
        request: &QueryRequest,
        continuation: Option<Continuation>,
    ) -> impl Future<Output = Result<StoreResponse<QueryPage>>> + Send {
        (**self).query(request, continuation)
    }

    fn read_many(
        &self,
        identities: &[ItemIdentity],
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<StoreResponse<Vec<Item>>>> + Send {
        (**self).read_many(identities, consistency)
    }
}
