// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Item model and backing store abstraction for the dedicated gateway.
//!
//! This crate defines what the gateway cache sits in front of:
//!
//! - [`Item`], [`ItemIdentity`] and [`Payload`]: the stored data
//! - [`BackingStore`]: the async interface every store implements
//! - [`RequestCharge`]: the unit cost every store call reports
//! - [`Error`] and [`ErrorKind`]: the failure taxonomy shared with the gateway
//! - [`InMemoryStore`]: a store that keeps everything in memory, with
//!   configurable charges and failure injection
//!
//! # Implementing a Backing Store
//!
//! Implement every method of [`BackingStore`]; each returns the value together
//! with the charge of the call:
//!
//! ```
//! use gateway_store::{
//!     BackingStore, ConsistencyLevel, Continuation, Error, Item, ItemIdentity, NewItem, Payload, QueryPage,
//!     QueryRequest, RequestCharge, Result, StoreResponse,
//! };
//!
//! struct EmptyStore;
//!
//! impl BackingStore for EmptyStore {
//!     async fn create_item(&self, _item: NewItem) -> Result<StoreResponse<Item>> {
//!         Err(Error::unavailable("read-only store"))
//!     }
//!
//!     async fn read_item(&self, identity: &ItemIdentity, _consistency: ConsistencyLevel) -> Result<StoreResponse<Item>> {
//!         Err(Error::not_found(identity))
//!     }
//!
//!     async fn replace_item(&self, identity: &ItemIdentity, _payload: Payload) -> Result<StoreResponse<Item>> {
//!         Err(Error::not_found(identity))
//!     }
//!
//!     async fn query(&self, _request: &QueryRequest, _continuation: Option<Continuation>) -> Result<StoreResponse<QueryPage>> {
//!         Ok(StoreResponse::new(QueryPage::default(), RequestCharge::new(1.0)))
//!     }
//!
//!     async fn read_many(&self, _identities: &[ItemIdentity], _consistency: ConsistencyLevel) -> Result<StoreResponse<Vec<Item>>> {
//!         Ok(StoreResponse::new(Vec::new(), RequestCharge::ZERO))
//!     }
//! }
//! ```

mod charge;
mod consistency;
pub mod error;
mod item;
pub mod memory;
pub mod store;

#[doc(inline)]
pub use charge::RequestCharge;
#[doc(inline)]
pub use consistency::ConsistencyLevel;
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use item::{Item, ItemIdentity, NewItem, Payload, SYSTEM_PROPERTIES};
#[doc(inline)]
pub use memory::{ChargeSchedule, InMemoryStore, StoreOp};
#[doc(inline)]
pub use store::{BackingStore, Continuation, QueryPage, QueryRequest, StoreResponse};
