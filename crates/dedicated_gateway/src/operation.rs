// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Operations the gateway dispatches.

use std::fmt;

use gateway_store::{Error, ItemIdentity, NewItem, Payload, QueryRequest, Result};

/// An operation submitted to the gateway.
///
/// Writes (`Create`, `Replace`) always reach the backing store. Reads
/// (`PointRead`, `Query`, `ReadMany`) may be served from the integrated cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Creates a new item.
    Create(NewItem),
    /// Replaces the payload of an existing item.
    Replace {
        /// The item to replace.
        identity: ItemIdentity,
        /// The new payload.
        payload: Payload,
    },
    /// Reads one item.
    PointRead(ItemIdentity),
    /// Runs a query, optionally scoped to one partition.
    Query {
        /// The query text.
        text: String,
        /// The partition to scope the query to.
        partition_key: Option<String>,
    },
    /// Reads several items in one call.
    ReadMany(Vec<ItemIdentity>),
}

impl Operation {
    /// Creates an item with the given id, partition key and payload.
    pub fn create(id: impl Into<String>, partition_key: impl Into<String>, payload: Payload) -> Self {
        Self::Create(NewItem::new(ItemIdentity::new(id, partition_key), payload))
    }

    /// Replaces the payload of an item.
    #[must_use]
    pub fn replace(identity: ItemIdentity, payload: Payload) -> Self {
        Self::Replace { identity, payload }
    }

    /// Reads the item with the given id and partition key.
    pub fn point_read(id: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self::PointRead(ItemIdentity::new(id, partition_key))
    }

    /// Runs a container-wide query.
    pub fn query(text: impl Into<String>) -> Self {
        Self::Query {
            text: text.into(),
            partition_key: None,
        }
    }

    /// Runs a query scoped to a single partition.
    pub fn query_in_partition(text: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self::Query {
            text: text.into(),
            partition_key: Some(partition_key.into()),
        }
    }

    /// Reads all given items.
    pub fn read_many(identities: impl IntoIterator<Item = ItemIdentity>) -> Self {
        Self::ReadMany(identities.into_iter().collect())
    }

    /// Returns the kind of this operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create(_) => OperationKind::Create,
            Self::Replace { .. } => OperationKind::Replace,
            Self::PointRead(_) => OperationKind::PointRead,
            Self::Query { .. } => OperationKind::Query,
            Self::ReadMany(_) => OperationKind::ReadMany,
        }
    }

    /// Checks the operation is well formed before it is dispatched.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Create(item) => require_id(item.identity()),
            Self::Replace { identity, .. } | Self::PointRead(identity) => require_id(identity),
            Self::Query { text, .. } => QueryRequest::new(text.as_str()).validate(),
            Self::ReadMany(identities) => {
                if identities.is_empty() {
                    return Err(Error::invalid_operation("read many requires at least one identity"));
                }
                identities.iter().try_for_each(require_id)
            }
        }
    }
}

fn require_id(identity: &ItemIdentity) -> Result<()> {
    if identity.id().is_empty() {
        return Err(Error::invalid_operation("item id must not be empty"));
    }
    Ok(())
}

/// The kind of an [`Operation`], used for charge records and telemetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// [`Operation::Create`].
    Create,
    /// [`Operation::Replace`].
    Replace,
    /// [`Operation::PointRead`].
    PointRead,
    /// [`Operation::Query`].
    Query,
    /// [`Operation::ReadMany`].
    ReadMany,
}

impl OperationKind {
    /// Returns a stable name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Replace => "replace",
            Self::PointRead => "point_read",
            Self::Query => "query",
            Self::ReadMany => "read_many",
        }
    }

    /// Returns `true` for operations that modify the backing store.
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::Create | Self::Replace)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use gateway_store::ErrorKind;

    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Operation::create("a", "a", Payload::new()).kind(), OperationKind::Create);
        assert_eq!(
            Operation::replace(ItemIdentity::new("a", "a"), Payload::new()).kind(),
            OperationKind::Replace
        );
        assert_eq!(Operation::point_read("a", "a").kind(), OperationKind::PointRead);
        assert_eq!(Operation::query("SELECT * FROM c").kind(), OperationKind::Query);
        assert_eq!(Operation::read_many([ItemIdentity::new("a", "a")]).kind(), OperationKind::ReadMany);
    }

    #[test]
    fn only_creates_and_replaces_are_writes() {
        assert!(OperationKind::Create.is_write());
        assert!(OperationKind::Replace.is_write());
        assert!(!OperationKind::PointRead.is_write());
        assert!(!OperationKind::Query.is_write());
        assert!(!OperationKind::ReadMany.is_write());
    }

    #[test]
    fn malformed_operations_are_rejected() {
        let malformed = [
            Operation::point_read("", "pk"),
            Operation::create("", "pk", Payload::new()),
            Operation::query("  "),
            Operation::read_many([]),
            Operation::read_many([ItemIdentity::new("a", "a"), ItemIdentity::new("", "b")]),
        ];

        for operation in malformed {
            let error = operation.validate().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidOperation, "{operation:?}");
        }
    }

    #[test]
    fn well_formed_operations_pass() {
        Operation::point_read("a", "").validate().unwrap();
        Operation::query_in_partition("SELECT * FROM c", "pk").validate().unwrap();
        Operation::read_many([ItemIdentity::new("a", "a")]).validate().unwrap();
    }

    #[test]
    fn kind_display() {
        assert_eq!(OperationKind::ReadMany.to_string(), "read_many");
    }
}
