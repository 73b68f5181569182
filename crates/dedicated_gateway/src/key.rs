// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache keys.

use gateway_store::ItemIdentity;
use xxhash_rust::xxh3::xxh3_64;

use crate::Operation;

/// The partition scope of a cached query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryScope {
    /// The query was scoped to one logical partition.
    Partition(String),
    /// The query spanned the whole container.
    Container,
}

/// The key of an integrated cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A point-read entry.
    Item {
        /// The item id.
        id: String,
        /// The item partition key.
        partition_key: String,
    },
    /// A query result entry.
    Query {
        /// Hash of the normalized query text.
        hash: u64,
        /// The partition scope of the query.
        scope: QueryScope,
    },
}

impl CacheKey {
    /// Returns `true` if this key addresses a point-read entry.
    #[must_use]
    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item { .. })
    }
}

/// Derives cache keys from operations.
///
/// Query texts are matched exactly after normalization: leading and trailing
/// whitespace is trimmed and inner whitespace runs collapse to a single space.
/// No other equivalence is recognized, so `SELECT * FROM c` and
/// `select * from c` produce different keys.
///
/// # Examples
///
/// ```
/// use dedicated_gateway::{CacheKey, CacheKeyBuilder, Operation};
///
/// let a = CacheKeyBuilder::build_key(&Operation::query("SELECT *  FROM c"));
/// let b = CacheKeyBuilder::build_key(&Operation::query(" SELECT * FROM c "));
/// assert_eq!(a, b);
///
/// let read = CacheKeyBuilder::build_key(&Operation::point_read("doc", "pk"));
/// assert!(read.is_some_and(|key| key.is_item()));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Returns the cache key of a point read or a query.
    ///
    /// Writes have no key. Batched reads have no single key either; each of
    /// their identities is keyed with [`item_key`](Self::item_key).
    #[must_use]
    pub fn build_key(operation: &Operation) -> Option<CacheKey> {
        match operation {
            Operation::PointRead(identity) => Some(Self::item_key(identity)),
            Operation::Query { text, partition_key } => Some(Self::query_key(text, partition_key.as_deref())),
            Operation::Create(_) | Operation::Replace { .. } | Operation::ReadMany(_) => None,
        }
    }

    /// Returns the point-read key of an item.
    #[must_use]
    pub fn item_key(identity: &ItemIdentity) -> CacheKey {
        CacheKey::Item {
            id: identity.id().to_owned(),
            partition_key: identity.partition_key().to_owned(),
        }
    }

    /// Returns the key of a query result.
    #[must_use]
    pub fn query_key(text: &str, partition_key: Option<&str>) -> CacheKey {
        let scope = partition_key.map_or(QueryScope::Container, |pk| QueryScope::Partition(pk.to_owned()));
        CacheKey::Query {
            hash: xxh3_64(normalize_query(text).as_bytes()),
            scope,
        }
    }
}

fn normalize_query(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use gateway_store::Payload;

    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_query("  SELECT *\n\tFROM   c "), "SELECT * FROM c");
    }

    #[test]
    fn query_keys_are_case_sensitive() {
        assert_ne!(
            CacheKeyBuilder::query_key("SELECT * FROM c", None),
            CacheKeyBuilder::query_key("select * from c", None)
        );
    }

    #[test]
    fn query_scope_is_part_of_the_key() {
        let container = CacheKeyBuilder::query_key("SELECT * FROM c", None);
        let partition = CacheKeyBuilder::query_key("SELECT * FROM c", Some("pk"));

        assert_ne!(container, partition);
        assert!(matches!(
            partition,
            CacheKey::Query {
                scope: QueryScope::Partition(ref pk),
                ..
            } if pk == "pk"
        ));
    }

    #[test]
    fn point_read_key_matches_item_key() {
        let identity = ItemIdentity::new("doc", "pk");
        assert_eq!(
            CacheKeyBuilder::build_key(&Operation::PointRead(identity.clone())),
            Some(CacheKeyBuilder::item_key(&identity))
        );
    }

    #[test]
    fn same_id_in_different_partitions_differs() {
        assert_ne!(
            CacheKeyBuilder::item_key(&ItemIdentity::new("doc", "a")),
            CacheKeyBuilder::item_key(&ItemIdentity::new("doc", "b"))
        );
    }

    #[test]
    fn writes_and_batches_have_no_key() {
        assert!(CacheKeyBuilder::build_key(&Operation::create("a", "a", Payload::new())).is_none());
        assert!(CacheKeyBuilder::build_key(&Operation::replace(ItemIdentity::new("a", "a"), Payload::new())).is_none());
        assert!(CacheKeyBuilder::build_key(&Operation::read_many([ItemIdentity::new("a", "a")])).is_none());
    }
}
