// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Items, their identities and payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// Property names reserved for item system metadata.
///
/// These never appear inside a [`Payload`]; they are populated from the
/// item itself when it is serialized.
pub const SYSTEM_PROPERTIES: [&str; 3] = ["id", "_pk", "_etag"];

/// The opaque, schema-less body of an item.
///
/// A payload is a JSON object. System properties (see [`SYSTEM_PROPERTIES`]) are stripped
/// on construction so they cannot shadow the item's own identity or version.
///
/// # Examples
///
/// ```
/// use gateway_store::Payload;
/// use serde_json::json;
///
/// let payload = Payload::try_from(json!({ "id": "ignored", "update": true }))?;
/// assert_eq!(payload.get("update"), Some(&json!(true)));
/// assert!(payload.get("id").is_none());
/// # Ok::<(), gateway_store::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a property, if present.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.0.get(property)
    }

    /// Sets a property, returning the previous value.
    ///
    /// Writes to system properties are ignored and return `None`.
    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let property = property.into();
        if SYSTEM_PROPERTIES.contains(&property.as_str()) {
            return None;
        }
        self.0.insert(property, value.into())
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(mut map: Map<String, Value>) -> Self {
        for property in SYSTEM_PROPERTIES {
            map.remove(property);
        }
        Self(map)
    }
}

impl TryFrom<Value> for Payload {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into()),
            other => Err(Error::invalid_operation(format!(
                "item payload must be a JSON object, got `{other}`"
            ))),
        }
    }
}

/// The unique address of an item: its id within a logical partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemIdentity {
    id: String,
    partition_key: String,
}

impl ItemIdentity {
    /// Creates an identity from an id and a partition key.
    pub fn new(id: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key: partition_key.into(),
        }
    }

    /// Returns the item id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the partition key.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.id.is_empty() {
            return Err(Error::invalid_operation("item id must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.id, self.partition_key)
    }
}

/// An item that has not been written yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    identity: ItemIdentity,
    payload: Payload,
}

impl NewItem {
    /// Creates a new item with the given identity and payload.
    #[must_use]
    pub fn new(identity: ItemIdentity, payload: Payload) -> Self {
        Self { identity, payload }
    }

    /// Returns the identity the item will be written under.
    #[must_use]
    pub fn identity(&self) -> &ItemIdentity {
        &self.identity
    }

    /// Returns the item body.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Splits the item into its identity and payload.
    #[must_use]
    pub fn into_parts(self) -> (ItemIdentity, Payload) {
        (self.identity, self.payload)
    }
}

/// A stored item.
///
/// Items are owned by the backing store; everything else only holds copies.
/// The version acts as an etag: it starts at `1` when the item is created and
/// increases by one on every replace.
///
/// Serialized items carry the id and payload properties at the top level
/// alongside the `_pk` and `_etag` system properties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: String,
    #[serde(rename = "_pk")]
    partition_key: String,
    #[serde(rename = "_etag")]
    version: u64,
    #[serde(flatten)]
    payload: Payload,
}

impl Item {
    /// Creates an item from its parts.
    #[must_use]
    pub fn new(identity: ItemIdentity, payload: Payload, version: u64) -> Self {
        Self {
            id: identity.id,
            partition_key: identity.partition_key,
            version,
            payload,
        }
    }

    /// Returns the item id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the partition key.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Returns the identity of this item.
    #[must_use]
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity::new(self.id.clone(), self.partition_key.clone())
    }

    /// Returns the version (etag) of this item.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the item body.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns `true` if the item has the given identity.
    #[must_use]
    pub fn has_identity(&self, identity: &ItemIdentity) -> bool {
        self.id == identity.id && self.partition_key == identity.partition_key
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
