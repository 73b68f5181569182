// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The consistency level a read is executed under.
///
/// Ordered from strongest to weakest. The gateway forwards the level to the
/// backing store on every store round trip; enforcing it is the store's job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    /// Reads observe the latest committed write.
    Strong,
    /// Reads lag writes by at most a bounded interval.
    BoundedStaleness,
    /// Reads observe the caller's own writes.
    #[default]
    Session,
    /// Reads never observe out-of-order writes.
    ConsistentPrefix,
    /// No ordering guarantee.
    Eventual,
}

impl ConsistencyLevel {
    /// Returns a stable name for this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::BoundedStaleness => "bounded_staleness",
            Self::Session => "session",
            Self::ConsistentPrefix => "consistent_prefix",
            Self::Eventual => "eventual",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
