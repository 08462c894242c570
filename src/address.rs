//! Replica Addressing
//!
//! Resolution and caching of replica addresses live outside this crate; the
//! read path only needs a selector it can ask for the current replica set of
//! a partition key range, with an explicit way to force a refresh after a
//! topology error.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ReadResult;

/// Address of a single replica.
///
/// Ordering is lexicographic and is used to break log-position ties
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaUri(String);

impl ReplicaUri {
    /// Wrap a resolved replica address.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replica set owning one partition key range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSet {
    /// Sole write authority for the range.
    pub primary: ReplicaUri,
    /// Read secondaries; may lag the primary.
    pub secondaries: Vec<ReplicaUri>,
}

impl ReplicaSet {
    /// Create a replica set.
    pub fn new(primary: ReplicaUri, secondaries: Vec<ReplicaUri>) -> Self {
        Self {
            primary,
            secondaries,
        }
    }

    /// Total replica count, primary included.
    pub fn len(&self) -> usize {
        1 + self.secondaries.len()
    }

    /// A replica set always has at least its primary.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Resolves replica addresses for a partition key range.
///
/// `force_refresh` bypasses any cache the implementation keeps; the
/// consistency reader sets it after topology errors.
#[async_trait]
pub trait AddressSelector: Send + Sync {
    /// Resolve the full replica set for a partition key range.
    async fn resolve_replicas(
        &self,
        partition_key_range_id: &str,
        force_refresh: bool,
    ) -> ReadResult<ReplicaSet>;

    /// Resolve the primary replica for a partition key range.
    async fn resolve_primary(
        &self,
        partition_key_range_id: &str,
        force_refresh: bool,
    ) -> ReadResult<ReplicaUri>;
}
