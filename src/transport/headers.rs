//! Wire Header Contract
//!
//! Per WIRE_PROTOCOL.md §3:
//! - Header names are bit-exact interop surface with the backend
//! - Missing numeric headers read as zero, never as an error
//! - Replica metadata (log positions, session token, charge) rides on
//!   successes and failures alike

use std::collections::BTreeMap;

use crate::request::floor_to_two_decimals;

/// Session token observed/required by the client.
pub const SESSION_TOKEN: &str = "x-ms-session-token";

/// Committed log position of the responding replica.
pub const LSN: &str = "x-ms-lsn";

/// Partition-local committed log position.
pub const LOCAL_LSN: &str = "x-ms-llsn";

/// Highest log position acknowledged by a write quorum.
pub const QUORUM_ACKED_LSN: &str = "x-ms-quorum-acked-lsn";

/// Partition-local quorum-acknowledged log position.
pub const QUORUM_ACKED_LOCAL_LSN: &str = "x-ms-quorum-acked-llsn";

/// Quorum-acknowledged position visible across regions.
pub const GLOBAL_COMMITTED_LSN: &str = "x-ms-global-committed-lsn";

/// Normalized request charge for the operation.
pub const REQUEST_CHARGE: &str = "x-ms-request-charge";

/// Numeric substatus qualifying the HTTP status.
pub const SUB_STATUS: &str = "x-ms-substatus";

/// Response headers returned by a replica.
///
/// Backed by a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseHeaders {
    map: BTreeMap<String, String>,
}

impl ResponseHeaders {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name, value);
        }
        headers
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into(), value.into());
    }

    /// Raw header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Iterate headers in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True if no headers are present.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Set a numeric header.
    pub fn set_u64(&mut self, name: &str, value: u64) {
        self.insert(name, value.to_string());
    }

    /// Set the request-charge header. Charges are floored to two decimals,
    /// never rounded up.
    pub fn set_request_charge(&mut self, charge: f64) {
        self.insert(
            REQUEST_CHARGE,
            format!("{:.2}", floor_to_two_decimals(charge)),
        );
    }

    fn u64_value(&self, name: &str) -> u64 {
        self.get(name)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// Committed log position; zero when the replica reported none.
    pub fn lsn(&self) -> u64 {
        self.u64_value(LSN)
    }

    /// Partition-local log position.
    pub fn local_lsn(&self) -> u64 {
        self.u64_value(LOCAL_LSN)
    }

    /// Quorum-acknowledged log position.
    pub fn quorum_acked_lsn(&self) -> u64 {
        self.u64_value(QUORUM_ACKED_LSN)
    }

    /// Partition-local quorum-acknowledged log position.
    pub fn quorum_acked_local_lsn(&self) -> u64 {
        self.u64_value(QUORUM_ACKED_LOCAL_LSN)
    }

    /// Cross-region committed log position.
    pub fn global_committed_lsn(&self) -> u64 {
        self.u64_value(GLOBAL_COMMITTED_LSN)
    }

    /// Numeric substatus; zero when absent.
    pub fn sub_status(&self) -> u32 {
        self.get(SUB_STATUS)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }

    /// Request charge; zero when absent or malformed.
    pub fn request_charge(&self) -> f64 {
        self.get(REQUEST_CHARGE)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Raw session token string, if present.
    pub fn session_token(&self) -> Option<&str> {
        self.get(SESSION_TOKEN)
    }
}
