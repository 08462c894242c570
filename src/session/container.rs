//! Session Container
//!
//! Tracks the client's last-observed session token per partition key range.
//! The read path resolves the token before admission checks and records the
//! authoritative result's token once, after selection (single writer).

use std::collections::HashMap;
use std::sync::RwLock;

use super::token::SessionToken;
use crate::request::ReadRequest;

/// Source of the client's last-known session tokens.
pub trait SessionContainer: Send + Sync {
    /// Token the client last observed for the partition key range, if any.
    fn resolve_partition_local_session_token(
        &self,
        request: &ReadRequest,
        partition_key_range_id: &str,
    ) -> Option<SessionToken>;

    /// Record a token observed on an authoritative response. Implementations
    /// must merge, never regress.
    fn record_session_token(&self, partition_key_range_id: &str, token: &SessionToken);
}

/// In-memory session container.
#[derive(Debug, Default)]
pub struct LocalSessionContainer {
    tokens: RwLock<HashMap<String, SessionToken>>,
}

impl LocalSessionContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionContainer for LocalSessionContainer {
    fn resolve_partition_local_session_token(
        &self,
        _request: &ReadRequest,
        partition_key_range_id: &str,
    ) -> Option<SessionToken> {
        match self.tokens.read() {
            Ok(tokens) => tokens.get(partition_key_range_id).cloned(),
            Err(_) => None,
        }
    }

    fn record_session_token(&self, partition_key_range_id: &str, token: &SessionToken) {
        if let Ok(mut tokens) = self.tokens.write() {
            let merged = match tokens.get(partition_key_range_id) {
                Some(existing) => existing.merge(token),
                None => token.clone(),
            };
            tokens.insert(partition_key_range_id.to_string(), merged);
        }
    }
}
