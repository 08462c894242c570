//! Store Result
//!
//! Normalized outcome of one replica call: success or typed failure, both
//! carrying the replica's log-position metadata and session token extracted
//! from the response headers. A result is never mutated after creation;
//! exactly one result per read call becomes authoritative.

use crate::address::ReplicaUri;
use crate::errors::{ReadError, ReadResult};
use crate::session::SessionToken;
use crate::transport::headers::ResponseHeaders;

use super::response::StoreResponse;

/// Success payload or typed failure.
#[derive(Debug, Clone)]
pub enum StoreOutcome {
    /// The replica answered the read.
    Success(StoreResponse),
    /// The replica failed the read; headers preserved on the error.
    Failure(ReadError),
}

/// Outcome of one replica call within one attempt.
#[derive(Debug, Clone)]
pub struct StoreResult {
    /// Replica that produced this result.
    pub replica_uri: ReplicaUri,
    /// Committed log position; zero when the replica reported none.
    pub log_position: u64,
    /// Partition-local committed log position.
    pub local_log_position: u64,
    /// Quorum-acknowledged log position.
    pub quorum_acked_log_position: u64,
    /// Partition-local quorum-acknowledged log position.
    pub quorum_acked_local_log_position: u64,
    /// Cross-region committed log position.
    pub global_committed_log_position: u64,
    /// Session token on the reply, if parseable.
    pub session_token: Option<SessionToken>,
    /// Charge reported by this replica.
    pub request_charge: f64,
    /// Success payload or typed failure.
    pub outcome: StoreOutcome,
}

impl StoreResult {
    /// Normalize a successful replica response.
    pub fn from_response(replica_uri: ReplicaUri, response: StoreResponse) -> Self {
        let headers = response.headers.clone();
        Self::build(replica_uri, &headers, StoreOutcome::Success(response))
    }

    /// Normalize a typed replica failure; metadata comes from the headers
    /// the error preserved.
    pub fn from_failure(replica_uri: ReplicaUri, error: ReadError) -> Self {
        let headers = error.headers.clone();
        Self::build(replica_uri, &headers, StoreOutcome::Failure(error))
    }

    fn build(replica_uri: ReplicaUri, headers: &ResponseHeaders, outcome: StoreOutcome) -> Self {
        Self {
            replica_uri,
            log_position: headers.lsn(),
            local_log_position: headers.local_lsn(),
            quorum_acked_log_position: headers.quorum_acked_lsn(),
            quorum_acked_local_log_position: headers.quorum_acked_local_lsn(),
            global_committed_log_position: headers.global_committed_lsn(),
            session_token: headers.session_token().and_then(SessionToken::try_parse),
            request_charge: headers.request_charge(),
            outcome,
        }
    }

    /// Headers of the underlying response or failure.
    pub fn headers(&self) -> &ResponseHeaders {
        match &self.outcome {
            StoreOutcome::Success(response) => &response.headers,
            StoreOutcome::Failure(error) => &error.headers,
        }
    }

    /// True for successful replies.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StoreOutcome::Success(_))
    }

    /// True when the replica answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            &self.outcome,
            StoreOutcome::Failure(error) if error.status == 404
        )
    }

    /// True when the replica reported a usable committed position.
    pub fn has_valid_log_position(&self) -> bool {
        self.log_position > 0
    }

    /// Turn the authoritative result into the call's terminal outcome,
    /// stamping the aggregated charge (floored to two decimals) onto the
    /// response or error headers.
    pub fn into_authoritative_response(self, aggregated_charge: f64) -> ReadResult<StoreResponse> {
        match self.outcome {
            StoreOutcome::Success(mut response) => {
                response.set_aggregated_charge(aggregated_charge);
                Ok(response)
            }
            StoreOutcome::Failure(mut error) => {
                error.headers.set_request_charge(aggregated_charge);
                Err(error)
            }
        }
    }
}
