//! Store Response
//!
//! Successful reply from one replica: status, headers, payload. The read
//! path consumes the header metadata; payload bytes pass through untouched.

use crate::session::SessionToken;
use crate::transport::headers::ResponseHeaders;

/// Replica response as handed back by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    /// HTTP status of the reply.
    pub status: u16,
    /// Response headers.
    pub headers: ResponseHeaders,
    /// Raw payload bytes; empty for barrier reads.
    pub payload: Vec<u8>,
}

impl StoreResponse {
    /// Create a response.
    pub fn new(status: u16, headers: ResponseHeaders, payload: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            payload,
        }
    }

    /// Committed log position reported by the replica.
    pub fn log_position(&self) -> u64 {
        self.headers.lsn()
    }

    /// Session token on the reply, if parseable. Malformed tokens read as
    /// absent.
    pub fn session_token(&self) -> Option<SessionToken> {
        self.headers.session_token().and_then(SessionToken::try_parse)
    }

    /// Charge reported by the replica.
    pub fn request_charge(&self) -> f64 {
        self.headers.request_charge()
    }

    /// Overwrite the charge header with the call's aggregate, floored to two
    /// decimals. Applied once, when the response becomes authoritative.
    pub fn set_aggregated_charge(&mut self, total: f64) {
        self.headers.set_request_charge(total);
    }
}
