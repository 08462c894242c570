//! Transport Seam
//!
//! The wire protocol (framing, TLS, connection pooling) lives behind the
//! `TransportClient` trait. The read path only requires that failures carry
//! the response headers, so log positions and substatus codes survive into
//! the error path.

pub mod headers;

use async_trait::async_trait;

pub use headers::ResponseHeaders;

use crate::address::ReplicaUri;
use crate::errors::ReadResult;
use crate::request::ReadRequest;
use crate::store::StoreResponse;

/// Invokes one operation against one replica.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Issue the request to the replica. Errors must preserve the replica's
    /// response headers via `ReadError::headers`.
    async fn invoke(&self, uri: &ReplicaUri, request: &ReadRequest) -> ReadResult<StoreResponse>;
}
