//! velodb-client - Multi-replica, multi-consistency read protocol for the
//! VeloDB partitioned document store
//!
//! Read path: consistency reader -> (quorum reader | store reader) ->
//! replicas via the transport client, with the address selector resolving
//! replica URIs and the session container tracking last-observed session
//! tokens.

pub mod address;
pub mod config;
pub mod consistency;
pub mod errors;
pub mod gateway;
pub mod observability;
pub mod quorum;
pub mod request;
pub mod session;
pub mod store;
pub mod transport;

pub use consistency::{deduce_read_mode, ConsistencyLevel, ConsistencyReader, ReadMode};
pub use errors::{ErrorKind, ReadError, ReadResult};
pub use request::{OperationType, ReadRequest, ResourceType};
pub use session::SessionToken;
pub use store::StoreResponse;
