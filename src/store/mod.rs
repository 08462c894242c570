//! Store Layer
//!
//! Per-replica responses, normalized results, and the reader that fans a
//! request out across a partition's replica set.

mod reader;
mod response;
mod result;

pub use reader::StoreReader;
pub use response::StoreResponse;
pub use result::{StoreOutcome, StoreResult};
