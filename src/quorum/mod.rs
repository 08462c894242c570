//! Quorum Reads
//!
//! Strong and BoundedStaleness read orchestration: quorum detection over
//! replica log positions and barrier catch-up rounds.

mod reader;

pub use reader::QuorumReader;
