//! Consistency Deduction and Dispatch
//!
//! The account consistency, per-request overrides, the derived read mode,
//! and the top-level reader that ties the read stack together.

mod level;
mod reader;

pub use level::{deduce_read_mode, ConsistencyLevel, ReadMode};
pub use reader::ConsistencyReader;
