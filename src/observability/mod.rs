//! Observability
//!
//! Structured logging for the read path.
//!
//! # Principles
//!
//! 1. Observability is read-only: no side effects on selection or retries
//! 2. Synchronous, no background threads
//! 3. Deterministic output (sorted keys, typed event names)

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
