//! Session Consistency Support
//!
//! Session tokens and the container tracking the client's last observations
//! per partition key range.

mod container;
mod token;

pub use container::{LocalSessionContainer, SessionContainer};
pub use token::SessionToken;
