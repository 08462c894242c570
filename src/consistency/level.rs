//! Consistency Levels and Read Modes
//!
//! The account consistency is a ceiling; a request may override it with a
//! weaker or equal level (enforcing that is the caller's concern). The read
//! mode is derived from the pair, never set directly:
//!
//! - effective Session forces a session token and `ReadMode::Any`
//! - Strong / BoundedStaleness with no override keep their strong mode
//! - everything else degrades to `ReadMode::Any` without a token

use std::fmt;

use serde::{Deserialize, Serialize};

/// Consistency levels, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    /// Linearizable reads via quorum agreement.
    Strong,
    /// Quorum agreement within a bounded lag window.
    BoundedStaleness,
    /// Read-your-own-writes via session tokens.
    Session,
    /// No ordering guarantee.
    Eventual,
    /// Writes observed in order, possibly stale.
    ConsistentPrefix,
}

impl ConsistencyLevel {
    /// Level name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::BoundedStaleness => "BoundedStaleness",
            Self::Session => "Session",
            Self::Eventual => "Eventual",
            Self::ConsistentPrefix => "ConsistentPrefix",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived read strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadMode {
    /// Quorum read with strict agreement.
    Strong,
    /// Quorum read tolerating the staleness window.
    BoundedStaleness,
    /// Any replica; selection by log position.
    Any,
    /// Primary only.
    Primary,
}

impl ReadMode {
    /// Mode name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::BoundedStaleness => "BoundedStaleness",
            Self::Any => "Any",
            Self::Primary => "Primary",
        }
    }

    /// True for the quorum-read modes.
    pub fn is_quorum(&self) -> bool {
        matches!(self, Self::Strong | Self::BoundedStaleness)
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derive `(read mode, effective consistency, use session token)` from the
/// account consistency and the per-request override.
///
/// An override equal to the account level is treated as no override.
pub fn deduce_read_mode(
    account_consistency: ConsistencyLevel,
    request_override: Option<ConsistencyLevel>,
) -> (ReadMode, ConsistencyLevel, bool) {
    let request_override = request_override.filter(|level| *level != account_consistency);
    let effective = request_override.unwrap_or(account_consistency);

    match effective {
        ConsistencyLevel::Session => (ReadMode::Any, ConsistencyLevel::Session, true),
        ConsistencyLevel::Strong if request_override.is_none() => {
            (ReadMode::Strong, ConsistencyLevel::Strong, false)
        }
        ConsistencyLevel::BoundedStaleness if request_override.is_none() => (
            ReadMode::BoundedStaleness,
            ConsistencyLevel::BoundedStaleness,
            false,
        ),
        weaker => (ReadMode::Any, weaker, false),
    }
}
