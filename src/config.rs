//! Read Engine Configuration
//!
//! Configured externally (file, env, CLI), immutable after startup. The
//! protocol itself is deadline-bounded; these knobs only control pacing and
//! the bounded-staleness tolerance window.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, ReadError, ReadResult};

/// Read engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadEngineConfig {
    /// Maximum log-position lag tolerated by BoundedStaleness before strict
    /// quorum agreement is demanded.
    pub bounded_staleness_lsn_lag: u64,

    /// Pause between barrier rounds while waiting for quorum.
    pub barrier_retry_interval_ms: u64,

    /// Pause between re-reads of replicas that have not yet caught up to the
    /// requested session token.
    pub session_retry_interval_ms: u64,

    /// Pause before retrying a read after a topology error.
    pub topology_retry_interval_ms: u64,
}

impl Default for ReadEngineConfig {
    fn default() -> Self {
        Self {
            bounded_staleness_lsn_lag: 5,
            barrier_retry_interval_ms: 30,
            session_retry_interval_ms: 20,
            topology_retry_interval_ms: 20,
        }
    }
}

impl ReadEngineConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> ReadResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReadError::new(
                ErrorKind::BadRequest,
                format!("failed to read config {}: {}", path.display(), e),
            )
        })?;
        Self::load_from_json(&content)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn load_from_json(content: &str) -> ReadResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| {
            ReadError::new(ErrorKind::BadRequest, format!("invalid config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Zero pacing intervals would turn the
    /// deadline-bounded loops into busy spins.
    pub fn validate(&self) -> ReadResult<()> {
        if self.barrier_retry_interval_ms == 0 {
            return Err(ReadError::new(
                ErrorKind::BadRequest,
                "barrier_retry_interval_ms must be greater than zero",
            ));
        }
        if self.session_retry_interval_ms == 0 {
            return Err(ReadError::new(
                ErrorKind::BadRequest,
                "session_retry_interval_ms must be greater than zero",
            ));
        }
        if self.topology_retry_interval_ms == 0 {
            return Err(ReadError::new(
                ErrorKind::BadRequest,
                "topology_retry_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Barrier pacing as a duration.
    pub fn barrier_retry_interval(&self) -> Duration {
        Duration::from_millis(self.barrier_retry_interval_ms)
    }

    /// Session admission pacing as a duration.
    pub fn session_retry_interval(&self) -> Duration {
        Duration::from_millis(self.session_retry_interval_ms)
    }

    /// Topology retry pacing as a duration.
    pub fn topology_retry_interval(&self) -> Duration {
        Duration::from_millis(self.topology_retry_interval_ms)
    }
}
