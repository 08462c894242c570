//! Read Request Context
//!
//! Context carried through one logical read call: the target partition key
//! range, the operation and resource kinds, the per-request consistency
//! override, the shared deadline, and the charge accumulator that every
//! contacted replica contributes to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::consistency::ConsistencyLevel;

/// Operation kinds issued by the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Document or metadata read.
    Read,
    /// Barrier read: forces the replica to report its current committed
    /// positions without returning a payload.
    Head,
}

impl OperationType {
    /// Operation name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Head => "head",
        }
    }

    /// True for barrier reads.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Self::Head)
    }
}

/// Resource kinds a read can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// User document data.
    Document,
    /// Collection metadata.
    Collection,
    /// Database metadata.
    Database,
    /// Partition key range metadata.
    PartitionKeyRange,
}

impl ResourceType {
    /// Master (metadata) resources use the system-configured replica counts;
    /// documents use the user-configured counts.
    pub fn is_master(&self) -> bool {
        !matches!(self, Self::Document)
    }
}

/// Accumulates request charge across concurrently contacted replicas.
///
/// Stored as f64 bits in an atomic so replica tasks can add without a lock.
#[derive(Debug, Default)]
pub struct ChargeAccumulator {
    bits: AtomicU64,
}

impl ChargeAccumulator {
    /// Create a zeroed accumulator.
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0.0f64.to_bits()),
        }
    }

    /// Add one replica's charge.
    pub fn add(&self, charge: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                Some((f64::from_bits(bits) + charge).to_bits())
            });
    }

    /// Total charge accumulated so far.
    pub fn total(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Round a charge down to two decimals.
pub fn floor_to_two_decimals(charge: f64) -> f64 {
    (charge * 100.0).floor() / 100.0
}

/// One logical read call.
///
/// Cloning shares the charge accumulator and deadline; barrier requests
/// derived from a read contribute to the same call totals.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// Partition key range the read targets.
    pub partition_key_range_id: String,
    /// Read or barrier.
    pub operation_type: OperationType,
    /// Resource kind, deciding user vs system replica counts.
    pub resource_type: ResourceType,
    /// Resource path handed to the transport.
    pub resource_link: String,
    /// Per-request consistency override; must be weaker than or equal to the
    /// account consistency (enforced by the caller).
    pub consistency_override: Option<ConsistencyLevel>,
    /// Shared deadline for every attempt, barrier round, and topology retry.
    pub deadline: Instant,
    /// Activity id for correlating logs.
    pub activity_id: Uuid,
    /// Charge accumulator shared across all replica calls of this read.
    pub charge: Arc<ChargeAccumulator>,
}

impl ReadRequest {
    /// Create a read with a deadline `timeout` from now.
    pub fn new(
        partition_key_range_id: impl Into<String>,
        resource_type: ResourceType,
        resource_link: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            partition_key_range_id: partition_key_range_id.into(),
            operation_type: OperationType::Read,
            resource_type,
            resource_link: resource_link.into(),
            consistency_override: None,
            deadline: Instant::now() + timeout,
            activity_id: Uuid::new_v4(),
            charge: Arc::new(ChargeAccumulator::new()),
        }
    }

    /// Set a per-request consistency override.
    pub fn with_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_override = Some(level);
        self
    }

    /// Time left before the deadline; `None` once it has elapsed.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
    }

    /// True once the deadline has elapsed.
    pub fn is_expired(&self) -> bool {
        self.remaining_time().is_none()
    }

    /// Derive the barrier request for this read: same call context, `Head`
    /// operation, shared charge accumulator and deadline.
    pub fn barrier(&self) -> ReadRequest {
        let mut barrier = self.clone();
        barrier.operation_type = OperationType::Head;
        barrier
    }
}
