//! Topology Retry Tests
//!
//! Partition splits, migrations, and stale address caches surface as 410s
//! with a qualifying substatus. The consistency reader owns their recovery:
//! force an address refresh, retry the whole read, and give up with
//! `ServiceUnavailable` once the deadline elapses. Everything else passes
//! through to the caller untouched.

mod common;

use std::time::Duration;

use common::{doc_request, harness, replica_set, Reply};
use velodb_client::errors::sub_status;
use velodb_client::{ConsistencyLevel, ErrorKind};

const OLD_PRIMARY: &str = "tcp://old-p:14000";
const OLD_S1: &str = "tcp://old-s1:14000";
const OLD_S2: &str = "tcp://old-s2:14000";
const NEW_PRIMARY: &str = "tcp://new-p:14000";
const NEW_S1: &str = "tcp://new-s1:14000";
const NEW_S2: &str = "tcp://new-s2:14000";

// =============================================================================
// Recovery
// =============================================================================

/// A split on the old replica set recovers through one forced address
/// refresh onto the new set.
#[tokio::test]
async fn test_split_recovers_after_address_refresh() {
    let h = harness(
        ConsistencyLevel::Eventual,
        replica_set(OLD_PRIMARY, &[OLD_S1, OLD_S2]),
    );
    for uri in [OLD_PRIMARY, OLD_S1, OLD_S2] {
        h.transport
            .script(uri, vec![Reply::error(410, sub_status::COMPLETING_SPLIT)]);
    }
    for uri in [NEW_PRIMARY, NEW_S1, NEW_S2] {
        h.transport.script(uri, vec![Reply::document(200, 200)]);
    }
    h.addresses
        .queue_refresh(replica_set(NEW_PRIMARY, &[NEW_S1, NEW_S2]));

    let response = h
        .reader
        .read(&doc_request(Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(response.log_position(), 200);
    assert_eq!(h.addresses.forced_refresh_count(), 1);
}

/// Quorum reads recover from topology errors through the same outer loop.
#[tokio::test]
async fn test_strong_read_recovers_from_partition_gone() {
    let h = harness(
        ConsistencyLevel::Strong,
        replica_set(OLD_PRIMARY, &[OLD_S1, OLD_S2]),
    );
    h.transport.script(
        OLD_PRIMARY,
        vec![Reply::error(410, sub_status::PARTITION_KEY_RANGE_GONE)],
    );
    h.transport.script(OLD_S1, vec![Reply::document(200, 200)]);
    h.transport.script(OLD_S2, vec![Reply::document(200, 200)]);
    for uri in [NEW_PRIMARY, NEW_S1, NEW_S2] {
        h.transport.script(uri, vec![Reply::document(200, 200)]);
    }
    h.addresses
        .queue_refresh(replica_set(NEW_PRIMARY, &[NEW_S1, NEW_S2]));

    let response = h
        .reader
        .read(&doc_request(Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(response.log_position(), 200);
    assert_eq!(h.addresses.forced_refresh_count(), 1);
}

// =============================================================================
// Exhaustion
// =============================================================================

/// Topology errors that never resolve exhaust the deadline with
/// `ServiceUnavailable`, refreshing addresses on every retry.
#[tokio::test]
async fn test_unresolved_split_exhausts_deadline() {
    let h = harness(
        ConsistencyLevel::Eventual,
        replica_set(OLD_PRIMARY, &[OLD_S1, OLD_S2]),
    );
    for uri in [OLD_PRIMARY, OLD_S1, OLD_S2] {
        h.transport
            .script(uri, vec![Reply::error(410, sub_status::COMPLETING_SPLIT)]);
    }

    let error = h
        .reader
        .read(&doc_request(Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::ServiceUnavailable);
    assert!(h.addresses.forced_refresh_count() >= 1);
}

// =============================================================================
// Pass-Through
// =============================================================================

/// Throttling is the caller's retry policy, not a topology problem: 429
/// surfaces immediately with no address refresh.
#[tokio::test]
async fn test_throttling_passes_through_without_refresh() {
    let h = harness(
        ConsistencyLevel::Eventual,
        replica_set(OLD_PRIMARY, &[OLD_S1, OLD_S2]),
    );
    for uri in [OLD_PRIMARY, OLD_S1, OLD_S2] {
        h.transport.script(uri, vec![Reply::error(429, 0)]);
    }

    let error = h
        .reader
        .read(&doc_request(Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::RequestRateTooLarge);
    assert_eq!(h.addresses.forced_refresh_count(), 0);
    assert_eq!(h.transport.invocation_count(), 3);
}
