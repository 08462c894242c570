//! Quorum Reader
//!
//! Per READ_PROTOCOL.md §5:
//! - A strong read is correct when at least a read quorum of replicas has
//!   quorum-acknowledged the candidate position (the highest position any
//!   contacted replica reported)
//! - When replicas disagree, barrier reads push them to report their true
//!   committed positions until they converge or the deadline elapses
//! - BoundedStaleness tolerates a configured position lag before demanding
//!   strict agreement
//!
//! Barrier rounds are sequential relative to each other; each round's
//! replica calls are concurrent. Round count is bounded by the remaining
//! time budget, never by a fixed constant.

use std::sync::Arc;

use crate::config::ReadEngineConfig;
use crate::consistency::ReadMode;
use crate::errors::{ReadError, ReadResult};
use crate::gateway::ServiceConfigurationReader;
use crate::observability::{Event, Logger};
use crate::request::ReadRequest;
use crate::store::{StoreReader, StoreResponse, StoreResult};

/// Outcome of one barrier wait.
enum BarrierOutcome {
    /// Enough replicas quorum-acknowledged the candidate position.
    QuorumReached,
    /// A replica reported a position past the candidate; the data read must
    /// be reissued at the newer position.
    CandidateAdvanced,
}

/// Orchestrates Strong and BoundedStaleness reads over the store reader.
pub struct QuorumReader {
    store_reader: Arc<StoreReader>,
    service_config: Arc<dyn ServiceConfigurationReader>,
    config: Arc<ReadEngineConfig>,
}

impl QuorumReader {
    /// Create a quorum reader.
    pub fn new(
        store_reader: Arc<StoreReader>,
        service_config: Arc<dyn ServiceConfigurationReader>,
        config: Arc<ReadEngineConfig>,
    ) -> Self {
        Self {
            store_reader,
            service_config,
            config,
        }
    }

    /// Read with quorum agreement at the requested strength.
    ///
    /// Fails fast with `ServiceUnavailable` when fewer than a read quorum of
    /// replicas are reachable, and with the same error when the deadline
    /// elapses without agreement.
    pub async fn read_strong(
        &self,
        request: &ReadRequest,
        replica_count_to_read: usize,
        read_mode: ReadMode,
        force_address_refresh: bool,
    ) -> ReadResult<StoreResponse> {
        let read_quorum = self.read_quorum(request);
        let mut force_refresh = force_address_refresh;

        loop {
            if request.is_expired() {
                return Err(ReadError::service_unavailable(
                    "quorum not established before the deadline",
                ));
            }

            let results = self
                .store_reader
                .read_multiple_replicas_detailed(
                    request,
                    true,
                    replica_count_to_read,
                    true,
                    force_refresh,
                )
                .await?;
            force_refresh = false;

            if results.len() < read_quorum {
                return Err(ReadError::service_unavailable(format!(
                    "only {} of the required {} replicas are reachable",
                    results.len(),
                    read_quorum
                )));
            }

            // The candidate is the highest position any replica reported.
            let Some(selected) = select_max_position(&results) else {
                return Err(ReadError::service_unavailable(
                    "no replica reported a committed log position",
                ));
            };
            let candidate = selected.log_position;

            if self.quorum_met(&results, candidate, read_quorum, read_mode) {
                let candidate_text = candidate.to_string();
                Logger::info(
                    Event::QuorumMet,
                    &[
                        ("candidate_lsn", &candidate_text),
                        ("pk_range_id", &request.partition_key_range_id),
                    ],
                );
                return selected
                    .clone()
                    .into_authoritative_response(request.charge.total());
            }

            let candidate_text = candidate.to_string();
            let replica_text = results.len().to_string();
            Logger::warn(
                Event::QuorumNotMet,
                &[
                    ("candidate_lsn", &candidate_text),
                    ("pk_range_id", &request.partition_key_range_id),
                    ("replicas", &replica_text),
                ],
            );

            match self
                .wait_for_barrier_quorum(request, replica_count_to_read, candidate, read_quorum, read_mode)
                .await?
            {
                BarrierOutcome::QuorumReached => {
                    return selected
                        .clone()
                        .into_authoritative_response(request.charge.total());
                }
                BarrierOutcome::CandidateAdvanced => {
                    Logger::trace(
                        Event::CandidateAdvanced,
                        &[("pk_range_id", &request.partition_key_range_id)],
                    );
                    // Re-read the data at the newer position.
                    continue;
                }
            }
        }
    }

    /// Issue barrier rounds until the candidate is quorum-acknowledged, a
    /// replica moves past it, or the deadline elapses.
    async fn wait_for_barrier_quorum(
        &self,
        request: &ReadRequest,
        replica_count_to_read: usize,
        candidate: u64,
        read_quorum: usize,
        read_mode: ReadMode,
    ) -> ReadResult<BarrierOutcome> {
        let barrier_request = request.barrier();

        loop {
            let Some(remaining) = request.remaining_time() else {
                return Err(ReadError::service_unavailable(
                    "quorum not established before the deadline",
                ));
            };
            tokio::time::sleep(self.config.barrier_retry_interval().min(remaining)).await;
            if request.is_expired() {
                return Err(ReadError::service_unavailable(
                    "quorum not established before the deadline",
                ));
            }

            let results = self
                .store_reader
                .read_multiple_replicas_detailed(
                    &barrier_request,
                    true,
                    replica_count_to_read,
                    true,
                    false,
                )
                .await?;

            let candidate_text = candidate.to_string();
            let replica_text = results.len().to_string();
            Logger::trace(
                Event::BarrierRound,
                &[
                    ("candidate_lsn", &candidate_text),
                    ("pk_range_id", &request.partition_key_range_id),
                    ("replicas", &replica_text),
                ],
            );

            if results
                .iter()
                .any(|result| result.log_position > candidate)
            {
                return Ok(BarrierOutcome::CandidateAdvanced);
            }
            if self.quorum_met(&results, candidate, read_quorum, read_mode) {
                return Ok(BarrierOutcome::QuorumReached);
            }
        }
    }

    /// Quorum holds when at least `read_quorum` replicas quorum-acknowledged
    /// the candidate position. BoundedStaleness credits each replica the
    /// configured lag window.
    fn quorum_met(
        &self,
        results: &[StoreResult],
        candidate: u64,
        read_quorum: usize,
        read_mode: ReadMode,
    ) -> bool {
        let tolerated_lag = match read_mode {
            ReadMode::BoundedStaleness => self.config.bounded_staleness_lsn_lag,
            _ => 0,
        };
        results
            .iter()
            .filter(|result| {
                result
                    .quorum_acked_log_position
                    .saturating_add(tolerated_lag)
                    >= candidate
            })
            .count()
            >= read_quorum
    }

    /// Read quorum size: system-configured for master resources, user-
    /// configured for document data.
    fn read_quorum(&self, request: &ReadRequest) -> usize {
        if request.resource_type.is_master() {
            self.service_config.system_min_replica_set_size()
        } else {
            self.service_config.user_min_replica_set_size()
        }
    }
}

/// Highest reported position; ties go to the lowest replica URI.
fn select_max_position(results: &[StoreResult]) -> Option<&StoreResult> {
    results.iter().max_by(|a, b| {
        a.log_position
            .cmp(&b.log_position)
            .then_with(|| b.replica_uri.cmp(&a.replica_uri))
    })
}
