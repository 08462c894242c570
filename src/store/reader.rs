//! Store Reader
//!
//! Per READ_PROTOCOL.md §4:
//! - Fan a read out to a subset of a partition's replicas concurrently
//! - Every replica call settles into a `StoreResult`, success or failure
//! - Session reads admit a result only if its token proves the replica has
//!   seen everything the client has ("a replica may lag, it may never lie")
//! - Selection under `ReadMode::Any`: highest log position, ties broken by
//!   lowest replica URI for determinism
//!
//! This layer performs no retry of its own beyond the session admission loop;
//! topology and throttling errors bubble to the callers that own them.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::task::JoinSet;

use crate::address::AddressSelector;
use crate::config::ReadEngineConfig;
use crate::consistency::ReadMode;
use crate::errors::{ReadError, ReadResult};
use crate::observability::{Event, Logger};
use crate::request::ReadRequest;
use crate::session::{SessionContainer, SessionToken};
use crate::transport::headers::ResponseHeaders;
use crate::transport::TransportClient;

use super::response::StoreResponse;
use super::result::{StoreOutcome, StoreResult};

/// Reads from the replicas of one partition key range.
pub struct StoreReader {
    transport: Arc<dyn TransportClient>,
    address_selector: Arc<dyn AddressSelector>,
    session_container: Arc<dyn SessionContainer>,
    config: Arc<ReadEngineConfig>,
}

impl StoreReader {
    /// Create a store reader over the given collaborators.
    pub fn new(
        transport: Arc<dyn TransportClient>,
        address_selector: Arc<dyn AddressSelector>,
        session_container: Arc<dyn SessionContainer>,
        config: Arc<ReadEngineConfig>,
    ) -> Self {
        Self {
            transport,
            address_selector,
            session_container,
            config,
        }
    }

    /// Read concurrently from up to `replica_count_to_read` replicas and
    /// return every settled result without selection.
    ///
    /// Secondaries are contacted in randomized order so load spreads across
    /// the replica set. Results that fail with anything other than 404
    /// bubble immediately as the call's error; 404s stay in the result set
    /// because they still carry authoritative log positions.
    pub async fn read_multiple_replicas_detailed(
        &self,
        request: &ReadRequest,
        include_primary: bool,
        replica_count_to_read: usize,
        requires_valid_log_position: bool,
        force_address_refresh: bool,
    ) -> ReadResult<Vec<StoreResult>> {
        if request.is_expired() {
            return Err(ReadError::service_unavailable(
                "deadline elapsed before replica fan-out",
            ));
        }

        let replica_set = self
            .address_selector
            .resolve_replicas(&request.partition_key_range_id, force_address_refresh)
            .await?;

        let mut targets = Vec::with_capacity(replica_count_to_read.max(1));
        if include_primary {
            targets.push(replica_set.primary.clone());
        }
        let mut secondaries = replica_set.secondaries.clone();
        secondaries.shuffle(&mut rand::thread_rng());
        targets.extend(secondaries);
        targets.truncate(replica_count_to_read.max(1));

        let results = self.invoke_replicas(request, targets).await;

        for result in &results {
            if let StoreOutcome::Failure(error) = &result.outcome {
                if error.status != 404 {
                    return Err(error.clone());
                }
            }
        }

        if requires_valid_log_position {
            Ok(results
                .into_iter()
                .filter(|result| result.has_valid_log_position() || !result.is_success())
                .collect())
        } else {
            Ok(results)
        }
    }

    /// Read from multiple replicas and select one authoritative response.
    ///
    /// With `use_session_token`, results must prove they are at least as
    /// recent as the client's tracked token; replicas that have not caught
    /// up are re-read within the deadline. When nothing becomes admissible
    /// in time, the call fails with 404 + `READ_SESSION_NOT_AVAILABLE`.
    #[allow(clippy::too_many_arguments)]
    pub async fn read_multiple_replica(
        &self,
        request: &ReadRequest,
        include_primary: bool,
        replica_count_to_read: usize,
        requires_valid_log_position: bool,
        use_session_token: bool,
        read_mode: ReadMode,
        force_address_refresh: bool,
    ) -> ReadResult<StoreResponse> {
        let replica_count_text = replica_count_to_read.to_string();
        Logger::trace(
            Event::ReplicaFanout,
            &[
                ("mode", read_mode.as_str()),
                ("pk_range_id", &request.partition_key_range_id),
                ("replica_count", &replica_count_text),
            ],
        );

        let requested_token = if use_session_token {
            self.session_container
                .resolve_partition_local_session_token(request, &request.partition_key_range_id)
        } else {
            None
        };

        let mut force_refresh = force_address_refresh;
        let mut freshest_lagging_headers = ResponseHeaders::new();

        loop {
            if request.is_expired() {
                break;
            }

            let results = self
                .read_multiple_replicas_detailed(
                    request,
                    include_primary,
                    replica_count_to_read,
                    requires_valid_log_position,
                    force_refresh,
                )
                .await?;
            force_refresh = false;

            let mut admissible = Vec::new();
            let mut lagging = Vec::new();
            for result in results {
                if is_admissible(&result, requested_token.as_ref()) {
                    admissible.push(result);
                } else {
                    lagging.push(result);
                }
            }

            if let Some(winner) = select_winner(admissible) {
                return winner.into_authoritative_response(request.charge.total());
            }

            if let Some(freshest) = lagging.iter().max_by_key(|result| result.log_position) {
                freshest_lagging_headers = freshest.headers().clone();
            }

            if let Some(token) = requested_token.as_ref() {
                let token_text = token.to_string();
                let lagging_text = lagging.len().to_string();
                Logger::warn(
                    Event::SessionTokenNotMet,
                    &[
                        ("lagging_replicas", &lagging_text),
                        ("pk_range_id", &request.partition_key_range_id),
                        ("requested_token", &token_text),
                    ],
                );
            }

            let Some(remaining) = request.remaining_time() else {
                break;
            };
            tokio::time::sleep(self.config.session_retry_interval().min(remaining)).await;
        }

        if requested_token.is_some() {
            Err(ReadError::read_session_not_available(
                freshest_lagging_headers,
                "no replica caught up to the requested session token before the deadline",
            ))
        } else {
            Err(ReadError::service_unavailable(
                "no replica response before the deadline",
            ))
        }
    }

    /// Read from the primary replica only.
    ///
    /// Used for master-resource reads and `ReadMode::Primary`. A primary
    /// that cannot report a committed log position when one is required maps
    /// to `Gone`, so the caller's topology loop re-resolves addresses.
    pub async fn read_primary(
        &self,
        request: &ReadRequest,
        requires_valid_log_position: bool,
        force_address_refresh: bool,
    ) -> ReadResult<StoreResponse> {
        if request.is_expired() {
            return Err(ReadError::service_unavailable(
                "deadline elapsed before the primary read",
            ));
        }

        let primary = self
            .address_selector
            .resolve_primary(&request.partition_key_range_id, force_address_refresh)
            .await?;

        let results = self.invoke_replicas(request, vec![primary]).await;
        let Some(result) = results.into_iter().next() else {
            return Err(ReadError::service_unavailable(
                "primary did not respond before the deadline",
            ));
        };

        if let StoreOutcome::Failure(error) = &result.outcome {
            return Err(error.clone());
        }
        if requires_valid_log_position && !result.has_valid_log_position() {
            return Err(ReadError::gone(
                "primary replied without a committed log position",
            ));
        }

        result.into_authoritative_response(request.charge.total())
    }

    /// Invoke the request against every target concurrently and collect the
    /// results that settle before the deadline. Outstanding invocations past
    /// the deadline are abandoned, not awaited; each settled result adds its
    /// charge to the call's accumulator as soon as it is known.
    async fn invoke_replicas(
        &self,
        request: &ReadRequest,
        targets: Vec<crate::address::ReplicaUri>,
    ) -> Vec<StoreResult> {
        let mut tasks = JoinSet::new();
        for uri in targets {
            let transport = Arc::clone(&self.transport);
            let replica_request = request.clone();
            tasks.spawn(async move {
                match transport.invoke(&uri, &replica_request).await {
                    Ok(response) => StoreResult::from_response(uri, response),
                    Err(error) => StoreResult::from_failure(uri, error),
                }
            });
        }

        let mut results = Vec::new();
        loop {
            tokio::select! {
                settled = tasks.join_next() => match settled {
                    Some(Ok(result)) => {
                        request.charge.add(result.request_charge);
                        results.push(result);
                    }
                    Some(Err(_)) => {} // replica task panicked; treat as unreachable
                    None => break,
                },
                _ = tokio::time::sleep_until(request.deadline) => {
                    let outstanding = tasks.len().to_string();
                    Logger::warn(
                        Event::ReplicaAbandoned,
                        &[
                            ("outstanding", &outstanding),
                            ("pk_range_id", &request.partition_key_range_id),
                        ],
                    );
                    break;
                }
            }
        }
        results
    }
}

/// A result is admissible when no session token was requested, or when its
/// own token proves it has observed at least the requested state. A result
/// without a token cannot prove anything and is inadmissible.
fn is_admissible(result: &StoreResult, requested_token: Option<&SessionToken>) -> bool {
    match requested_token {
        None => true,
        Some(requested) => match &result.session_token {
            Some(token) => token.is_at_least_as_recent_as(requested),
            None => false,
        },
    }
}

/// Highest log position wins; ties go to the lowest replica URI so repeated
/// reads pick the same replica.
fn select_winner(admissible: Vec<StoreResult>) -> Option<StoreResult> {
    admissible.into_iter().max_by(|a, b| {
        a.log_position
            .cmp(&b.log_position)
            .then_with(|| b.replica_uri.cmp(&a.replica_uri))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ReplicaUri;
    use crate::transport::headers;

    fn result(uri: &str, lsn: u64, token: Option<&str>) -> StoreResult {
        let mut response_headers = ResponseHeaders::new();
        response_headers.set_u64(headers::LSN, lsn);
        if let Some(token) = token {
            response_headers.insert(headers::SESSION_TOKEN, token);
        }
        StoreResult::from_response(
            ReplicaUri::new(uri),
            StoreResponse::new(200, response_headers, Vec::new()),
        )
    }

    /// Highest position wins.
    #[test]
    fn test_select_winner_by_position() {
        let winner = select_winner(vec![
            result("tcp://b:1", 100, None),
            result("tcp://a:1", 110, None),
            result("tcp://c:1", 90, None),
        ])
        .unwrap();
        assert_eq!(winner.replica_uri, ReplicaUri::new("tcp://a:1"));
    }

    /// Position ties break to the lowest URI.
    #[test]
    fn test_select_winner_tie_breaks_to_lowest_uri() {
        let winner = select_winner(vec![
            result("tcp://b:1", 100, None),
            result("tcp://a:1", 100, None),
        ])
        .unwrap();
        assert_eq!(winner.replica_uri, ReplicaUri::new("tcp://a:1"));
    }

    /// Without a requested token everything is admissible; with one, only
    /// replicas that prove they caught up are.
    #[test]
    fn test_admission() {
        let requested = SessionToken::try_parse("r:1#651177").unwrap();

        let caught_up = result("tcp://a:1", 651177, Some("r:1#651177"));
        let behind = result("tcp://b:1", 651176, Some("r:1#651176"));
        let silent = result("tcp://c:1", 651177, None);

        assert!(is_admissible(&caught_up, None));
        assert!(is_admissible(&behind, None));

        assert!(is_admissible(&caught_up, Some(&requested)));
        assert!(!is_admissible(&behind, Some(&requested)));
        assert!(!is_admissible(&silent, Some(&requested)));
    }
}
