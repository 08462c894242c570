//! Consistency Reader
//!
//! Top-level entry point for the read path. Deduces the read mode from the
//! account consistency and the per-request override, dispatches to the
//! quorum or store reader, and owns the retry loop across partition-topology
//! errors: force an address refresh, retry the whole read, and surface
//! `ServiceUnavailable` once the deadline elapses. Every other error passes
//! through unmodified.

use std::sync::Arc;

use crate::address::AddressSelector;
use crate::config::ReadEngineConfig;
use crate::errors::{ReadError, ReadResult};
use crate::gateway::ServiceConfigurationReader;
use crate::observability::{Event, Logger};
use crate::quorum::QuorumReader;
use crate::request::ReadRequest;
use crate::session::SessionContainer;
use crate::store::{StoreReader, StoreResponse};
use crate::transport::TransportClient;

use super::level::{deduce_read_mode, ConsistencyLevel, ReadMode};

/// Entry point for consistency-aware reads against one account.
pub struct ConsistencyReader {
    account_consistency: ConsistencyLevel,
    config: Arc<ReadEngineConfig>,
    service_config: Arc<dyn ServiceConfigurationReader>,
    session_container: Arc<dyn SessionContainer>,
    store_reader: Arc<StoreReader>,
    quorum_reader: QuorumReader,
}

impl ConsistencyReader {
    /// Build the read stack over the injected collaborators.
    pub fn new(
        account_consistency: ConsistencyLevel,
        config: ReadEngineConfig,
        service_config: Arc<dyn ServiceConfigurationReader>,
        session_container: Arc<dyn SessionContainer>,
        address_selector: Arc<dyn AddressSelector>,
        transport: Arc<dyn TransportClient>,
    ) -> ReadResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let store_reader = Arc::new(StoreReader::new(
            transport,
            address_selector,
            Arc::clone(&session_container),
            Arc::clone(&config),
        ));
        let quorum_reader = QuorumReader::new(
            Arc::clone(&store_reader),
            Arc::clone(&service_config),
            Arc::clone(&config),
        );
        Ok(Self {
            account_consistency,
            config,
            service_config,
            session_container,
            store_reader,
            quorum_reader,
        })
    }

    /// Account-level consistency ceiling.
    pub fn account_consistency(&self) -> ConsistencyLevel {
        self.account_consistency
    }

    /// Replicas to contact: system-configured for master resources,
    /// user-configured for document data.
    pub fn max_replica_set_size(&self, request: &ReadRequest) -> usize {
        if request.resource_type.is_master() {
            self.service_config.system_max_replica_set_size()
        } else {
            self.service_config.user_max_replica_set_size()
        }
    }

    /// Read quorum size for the request's resource kind.
    pub fn min_replica_set_size(&self, request: &ReadRequest) -> usize {
        if request.resource_type.is_master() {
            self.service_config.system_min_replica_set_size()
        } else {
            self.service_config.user_min_replica_set_size()
        }
    }

    /// Execute one logical read.
    ///
    /// Topology errors force an address refresh and retry the whole read
    /// within the deadline; exhausting it surfaces `ServiceUnavailable`.
    /// After the authoritative response is chosen, its session token is
    /// recorded in the session container (single writer, once per call).
    pub async fn read(&self, request: &ReadRequest) -> ReadResult<StoreResponse> {
        let mut force_address_refresh = false;
        let mut is_retry = false;

        loop {
            match self
                .read_once(request, is_retry, force_address_refresh)
                .await
            {
                Ok(response) => {
                    self.record_session_token(request, &response);
                    let lsn_text = response.log_position().to_string();
                    Logger::info(
                        Event::ReadComplete,
                        &[
                            ("lsn", &lsn_text),
                            ("pk_range_id", &request.partition_key_range_id),
                        ],
                    );
                    return Ok(response);
                }
                Err(error) if error.is_topology() => {
                    let status_text = error.status.to_string();
                    let sub_status_text = error.sub_status.to_string();
                    Logger::warn(
                        Event::TopologyRetry,
                        &[
                            ("kind", error.kind.as_str()),
                            ("pk_range_id", &request.partition_key_range_id),
                            ("status", &status_text),
                            ("sub_status", &sub_status_text),
                        ],
                    );

                    let Some(remaining) = request.remaining_time() else {
                        return Err(ReadError::service_unavailable(
                            "topology retries exhausted the deadline",
                        ));
                    };
                    tokio::time::sleep(self.config.topology_retry_interval().min(remaining))
                        .await;
                    if request.is_expired() {
                        return Err(ReadError::service_unavailable(
                            "topology retries exhausted the deadline",
                        ));
                    }
                    force_address_refresh = true;
                    is_retry = true;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn read_once(
        &self,
        request: &ReadRequest,
        is_retry: bool,
        force_address_refresh: bool,
    ) -> ReadResult<StoreResponse> {
        let (read_mode, effective_consistency, use_session_token) =
            deduce_read_mode(self.account_consistency, request.consistency_override);
        // Master resources have no quorum mode; they are served by the
        // primary replica.
        let read_mode = if read_mode == ReadMode::Any && request.resource_type.is_master() {
            ReadMode::Primary
        } else {
            read_mode
        };

        let retry_text = is_retry.to_string();
        Logger::trace(
            Event::ReadDispatch,
            &[
                ("consistency", effective_consistency.as_str()),
                ("is_retry", &retry_text),
                ("mode", read_mode.as_str()),
                ("pk_range_id", &request.partition_key_range_id),
            ],
        );

        match read_mode {
            ReadMode::Strong | ReadMode::BoundedStaleness => {
                self.quorum_reader
                    .read_strong(
                        request,
                        self.max_replica_set_size(request),
                        read_mode,
                        force_address_refresh,
                    )
                    .await
            }
            ReadMode::Primary => {
                self.store_reader
                    .read_primary(request, true, force_address_refresh)
                    .await
            }
            ReadMode::Any => {
                self.store_reader
                    .read_multiple_replica(
                        request,
                        true,
                        self.max_replica_set_size(request),
                        false,
                        use_session_token,
                        ReadMode::Any,
                        force_address_refresh,
                    )
                    .await
            }
        }
    }

    /// Record the authoritative response's session token. The container
    /// merges, so tracked positions never regress.
    fn record_session_token(&self, request: &ReadRequest, response: &StoreResponse) {
        if let Some(token) = response.session_token() {
            self.session_container
                .record_session_token(&request.partition_key_range_id, &token);
        }
    }
}
