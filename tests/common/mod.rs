//! Deterministic test doubles for the read path
//!
//! - `ScriptedTransport`: per-replica reply scripts; the last reply repeats
//! - `StaticAddressSelector`: fixed replica set, with queued sets that take
//!   effect on forced refreshes (simulates replica moves after a split)
//! - `Harness`: a fully wired consistency reader with fast pacing intervals

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use velodb_client::address::{AddressSelector, ReplicaSet, ReplicaUri};
use velodb_client::config::ReadEngineConfig;
use velodb_client::errors::{ReadError, ReadResult};
use velodb_client::gateway::StaticServiceConfiguration;
use velodb_client::request::{ReadRequest, ResourceType};
use velodb_client::session::LocalSessionContainer;
use velodb_client::transport::{headers, ResponseHeaders, TransportClient};
use velodb_client::{ConsistencyLevel, ConsistencyReader, StoreResponse};

/// One scripted replica reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub sub_status: u32,
    pub lsn: u64,
    pub quorum_acked_lsn: u64,
    pub global_committed_lsn: u64,
    pub session_token: Option<String>,
    pub charge: f64,
    pub payload: Vec<u8>,
    pub delay: Duration,
}

impl Reply {
    /// Successful document read at the given positions.
    pub fn document(lsn: u64, quorum_acked_lsn: u64) -> Self {
        Self {
            status: 200,
            sub_status: 0,
            lsn,
            quorum_acked_lsn,
            global_committed_lsn: quorum_acked_lsn,
            session_token: None,
            charge: 1.0,
            payload: b"{\"id\":\"doc-1\"}".to_vec(),
            delay: Duration::ZERO,
        }
    }

    /// 404 carrying the replica's positions.
    pub fn not_found(lsn: u64) -> Self {
        Self {
            status: 404,
            payload: Vec::new(),
            ..Self::document(lsn, lsn)
        }
    }

    /// Typed failure with the given status and substatus.
    pub fn error(status: u16, sub_status: u32) -> Self {
        Self {
            status,
            sub_status,
            lsn: 0,
            quorum_acked_lsn: 0,
            global_committed_lsn: 0,
            session_token: None,
            charge: 0.0,
            payload: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    /// A replica that never answers within any test deadline.
    pub fn stall() -> Self {
        Self {
            delay: Duration::from_secs(3600),
            ..Self::document(0, 0)
        }
    }

    pub fn with_session_token(mut self, token: &str) -> Self {
        self.session_token = Some(token.to_string());
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn headers(&self) -> ResponseHeaders {
        let mut response_headers = ResponseHeaders::new();
        response_headers.set_u64(headers::LSN, self.lsn);
        response_headers.set_u64(headers::LOCAL_LSN, self.lsn);
        response_headers.set_u64(headers::QUORUM_ACKED_LSN, self.quorum_acked_lsn);
        response_headers.set_u64(headers::QUORUM_ACKED_LOCAL_LSN, self.quorum_acked_lsn);
        response_headers.set_u64(headers::GLOBAL_COMMITTED_LSN, self.global_committed_lsn);
        response_headers.insert(headers::REQUEST_CHARGE, format!("{:.2}", self.charge));
        if self.sub_status > 0 {
            response_headers.set_u64(headers::SUB_STATUS, u64::from(self.sub_status));
        }
        if let Some(token) = &self.session_token {
            response_headers.insert(headers::SESSION_TOKEN, token.clone());
        }
        response_headers
    }
}

/// Transport returning scripted replies per replica URI.
///
/// Replies pop in order; the final reply repeats forever. Unscripted URIs
/// answer 410 Gone, which surfaces misconfigured tests quickly.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    pub invocations: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, uri: &str, replies: Vec<Reply>) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(uri.to_string(), replies.into());
        }
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn next_reply(&self, uri: &str) -> Option<Reply> {
        let mut scripts = self.scripts.lock().ok()?;
        let queue = scripts.get_mut(uri)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl TransportClient for ScriptedTransport {
    async fn invoke(&self, uri: &ReplicaUri, _request: &ReadRequest) -> ReadResult<StoreResponse> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let Some(reply) = self.next_reply(uri.as_str()) else {
            return Err(ReadError::from_status(
                410,
                0,
                ResponseHeaders::new(),
                format!("no script for {uri}"),
            ));
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        if reply.status < 400 {
            Ok(StoreResponse::new(
                reply.status,
                reply.headers(),
                reply.payload.clone(),
            ))
        } else {
            Err(ReadError::from_status(
                reply.status,
                reply.sub_status,
                reply.headers(),
                "scripted failure",
            ))
        }
    }
}

/// Address selector with a fixed current set and queued replacement sets
/// that take effect on forced refreshes.
pub struct StaticAddressSelector {
    current: Mutex<ReplicaSet>,
    queued: Mutex<VecDeque<ReplicaSet>>,
    pub forced_refreshes: AtomicUsize,
}

impl StaticAddressSelector {
    pub fn new(initial: ReplicaSet) -> Self {
        Self {
            current: Mutex::new(initial),
            queued: Mutex::new(VecDeque::new()),
            forced_refreshes: AtomicUsize::new(0),
        }
    }

    /// Queue a replica set that a future forced refresh will switch to.
    pub fn queue_refresh(&self, set: ReplicaSet) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(set);
        }
    }

    pub fn forced_refresh_count(&self) -> usize {
        self.forced_refreshes.load(Ordering::SeqCst)
    }

    fn resolve(&self, force_refresh: bool) -> ReadResult<ReplicaSet> {
        if force_refresh {
            self.forced_refreshes.fetch_add(1, Ordering::SeqCst);
            if let (Ok(mut queued), Ok(mut current)) = (self.queued.lock(), self.current.lock()) {
                if let Some(next) = queued.pop_front() {
                    *current = next;
                }
            }
        }
        self.current
            .lock()
            .map(|current| current.clone())
            .map_err(|_| ReadError::service_unavailable("address selector poisoned"))
    }
}

#[async_trait]
impl AddressSelector for StaticAddressSelector {
    async fn resolve_replicas(
        &self,
        _partition_key_range_id: &str,
        force_refresh: bool,
    ) -> ReadResult<ReplicaSet> {
        self.resolve(force_refresh)
    }

    async fn resolve_primary(
        &self,
        _partition_key_range_id: &str,
        force_refresh: bool,
    ) -> ReadResult<ReplicaUri> {
        self.resolve(force_refresh).map(|set| set.primary)
    }
}

/// Build a replica set from plain address strings.
pub fn replica_set(primary: &str, secondaries: &[&str]) -> ReplicaSet {
    ReplicaSet::new(
        ReplicaUri::new(primary),
        secondaries.iter().map(|uri| ReplicaUri::new(*uri)).collect(),
    )
}

/// A document read against `range-1` with the given deadline.
pub fn doc_request(deadline: Duration) -> ReadRequest {
    ReadRequest::new("range-1", ResourceType::Document, "/docs/doc-1", deadline)
}

/// A master-resource (collection metadata) read with the given deadline.
pub fn master_request(deadline: Duration) -> ReadRequest {
    ReadRequest::new("range-1", ResourceType::Collection, "/colls/coll-1", deadline)
}

/// Fully wired reader plus handles to its collaborators.
pub struct Harness {
    pub reader: ConsistencyReader,
    pub transport: Arc<ScriptedTransport>,
    pub addresses: Arc<StaticAddressSelector>,
    pub sessions: Arc<LocalSessionContainer>,
}

/// Wire a consistency reader with fast pacing so deadline-bounded tests run
/// in tens of milliseconds.
pub fn harness(account_consistency: ConsistencyLevel, initial_set: ReplicaSet) -> Harness {
    let transport = Arc::new(ScriptedTransport::new());
    let addresses = Arc::new(StaticAddressSelector::new(initial_set));
    let sessions = Arc::new(LocalSessionContainer::new());

    let config = ReadEngineConfig {
        bounded_staleness_lsn_lag: 5,
        barrier_retry_interval_ms: 5,
        session_retry_interval_ms: 5,
        topology_retry_interval_ms: 5,
    };

    let reader = ConsistencyReader::new(
        account_consistency,
        config,
        Arc::new(StaticServiceConfiguration::default()),
        sessions.clone(),
        addresses.clone(),
        transport.clone(),
    )
    .expect("valid test configuration");

    Harness {
        reader,
        transport,
        addresses,
        sessions,
    }
}
