//! Observable read-protocol events
//!
//! Events are explicit and typed; log consumers match on the event name, not
//! on message text.

use std::fmt;

/// Observable events on the read path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Dispatch
    /// A logical read entered the consistency reader
    ReadDispatch,
    /// The read completed with an authoritative result
    ReadComplete,

    // Store reader
    /// Replica fan-out started
    ReplicaFanout,
    /// A replica settled past the deadline and was abandoned
    ReplicaAbandoned,
    /// No replica satisfied the requested session token this attempt
    SessionTokenNotMet,

    // Quorum reader
    /// Quorum agreement reached
    QuorumMet,
    /// Quorum agreement absent; barrier rounds follow
    QuorumNotMet,
    /// One barrier round issued
    BarrierRound,
    /// The candidate position advanced during a barrier round
    CandidateAdvanced,

    // Topology
    /// Topology error observed; address refresh forced and read retried
    TopologyRetry,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ReadDispatch => "READ_DISPATCH",
            Event::ReadComplete => "READ_COMPLETE",
            Event::ReplicaFanout => "REPLICA_FANOUT",
            Event::ReplicaAbandoned => "REPLICA_ABANDONED",
            Event::SessionTokenNotMet => "SESSION_TOKEN_NOT_MET",
            Event::QuorumMet => "QUORUM_MET",
            Event::QuorumNotMet => "QUORUM_NOT_MET",
            Event::BarrierRound => "BARRIER_ROUND",
            Event::CandidateAdvanced => "CANDIDATE_ADVANCED",
            Event::TopologyRetry => "TOPOLOGY_RETRY",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
