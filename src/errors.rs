//! Read Protocol Error Types
//!
//! One carrier type for every failure the read path can observe. The kind is
//! a flat enum (no per-status types), so callers match exhaustively, and the
//! original response headers always travel with the error so retry layers can
//! inspect log positions, session tokens, and substatus codes.

use std::fmt;

use thiserror::Error;

use crate::transport::headers::{self, ResponseHeaders};

/// Result type for read-path operations
pub type ReadResult<T> = Result<T, ReadError>;

/// Substatus codes qualifying an HTTP status.
pub mod sub_status {
    /// No substatus reported.
    pub const UNKNOWN: u32 = 0;

    /// 410: the cached collection name no longer resolves.
    pub const NAME_CACHE_IS_STALE: u32 = 1000;

    /// 410: the partition key range no longer exists.
    pub const PARTITION_KEY_RANGE_GONE: u32 = 1002;

    /// 404: no replica has caught up to the requested session token.
    pub const READ_SESSION_NOT_AVAILABLE: u32 = 1002;

    /// 410: the partition is completing a split.
    pub const COMPLETING_SPLIT: u32 = 1007;

    /// 410: the partition is completing a migration.
    pub const COMPLETING_PARTITION_MIGRATION: u32 = 1008;
}

/// Error kinds for the read path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // ==================
    // Caller Errors
    // ==================
    /// 400: malformed request
    BadRequest,
    /// 401: missing or invalid authorization
    Unauthorized,
    /// 403: authorization denied
    Forbidden,
    /// 404: resource absent (substatus distinguishes session misses)
    NotFound,
    /// 405: operation not supported on the resource
    MethodNotAllowed,
    /// 409: write conflict
    Conflict,
    /// 412: precondition (etag) failed
    PreconditionFailed,
    /// 413: payload exceeds limits
    RequestEntityTooLarge,
    /// 423: resource is locked
    Locked,

    // ==================
    // Topology Errors (recovered by the consistency reader)
    // ==================
    /// 410 without a recognized substatus
    Gone,
    /// 410/1000: stale name cache
    InvalidPartition,
    /// 410/1002: partition key range gone
    PartitionKeyRangeGone,
    /// 410/1007: split in progress
    PartitionKeyRangeIsSplitting,
    /// 410/1008: migration in progress
    PartitionIsMigrating,

    // ==================
    // Transient Server Errors (caller retry policy)
    // ==================
    /// 408: request timed out server-side
    RequestTimeout,
    /// 429: request rate too large
    RequestRateTooLarge,
    /// 449: retry the request
    RetryWith,
    /// 500: internal server error
    InternalServerError,
    /// 503: service unavailable
    ServiceUnavailable,
}

impl ErrorKind {
    /// Map an HTTP status plus substatus to a kind.
    ///
    /// 410 fans out by substatus; everything unrecognized maps to
    /// `InternalServerError` so it is never silently retried.
    pub fn from_status(status: u16, sub_status_code: u32) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            408 => Self::RequestTimeout,
            409 => Self::Conflict,
            410 => match sub_status_code {
                sub_status::NAME_CACHE_IS_STALE => Self::InvalidPartition,
                sub_status::PARTITION_KEY_RANGE_GONE => Self::PartitionKeyRangeGone,
                sub_status::COMPLETING_SPLIT => Self::PartitionKeyRangeIsSplitting,
                sub_status::COMPLETING_PARTITION_MIGRATION => Self::PartitionIsMigrating,
                _ => Self::Gone,
            },
            412 => Self::PreconditionFailed,
            413 => Self::RequestEntityTooLarge,
            423 => Self::Locked,
            429 => Self::RequestRateTooLarge,
            449 => Self::RetryWith,
            500 => Self::InternalServerError,
            503 => Self::ServiceUnavailable,
            _ => Self::InternalServerError,
        }
    }

    /// HTTP status this kind surfaces as.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::RequestTimeout => 408,
            Self::Conflict => 409,
            Self::Gone
            | Self::InvalidPartition
            | Self::PartitionKeyRangeGone
            | Self::PartitionKeyRangeIsSplitting
            | Self::PartitionIsMigrating => 410,
            Self::PreconditionFailed => 412,
            Self::RequestEntityTooLarge => 413,
            Self::Locked => 423,
            Self::RequestRateTooLarge => 429,
            Self::RetryWith => 449,
            Self::InternalServerError => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    /// String code for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::Conflict => "CONFLICT",
            Self::Gone => "GONE",
            Self::InvalidPartition => "INVALID_PARTITION",
            Self::PartitionKeyRangeGone => "PARTITION_KEY_RANGE_GONE",
            Self::PartitionKeyRangeIsSplitting => "PARTITION_KEY_RANGE_IS_SPLITTING",
            Self::PartitionIsMigrating => "PARTITION_IS_MIGRATING",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::RequestEntityTooLarge => "REQUEST_ENTITY_TOO_LARGE",
            Self::Locked => "LOCKED",
            Self::RequestRateTooLarge => "REQUEST_RATE_TOO_LARGE",
            Self::RetryWith => "RETRY_WITH",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// True for errors the consistency reader recovers with an address
    /// refresh and a full retry.
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            Self::Gone
                | Self::InvalidPartition
                | Self::PartitionKeyRangeGone
                | Self::PartitionKeyRangeIsSplitting
                | Self::PartitionIsMigrating
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-path error
#[derive(Debug, Clone, Error)]
#[error("{kind} (status {status}, substatus {sub_status}): {message}")]
pub struct ReadError {
    /// Error kind
    pub kind: ErrorKind,
    /// HTTP status
    pub status: u16,
    /// Substatus qualifying the status
    pub sub_status: u32,
    /// Original response headers, preserved for retry layers
    pub headers: ResponseHeaders,
    /// Error message
    pub message: String,
}

impl ReadError {
    /// Create a client-originated error with no response headers.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: kind.status(),
            sub_status: sub_status::UNKNOWN,
            headers: ResponseHeaders::new(),
            message: message.into(),
        }
    }

    /// Create from a wire status, preserving the response headers.
    pub fn from_status(
        status: u16,
        sub_status_code: u32,
        response_headers: ResponseHeaders,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::from_status(status, sub_status_code),
            status,
            sub_status: sub_status_code,
            headers: response_headers,
            message: message.into(),
        }
    }

    /// Deadline-style failure surfaced by the read orchestration layers.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Client-originated Gone, used when a primary response is unusable and
    /// the topology must be re-resolved.
    pub fn gone(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Gone, message)
    }

    /// 404 with `READ_SESSION_NOT_AVAILABLE`, carrying the freshest headers
    /// observed from the lagging replicas.
    pub fn read_session_not_available(
        mut response_headers: ResponseHeaders,
        message: impl Into<String>,
    ) -> Self {
        response_headers.insert(
            headers::SUB_STATUS,
            sub_status::READ_SESSION_NOT_AVAILABLE.to_string(),
        );
        Self {
            kind: ErrorKind::NotFound,
            status: 404,
            sub_status: sub_status::READ_SESSION_NOT_AVAILABLE,
            headers: response_headers,
            message: message.into(),
        }
    }

    /// True for errors the consistency reader recovers locally.
    pub fn is_topology(&self) -> bool {
        self.kind.is_topology()
    }
}
