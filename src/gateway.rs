//! Gateway Service Configuration
//!
//! Replica-set sizing comes from the gateway: system-configured counts for
//! master (metadata) resources, user-configured counts for document data.
//! Retrieval mechanics are out of scope; the read path only consumes the
//! resolved values.

/// Replica-set sizes the gateway advertises for the account.
pub trait ServiceConfigurationReader: Send + Sync {
    /// Maximum replica-set size for user document data.
    fn user_max_replica_set_size(&self) -> usize;

    /// Minimum (quorum) replica-set size for user document data.
    fn user_min_replica_set_size(&self) -> usize;

    /// Maximum replica-set size for master resources.
    fn system_max_replica_set_size(&self) -> usize;

    /// Minimum (quorum) replica-set size for master resources.
    fn system_min_replica_set_size(&self) -> usize;
}

/// Fixed service configuration, resolved once at client construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticServiceConfiguration {
    pub user_max_replica_set_size: usize,
    pub user_min_replica_set_size: usize,
    pub system_max_replica_set_size: usize,
    pub system_min_replica_set_size: usize,
}

impl Default for StaticServiceConfiguration {
    fn default() -> Self {
        Self {
            user_max_replica_set_size: 4,
            user_min_replica_set_size: 3,
            system_max_replica_set_size: 4,
            system_min_replica_set_size: 3,
        }
    }
}

impl ServiceConfigurationReader for StaticServiceConfiguration {
    fn user_max_replica_set_size(&self) -> usize {
        self.user_max_replica_set_size
    }

    fn user_min_replica_set_size(&self) -> usize {
        self.user_min_replica_set_size
    }

    fn system_max_replica_set_size(&self) -> usize {
        self.system_max_replica_set_size
    }

    fn system_min_replica_set_size(&self) -> usize {
        self.system_min_replica_set_size
    }
}
