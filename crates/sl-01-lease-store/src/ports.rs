//! # Outbound Ports
//!
//! External persistence for leases that reached a terminal status. The
//! in-memory table only keeps live leases; a deployment that needs history
//! plugs an archive in here.

use crate::error::ArchiveError;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Lease, LeaseId};

/// Receives terminal leases before they are dropped from the store.
#[async_trait]
pub trait LeaseArchive: Send + Sync {
    /// Persist a terminal lease. The store only forgets it on success.
    async fn archive(&self, lease: &Lease) -> Result<(), ArchiveError>;
}

/// Archive that keeps leases in process memory.
#[derive(Default)]
pub struct InMemoryArchive {
    leases: Mutex<Vec<Lease>>,
}

impl InMemoryArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Archived leases in archival order.
    pub fn archived(&self) -> Vec<Lease> {
        self.leases.lock().clone()
    }

    /// Whether `lease_id` has been archived.
    pub fn contains(&self, lease_id: &LeaseId) -> bool {
        self.leases.lock().iter().any(|l| &l.lease_id == lease_id)
    }
}

#[async_trait]
impl LeaseArchive for InMemoryArchive {
    async fn archive(&self, lease: &Lease) -> Result<(), ArchiveError> {
        self.leases.lock().push(lease.clone());
        Ok(())
    }
}
