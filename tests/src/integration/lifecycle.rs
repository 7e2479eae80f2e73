//! # Lease Lifecycle
//!
//! Drives the manager and monitor cycle by cycle against shared mocks and a
//! manual clock, following two leases from admission to archival.

#[cfg(test)]
mod tests {
    use shared_types::test_utils::{
        slashing_event, ManualTimeSource, MockMainChain, MockSubnetAdapter, RecordingAlertPublisher,
    };
    use shared_types::{
        AlertKind, LeaseDescriptor, LeaseId, LeaseStatus, SubnetAdapterClient, SubnetAdapters, SubnetId,
    };
    use sl_01_lease_store::{ActivationPolicy, InMemoryArchive, LeaseStore};
    use sl_02_lease_manager::{LeaseManager, LeaseManagerConfig};
    use sl_03_monitor::{Monitor, MonitorConfig};
    use std::sync::Arc;
    use std::time::Duration;

    const GRACE: Duration = Duration::from_secs(3_600);

    fn descriptor(id: &str, stake: u64, duration_secs: u64) -> LeaseDescriptor {
        LeaseDescriptor {
            lease_id: LeaseId::new(id),
            subnet_id: SubnetId::new("S1"),
            stake,
            duration_secs: Some(duration_secs),
        }
    }

    struct World {
        store: Arc<LeaseStore>,
        chain: Arc<MockMainChain>,
        adapter: Arc<MockSubnetAdapter>,
        alerts: Arc<RecordingAlertPublisher>,
        archive: Arc<InMemoryArchive>,
        clock: Arc<ManualTimeSource>,
        manager: LeaseManager,
        monitor: Monitor,
    }

    fn world(policy: ActivationPolicy) -> World {
        let store = Arc::new(LeaseStore::new(policy));
        let chain = Arc::new(MockMainChain::new());
        let adapter = Arc::new(MockSubnetAdapter::new());
        let alerts = Arc::new(RecordingAlertPublisher::new());
        let archive = Arc::new(InMemoryArchive::new());
        let clock = Arc::new(ManualTimeSource::new(1_000));

        let mut adapters = SubnetAdapters::new();
        adapters.insert(SubnetId::new("S1"), adapter.clone() as Arc<dyn SubnetAdapterClient>);

        let manager_config = LeaseManagerConfig {
            slashing_grace_period: GRACE,
            ..LeaseManagerConfig::for_validator("0xv")
        };
        let monitor_config = MonitorConfig {
            slashing_grace_period: GRACE,
            ..MonitorConfig::default()
        };

        let manager = LeaseManager::new(
            manager_config,
            store.clone(),
            chain.clone(),
            adapters.clone(),
            alerts.clone(),
            clock.clone(),
        )
        .with_archive(archive.clone());
        let monitor = Monitor::new(monitor_config, store.clone(), adapters, alerts.clone(), clock.clone());

        World {
            store,
            chain,
            adapter,
            alerts,
            archive,
            clock,
            manager,
            monitor,
        }
    }

    fn status(world: &World, id: &str) -> Option<LeaseStatus> {
        world.store.get(&LeaseId::new(id)).map(|l| l.status)
    }

    #[tokio::test]
    async fn test_full_lifecycle_to_archive() {
        let mut w = world(ActivationPolicy::new(5, 100));
        w.chain
            .set_pending(vec![descriptor("L1", 1_000, 100_000), descriptor("L2", 500, 5_000)]);

        // Admission and activation.
        let report = w.manager.run_cycle().await;
        assert_eq!(report.activated, vec![LeaseId::new("L1"), LeaseId::new("L2")]);
        w.chain.set_pending(vec![]);

        let report = w.monitor.run_cycle().await;
        assert_eq!(report.healthy.len(), 2);

        // Slashing on the subnet.
        w.clock.set(1_100);
        w.adapter.push_event(slashing_event("ev-1", "L1", 400, 1_050));
        let report = w.monitor.run_cycle().await;
        assert_eq!(report.slashed, vec![LeaseId::new("L1")]);
        let l1 = w.store.get(&LeaseId::new("L1")).unwrap();
        assert_eq!(l1.status, LeaseStatus::Slashed);
        assert_eq!(l1.stake, 600);

        // Replayed events are not applied twice.
        w.clock.set(1_200);
        w.monitor.run_cycle().await;
        assert_eq!(w.store.get(&LeaseId::new("L1")).unwrap().stake, 600);
        assert_eq!(w.alerts.count(AlertKind::Slashing), 1);

        // Still inside the grace period.
        w.clock.set(4_699);
        let report = w.manager.run_cycle().await;
        assert!(report.terminated.is_empty());

        // Grace elapsed: terminated and archived in the same cycle.
        w.clock.set(4_700);
        let report = w.manager.run_cycle().await;
        assert_eq!(report.terminated, vec![LeaseId::new("L1")]);
        assert_eq!(report.archived, vec![LeaseId::new("L1")]);
        assert_eq!(status(&w, "L1"), None);
        assert!(w.archive.contains(&LeaseId::new("L1")));

        // The main chain listing it again does not resurrect it.
        w.chain.set_pending(vec![descriptor("L1", 1_000, 100_000)]);
        let report = w.manager.run_cycle().await;
        assert!(report.inserted.is_empty());
        assert_eq!(status(&w, "L1"), None);
        w.chain.set_pending(vec![]);

        // L2 runs out its term.
        w.clock.set(6_000);
        let report = w.manager.run_cycle().await;
        assert_eq!(report.expired, vec![LeaseId::new("L2")]);
        assert_eq!(report.archived, vec![LeaseId::new("L2")]);

        assert!(w.store.snapshot().is_empty());
        let archived: Vec<_> = w.archive.archived().into_iter().map(|l| (l.lease_id, l.status)).collect();
        assert_eq!(
            archived,
            vec![
                (LeaseId::new("L1"), LeaseStatus::Terminated),
                (LeaseId::new("L2"), LeaseStatus::Expired),
            ]
        );
    }

    #[tokio::test]
    async fn test_capacity_frees_up_after_expiry() {
        let mut w = world(ActivationPolicy::new(1, 0));
        w.chain
            .set_pending(vec![descriptor("A", 100, 50), descriptor("B", 100, 50)]);

        let report = w.manager.run_cycle().await;
        assert_eq!(report.activated, vec![LeaseId::new("A")]);
        assert_eq!(status(&w, "B"), Some(LeaseStatus::Pending));

        // A expires; B takes the freed slot on the following cycle.
        w.clock.set(1_050);
        let report = w.manager.run_cycle().await;
        assert_eq!(report.expired, vec![LeaseId::new("A")]);

        let report = w.manager.run_cycle().await;
        assert_eq!(report.activated, vec![LeaseId::new("B")]);
        assert_eq!(w.store.count_active(), 1);
    }

    #[tokio::test]
    async fn test_slashing_to_zero_terminates_immediately() {
        let mut w = world(ActivationPolicy::new(5, 0));
        w.chain.set_pending(vec![descriptor("L1", 300, 100_000)]);
        w.manager.run_cycle().await;
        w.chain.set_pending(vec![]);

        w.clock.set(1_010);
        w.adapter.push_event(slashing_event("ev-1", "L1", 200, 1_005));
        w.adapter.push_event(slashing_event("ev-2", "L1", 150, 1_006));
        let report = w.monitor.run_cycle().await;

        assert_eq!(report.terminated, vec![LeaseId::new("L1")]);
        let lease = w.store.get(&LeaseId::new("L1")).unwrap();
        assert_eq!(lease.status, LeaseStatus::Terminated);
        assert_eq!(lease.stake, 0);
        assert_eq!(w.alerts.count(AlertKind::Slashing), 2);

        let report = w.manager.run_cycle().await;
        assert_eq!(report.archived, vec![LeaseId::new("L1")]);
    }
}
