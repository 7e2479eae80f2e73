//! # Concurrent Writers
//!
//! The lease manager and the monitor run as independent tasks and share only
//! the store. A lease that is both past its expiry and freshly slashed is
//! contested by `Active → Expired` and `Active → Slashed`; exactly one of the
//! two may commit, and the loser must observe a conflict rather than
//! overwrite the winner.

#[cfg(test)]
mod tests {
    use shared_types::test_utils::{
        slashing_event, ManualTimeSource, MockMainChain, MockSubnetAdapter, RecordingAlertPublisher,
    };
    use shared_types::{
        AlertKind, Lease, LeaseDescriptor, LeaseId, LeaseStatus, SubnetAdapterClient, SubnetAdapters,
        SubnetId, Timestamp,
    };
    use sl_01_lease_store::{ActivationPolicy, LeaseStore};
    use sl_02_lease_manager::{LeaseManager, LeaseManagerConfig};
    use sl_03_monitor::{Monitor, MonitorConfig};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    const STAKE: u64 = 1_000;
    const SLASHED: u64 = 300;

    /// Store holding one `Active` lease that expired at t=1100.
    fn contested_store() -> Arc<LeaseStore> {
        let store = Arc::new(LeaseStore::new(ActivationPolicy::new(4, 0)));
        let descriptor = LeaseDescriptor {
            lease_id: LeaseId::new("L1"),
            subnet_id: SubnetId::new("S1"),
            stake: STAKE,
            duration_secs: Some(100),
        };
        store
            .upsert(Lease::pending(&descriptor, Duration::from_secs(100), Timestamp::new(1_000)))
            .unwrap();
        store
            .compare_and_transition(&LeaseId::new("L1"), LeaseStatus::Pending, LeaseStatus::Active, |l| {
                l.stamp_activation(Timestamp::new(1_000))
            })
            .unwrap();
        store
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_expiry_and_slashing_race_has_single_winner() {
        for _ in 0..50 {
            let store = contested_store();
            let clock = Arc::new(ManualTimeSource::new(2_000));
            let adapter = Arc::new(MockSubnetAdapter::new());
            adapter.push_event(slashing_event("ev-1", "L1", SLASHED, 1_500));

            let mut adapters = SubnetAdapters::new();
            adapters.insert(SubnetId::new("S1"), adapter.clone() as Arc<dyn SubnetAdapterClient>);
            let manager_alerts = Arc::new(RecordingAlertPublisher::new());
            let monitor_alerts = Arc::new(RecordingAlertPublisher::new());

            let mut manager = LeaseManager::new(
                LeaseManagerConfig::for_validator("0xv"),
                store.clone(),
                Arc::new(MockMainChain::new()),
                adapters.clone(),
                manager_alerts.clone(),
                clock.clone(),
            );
            let mut monitor = Monitor::new(
                MonitorConfig::default(),
                store.clone(),
                adapters,
                monitor_alerts.clone(),
                clock.clone(),
            );

            let barrier = Arc::new(Barrier::new(2));
            let manager_task = tokio::spawn({
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    manager.run_cycle().await
                }
            });
            let monitor_task = tokio::spawn({
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    monitor.run_cycle().await
                }
            });
            let manager_report = manager_task.await.unwrap();
            let monitor_report = monitor_task.await.unwrap();

            let id = LeaseId::new("L1");
            let expired = manager_report.expired.contains(&id);
            let slashed = monitor_report.slashed.contains(&id);
            assert!(expired ^ slashed, "exactly one transition must commit");

            let lease = store.get(&id).unwrap();
            if expired {
                assert_eq!(lease.status, LeaseStatus::Expired);
                assert_eq!(lease.stake, STAKE);
                assert_eq!(monitor_alerts.count(AlertKind::Slashing), 0);
            } else {
                assert_eq!(lease.status, LeaseStatus::Slashed);
                assert_eq!(lease.stake, STAKE - SLASHED);
                assert_eq!(monitor_alerts.count(AlertKind::Slashing), 1);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slashing_before_expiry_is_not_contested() {
        let store = contested_store();
        let adapter = Arc::new(MockSubnetAdapter::new());
        adapter.push_event(slashing_event("ev-1", "L1", SLASHED, 1_050));

        let mut adapters = SubnetAdapters::new();
        adapters.insert(SubnetId::new("S1"), adapter.clone() as Arc<dyn SubnetAdapterClient>);
        let alerts = Arc::new(RecordingAlertPublisher::new());
        // Before expiry, so the manager has nothing to contest.
        let clock = Arc::new(ManualTimeSource::new(1_060));

        let mut monitor = Monitor::new(MonitorConfig::default(), store.clone(), adapters.clone(), alerts.clone(), clock.clone());
        let mut manager = LeaseManager::new(
            LeaseManagerConfig::for_validator("0xv"),
            store.clone(),
            Arc::new(MockMainChain::new()),
            adapters,
            alerts.clone(),
            clock,
        );

        let (monitor_report, manager_report) = tokio::join!(
            tokio::spawn(async move { monitor.run_cycle().await }),
            tokio::spawn(async move { manager.run_cycle().await }),
        );
        let (monitor_report, manager_report) = (monitor_report.unwrap(), manager_report.unwrap());

        assert_eq!(monitor_report.slashed, vec![LeaseId::new("L1")]);
        assert!(manager_report.expired.is_empty());
        let lease = store.get(&LeaseId::new("L1")).unwrap();
        assert_eq!(lease.status, LeaseStatus::Slashed);
        assert_eq!(lease.stake, STAKE - SLASHED);
    }
}
