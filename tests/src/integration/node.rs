//! # Node Composition
//!
//! Boots a `ValidatorNode` from a config file on disk with mock collaborators
//! and checks that alerts raised by either loop reach the sink before
//! shutdown returns.

#[cfg(test)]
mod tests {
    use shared_types::test_utils::{
        descriptor, slashing_event, ManualTimeSource, MockMainChain, MockSubnetAdapter, RecordingAlertSink,
    };
    use shared_types::{AlertKind, LeaseId, LeaseStatus, SubnetAdapterClient, SubnetAdapters};
    use sl_01_lease_store::{InMemoryArchive, LeaseArchive};
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use validator_node::{NodeConfig, NodeDeps, ValidatorNode};

    const CONFIG: &str = r#"
validator:
  address: "0xvalidator"
  private_key: "k"
  main_chain_rpc: "http://localhost:8545"
leases:
  auto_activate: true
  min_stake: 100
  max_leases: 2
  manager_interval: 10s
  slashing_grace_period: 1h
monitoring:
  enabled: true
  check_interval: 10s
  alert_webhook: ""
  expiry_warning: 0s
subnets:
  - id: S1
    type: evm
    rpc: "http://localhost:9545"
    adapter_address: "0xadapter"
"#;

    struct Mocks {
        chain: Arc<MockMainChain>,
        adapter: Arc<MockSubnetAdapter>,
        sink: Arc<RecordingAlertSink>,
        clock: Arc<ManualTimeSource>,
        archive: Arc<InMemoryArchive>,
    }

    fn load_config() -> NodeConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        NodeConfig::load(file.path()).unwrap()
    }

    fn deps(config: &NodeConfig) -> (NodeDeps, Mocks) {
        let mocks = Mocks {
            chain: Arc::new(MockMainChain::with_pending(vec![
                descriptor("L1", "S1", 1_000),
                descriptor("L2", "S1", 50),
            ])),
            adapter: Arc::new(MockSubnetAdapter::new()),
            sink: Arc::new(RecordingAlertSink::new()),
            clock: Arc::new(ManualTimeSource::new(1_000)),
            archive: Arc::new(InMemoryArchive::new()),
        };

        let mut adapters = SubnetAdapters::new();
        for subnet in &config.subnets {
            adapters.insert(subnet.subnet_id(), mocks.adapter.clone() as Arc<dyn SubnetAdapterClient>);
        }

        let deps = NodeDeps {
            main_chain: mocks.chain.clone(),
            adapters,
            alert_sink: mocks.sink.clone(),
            clock: mocks.clock.clone(),
            archive: Some(mocks.archive.clone() as Arc<dyn LeaseArchive>),
        };
        (deps, mocks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_node_end_to_end() {
        let config = load_config();
        let (deps, mocks) = deps(&config);
        let mut node = ValidatorNode::new(config, deps);
        let store = node.store();

        node.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // L2 is below min_stake and stays pending.
        assert_eq!(store.get(&LeaseId::new("L1")).unwrap().status, LeaseStatus::Active);
        assert_eq!(store.get(&LeaseId::new("L2")).unwrap().status, LeaseStatus::Pending);

        mocks.clock.set(1_005);
        mocks.adapter.push_event(slashing_event("ev-1", "L1", 1_000, 1_001));
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Slashing consumed the whole stake: terminated, then archived by
        // the manager's next cycle.
        tokio::time::sleep(Duration::from_secs(10)).await;
        node.shutdown().await.unwrap();

        assert_eq!(store.get(&LeaseId::new("L1")), None);
        assert!(mocks.archive.contains(&LeaseId::new("L1")));

        let slashing: Vec<_> = mocks
            .sink
            .delivered()
            .into_iter()
            .filter(|a| a.kind == AlertKind::Slashing)
            .collect();
        assert_eq!(slashing.len(), 1);
        assert_eq!(slashing[0].lease_id, Some(LeaseId::new("L1")));
        assert_eq!(slashing[0].detail["remaining_stake"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitoring_disabled_still_delivers_manager_alerts() {
        let mut config = load_config();
        config.monitoring.enabled = false;
        let (deps, mocks) = deps(&config);
        mocks.chain.set_balance(10);

        let node = ValidatorNode::new(config, deps);
        node.run_until(tokio::time::sleep(Duration::from_secs(25)))
            .await
            .unwrap();

        assert_eq!(mocks.adapter.status_calls(), 0);
        let kinds: Vec<_> = mocks.sink.delivered().into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::OverLeased]);
    }
}
