//! # Validator Node Runtime
//!
//! Composition root. Owns the lease store, the alert dispatcher and the
//! shutdown channel, and runs the lease manager and monitor loops as
//! separate tasks.
//!
//! ## Shutdown Sequence
//!
//! 1. Raise the shutdown flag.
//! 2. Each loop finishes its in-flight cycle and returns.
//! 3. The last dispatcher handle is dropped.
//! 4. The alert worker drains its queue and exits.

use crate::adapters::{JsonRpcMainChainClient, JsonRpcSubnetAdapter, LogAlertSink, WebhookAlertSink};
use crate::config::NodeConfig;
use shared_types::{
    AlertError, AlertSink, MainChainClient, RpcError, SubnetAdapterClient, SubnetAdapters,
    SystemTimeSource, TimeSource,
};
use sl_01_lease_store::{LeaseArchive, LeaseStore};
use sl_02_lease_manager::LeaseManager;
use sl_03_monitor::{AlertDispatcher, Monitor};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// An RPC client could not be constructed.
    #[error("cannot build client for {target}: {source}")]
    Adapter {
        /// Main chain or subnet id.
        target: String,
        /// Underlying error.
        #[source]
        source: RpcError,
    },

    /// The webhook client could not be constructed.
    #[error("cannot build alert sink: {0}")]
    AlertSink(#[source] AlertError),

    /// `start` was called twice.
    #[error("node already started")]
    AlreadyStarted,

    /// A loop panicked or was cancelled.
    #[error("{task} task failed: {reason}")]
    TaskFailed {
        /// Task name.
        task: &'static str,
        /// Join error.
        reason: String,
    },
}

/// External collaborators of the node.
pub struct NodeDeps {
    /// Main chain client.
    pub main_chain: Arc<dyn MainChainClient>,
    /// One client per configured subnet.
    pub adapters: SubnetAdapters,
    /// Final alert destination.
    pub alert_sink: Arc<dyn AlertSink>,
    /// Wall clock.
    pub clock: Arc<dyn TimeSource>,
    /// Optional persistence hook for terminal leases.
    pub archive: Option<Arc<dyn LeaseArchive>>,
}

impl NodeDeps {
    /// JSON-RPC clients and the webhook sink described by `config`.
    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        let timeout = config.monitoring.rpc_timeout;

        let main_chain = JsonRpcMainChainClient::new(&config.validator.main_chain_rpc, timeout)
            .map_err(|source| NodeError::Adapter {
                target: "main chain".to_string(),
                source,
            })?;

        let mut adapters = SubnetAdapters::new();
        for subnet in &config.subnets {
            let id = subnet.subnet_id();
            let adapter = JsonRpcSubnetAdapter::from_config(subnet, timeout).map_err(|source| {
                NodeError::Adapter {
                    target: format!("subnet {id}"),
                    source,
                }
            })?;
            adapters.insert(id, Arc::new(adapter) as Arc<dyn SubnetAdapterClient>);
        }

        let alert_sink: Arc<dyn AlertSink> = if config.monitoring.alert_webhook.is_empty() {
            warn!("No alert webhook configured, alerts will only be logged");
            Arc::new(LogAlertSink)
        } else {
            Arc::new(
                WebhookAlertSink::new(&config.monitoring.alert_webhook, timeout)
                    .map_err(NodeError::AlertSink)?,
            )
        };

        Ok(Self {
            main_chain: Arc::new(main_chain),
            adapters,
            alert_sink,
            clock: Arc::new(SystemTimeSource),
            archive: None,
        })
    }
}

/// The running validator.
pub struct ValidatorNode {
    config: NodeConfig,
    store: Arc<LeaseStore>,
    dispatcher: Option<AlertDispatcher>,
    alert_worker: Option<JoinHandle<()>>,
    manager: Option<LeaseManager>,
    monitor: Option<Monitor>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ValidatorNode {
    /// Wire the subsystems. Must be called inside a Tokio runtime: the
    /// alert worker is spawned here.
    pub fn new(config: NodeConfig, deps: NodeDeps) -> Self {
        let store = Arc::new(LeaseStore::new(config.activation_policy()));
        let (dispatcher, alert_worker) =
            AlertDispatcher::spawn(deps.alert_sink, config.dispatcher_config());

        let mut manager = LeaseManager::new(
            config.manager_config(),
            Arc::clone(&store),
            deps.main_chain,
            deps.adapters.clone(),
            Arc::new(dispatcher.clone()),
            Arc::clone(&deps.clock),
        );
        if let Some(archive) = deps.archive {
            manager = manager.with_archive(archive);
        }

        let monitor = config.monitoring.enabled.then(|| {
            Monitor::new(
                config.monitor_config(),
                Arc::clone(&store),
                deps.adapters,
                Arc::new(dispatcher.clone()),
                deps.clock,
            )
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            store,
            dispatcher: Some(dispatcher),
            alert_worker: Some(alert_worker),
            manager: Some(manager),
            monitor,
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Shared lease store.
    pub fn store(&self) -> Arc<LeaseStore> {
        Arc::clone(&self.store)
    }

    /// Configuration in force.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Spawn the polling loops.
    pub fn start(&mut self) -> Result<(), NodeError> {
        let manager = self.manager.take().ok_or(NodeError::AlreadyStarted)?;

        info!("===========================================");
        info!("  Security-Leasing Validator Node v{}", crate::VERSION);
        info!("===========================================");
        info!(
            validator = %self.config.validator.address,
            main_chain = %self.config.validator.main_chain_rpc,
            signing_key = self.config.validator.private_key.is_set(),
            "Validator identity"
        );
        info!(
            monitoring = self.config.monitoring.enabled,
            subnets = self.config.subnets.len(),
            max_leases = self.config.leases.max_leases,
            min_stake = self.config.leases.min_stake,
            auto_activate = self.config.leases.auto_activate,
            "Starting subsystems"
        );

        self.tasks.push((
            "lease-manager",
            tokio::spawn(manager.run(self.shutdown_rx.clone())),
        ));
        if let Some(monitor) = self.monitor.take() {
            self.tasks
                .push(("monitor", tokio::spawn(monitor.run(self.shutdown_rx.clone()))));
        } else {
            info!("Monitoring disabled");
        }

        info!("Validator node running");
        Ok(())
    }

    /// Start, wait for `signal`, then shut down.
    pub async fn run_until<F: Future<Output = ()>>(mut self, signal: F) -> Result<(), NodeError> {
        self.start()?;
        signal.await;
        self.shutdown().await
    }

    /// Stop both loops after their current cycle and flush queued alerts.
    pub async fn shutdown(mut self) -> Result<(), NodeError> {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        let mut failure = None;
        for (task, handle) in self.tasks.drain(..) {
            if let Err(e) = handle.await {
                error!(task, error = %e, "Task did not stop cleanly");
                failure.get_or_insert(NodeError::TaskFailed {
                    task,
                    reason: e.to_string(),
                });
            }
        }

        // The worker exits once every publisher handle is gone.
        self.manager.take();
        self.monitor.take();
        self.dispatcher.take();
        if let Some(worker) = self.alert_worker.take() {
            if let Err(e) = worker.await {
                error!(error = %e, "Alert worker did not stop cleanly");
                failure.get_or_insert(NodeError::TaskFailed {
                    task: "alert-dispatcher",
                    reason: e.to_string(),
                });
            }
        }

        info!("Shutdown complete");
        failure.map_or(Ok(()), Err)
    }
}
