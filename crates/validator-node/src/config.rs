//! # Node Configuration
//!
//! YAML configuration for the validator node.
//!
//! ```yaml
//! validator:
//!   address: "0xabc..."
//!   private_key: "..."
//!   main_chain_rpc: "http://localhost:8545"
//! leases:
//!   auto_activate: true
//!   min_stake: 1000
//!   max_leases: 10
//! monitoring:
//!   enabled: true
//!   check_interval: 1m
//!   alert_webhook: "https://hooks.example.com/alerts"
//! subnets:
//!   - type: evm
//!     rpc: "http://localhost:9545"
//!     adapter_address: "0xdef..."
//! ```
//!
//! Every tuning key is optional. Durations use Go-style strings
//! (`500ms`, `30s`, `1m30s`, `2h`). A file that fails to parse or validate
//! is fatal before any task starts.
//!
//! ## Environment Overrides
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SL_MAIN_CHAIN_RPC` | `validator.main_chain_rpc` |
//! | `SL_ALERT_WEBHOOK` | `monitoring.alert_webhook` |

use serde::{Deserialize, Serialize};
use shared_types::{SubnetId, ValidatorAddress};
use sl_01_lease_store::ActivationPolicy;
use sl_02_lease_manager::LeaseManagerConfig;
use sl_03_monitor::{DispatcherConfig, MonitorConfig};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `validator.main_chain_rpc`.
pub const ENV_MAIN_CHAIN_RPC: &str = "SL_MAIN_CHAIN_RPC";
/// Environment variable overriding `monitoring.alert_webhook`.
pub const ENV_ALERT_WEBHOOK: &str = "SL_ALERT_WEBHOOK";

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Validator identity and main chain endpoint.
    pub validator: ValidatorConfig,
    /// Lease admission and lifecycle.
    pub leases: LeasesConfig,
    /// Subnet health monitoring and alerting.
    pub monitoring: MonitoringConfig,
    /// Subnets this validator leases security to.
    pub subnets: Vec<SubnetConfig>,
}

/// Validator identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// On-chain validator address.
    pub address: String,
    /// Signing key. Never logged.
    pub private_key: PrivateKey,
    /// Main chain JSON-RPC endpoint.
    pub main_chain_rpc: String,
}

/// Lease admission and lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeasesConfig {
    /// Activate pending leases without operator action.
    pub auto_activate: bool,
    /// Minimum stake a lease needs to be activated.
    pub min_stake: u64,
    /// Maximum concurrently active leases.
    pub max_leases: usize,
    /// Lease manager cycle period.
    #[serde(with = "go_duration")]
    pub manager_interval: Duration,
    /// Lease term when the main chain does not report one.
    #[serde(with = "go_duration")]
    pub default_lease_duration: Duration,
    /// Time a slashed lease is kept before termination.
    #[serde(with = "go_duration")]
    pub slashing_grace_period: Duration,
    /// Consecutive activation failures before alerting.
    pub activation_retry_limit: u32,
    /// Pending age that raises a `pending-stuck` alert.
    #[serde(with = "go_duration")]
    pub pending_alert_after: Duration,
}

impl Default for LeasesConfig {
    fn default() -> Self {
        Self {
            auto_activate: true,
            min_stake: 0,
            max_leases: 10,
            manager_interval: Duration::from_secs(30),
            default_lease_duration: Duration::from_secs(720 * 3600),
            slashing_grace_period: Duration::from_secs(24 * 3600),
            activation_retry_limit: 3,
            pending_alert_after: Duration::from_secs(3600),
        }
    }
}

/// Monitoring and alerting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Run the monitor loop.
    pub enabled: bool,
    /// Monitor cycle period.
    #[serde(with = "go_duration")]
    pub check_interval: Duration,
    /// Alert webhook URL. Empty means alerts are only logged.
    pub alert_webhook: String,
    /// Consecutive failed checks before a connectivity alert.
    pub failure_threshold: u32,
    /// Deadline for every remote call.
    #[serde(with = "go_duration")]
    pub rpc_timeout: Duration,
    /// Delivery attempts per alert.
    pub alert_max_attempts: u32,
    /// Delay after the first failed delivery; doubles on each retry.
    #[serde(with = "go_duration")]
    pub alert_backoff: Duration,
    /// Warn this long before a lease expires. `0s` disables.
    #[serde(with = "go_duration")]
    pub expiry_warning: Duration,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: Duration::from_secs(60),
            alert_webhook: String::new(),
            failure_threshold: 3,
            rpc_timeout: Duration::from_secs(10),
            alert_max_attempts: 3,
            alert_backoff: Duration::from_millis(500),
            expiry_warning: Duration::from_secs(3600),
        }
    }
}

/// One subnet adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetConfig {
    /// Subnet id as reported by the main chain. Defaults to `adapter_address`.
    pub id: Option<String>,
    /// Adapter flavour, informational.
    #[serde(rename = "type")]
    pub kind: String,
    /// Adapter JSON-RPC endpoint.
    pub rpc: String,
    /// Adapter contract address on the subnet.
    pub adapter_address: String,
}

impl SubnetConfig {
    /// Id this subnet is keyed by.
    pub fn subnet_id(&self) -> SubnetId {
        match &self.id {
            Some(id) if !id.is_empty() => SubnetId::new(id.clone()),
            _ => SubnetId::new(self.adapter_address.clone()),
        }
    }
}

/// Validator signing key. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Whether a key was configured.
    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }

    /// Raw key material.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            f.write_str("PrivateKey(<redacted>)")
        } else {
            f.write_str("PrivateKey(<unset>)")
        }
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML is malformed or a duration failed to parse.
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required value is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A numeric or duration value is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending key.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A URL did not parse as http(s).
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl {
        /// Offending key.
        field: &'static str,
        /// Value as configured.
        value: String,
    },

    /// Two subnets share an id.
    #[error("duplicate subnet id: {0}")]
    DuplicateSubnet(String),
}

impl NodeConfig {
    /// Read, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml(&raw)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without validating.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Replace values for which `lookup` returns a non-empty string.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(rpc) = lookup(ENV_MAIN_CHAIN_RPC).filter(|v| !v.is_empty()) {
            self.validator.main_chain_rpc = rpc;
        }
        if let Some(webhook) = lookup(ENV_ALERT_WEBHOOK).filter(|v| !v.is_empty()) {
            self.monitoring.alert_webhook = webhook;
        }
    }

    /// Check required fields, ranges, URLs and subnet id uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validator.address.trim().is_empty() {
            return Err(ConfigError::MissingField("validator.address"));
        }
        if self.validator.main_chain_rpc.trim().is_empty() {
            return Err(ConfigError::MissingField("validator.main_chain_rpc"));
        }
        check_url("validator.main_chain_rpc", &self.validator.main_chain_rpc)?;

        if self.leases.max_leases == 0 {
            return Err(invalid("leases.max_leases", "must be greater than 0"));
        }
        check_positive("leases.manager_interval", self.leases.manager_interval)?;
        check_positive("leases.default_lease_duration", self.leases.default_lease_duration)?;
        if self.leases.activation_retry_limit == 0 {
            return Err(invalid("leases.activation_retry_limit", "must be greater than 0"));
        }

        check_positive("monitoring.check_interval", self.monitoring.check_interval)?;
        check_positive("monitoring.rpc_timeout", self.monitoring.rpc_timeout)?;
        check_positive("monitoring.alert_backoff", self.monitoring.alert_backoff)?;
        if self.monitoring.failure_threshold == 0 {
            return Err(invalid("monitoring.failure_threshold", "must be greater than 0"));
        }
        if self.monitoring.alert_max_attempts == 0 {
            return Err(invalid("monitoring.alert_max_attempts", "must be greater than 0"));
        }
        if !self.monitoring.alert_webhook.is_empty() {
            check_url("monitoring.alert_webhook", &self.monitoring.alert_webhook)?;
        }

        let mut seen = HashSet::new();
        for subnet in &self.subnets {
            if subnet.rpc.trim().is_empty() {
                return Err(ConfigError::MissingField("subnets[].rpc"));
            }
            check_url("subnets[].rpc", &subnet.rpc)?;
            if subnet.adapter_address.trim().is_empty() {
                return Err(ConfigError::MissingField("subnets[].adapter_address"));
            }
            let id = subnet.subnet_id();
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateSubnet(id.to_string()));
            }
        }

        Ok(())
    }

    /// Validator address as a typed id.
    pub fn validator_address(&self) -> ValidatorAddress {
        ValidatorAddress::new(self.validator.address.clone())
    }

    /// Store admission policy.
    pub fn activation_policy(&self) -> ActivationPolicy {
        ActivationPolicy::new(self.leases.max_leases, self.leases.min_stake)
    }

    /// Lease manager settings.
    pub fn manager_config(&self) -> LeaseManagerConfig {
        LeaseManagerConfig {
            validator_address: self.validator_address(),
            interval: self.leases.manager_interval,
            auto_activate: self.leases.auto_activate,
            default_lease_duration: self.leases.default_lease_duration,
            slashing_grace_period: self.leases.slashing_grace_period,
            activation_retry_limit: self.leases.activation_retry_limit,
            pending_alert_after: self.leases.pending_alert_after,
            rpc_timeout: self.monitoring.rpc_timeout,
        }
    }

    /// Monitor settings.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            interval: self.monitoring.check_interval,
            failure_threshold: self.monitoring.failure_threshold,
            rpc_timeout: self.monitoring.rpc_timeout,
            slashing_grace_period: self.leases.slashing_grace_period,
            expiry_warning: self.monitoring.expiry_warning,
        }
    }

    /// Alert delivery settings.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            max_attempts: self.monitoring.alert_max_attempts,
            initial_backoff: self.monitoring.alert_backoff,
            send_timeout: self.monitoring.rpc_timeout,
            ..DispatcherConfig::default()
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn check_positive(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(invalid(field, "must be a positive duration"));
    }
    Ok(())
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let bad = || ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    };
    let url = reqwest::Url::parse(value).map_err(|_| bad())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().map_or(true, str::is_empty) {
        return Err(bad());
    }
    Ok(())
}

/// Go-style duration strings: a sequence of `<number><unit>` with units
/// `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`. A bare `0` is zero.
pub mod go_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    /// Parse `1m30s`, `500ms`, `2h`, `1.5h`.
    pub fn parse(input: &str) -> Result<Duration, String> {
        let s = input.trim();
        if s.is_empty() {
            return Err("empty duration".to_string());
        }
        if s == "0" {
            return Ok(Duration::ZERO);
        }

        let mut total_nanos: f64 = 0.0;
        let mut rest = s;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| format!("missing unit in duration {input:?}"))?;
            if number_len == 0 {
                return Err(format!("invalid duration {input:?}"));
            }
            let value: f64 = rest[..number_len]
                .parse()
                .map_err(|_| format!("invalid number in duration {input:?}"))?;
            rest = &rest[number_len..];

            let unit_len = rest
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(rest.len());
            let nanos_per_unit = match &rest[..unit_len] {
                "ns" => 1.0,
                "us" | "µs" => 1e3,
                "ms" => 1e6,
                "s" => 1e9,
                "m" => 60.0 * 1e9,
                "h" => 3600.0 * 1e9,
                unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
            };
            rest = &rest[unit_len..];
            total_nanos += value * nanos_per_unit;
        }

        if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
            return Err(format!("duration {input:?} out of range"));
        }
        Ok(Duration::from_nanos(total_nanos.round() as u64))
    }

    /// `<h>h<m>m<s>s` for whole seconds, otherwise the coarsest of
    /// `ms`, `us` or `ns` that loses nothing.
    pub fn format(duration: Duration) -> String {
        if duration.is_zero() {
            return "0s".to_string();
        }
        let subsec = duration.subsec_nanos();
        if subsec % 1_000_000 != 0 {
            return if subsec % 1_000 == 0 {
                format!("{}us", duration.as_micros())
            } else {
                format!("{}ns", duration.as_nanos())
            };
        }
        if subsec != 0 {
            return format!("{}ms", duration.as_millis());
        }

        let secs = duration.as_secs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        let mut out = String::new();
        if h > 0 {
            out.push_str(&format!("{h}h"));
        }
        if m > 0 {
            out.push_str(&format!("{m}m"));
        }
        if s > 0 {
            out.push_str(&format!("{s}s"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL: &str = r#"
validator:
  address: "0xvalidator"
  private_key: "super-secret"
  main_chain_rpc: "http://localhost:8545"
leases:
  auto_activate: false
  min_stake: 1000
  max_leases: 4
  manager_interval: 15s
  slashing_grace_period: 2h
monitoring:
  enabled: true
  check_interval: 1m30s
  alert_webhook: "https://hooks.example.com/alerts"
  alert_backoff: 250ms
  expiry_warning: 0s
subnets:
  - type: evm
    rpc: "http://localhost:9545"
    adapter_address: "0xadapter-a"
  - id: subnet-b
    type: cosmos
    rpc: "http://localhost:9646"
    adapter_address: "0xadapter-b"
"#;

    fn valid() -> NodeConfig {
        NodeConfig::from_yaml(FULL).unwrap()
    }

    #[test]
    fn test_parse_full_config() {
        let config = valid();
        config.validate().unwrap();

        assert_eq!(config.validator.address, "0xvalidator");
        assert!(!config.leases.auto_activate);
        assert_eq!(config.leases.min_stake, 1000);
        assert_eq!(config.leases.max_leases, 4);
        assert_eq!(config.leases.manager_interval, Duration::from_secs(15));
        assert_eq!(config.leases.slashing_grace_period, Duration::from_secs(7200));
        assert_eq!(config.monitoring.check_interval, Duration::from_secs(90));
        assert_eq!(config.monitoring.alert_backoff, Duration::from_millis(250));
        assert!(config.monitoring.expiry_warning.is_zero());
        assert_eq!(config.subnets[0].kind, "evm");
        assert_eq!(config.subnets[0].subnet_id().as_str(), "0xadapter-a");
        assert_eq!(config.subnets[1].subnet_id().as_str(), "subnet-b");
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = NodeConfig::from_yaml(
            "validator: { address: v, main_chain_rpc: 'http://chain:8545' }\n",
        )
        .unwrap();
        config.validate().unwrap();

        assert!(config.leases.auto_activate);
        assert_eq!(config.leases.max_leases, 10);
        assert_eq!(config.leases.default_lease_duration, Duration::from_secs(720 * 3600));
        assert!(config.monitoring.enabled);
        assert_eq!(config.monitoring.check_interval, Duration::from_secs(60));
        assert_eq!(config.monitoring.rpc_timeout, Duration::from_secs(10));
        assert!(config.subnets.is_empty());
    }

    #[test]
    fn test_invalid_duration_is_parse_error() {
        let raw = FULL.replace("check_interval: 1m30s", "check_interval: soon");
        assert!(matches!(NodeConfig::from_yaml(&raw), Err(ConfigError::Parse(_))));

        let raw = FULL.replace("check_interval: 1m30s", "check_interval: 30");
        assert!(matches!(NodeConfig::from_yaml(&raw), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_rules() {
        let mut config = valid();
        config.validator.address.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("validator.address"))
        ));

        let mut config = valid();
        config.leases.max_leases = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "leases.max_leases", .. })
        ));

        let mut config = valid();
        config.monitoring.check_interval = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "monitoring.check_interval", .. })
        ));

        let mut config = valid();
        config.monitoring.alert_webhook = "ftp://hooks.example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut config = valid();
        config.monitoring.alert_webhook = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut config = valid();
        config.subnets[1].id = Some("0xadapter-a".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateSubnet(id)) if id == "0xadapter-a"));
    }

    #[test]
    fn test_empty_webhook_is_allowed() {
        let mut config = valid();
        config.monitoring.alert_webhook.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_MAIN_CHAIN_RPC, "http://override:8545"),
            (ENV_ALERT_WEBHOOK, ""),
        ]
        .into_iter()
        .collect();

        let mut config = valid();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.validator.main_chain_rpc, "http://override:8545");
        assert_eq!(config.monitoring.alert_webhook, "https://hooks.example.com/alerts");
    }

    #[test]
    fn test_private_key_is_redacted() {
        let config = valid();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
        assert_eq!(config.validator.private_key.expose(), "super-secret");
    }

    #[test]
    fn test_derived_subsystem_configs() {
        let config = valid();

        let manager = config.manager_config();
        assert_eq!(manager.validator_address.as_str(), "0xvalidator");
        assert_eq!(manager.interval, Duration::from_secs(15));
        assert!(!manager.auto_activate);

        let monitor = config.monitor_config();
        assert_eq!(monitor.interval, Duration::from_secs(90));
        assert_eq!(monitor.slashing_grace_period, Duration::from_secs(7200));

        let policy = config.activation_policy();
        assert_eq!(policy.max_active, 4);
        assert_eq!(policy.min_stake, 1000);

        let dispatcher = config.dispatcher_config();
        assert_eq!(dispatcher.initial_backoff, Duration::from_millis(250));
        assert_eq!(dispatcher.max_attempts, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.subnets.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_parse_go_durations() {
        use go_duration::parse;
        assert_eq!(parse("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse("0").unwrap(), Duration::ZERO);

        for bad in ["", "30", "s", "1x", "1h-5m", "-1s"] {
            assert!(parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_format_go_durations() {
        use go_duration::format;
        assert_eq!(format(Duration::from_secs(90)), "1m30s");
        assert_eq!(format(Duration::from_secs(7200)), "2h");
        assert_eq!(format(Duration::from_millis(500)), "500ms");
        assert_eq!(format(Duration::ZERO), "0s");
        assert_eq!(format(Duration::from_micros(250)), "250us");
        assert_eq!(format(Duration::from_micros(1_500)), "1500us");
        assert_eq!(format(Duration::new(1, 7)), "1000000007ns");
    }

    #[test]
    fn test_sub_millisecond_durations_survive_serialization() {
        use go_duration::{format, parse};
        for d in [
            Duration::from_micros(250),
            Duration::from_nanos(1_500),
            Duration::new(2, 250_000),
            Duration::from_millis(1_500),
        ] {
            assert_eq!(parse(&format(d)).unwrap(), d, "{d:?}");
        }
    }
}
