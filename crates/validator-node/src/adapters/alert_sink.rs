//! Alert sinks: HTTP webhook and log-only fallback.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use shared_types::{Alert, AlertError, AlertKind, AlertSink, LeaseId, SubnetId};
use std::time::Duration;
use tracing::warn;

/// JSON body POSTed to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    /// Machine-readable kind, e.g. `slashing`.
    pub kind: AlertKind,
    /// Affected lease, if any.
    pub lease_id: Option<LeaseId>,
    /// Affected subnet, if any.
    pub subnet_id: Option<SubnetId>,
    /// Kind-specific fields.
    pub detail: serde_json::Value,
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// Short operator-facing title.
    pub title: String,
    /// One-line summary.
    pub message: String,
}

impl From<&Alert> for WebhookPayload {
    fn from(alert: &Alert) -> Self {
        Self {
            kind: alert.kind,
            lease_id: alert.lease_id.clone(),
            subnet_id: alert.subnet_id.clone(),
            detail: alert.detail.clone(),
            timestamp: rfc3339(alert.timestamp.as_secs()),
            title: alert.kind.title().to_string(),
            message: alert.message(),
        }
    }
}

fn rfc3339(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// POSTs each alert as JSON. One attempt per call.
pub struct WebhookAlertSink {
    client: Client,
    url: String,
}

impl WebhookAlertSink {
    /// Sink for `url`; `timeout` bounds each POST.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlertError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let payload = WebhookPayload::from(alert);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AlertError::Timeout
                } else {
                    AlertError::Delivery(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// Used when no webhook is configured: alerts only reach the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        warn!(
            target: "alerts",
            kind = %alert.kind,
            lease_id = ?alert.lease_id,
            subnet_id = ?alert.subnet_id,
            detail = %alert.detail,
            "{}",
            alert.message()
        );
        Ok(())
    }
}
