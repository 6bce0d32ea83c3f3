//! Outbound IFTTT Webhooks trigger
//!
//! Builds `<base>/trigger/<event>/with/key/<api_key>` and POSTs a JSON body
//! containing only the ingredient values that were supplied. One attempt per
//! trigger, bounded by the configured timeout; no retry, no delivery
//! guarantee.

use crate::config::PluginConfig;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Production IFTTT Webhooks endpoint
pub const DEFAULT_BASE_URL: &str = "https://maker.ifttt.com";

/// Optional ingredient values forwarded to the webhook
///
/// Omitted values are absent from the request body, not null.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value1: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value3: Option<Value>,
}

impl TriggerValues {
    /// No ingredient values
    pub fn none() -> Self {
        Self::default()
    }
}

/// Classified failure of a single trigger attempt
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("IFTTT_API_KEY is not configured")]
    MissingApiKey,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Network(#[from] reqwest::Error),
}

/// Seam for firing webhook events, so handlers can be tested against a stub
#[async_trait]
pub trait EventTrigger: Send + Sync {
    /// Fire one event; returns the HTTP status on 2xx
    async fn trigger(&self, event_name: &str, values: TriggerValues) -> Result<u16, TriggerError>;
}

/// Real HTTP client for the IFTTT Webhooks service
pub struct IftttClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl IftttClient {
    pub fn new(config: &PluginConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Construct against a non-default endpoint (used by tests)
    pub fn with_base_url(config: &PluginConfig, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.api_key().to_string(),
            timeout: config.timeout(),
        }
    }

    fn build_url(&self, event_name: &str) -> String {
        format!(
            "{}/trigger/{}/with/key/{}",
            self.base_url, event_name, self.api_key
        )
    }
}

#[async_trait]
impl EventTrigger for IftttClient {
    async fn trigger(&self, event_name: &str, values: TriggerValues) -> Result<u16, TriggerError> {
        if self.api_key.is_empty() {
            error!("IFTTT_API_KEY is missing in config.json");
            return Err(TriggerError::MissingApiKey);
        }

        let url = self.build_url(event_name);
        debug!("Calling IFTTT event '{}'", event_name);

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&values)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            error!(
                "IFTTT event '{}' returned status {}",
                event_name,
                status.as_u16()
            );
            Err(TriggerError::Status(status.as_u16()))
        }
    }
}
