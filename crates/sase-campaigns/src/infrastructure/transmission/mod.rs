//! Transmission endpoint adapters
//!
//! `HttpTransmitter` POSTs one JSON request per recipient to the configured
//! endpoint. `DryRunTransmitter` accepts everything and keeps the requests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::ports::outbound::{TransmitError, TransmitRequest, TransmitResponse, Transmitter};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self { endpoint_url: None, api_key: None, timeout_secs: 30 }
    }
}

/// HTTP transmission endpoint client
pub struct HttpTransmitter {
    endpoint_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpTransmitter {
    pub fn new(endpoint_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, TransmitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransmitError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint_url: endpoint_url.to_string(),
            api_key: api_key.map(String::from),
            client,
        })
    }

    /// `None` when no endpoint is configured
    pub fn from_config(config: &TransmissionConfig) -> Result<Option<Self>, TransmitError> {
        match config.endpoint_url.as_deref().filter(|url| !url.trim().is_empty()) {
            Some(url) => Ok(Some(Self::new(
                url,
                config.api_key.as_deref(),
                Duration::from_secs(config.timeout_secs.max(1)),
            )?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Transmitter for HttpTransmitter {
    async fn send(&self, request: TransmitRequest) -> Result<TransmitResponse, TransmitError> {
        let mut req = self.client.post(&self.endpoint_url).json(&request);

        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TransmitError::Timeout
            } else {
                TransmitError::Transport(e.to_string())
            }
        })?;
        let status = resp.status();
        debug!(contact_id = %request.contact_id, status = status.as_u16(), "Endpoint responded");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TransmitResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("endpoint returned HTTP {}", status.as_u16()));
            return Ok(TransmitResponse::rejected(reason));
        }

        resp.json::<TransmitResponse>()
            .await
            .map_err(|e| TransmitError::InvalidResponse(e.to_string()))
    }
}

/// Accepts every request without sending anything
#[derive(Default)]
pub struct DryRunTransmitter {
    sent: Mutex<Vec<TransmitRequest>>,
}

impl DryRunTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far
    pub fn sent(&self) -> Vec<TransmitRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Transmitter for DryRunTransmitter {
    async fn send(&self, request: TransmitRequest) -> Result<TransmitResponse, TransmitError> {
        debug!(to = %request.to, contact_id = %request.contact_id, "Dry run: message accepted");
        self.sent.lock().push(request);
        Ok(TransmitResponse::accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::PersonalizationPayload;
    use crate::domain::value_objects::EntityId;

    fn request() -> TransmitRequest {
        TransmitRequest {
            to: "ada@example.com".into(),
            subject: "Hello".into(),
            html: "<p>Hi Ada</p>".into(),
            from_name: "OpenSASE".into(),
            reply_to: None,
            sending_domain_id: Some("dom-1".into()),
            campaign_id: EntityId::from("k1"),
            contact_id: EntityId::from("c1"),
            personalization: PersonalizationPayload {
                first_name: Some("Ada".into()),
                last_name: None,
                email: "ada@example.com".into(),
            },
        }
    }

    #[test]
    fn test_no_endpoint_configured() {
        assert!(HttpTransmitter::from_config(&TransmissionConfig::default()).unwrap().is_none());
        let blank = TransmissionConfig { endpoint_url: Some("  ".into()), ..Default::default() };
        assert!(HttpTransmitter::from_config(&blank).unwrap().is_none());
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["to"], "ada@example.com");
        assert_eq!(json["campaign_id"], "k1");
        assert_eq!(json["personalization"]["first_name"], "Ada");
    }

    #[test]
    fn test_response_without_error_field() {
        let resp: TransmitResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(resp.failure_reason().as_deref(), Some("endpoint reported failure"));
    }

    #[tokio::test]
    async fn test_dry_run_records() {
        let transmitter = DryRunTransmitter::new();
        let resp = transmitter.send(request()).await.unwrap();
        assert!(resp.success);
        assert_eq!(transmitter.sent().len(), 1);
    }
}
