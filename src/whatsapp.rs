//! Outbound message gateway. The wire protocol is a thin HTTP POST; the only
//! contract the rest of the system relies on is send(recipient, text) with a
//! bounded completion time.

use serde_json::json;
use std::time::Duration;

pub const SEND_TIMEOUT_SECS: u64 = 15;

/// Outcome of one dispatch attempt. Timeout is kept apart from Failed
/// because a timeout does not prove non-delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Failed,
    Timeout,
    Error,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Sent => "sent",
            DispatchStatus::Failed => "failed",
            DispatchStatus::Timeout => "timeout",
            DispatchStatus::Error => "error",
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchStatus::Sent)
    }
}

#[derive(Clone)]
pub struct WhatsAppGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WhatsAppGateway {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub async fn send(&self, recipient: &str, text: &str) -> DispatchStatus {
        let url = format!("{}/message/sendText", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "number": recipient,
            "text": text,
        });

        let request = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&payload)
            .send();

        match tokio::time::timeout(Duration::from_secs(SEND_TIMEOUT_SECS), request).await {
            Err(_) => {
                tracing::warn!("WhatsApp send to {} timed out", recipient);
                DispatchStatus::Timeout
            }
            Ok(Err(e)) => {
                tracing::error!("WhatsApp send to {} errored: {}", recipient, e);
                DispatchStatus::Error
            }
            Ok(Ok(response)) if response.status().is_success() => DispatchStatus::Sent,
            Ok(Ok(response)) => {
                tracing::warn!(
                    "WhatsApp gateway rejected send to {}: HTTP {}",
                    recipient,
                    response.status()
                );
                DispatchStatus::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(DispatchStatus::Sent.as_str(), "sent");
        assert_eq!(DispatchStatus::Failed.as_str(), "failed");
        assert_eq!(DispatchStatus::Timeout.as_str(), "timeout");
        assert_eq!(DispatchStatus::Error.as_str(), "error");
    }

    #[test]
    fn test_only_sent_counts_as_sent() {
        assert!(DispatchStatus::Sent.is_sent());
        assert!(!DispatchStatus::Timeout.is_sent());
        assert!(!DispatchStatus::Failed.is_sent());
        assert!(!DispatchStatus::Error.is_sent());
    }
}
