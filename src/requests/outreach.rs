use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::debug;

use super::domain::{BloodRequest, RequestId, Urgency};
use crate::donors::BloodGroup;

/// Result of one outreach attempt. `Unreachable` is a branch, not an error:
/// it routes the request to the fallback simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutreachOutcome {
    /// The automation endpoint accepted the request; all further stage
    /// changes are expected to arrive from that system.
    Confirmed,
    /// The endpoint could not be reached or rejected the call.
    Unreachable(String),
}

/// JSON body posted to the automation endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachPayload {
    pub request_id: RequestId,
    pub patient_name: String,
    pub patient_phone: String,
    pub blood_group: BloodGroup,
    pub location: String,
    pub urgency: Urgency,
    pub org_id: String,
    pub timestamp: DateTime<Utc>,
}

impl OutreachPayload {
    pub fn from_request(request: &BloodRequest) -> Self {
        Self {
            request_id: request.id.clone(),
            patient_name: request.patient_name.clone(),
            patient_phone: request.patient_phone.clone(),
            blood_group: request.blood_group,
            location: request.location.clone(),
            urgency: request.urgency,
            org_id: request.org_id.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Outbound hook notifying the external automation system about a request.
pub trait OutreachTrigger: Send + Sync + 'static {
    fn trigger(&self, payload: OutreachPayload) -> BoxFuture<'static, OutreachOutcome>;
}

/// Production trigger: a single HTTP POST to the configured webhook. Any 2xx
/// response confirms delivery; everything else hands off to the fallback.
#[derive(Debug, Clone)]
pub struct WebhookOutreach {
    client: reqwest::Client,
    url: String,
}

impl WebhookOutreach {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(config: &crate::config::OutreachConfig) -> Self {
        Self::new(config.webhook_url.clone(), config.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl OutreachTrigger for WebhookOutreach {
    fn trigger(&self, payload: OutreachPayload) -> BoxFuture<'static, OutreachOutcome> {
        let client = self.client.clone();
        let url = self.url.clone();

        Box::pin(async move {
            debug!(request_id = %payload.request_id, %url, "posting outreach webhook");

            match client.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => OutreachOutcome::Confirmed,
                Ok(response) => OutreachOutcome::Unreachable(format!(
                    "endpoint responded with {}",
                    response.status()
                )),
                Err(err) => OutreachOutcome::Unreachable(err.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::domain::{RequestStage, TimelineEvent};
    use serde_json::Value;

    #[test]
    fn payload_serializes_with_wire_field_names() {
        let now = Utc::now();
        let request = BloodRequest {
            id: RequestId("req-000042".to_string()),
            patient_name: "Ravi".to_string(),
            patient_phone: "9840012345".to_string(),
            blood_group: BloodGroup::OPositive,
            location: "Anna Nagar".to_string(),
            urgency: Urgency::Critical,
            org_id: "org-chennai-01".to_string(),
            status: RequestStage::Pending,
            progress: 0,
            timeline: vec![TimelineEvent::at(RequestStage::Pending, now)],
            created_at: now,
        };

        let payload = OutreachPayload::from_request(&request);
        let json: Value = serde_json::to_value(&payload).expect("serializes");

        assert_eq!(json["requestId"], "req-000042");
        assert_eq!(json["patientName"], "Ravi");
        assert_eq!(json["patientPhone"], "9840012345");
        assert_eq!(json["bloodGroup"], "O+");
        assert_eq!(json["urgency"], "critical");
        assert_eq!(json["orgId"], "org-chennai-01");
        assert!(json["timestamp"].is_string());
    }
}
