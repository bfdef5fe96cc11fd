use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::donors::BloodGroup;

/// The five fixed points of the request lifecycle, in total order.
/// `Secured` is terminal; there is no failure or cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    Pending,
    Matching,
    Contacting,
    Awaiting,
    Secured,
}

impl RequestStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Pending,
            Self::Matching,
            Self::Contacting,
            Self::Awaiting,
            Self::Secured,
        ]
    }

    /// The stages the fallback simulator replays, in order.
    pub const fn fallback_order() -> [Self; 4] {
        [Self::Matching, Self::Contacting, Self::Awaiting, Self::Secured]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Request Received",
            Self::Matching => "Matching Donors",
            Self::Contacting => "Initiating Outreach",
            Self::Awaiting => "Awaiting Responses",
            Self::Secured => "Donor Secured",
        }
    }

    pub const fn position(self) -> usize {
        match self {
            Self::Pending => 0,
            Self::Matching => 1,
            Self::Contacting => 2,
            Self::Awaiting => 3,
            Self::Secured => 4,
        }
    }

    /// The only stage a request at this stage may advance to.
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Matching),
            Self::Matching => Some(Self::Contacting),
            Self::Contacting => Some(Self::Awaiting),
            Self::Awaiting => Some(Self::Secured),
            Self::Secured => None,
        }
    }

    /// Completion percentage shown to observers. A freshly created request
    /// sits at 0; each advanced stage contributes a fifth of the bar.
    pub const fn progress(self) -> u8 {
        match self {
            Self::Pending => 0,
            _ => ((self.position() as u8) + 1) * 20,
        }
    }
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Matching => "matching",
            Self::Contacting => "contacting",
            Self::Awaiting => "awaiting",
            Self::Secured => "secured",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Moderate,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Moderate => "Moderate",
        }
    }
}

/// Opaque request identifier assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in a request's append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub status: RequestStage,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEvent {
    pub fn at(status: RequestStage, timestamp: DateTime<Utc>) -> Self {
        Self {
            status,
            label: status.label().to_string(),
            timestamp,
        }
    }
}

/// A blood request as stored and streamed to observers. `status`, `progress`,
/// and `timeline` are mutated only by the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: RequestId,
    pub patient_name: String,
    pub patient_phone: String,
    pub blood_group: BloodGroup,
    pub location: String,
    pub urgency: Urgency,
    pub org_id: String,
    pub status: RequestStage,
    pub progress: u8,
    pub timeline: Vec<TimelineEvent>,
    pub created_at: DateTime<Utc>,
}

/// Fields an organization supplies when opening a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub patient_name: String,
    pub patient_phone: String,
    pub blood_group: BloodGroup,
    pub location: String,
    pub urgency: Urgency,
    pub org_id: String,
}

impl NewRequest {
    /// Reject incomplete submissions before anything is persisted. Blood
    /// group and urgency are enforced by their types.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_name.trim().is_empty() {
            return Err(ValidationError::MissingField("patientName"));
        }
        if self.patient_phone.trim().is_empty() {
            return Err(ValidationError::MissingField("patientPhone"));
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::MissingField("location"));
        }
        if self.org_id.trim().is_empty() {
            return Err(ValidationError::MissingField("orgId"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}
