use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fuzzy::FuzzyTarget;

/// The eight ABO/Rh blood groups. Matched strictly by equality everywhere;
/// an approximate match on blood type is never acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::APositive,
            Self::ANegative,
            Self::BPositive,
            Self::BNegative,
            Self::AbPositive,
            Self::AbNegative,
            Self::OPositive,
            Self::ONegative,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a recognized blood group")]
pub struct ParseBloodGroupError(String);

impl FromStr for BloodGroup {
    type Err = ParseBloodGroupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A+" => Ok(Self::APositive),
            "A-" => Ok(Self::ANegative),
            "B+" => Ok(Self::BPositive),
            "B-" => Ok(Self::BNegative),
            "AB+" => Ok(Self::AbPositive),
            "AB-" => Ok(Self::AbNegative),
            "O+" => Ok(Self::OPositive),
            "O-" => Ok(Self::ONegative),
            _ => Err(ParseBloodGroupError(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonorStatus {
    Active,
    Inactive,
}

impl DonorStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

/// Opaque donor identifier assigned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonorId(pub String);

impl fmt::Display for DonorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered donor record. The engine only reads these; lifecycle changes
/// come through explicit directory operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: DonorId,
    pub name: String,
    pub blood_group: BloodGroup,
    pub location: String,
    pub contact_number: String,
    pub email: String,
    pub last_donation: NaiveDate,
    pub status: DonorStatus,
    pub created_at: DateTime<Utc>,
}

impl FuzzyTarget for Donor {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Caller-supplied fields for registering a donor; the directory assigns the
/// id, the creation timestamp, and the default Active status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonor {
    pub name: String,
    pub blood_group: BloodGroup,
    pub location: String,
    pub contact_number: String,
    pub email: String,
    pub last_donation: NaiveDate,
}

/// Partial update applied to an existing donor record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorPatch {
    pub name: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub location: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub last_donation: Option<NaiveDate>,
    pub status: Option<DonorStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_group_round_trips_through_labels() {
        for group in BloodGroup::ordered() {
            let parsed: BloodGroup = group.label().parse().expect("label parses");
            assert_eq!(parsed, group);
        }
    }

    #[test]
    fn blood_group_parse_is_case_insensitive() {
        assert_eq!("ab+".parse::<BloodGroup>().unwrap(), BloodGroup::AbPositive);
        assert_eq!(" o- ".parse::<BloodGroup>().unwrap(), BloodGroup::ONegative);
        assert!("C+".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn blood_group_serializes_to_display_form() {
        let json = serde_json::to_string(&BloodGroup::OPositive).expect("serializes");
        assert_eq!(json, "\"O+\"");
        let back: BloodGroup = serde_json::from_str("\"AB-\"").expect("deserializes");
        assert_eq!(back, BloodGroup::AbNegative);
    }
}
