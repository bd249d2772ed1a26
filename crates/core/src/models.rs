use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNKNOWN_FEATURE: &str = "Unknown";

/// Category of user need that drives response selection.
///
/// The known variants are the labels the trained pipeline and the keyword
/// rules produce. Labels coming from an external pretrained model live in
/// `Other` and serialize back to the exact lowercase label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    RequestRescue,
    RequestMedicalAid,
    RequestSupplies,
    RequestInformation,
    MissingPerson,
    PowerFailure,
    EvacuationRequest,
    DamageReport,
    Other(String),
}

impl Intent {
    pub const KNOWN: [Intent; 8] = [
        Intent::RequestRescue,
        Intent::RequestMedicalAid,
        Intent::RequestSupplies,
        Intent::RequestInformation,
        Intent::MissingPerson,
        Intent::PowerFailure,
        Intent::EvacuationRequest,
        Intent::DamageReport,
    ];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "request_rescue" => Self::RequestRescue,
            "request_medical_aid" => Self::RequestMedicalAid,
            "request_supplies" => Self::RequestSupplies,
            "request_information" => Self::RequestInformation,
            "missing_person" => Self::MissingPerson,
            "power_failure" => Self::PowerFailure,
            "evacuation_request" => Self::EvacuationRequest,
            "damage_report" => Self::DamageReport,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::RequestRescue => "request_rescue",
            Self::RequestMedicalAid => "request_medical_aid",
            Self::RequestSupplies => "request_supplies",
            Self::RequestInformation => "request_information",
            Self::MissingPerson => "missing_person",
            Self::PowerFailure => "power_failure",
            Self::EvacuationRequest => "evacuation_request",
            Self::DamageReport => "damage_report",
            Self::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Intent {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Intent> for String {
    fn from(value: Intent) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub location: String,
    pub disaster_type: String,
}

/// One resolved chat turn: exactly one intent and one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    pub intent: Intent,
    pub response: String,
    pub disaster_type: String,
    pub location: String,
}
