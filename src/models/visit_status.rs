use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome recorded for a visit.
///
/// The set is open: unknown values read from the store or sent by a client
/// are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisitStatus {
    #[default]
    Interested,
    Contacted,
    Converted,
    Declined,
    Other(String),
}

impl VisitStatus {
    pub fn as_str(&self) -> &str {
        match self {
            VisitStatus::Interested => "interested",
            VisitStatus::Contacted => "contacted",
            VisitStatus::Converted => "converted",
            VisitStatus::Declined => "declined",
            VisitStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Visit status cannot be empty".to_string());
        }
        Ok(match trimmed.to_lowercase().as_str() {
            "interested" => VisitStatus::Interested,
            "contacted" => VisitStatus::Contacted,
            "converted" => VisitStatus::Converted,
            "declined" => VisitStatus::Declined,
            _ => VisitStatus::Other(trimmed.to_string()),
        })
    }
}

impl From<String> for VisitStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<VisitStatus> for String {
    fn from(status: VisitStatus) -> Self {
        match status {
            VisitStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}
