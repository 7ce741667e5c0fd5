use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status recorded on every captured lead and echoed back to the user.
pub const LEAD_CAPTURED_STATUS: &str = "Lead captured successfully";

/// A prospective customer's contact details captured through the form-fill
/// flow. Appended to the lead log, never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl Lead {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            platform: platform.into(),
            timestamp: Utc::now(),
            status: LEAD_CAPTURED_STATUS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lead, LEAD_CAPTURED_STATUS};

    #[test]
    fn new_lead_carries_fixed_status() {
        let lead = Lead::new("Jane Doe", "jane@example.com", "YouTube");
        assert_eq!(lead.status, LEAD_CAPTURED_STATUS);
        assert_eq!(lead.platform, "YouTube");
    }

    #[test]
    fn serializes_timestamp_as_iso8601() {
        let lead = Lead::new("Jane Doe", "jane@example.com", "YouTube");
        let raw = serde_json::to_string(&lead).expect("lead should serialize");
        assert!(raw.contains("\"timestamp\":\""));
        assert!(raw.contains('T'), "timestamp should be ISO-8601: {raw}");
    }
}
