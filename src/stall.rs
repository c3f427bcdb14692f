use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StallStatus {
    #[default]
    Pending,
    Active,
    Inactive,
}

impl fmt::Display for StallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StallStatus::Pending => "pending",
            StallStatus::Active => "active",
            StallStatus::Inactive => "inactive",
        })
    }
}

/// Single vendor stall as kept in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StallRecord {
    /// Primary key assigned by the store, `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<u64>,

    /// Internal identifier, `stall-<n>`.
    pub id: String,

    /// Display name, usually `Stall <n>` but may carry free text.
    pub name: String,

    #[serde(rename = "type")]
    pub stall_type: String,

    pub vendor_name: String,
    pub business_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Rent in cents.
    pub rent: u64,

    pub start_date: String,
    pub end_date: String,
    pub status: StallStatus,
}

/// Formats an amount in cents as `units.cc`.
pub fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_field_name() {
        let record = StallRecord {
            id: "stall-1".to_string(),
            stall_type: "Fish".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Fish");
        assert!(json.get("key").is_none());
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_partial_record_loads() {
        let record: StallRecord =
            serde_json::from_str(r#"{"id": "stall-3", "name": "Stall 3", "extra": true}"#).unwrap();
        assert_eq!(record.id, "stall-3");
        assert_eq!(record.stall_type, "");
        assert_eq!(record.status, StallStatus::Pending);
        assert_eq!(record.key, None);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(123450), "1234.50");
    }
}
