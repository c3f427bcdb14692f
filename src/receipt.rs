//! Scan code payload and printable receipt for a stored stall.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stall::{StallRecord, format_cents};

pub const SCAN_CODE_PREFIX: &str = "STALLREG1:";
pub const RECEIPT_WIDTH: usize = 48;

#[derive(Debug, Error)]
pub enum ScanCodeError {
    #[error("scan code does not start with STALLREG1:")]
    UnknownPrefix,
    #[error("scan code is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("scan code payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Fields carried by a scan code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPayload {
    pub key: Option<u64>,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub stall_type: String,
    pub vendor: String,
    pub business: String,
    pub rent_cents: u64,
    pub start: String,
    pub end: String,
}

impl From<&StallRecord> for ScanPayload {
    fn from(record: &StallRecord) -> Self {
        Self {
            key: record.key,
            id: record.id.clone(),
            name: record.name.clone(),
            stall_type: record.stall_type.clone(),
            vendor: record.vendor_name.clone(),
            business: record.business_name.clone(),
            rent_cents: record.rent,
            start: record.start_date.clone(),
            end: record.end_date.clone(),
        }
    }
}

/// Text to be encoded into a QR code for `record`.
pub fn scan_code(record: &StallRecord) -> String {
    // Serializing a struct of strings and integers can't fail.
    let json = serde_json::to_vec(&ScanPayload::from(record)).unwrap_or_default();
    format!("{SCAN_CODE_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_scan_code(code: &str) -> Result<ScanPayload, ScanCodeError> {
    let encoded = code.trim().strip_prefix(SCAN_CODE_PREFIX).ok_or(ScanCodeError::UnknownPrefix)?;
    let json = URL_SAFE_NO_PAD.decode(encoded)?;
    Ok(serde_json::from_slice(&json)?)
}

fn row(label: &str, value: &str) -> String {
    let pad = RECEIPT_WIDTH.saturating_sub(label.chars().count() + value.chars().count());
    format!("{label}{}{value}", " ".repeat(pad.max(1)))
}

fn centered(text: &str) -> String {
    let pad = RECEIPT_WIDTH.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

/// Renders a fixed-width plain text receipt.
pub fn render_receipt(record: &StallRecord) -> String {
    let rule = "=".repeat(RECEIPT_WIDTH);
    let thin_rule = "-".repeat(RECEIPT_WIDTH);
    let key = record.key.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        rule.clone(),
        centered("MARKET STALL REGISTRATION"),
        centered("Receipt"),
        rule.clone(),
        row("Stall", &format!("{} ({})", record.name, record.id)),
        row("Type", &record.stall_type),
        row("Status", &record.status.to_string()),
        row("Reference", &key),
        thin_rule.clone(),
        row("Vendor", &record.vendor_name),
        row("Business", &record.business_name),
        row("Phone", &record.phone),
    ];
    if let Some(email) = &record.email {
        lines.push(row("Email", email));
    }
    lines.extend([
        thin_rule.clone(),
        row("Period", &format!("{} to {}", record.start_date, record.end_date)),
        row("Rent", &format_cents(record.rent)),
        thin_rule,
        "Scan code:".to_string(),
    ]);

    let code = scan_code(record);
    lines.extend(code.chars().chunks(RECEIPT_WIDTH).into_iter().map(|chunk| chunk.collect::<String>()));
    lines.push(rule);

    let mut receipt = lines.iter().join("\n");
    receipt.push('\n');
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stall::StallStatus;

    fn record() -> StallRecord {
        StallRecord {
            key: Some(11),
            id: "stall-8".to_string(),
            name: "Stall 4".to_string(),
            stall_type: "Fish".to_string(),
            vendor_name: "Ada Lovelace".to_string(),
            business_name: "Ada's Fish".to_string(),
            phone: "555 123 4567".to_string(),
            email: Some("ada@example.com".to_string()),
            rent: 12050,
            start_date: "2024-02-01".to_string(),
            end_date: "2024-02-29".to_string(),
            status: StallStatus::Pending,
        }
    }

    #[test]
    fn test_scan_code_decodes() {
        let code = scan_code(&record());
        assert!(code.starts_with(SCAN_CODE_PREFIX));
        assert!(code[SCAN_CODE_PREFIX.len()..].chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let payload = decode_scan_code(&code).unwrap();
        assert_eq!(payload.id, "stall-8");
        assert_eq!(payload.key, Some(11));
        assert_eq!(payload.rent_cents, 12050);
        assert_eq!(payload.stall_type, "Fish");
    }

    #[test]
    fn test_bad_scan_codes() {
        assert!(matches!(decode_scan_code("QR:abc"), Err(ScanCodeError::UnknownPrefix)));
        assert!(matches!(decode_scan_code("STALLREG1:***"), Err(ScanCodeError::Encoding(_))));
        let not_json = format!("{SCAN_CODE_PREFIX}{}", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(decode_scan_code(&not_json), Err(ScanCodeError::Payload(_))));
    }

    #[test]
    fn test_receipt_layout() {
        let receipt = render_receipt(&record());
        assert!(receipt.lines().all(|line| line.chars().count() <= RECEIPT_WIDTH));
        assert!(receipt.contains("Stall 4 (stall-8)"));
        assert!(receipt.contains(&row("Rent", "120.50")));
        assert!(receipt.contains("2024-02-01 to 2024-02-29"));
        assert!(receipt.contains("ada@example.com"));

        let code: String = receipt
            .lines()
            .skip_while(|line| *line != "Scan code:")
            .skip(1)
            .take_while(|line| !line.starts_with('='))
            .collect();
        assert_eq!(code, scan_code(&record()));
    }

    #[test]
    fn test_receipt_without_email() {
        let mut record = record();
        record.email = None;
        record.key = None;
        let receipt = render_receipt(&record);
        assert!(!receipt.contains("Email"));
        assert!(receipt.lines().any(|line| line.starts_with("Reference") && line.ends_with('-')));
    }
}
