//! Registration form values and their validation.

use std::fmt;

use itertools::Itertools as _;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{
    allocator::NextNumbers,
    stall::{StallRecord, StallStatus},
};

const MAX_TEXT_LEN: usize = 100;
const FIELD_COUNT: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static RENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)(?:\.([0-9]{1,2}))?$").unwrap());
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    VendorName,
    BusinessName,
    Phone,
    Email,
    StallType,
    Rent,
    StartDate,
    EndDate,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::VendorName,
        Field::BusinessName,
        Field::Phone,
        Field::Email,
        Field::StallType,
        Field::Rent,
        Field::StartDate,
        Field::EndDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::VendorName => "Vendor name",
            Field::BusinessName => "Business name",
            Field::Phone => "Phone",
            Field::Email => "Email (optional)",
            Field::StallType => "Stall type",
            Field::Rent => "Rent",
            Field::StartDate => "Start date (YYYY-MM-DD)",
            Field::EndDate => "End date (YYYY-MM-DD)",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    /// Following field, wrapping around to the first one.
    pub fn next(self) -> Field {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Field {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.message)
    }
}

/// All problems found in a form, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }
}

/// Validated form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub vendor_name: String,
    pub business_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub stall_type: String,
    pub rent: u64,
    pub start_date: String,
    pub end_date: String,
}

impl Registration {
    /// Builds the record to persist, labelled with the allocated numbers.
    pub fn into_record(self, next: NextNumbers) -> StallRecord {
        StallRecord {
            key: None,
            id: next.stall_id(),
            name: next.stall_name(),
            stall_type: self.stall_type,
            vendor_name: self.vendor_name,
            business_name: self.business_name,
            phone: self.phone,
            email: self.email,
            rent: self.rent,
            start_date: self.start_date,
            end_date: self.end_date,
            status: StallStatus::Pending,
        }
    }
}

/// Raw text of every form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    values: [String; FIELD_COUNT],
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn validate(&self) -> Result<Registration, ValidationErrors> {
        let mut errors = Vec::new();
        let mut check = |field: Field, result: Result<(), String>| {
            if let Err(message) = result {
                errors.push(FieldError { field, message });
            }
        };

        let vendor_name = self.get(Field::VendorName).trim();
        check(Field::VendorName, required_text(vendor_name));
        let business_name = self.get(Field::BusinessName).trim();
        check(Field::BusinessName, required_text(business_name));

        let phone = self.get(Field::Phone).trim();
        check(Field::Phone, validate_phone(phone));

        let email = self.get(Field::Email).trim();
        if !email.is_empty() && !EMAIL_PATTERN.is_match(email) {
            check(Field::Email, Err("not a valid email address".to_string()));
        }

        let stall_type = self.get(Field::StallType).trim();
        check(Field::StallType, required_text(stall_type));

        let rent = parse_rent(self.get(Field::Rent).trim());
        check(Field::Rent, rent.clone().map(|_| ()));

        let start_date = self.get(Field::StartDate).trim();
        let start = parse_date(start_date);
        check(Field::StartDate, start.clone().map(|_| ()));

        let end_date = self.get(Field::EndDate).trim();
        let end = parse_date(end_date);
        check(
            Field::EndDate,
            match (start, end) {
                (Ok(start), Ok(end)) if end < start => {
                    Err("must not be before the start date".to_string())
                }
                (_, end) => end.map(|_| ()),
            },
        );

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(Registration {
            vendor_name: vendor_name.to_string(),
            business_name: business_name.to_string(),
            phone: phone.to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
            stall_type: stall_type.to_string(),
            rent: rent.unwrap_or_default(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
        })
    }
}

fn required_text(value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err("is required".to_string())
    } else if value.chars().count() > MAX_TEXT_LEN {
        Err(format!("must be at most {MAX_TEXT_LEN} characters"))
    } else {
        Ok(())
    }
}

fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err("is required".to_string());
    }
    let phone = phone.strip_prefix('+').unwrap_or(phone);
    let digits: Vec<char> = phone.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')')).collect();
    if !digits.iter().all(char::is_ascii_digit) || !(7..=15).contains(&digits.len()) {
        return Err("must contain 7 to 15 digits".to_string());
    }
    Ok(())
}

/// Parses a positive amount with up to two decimals into cents.
fn parse_rent(rent: &str) -> Result<u64, String> {
    if rent.is_empty() {
        return Err("is required".to_string());
    }
    let captures = RENT_PATTERN
        .captures(rent)
        .ok_or_else(|| "must be an amount like 120 or 120.50".to_string())?;
    let units: u64 = captures[1].parse().map_err(|_| "is too large".to_string())?;
    let cents = match captures.get(2).map(|m| m.as_str()) {
        Some(fraction) if fraction.len() == 1 => fraction.parse::<u64>().unwrap_or(0) * 10,
        Some(fraction) => fraction.parse::<u64>().unwrap_or(0),
        None => 0,
    };
    let total = units
        .checked_mul(100)
        .and_then(|units| units.checked_add(cents))
        .ok_or_else(|| "is too large".to_string())?;
    if total == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(total)
}

/// Parses an ISO calendar date into comparable `(year, month, day)`.
fn parse_date(date: &str) -> Result<(u32, u32, u32), String> {
    if date.is_empty() {
        return Err("is required".to_string());
    }
    let invalid = || "must be a date like 2024-05-31".to_string();
    let captures = DATE_PATTERN.captures(date).ok_or_else(invalid)?;
    let year: u32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    let day: u32 = captures[3].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    Ok((year, month, day))
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
