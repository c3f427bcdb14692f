//! Derivation of the next free stall identifier and display name.
//!
//! Two numbering spaces are tracked independently: the internal `stall-<n>`
//! identifier, which is global, and the `Stall <n>` display name, which may be
//! scoped to a single stall type. Nothing is stored between calls, every
//! allocation is recomputed from the records passed in.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::stall::StallRecord;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"stall-([0-9]+)").unwrap());
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)stall\s+([0-9]+)").unwrap());

/// Next unused number in each identifier space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextNumbers {
    pub id: u64,
    pub name: u64,
}

impl NextNumbers {
    pub fn stall_id(&self) -> String {
        format!("stall-{}", self.id)
    }

    pub fn stall_name(&self) -> String {
        format!("Stall {}", self.name)
    }
}

/// Number captured by the first match of `pattern` in `text`.
/// Digit runs that don't fit into `u64` count as no match.
fn extract_number(pattern: &Regex, text: &str) -> Option<u64> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

pub fn id_number(id: &str) -> Option<u64> {
    extract_number(&ID_PATTERN, id)
}

pub fn name_number(name: &str) -> Option<u64> {
    extract_number(&NAME_PATTERN, name)
}

/// Stall type comparison key: trimmed and case-folded.
pub fn normalize_type(stall_type: &str) -> String {
    stall_type.trim().to_lowercase()
}

/// Computes next stall numbers for `stalls`.
///
/// The id number is always computed over all records. When `type_filter` is
/// given, only records of that type take part in the name number.
pub fn next_stall_numbers(stalls: &[StallRecord], type_filter: Option<&str>) -> NextNumbers {
    let max_id = stalls
        .iter()
        .filter_map(|stall| id_number(&stall.id))
        .max()
        .unwrap_or(0);

    let type_filter = type_filter.map(normalize_type);
    let max_name = stalls
        .iter()
        .filter(|stall| match &type_filter {
            Some(filter) => normalize_type(&stall.stall_type) == *filter,
            None => true,
        })
        .filter_map(|stall| name_number(&stall.name))
        .max()
        .unwrap_or(0);

    NextNumbers {
        id: max_id.saturating_add(1),
        name: max_name.saturating_add(1),
    }
}
