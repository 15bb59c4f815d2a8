//! Internal helpers for input normalization and row decoding.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, EntityKind, ResultEngine};

/// Case- and width-insensitive lookup key for names (`"  Rote  ROSE "` and
/// `"rote rose"` map to the same key).
pub(crate) fn name_key(value: &str) -> String {
    value
        .nfkc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub(crate) fn normalize_required_name(value: &str, field: &'static str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::validation(field, "must not be empty"));
    }
    Ok(collapsed)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Parse a UUID read back from storage.
pub(crate) fn parse_uuid(value: &str, kind: EntityKind) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::validation("id", format!("invalid {kind} id \"{value}\"")))
}

pub(crate) fn require_positive(value: i64, field: &'static str) -> ResultEngine<i64> {
    if value <= 0 {
        return Err(EngineError::validation(field, "must be > 0"));
    }
    Ok(value)
}

pub(crate) fn require_non_negative(value: i64, field: &'static str) -> ResultEngine<i64> {
    if value < 0 {
        return Err(EngineError::validation(field, "must be >= 0"));
    }
    Ok(value)
}

/// `quantity * unit_price` with overflow reported as a validation error.
pub(crate) fn line_total(quantity: i64, unit_price_minor: i64) -> ResultEngine<i64> {
    quantity
        .checked_mul(unit_price_minor)
        .ok_or_else(|| EngineError::validation("total_price", "amount too large"))
}
