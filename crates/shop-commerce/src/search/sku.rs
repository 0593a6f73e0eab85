//! SKU list normalization for bulk lookups.

use crate::error::CommerceError;
use serde_json::Value;

/// Normalize one SKU from a request body.
///
/// Numbers are stringified, and a trailing `.0` left over from a float
/// round-trip through a spreadsheet is stripped. Returns `None` for values
/// that aren't strings or numbers, or that end up empty.
pub fn normalize_sku(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let sku = raw.strip_suffix(".0").unwrap_or(&raw).to_string();
    if sku.is_empty() {
        None
    } else {
        Some(sku)
    }
}

/// Normalize a whole SKU list. An empty list or any invalid entry is a
/// validation error.
pub fn normalize_skus(values: &[Value]) -> Result<Vec<String>, CommerceError> {
    if values.is_empty() {
        return Err(CommerceError::validation("Invalid or empty SKU list."));
    }
    values
        .iter()
        .map(|v| normalize_sku(v).ok_or_else(|| CommerceError::validation("Invalid or empty SKU list.")))
        .collect()
}
