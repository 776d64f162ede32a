//! Field deserialisers that coerce odd backend values instead of failing.
//!
//! A store holds records exported by another system, so a single `null` or
//! mistyped field must not make the whole file unreadable. Each helper takes
//! whatever JSON value is present and maps it onto the field's type, falling
//! back to the field's empty value.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Record ID from a number or numeric string; anything else becomes 0.
pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(d)?;
    let id = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(id.unwrap_or_else(|| {
        log::warn!("unusable record id {value}, using 0");
        0
    }))
}

/// Required text field; `null` and non-scalars become an empty string.
pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text(Value::deserialize(d)?).unwrap_or_default())
}

/// Optional text field; numbers and booleans are kept as their text form.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text(Value::deserialize(d)?))
}

/// Optional count; negative, fractional or non-numeric values become `None`.
pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let n = match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(n.and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "id")]
        id: u64,
        #[serde(default, deserialize_with = "string")]
        status: String,
        #[serde(default, deserialize_with = "opt_string")]
        due: Option<String>,
        #[serde(default, deserialize_with = "opt_u32")]
        crew: Option<u32>,
    }

    fn row(json: &str) -> Row {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_well_formed_values_pass_through() {
        let r = row(r#"{"id": 12, "status": "pending", "due": "2024-05-01", "crew": 8}"#);
        assert_eq!(r.id, 12);
        assert_eq!(r.status, "pending");
        assert_eq!(r.due.as_deref(), Some("2024-05-01"));
        assert_eq!(r.crew, Some(8));
    }

    #[test]
    fn test_nulls_become_empty_values() {
        let r = row(r#"{"id": null, "status": null, "due": null, "crew": null}"#);
        assert_eq!(r.id, 0);
        assert_eq!(r.status, "");
        assert!(r.due.is_none());
        assert!(r.crew.is_none());
    }

    #[test]
    fn test_mistyped_values_are_coerced() {
        let r = row(r#"{"id": "31", "status": true, "due": 20240501, "crew": -3}"#);
        assert_eq!(r.id, 31);
        assert_eq!(r.status, "true");
        assert_eq!(r.due.as_deref(), Some("20240501"));
        assert!(r.crew.is_none());

        let r = row(r#"{"id": "A-7", "status": ["x"], "crew": "12"}"#);
        assert_eq!(r.id, 0);
        assert_eq!(r.status, "");
        assert_eq!(r.crew, Some(12));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let r = row("{}");
        assert_eq!(r.id, 0);
        assert!(r.status.is_empty());
        assert!(r.due.is_none());
    }
}
