//! Driver-neutral values and their JSON coercion.
//!
//! Backends translate each fetched cell into a [`DbValue`]; [`coerce_to_json`]
//! then decides how it crosses the wire.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use serde_json::{Number, Value as JsonValue};
use uuid::Uuid;

/// A single fetched cell.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Text(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Fixed-point number in its exact decimal text form.
    Decimal(String),
    /// Date or timestamp without a time zone.
    Timestamp(NaiveDateTime),
    /// Timestamp with a known offset.
    TimestampTz(DateTime<FixedOffset>),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    /// Intervals and anything else with a stable display form.
    Formatted(String),
}

impl DbValue {
    /// Text form for scalar lookups, `None` for NULL.
    pub fn to_text(&self) -> Option<String> {
        match coerce_to_json(self.clone()) {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

// =============================================================================
// JSON Coercion
// =============================================================================

/// Convert a fetched value into a JSON value any MCP client can carry.
pub fn coerce_to_json(value: DbValue) -> JsonValue {
    match value {
        DbValue::Null => JsonValue::Null,
        DbValue::Text(s) => JsonValue::String(s),
        DbValue::Bool(b) => JsonValue::Bool(b),
        DbValue::Int(i) => JsonValue::Number(i.into()),
        DbValue::UInt(u) => JsonValue::Number(u.into()),
        DbValue::Float(f) => float_to_json(f),
        DbValue::Decimal(text) => decimal_to_json(text),
        DbValue::Timestamp(ts) => {
            JsonValue::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        DbValue::TimestampTz(ts) => {
            JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
        DbValue::Bytes(bytes) => JsonValue::String(STANDARD.encode(bytes)),
        DbValue::Uuid(id) => JsonValue::String(id.hyphenated().to_string()),
        DbValue::Formatted(s) => JsonValue::String(s),
    }
}

/// JSON has no NaN or infinity; those become their string form.
fn float_to_json(f: f64) -> JsonValue {
    Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(f.to_string()))
}

/// Emit a decimal as an exact JSON number, keeping every digit of its text.
///
/// Text that is not a JSON number (Oracle's `~` and `-~` infinities) stays a string.
fn decimal_to_json(text: String) -> JsonValue {
    let normalized = if let Some(rest) = text.strip_prefix("-.") {
        format!("-0.{rest}")
    } else if text.starts_with('.') {
        format!("0{text}")
    } else {
        text.clone()
    };
    match normalized.parse::<Number>() {
        Ok(number) if number.to_string() == normalized => JsonValue::Number(number),
        _ => JsonValue::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(coerce_to_json(DbValue::Null), JsonValue::Null);
        assert_eq!(coerce_to_json(DbValue::Text("x".into())), json!("x"));
        assert_eq!(coerce_to_json(DbValue::Bool(true)), json!(true));
        assert_eq!(coerce_to_json(DbValue::Int(-42)), json!(-42));
        assert_eq!(coerce_to_json(DbValue::UInt(u64::MAX)), json!(u64::MAX));
        assert_eq!(coerce_to_json(DbValue::Float(1.5)), json!(1.5));
    }

    #[test]
    fn test_non_finite_float_becomes_string() {
        assert_eq!(coerce_to_json(DbValue::Float(f64::NAN)), json!("NaN"));
        assert_eq!(coerce_to_json(DbValue::Float(f64::INFINITY)), json!("inf"));
    }

    #[test]
    fn test_decimal_is_always_an_exact_number() {
        assert_eq!(coerce_to_json(DbValue::Decimal("123".into())), json!(123));
        assert_eq!(coerce_to_json(DbValue::Decimal("0.1".into())), json!(0.1));

        for text in ["12345678901234567890", "12345678901234567890.123", "-12.50", "1.5"] {
            let value = coerce_to_json(DbValue::Decimal(text.into()));
            assert!(value.is_number(), "{text} should be a number");
            assert_eq!(value.to_string(), text);
        }
    }

    #[test]
    fn test_decimal_without_leading_zero() {
        assert_eq!(coerce_to_json(DbValue::Decimal(".5".into())).to_string(), "0.5");
        assert_eq!(coerce_to_json(DbValue::Decimal("-.25".into())).to_string(), "-0.25");
    }

    #[test]
    fn test_decimal_infinity_stays_text() {
        assert_eq!(coerce_to_json(DbValue::Decimal("~".into())), json!("~"));
        assert_eq!(coerce_to_json(DbValue::Decimal("-~".into())), json!("-~"));
    }

    #[test]
    fn test_naive_timestamp_round_trips() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_nano_opt(13, 45, 7, 123_456_789)
            .unwrap();
        let json = coerce_to_json(DbValue::Timestamp(ts));
        assert_eq!(json, json!("2024-02-29T13:45:07.123456789"));
        let parsed: NaiveDateTime = json.as_str().unwrap().parse().unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_date_without_fraction() {
        let ts = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            coerce_to_json(DbValue::Timestamp(ts)),
            json!("1999-12-31T00:00:00")
        );
    }

    #[test]
    fn test_zoned_timestamp_round_trips() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let ts = offset.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let json = coerce_to_json(DbValue::TimestampTz(ts));
        assert_eq!(json, json!("2024-06-01T08:30:00+02:00"));
        let parsed = DateTime::parse_from_rfc3339(json.as_str().unwrap()).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_bytes_are_base64() {
        let bytes = vec![0u8, 159, 146, 150, 255];
        let json = coerce_to_json(DbValue::Bytes(bytes.clone()));
        let decoded = STANDARD.decode(json.as_str().unwrap()).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_uuid_is_hyphenated() {
        let id = Uuid::parse_str("67e5504410b1426f9247bb680e5fe0c8").unwrap();
        assert_eq!(
            coerce_to_json(DbValue::Uuid(id)),
            json!("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
    }

    #[test]
    fn test_formatted_is_string() {
        assert_eq!(
            coerce_to_json(DbValue::Formatted("+01 02:03:04.000000".into())),
            json!("+01 02:03:04.000000")
        );
    }

    #[test]
    fn test_to_text() {
        assert_eq!(DbValue::Null.to_text(), None);
        assert_eq!(DbValue::Text("ORCL".into()).to_text().as_deref(), Some("ORCL"));
        assert_eq!(DbValue::Int(7).to_text().as_deref(), Some("7"));
    }
}
