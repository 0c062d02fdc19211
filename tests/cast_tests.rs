/// Unit tests for the InvoiceXpress SDK cast engine.
///
/// Covers null passthrough, numeric and decimal casts, date parsing priority,
/// JSON encode/decode and the lenient handling of unknown cast names.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;
use serde_json::json;

use invoicexpress_sdk::cast::*;
use invoicexpress_sdk::decimal::FixedDecimal;
use invoicexpress_sdk::value::FieldValue;

const ALL_KINDS: [CastKind; 12] = [
    CastKind::Integer,
    CastKind::Float,
    CastKind::Decimal(2),
    CastKind::String,
    CastKind::Boolean,
    CastKind::Object,
    CastKind::Json,
    CastKind::ToJson,
    CastKind::Date,
    CastKind::DateTime,
    CastKind::Timestamp,
    CastKind::ToDate,
];

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Null passthrough
// ---------------------------------------------------------------------------

#[test]
fn test_null_passes_through_every_kind() {
    for kind in ALL_KINDS {
        assert_eq!(cast(FieldValue::Null, kind).unwrap(), FieldValue::Null, "{kind}");
    }
}

#[test]
fn test_null_json_value_passes_through() {
    assert_eq!(
        cast_value(&serde_json::Value::Null, CastKind::Date).unwrap(),
        FieldValue::Null
    );
}

// ---------------------------------------------------------------------------
// Kind names
// ---------------------------------------------------------------------------

#[test]
fn test_parse_aliases() {
    assert_eq!(CastKind::parse("int"), Some(CastKind::Integer));
    assert_eq!(CastKind::parse("double"), Some(CastKind::Float));
    assert_eq!(CastKind::parse("real"), Some(CastKind::Float));
    assert_eq!(CastKind::parse("bool"), Some(CastKind::Boolean));
    assert_eq!(CastKind::parse("array"), Some(CastKind::Json));
    assert_eq!(CastKind::parse("custom_datetime"), Some(CastKind::DateTime));
    assert_eq!(CastKind::parse("to_date"), Some(CastKind::ToDate));
}

#[test]
fn test_parse_decimal_scale() {
    assert_eq!(CastKind::parse("decimal:4"), Some(CastKind::Decimal(4)));
    assert_eq!(CastKind::parse("decimal"), Some(CastKind::Decimal(2)));
    assert_eq!(CastKind::parse("decimal:x"), None);
}

#[test]
fn test_parse_unknown_is_none() {
    assert_eq!(CastKind::parse("money"), None);
}

#[test]
fn test_kind_name_round_trips() {
    for kind in ALL_KINDS {
        assert_eq!(CastKind::parse(&kind.name()), Some(kind));
    }
}

#[test]
fn test_unknown_named_cast_passes_value_through() {
    let value = text("as is");
    assert_eq!(cast_named(value.clone(), "money").unwrap(), value);
}

#[test]
fn test_named_cast_applies_known_kind() {
    assert_eq!(cast_named(text("42"), "int").unwrap(), FieldValue::Integer(42));
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[test]
fn test_integer_from_text_uses_leading_number() {
    assert_eq!(cast(text("12abc"), CastKind::Integer).unwrap(), FieldValue::Integer(12));
    assert_eq!(cast(text("abc"), CastKind::Integer).unwrap(), FieldValue::Integer(0));
    assert_eq!(cast(text("-7.9"), CastKind::Integer).unwrap(), FieldValue::Integer(-7));
}

#[test]
fn test_integer_from_bool_and_float() {
    assert_eq!(cast(FieldValue::Bool(true), CastKind::Integer).unwrap(), FieldValue::Integer(1));
    assert_eq!(cast(FieldValue::Float(3.99), CastKind::Integer).unwrap(), FieldValue::Integer(3));
}

#[test]
fn test_float_special_tokens() {
    assert_eq!(
        cast(text("Infinity"), CastKind::Float).unwrap(),
        FieldValue::Float(f64::INFINITY)
    );
    assert_eq!(
        cast(text("-Infinity"), CastKind::Float).unwrap(),
        FieldValue::Float(f64::NEG_INFINITY)
    );
    let nan = cast(text("NaN"), CastKind::Float).unwrap();
    assert!(nan.as_f64().unwrap().is_nan());
}

#[test]
fn test_non_finite_float_renders_token() {
    assert_eq!(FieldValue::Float(f64::INFINITY).to_json(), json!("Infinity"));
    assert_eq!(FieldValue::Float(f64::NAN).to_json(), json!("NaN"));
}

#[test]
fn test_decimal_rounds_to_scale() {
    let value = cast(text("10.005"), CastKind::Decimal(2)).unwrap();
    assert_eq!(value, FieldValue::Decimal(FixedDecimal::new(dec!(10.01), 2)));
    assert_eq!(value.to_json(), json!("10.01"));
}

#[test]
fn test_decimal_pads_to_scale() {
    let value = cast(FieldValue::Integer(5), CastKind::Decimal(3)).unwrap();
    assert_eq!(value.to_json(), json!("5.000"));
}

#[test]
fn test_decimal_rejects_garbage() {
    assert!(matches!(
        cast(text("twelve"), CastKind::Decimal(2)),
        Err(CastError::InvalidNumber(_))
    ));
}

#[test]
fn test_string_from_bool_follows_wire_convention() {
    assert_eq!(cast(FieldValue::Bool(true), CastKind::String).unwrap(), text("1"));
    assert_eq!(cast(FieldValue::Bool(false), CastKind::String).unwrap(), text(""));
}

#[test]
fn test_string_from_integer() {
    assert_eq!(cast(FieldValue::Integer(508025338), CastKind::String).unwrap(), text("508025338"));
}

#[test]
fn test_boolean_truthiness() {
    assert_eq!(cast(text("0"), CastKind::Boolean).unwrap(), FieldValue::Bool(false));
    assert_eq!(cast(text(""), CastKind::Boolean).unwrap(), FieldValue::Bool(false));
    assert_eq!(cast(text("no"), CastKind::Boolean).unwrap(), FieldValue::Bool(true));
    assert_eq!(cast(FieldValue::Integer(2), CastKind::Boolean).unwrap(), FieldValue::Bool(true));
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[test]
fn test_json_decodes_text() {
    let value = cast(text(r#"{"a":[1,2]}"#), CastKind::Json).unwrap();
    assert_eq!(value, FieldValue::Json(json!({"a": [1, 2]})));
}

#[test]
fn test_json_rejects_malformed_text() {
    assert!(matches!(
        cast(text("{nope"), CastKind::Object),
        Err(CastError::InvalidJson(_))
    ));
}

#[test]
fn test_to_json_encodes_structures() {
    let value = cast(FieldValue::Json(json!({"a": 1})), CastKind::ToJson).unwrap();
    assert_eq!(value, text(r#"{"a":1}"#));
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[test]
fn test_typed_datetime_returned_unchanged() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    assert_eq!(parse_datetime(&FieldValue::DateTime(dt)).unwrap(), dt);
}

#[test]
fn test_numeric_value_is_unix_timestamp() {
    assert_eq!(parse_datetime(&FieldValue::Integer(0)).unwrap(), midnight(1970, 1, 1));
    assert_eq!(parse_datetime(&text("86400")).unwrap(), midnight(1970, 1, 2));
}

#[test]
fn test_standard_date_string() {
    assert_eq!(parse_datetime(&text("2024-3-1")).unwrap(), midnight(2024, 3, 1));
    assert_eq!(parse_datetime(&text("2024-03-01")).unwrap(), midnight(2024, 3, 1));
}

#[test]
fn test_canonical_formats() {
    assert_eq!(parse_datetime(&text("01/03/2024")).unwrap(), midnight(2024, 3, 1));
    let dt = parse_datetime(&text("01/03/2024 14:05:09")).unwrap();
    assert_eq!(dt.format("%H:%M:%S").to_string(), "14:05:09");
}

#[test]
fn test_unparseable_date_fails() {
    assert_eq!(
        parse_datetime(&text("next tuesday")),
        Err(CastError::UnparseableDate("next tuesday".to_string()))
    );
    assert!(matches!(
        cast(text("2024/13/45"), CastKind::Date),
        Err(CastError::UnparseableDate(_))
    ));
}

#[test]
fn test_date_cast_truncates_time() {
    let value = cast(text("01/03/2024 14:05:09"), CastKind::Date).unwrap();
    assert_eq!(value, FieldValue::DateTime(midnight(2024, 3, 1)));
    assert_eq!(value.to_json(), json!("01/03/2024"));
}

#[test]
fn test_datetime_renders_with_time() {
    let value = cast(text("01/03/2024 14:05:09"), CastKind::DateTime).unwrap();
    assert_eq!(value.to_json(), json!("01/03/2024 14:05:09"));
}

#[test]
fn test_timestamp_cast() {
    assert_eq!(
        cast(text("1970-01-02"), CastKind::Timestamp).unwrap(),
        FieldValue::Integer(86400)
    );
}

#[test]
fn test_to_date_writes_canonical_format() {
    assert_eq!(cast(text("2024-3-1"), CastKind::ToDate).unwrap(), text("01/03/2024"));
    assert_eq!(cast(text("01/03/2024"), CastKind::ToDate).unwrap(), text("01/03/2024"));
}

#[test]
fn test_format_date() {
    assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 12, 9).unwrap()), "09/12/2024");
}

#[test]
fn test_coerce_keeps_raw_value_on_failure() {
    assert_eq!(coerce(text("someday"), CastKind::ToDate), text("someday"));
}
