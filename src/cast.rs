/// Cast engine: converts raw wire values into typed [`FieldValue`]s.
///
/// Every entity field may declare a [`CastKind`]. Assignment runs the cast,
/// serialization renders the typed value back to JSON. Null always passes
/// through untouched, whatever the kind.
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::decimal::FixedDecimal;
use crate::value::FieldValue;

/// Canonical wire date format.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Canonical wire date-time format.
pub const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Failures raised by the cast engine on bad input data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    #[error("Unparseable date: {0}")]
    UnparseableDate(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Declared conversion for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Integer,
    Float,
    /// Fixed-point with the given number of fractional digits.
    Decimal(u32),
    String,
    Boolean,
    /// JSON text decoded as an object graph.
    Object,
    /// JSON text decoded as array/map data.
    Json,
    /// Arrays and objects encoded to JSON text.
    ToJson,
    Date,
    DateTime,
    Timestamp,
    /// Any date representation, written back in the canonical date format.
    ToDate,
}

impl CastKind {
    /// Resolve a cast name. Accepts the usual aliases and `decimal:<scale>`.
    pub fn parse(name: &str) -> Option<CastKind> {
        let name = name.trim();
        if let Some(scale) = name.strip_prefix("decimal:") {
            return scale.trim().parse().ok().map(CastKind::Decimal);
        }
        let kind = match name {
            "int" | "integer" => CastKind::Integer,
            "real" | "float" | "double" => CastKind::Float,
            "decimal" => CastKind::Decimal(2),
            "string" => CastKind::String,
            "bool" | "boolean" => CastKind::Boolean,
            "object" => CastKind::Object,
            "array" | "json" => CastKind::Json,
            "to_json" => CastKind::ToJson,
            "date" => CastKind::Date,
            "datetime" | "custom_datetime" => CastKind::DateTime,
            "timestamp" => CastKind::Timestamp,
            "to_date" => CastKind::ToDate,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> String {
        match self {
            CastKind::Integer => "integer".into(),
            CastKind::Float => "float".into(),
            CastKind::Decimal(scale) => format!("decimal:{scale}"),
            CastKind::String => "string".into(),
            CastKind::Boolean => "boolean".into(),
            CastKind::Object => "object".into(),
            CastKind::Json => "json".into(),
            CastKind::ToJson => "to_json".into(),
            CastKind::Date => "date".into(),
            CastKind::DateTime => "datetime".into(),
            CastKind::Timestamp => "timestamp".into(),
            CastKind::ToDate => "to_date".into(),
        }
    }
}

impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ---------------------------------------------------------------------------
// Casting
// ---------------------------------------------------------------------------

/// Cast `value` to `kind`.
///
/// Null, nested entities and entity lists are returned unchanged.
pub fn cast(value: FieldValue, kind: CastKind) -> Result<FieldValue, CastError> {
    if matches!(
        value,
        FieldValue::Null | FieldValue::Entity(_) | FieldValue::List(_)
    ) {
        return Ok(value);
    }

    match kind {
        CastKind::Integer => Ok(FieldValue::Integer(to_integer(&value))),
        CastKind::Float => Ok(FieldValue::Float(to_float(&value))),
        CastKind::Decimal(scale) => to_decimal(&value, scale).map(FieldValue::Decimal),
        CastKind::String => Ok(FieldValue::Text(to_text(&value))),
        CastKind::Boolean => Ok(FieldValue::Bool(to_bool(&value))),
        CastKind::Object | CastKind::Json => from_json_text(value),
        CastKind::ToJson => Ok(to_json_text(value)),
        CastKind::Date => {
            let dt = parse_datetime(&value)?;
            Ok(FieldValue::DateTime(dt.date().and_time(NaiveTime::MIN)))
        }
        CastKind::DateTime => parse_datetime(&value).map(FieldValue::DateTime),
        CastKind::Timestamp => {
            let dt = parse_datetime(&value)?;
            Ok(FieldValue::Integer(dt.and_utc().timestamp()))
        }
        CastKind::ToDate => {
            let dt = parse_datetime(&value)?;
            Ok(FieldValue::Text(dt.format(DATE_FORMAT).to_string()))
        }
    }
}

/// Cast by name. Unknown names pass the value through unchanged.
pub fn cast_named(value: FieldValue, name: &str) -> Result<FieldValue, CastError> {
    match CastKind::parse(name) {
        Some(kind) => cast(value, kind),
        None => {
            debug!("cast.cast_named unknown_kind={} passthrough", name);
            Ok(value)
        }
    }
}

/// Cast a raw JSON value.
pub fn cast_value(value: &Value, kind: CastKind) -> Result<FieldValue, CastError> {
    cast(FieldValue::from(value), kind)
}

/// Infallible cast: kinds that can fail leave the value as given.
pub fn coerce(value: FieldValue, kind: CastKind) -> FieldValue {
    match cast(value.clone(), kind) {
        Ok(cast) => cast,
        Err(e) => {
            debug!("cast.coerce kind={} kept_raw error={}", kind, e);
            value
        }
    }
}

/// Format a calendar date in the canonical wire format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse any supported date representation.
///
/// Priority: typed date-time, Unix timestamp, bare `YYYY-M-D`, the canonical
/// date-time format, then the canonical date format.
pub fn parse_datetime(value: &FieldValue) -> Result<NaiveDateTime, CastError> {
    match value {
        FieldValue::DateTime(dt) => Ok(*dt),
        FieldValue::Integer(secs) => from_timestamp(*secs),
        FieldValue::Float(f) if f.is_finite() => from_timestamp(f.trunc() as i64),
        FieldValue::Text(s) => parse_date_text(s),
        other => Err(CastError::UnparseableDate(format!("{:?}", other))),
    }
}

fn parse_date_text(s: &str) -> Result<NaiveDateTime, CastError> {
    let trimmed = s.trim();
    if let Ok(secs) = trimmed.parse::<i64>() {
        return from_timestamp(secs);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return from_timestamp(f.trunc() as i64);
        }
    }
    if let Some(date) = parse_standard_date(trimmed) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(CastError::UnparseableDate(s.to_string()))
}

/// `YYYY-M-D` with one or two digit month and day.
fn parse_standard_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some()
        || year.len() != 4
        || !(1..=2).contains(&month.len())
        || !(1..=2).contains(&day.len())
    {
        return None;
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !(all_digits(year) && all_digits(month) && all_digits(day)) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn from_timestamp(secs: i64) -> Result<NaiveDateTime, CastError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| CastError::UnparseableDate(secs.to_string()))
}

// ---------------------------------------------------------------------------
// Scalar conversions
// ---------------------------------------------------------------------------

/// Leading-number parse: "12abc" is 12, "abc" is 0.
fn to_integer(value: &FieldValue) -> i64 {
    match value {
        FieldValue::Bool(b) => i64::from(*b),
        FieldValue::Integer(i) => *i,
        FieldValue::Float(f) if f.is_finite() => f.trunc() as i64,
        FieldValue::Decimal(d) => d.inner().trunc().to_i64().unwrap_or(0),
        FieldValue::Text(s) => leading_number(s).trunc() as i64,
        FieldValue::DateTime(dt) => dt.and_utc().timestamp(),
        FieldValue::Json(Value::Array(a)) => i64::from(!a.is_empty()),
        FieldValue::Json(Value::Object(o)) => i64::from(!o.is_empty()),
        _ => 0,
    }
}

fn to_float(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Text(s) => match s.trim() {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            other => leading_number(other),
        },
        FieldValue::Float(f) => *f,
        FieldValue::Integer(i) => *i as f64,
        FieldValue::Bool(b) => f64::from(u8::from(*b)),
        FieldValue::Decimal(d) => d.inner().to_f64().unwrap_or(0.0),
        other => to_integer(other) as f64,
    }
}

fn leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        let ok = c.is_ascii_digit()
            || (i == 0 && (c == '-' || c == '+'))
            || (c == '.' && !seen_dot);
        if !ok {
            break;
        }
        seen_dot |= c == '.';
        end = i + c.len_utf8();
    }
    s[..end].parse().unwrap_or(0.0)
}

fn to_decimal(value: &FieldValue, scale: u32) -> Result<FixedDecimal, CastError> {
    match value {
        FieldValue::Decimal(d) => Ok(FixedDecimal::new(d.into_inner(), scale)),
        FieldValue::Integer(i) => Ok(FixedDecimal::new(Decimal::from(*i), scale)),
        FieldValue::Float(f) => Decimal::try_from(*f)
            .map(|d| FixedDecimal::new(d, scale))
            .map_err(|e| CastError::InvalidNumber(format!("{f}: {e}"))),
        FieldValue::Bool(b) => Ok(FixedDecimal::new(Decimal::from(u8::from(*b)), scale)),
        FieldValue::Text(s) => FixedDecimal::parse(s, scale),
        other => Err(CastError::InvalidNumber(format!("{:?}", other))),
    }
}

fn to_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Bool(true) => "1".to_string(),
        FieldValue::Bool(false) => String::new(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Decimal(d) => d.to_string(),
        FieldValue::DateTime(_) | FieldValue::Json(_) => match value.to_json() {
            Value::String(s) => s,
            other => other.to_string(),
        },
        _ => String::new(),
    }
}

fn to_bool(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(b) => *b,
        FieldValue::Integer(i) => *i != 0,
        FieldValue::Float(f) => *f != 0.0,
        FieldValue::Decimal(d) => !d.inner().is_zero(),
        FieldValue::Text(s) => !(s.is_empty() || s == "0"),
        FieldValue::DateTime(_) => true,
        FieldValue::Json(Value::Array(a)) => !a.is_empty(),
        FieldValue::Json(Value::Object(_)) => true,
        _ => false,
    }
}

fn from_json_text(value: FieldValue) -> Result<FieldValue, CastError> {
    match value {
        FieldValue::Text(s) => serde_json::from_str::<Value>(&s)
            .map(FieldValue::from)
            .map_err(|e| CastError::InvalidJson(e.to_string())),
        other => Ok(other),
    }
}

fn to_json_text(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Json(v @ (Value::Array(_) | Value::Object(_))) => {
            FieldValue::Text(v.to_string())
        }
        other => other,
    }
}
