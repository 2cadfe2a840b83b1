//! Scalar coercion between request values, bind values and response values.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, NaiveDateTime};
use plcall_core::ScalarKind;

use crate::error::{Result, RuntimeError};
use crate::value::{TIMESTAMP_FORMAT, Value};

const TIMESTAMP_FALLBACKS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.fZ"];

fn expected(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Int => "integer",
        ScalarKind::Decimal => "decimal",
        ScalarKind::Float => "float",
        ScalarKind::Bool => "bool",
        ScalarKind::Text => "text",
        ScalarKind::Bytes => "bytes",
        ScalarKind::Timestamp => "timestamp",
        ScalarKind::Clob => "clob",
        ScalarKind::Blob => "blob",
    }
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");
    (!int.is_empty() || !frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    std::iter::once(TIMESTAMP_FORMAT)
        .chain(TIMESTAMP_FALLBACKS.iter().copied())
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert `value` to the representation of `kind`.
///
/// Null passes through for every kind. `path` only labels errors.
pub fn coerce(value: &Value, kind: ScalarKind, path: &str) -> Result<Value> {
    let fail = || RuntimeError::convert(path, expected(kind), value.kind_name());
    let coerced = match (kind, value) {
        (_, Value::Null) => Value::Null,

        (ScalarKind::Int, Value::Int(i)) => Value::Int(*i),
        (ScalarKind::Int, Value::Float(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Value::Int(*f as i64)
        }
        (ScalarKind::Int, Value::Decimal(s) | Value::Text(s)) => {
            Value::Int(s.trim().parse().map_err(|_| fail())?)
        }
        (ScalarKind::Int, Value::Bool(b)) => Value::Int(i64::from(*b)),

        (ScalarKind::Decimal, Value::Int(i)) => Value::Decimal(i.to_string()),
        (ScalarKind::Decimal, Value::Float(f)) if f.is_finite() => Value::Decimal(f.to_string()),
        (ScalarKind::Decimal, Value::Decimal(s) | Value::Text(s)) if is_decimal(s.trim()) => {
            Value::Decimal(s.trim().to_string())
        }

        (ScalarKind::Float, Value::Float(f)) => Value::Float(*f),
        (ScalarKind::Float, Value::Int(i)) => Value::Float(*i as f64),
        (ScalarKind::Float, Value::Decimal(s) | Value::Text(s)) => {
            Value::Float(s.trim().parse().map_err(|_| fail())?)
        }

        (ScalarKind::Bool, Value::Bool(b)) => Value::Bool(*b),
        (ScalarKind::Bool, Value::Int(0)) => Value::Bool(false),
        (ScalarKind::Bool, Value::Int(1)) => Value::Bool(true),
        (ScalarKind::Bool, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "1" => Value::Bool(true),
            "false" | "n" | "0" => Value::Bool(false),
            _ => return Err(fail()),
        },

        (ScalarKind::Text | ScalarKind::Clob, Value::Text(s)) => Value::Text(s.clone()),
        (ScalarKind::Text | ScalarKind::Clob, Value::Decimal(s)) => Value::Text(s.clone()),
        (ScalarKind::Text | ScalarKind::Clob, Value::Int(i)) => Value::Text(i.to_string()),
        (ScalarKind::Text | ScalarKind::Clob, Value::Float(f)) => Value::Text(f.to_string()),
        (ScalarKind::Text | ScalarKind::Clob, Value::Bytes(b)) => {
            Value::Text(String::from_utf8(b.clone()).map_err(|_| fail())?)
        }

        (ScalarKind::Bytes | ScalarKind::Blob, Value::Bytes(b)) => Value::Bytes(b.clone()),
        (ScalarKind::Bytes | ScalarKind::Blob, Value::Text(s)) => {
            Value::Bytes(BASE64.decode(s.trim()).map_err(|_| fail())?)
        }

        (ScalarKind::Clob | ScalarKind::Blob, Value::Spilled(lob)) => Value::Spilled(lob.clone()),

        (ScalarKind::Timestamp, Value::Timestamp(t)) => Value::Timestamp(*t),
        (ScalarKind::Timestamp, Value::Text(s)) => {
            Value::Timestamp(parse_timestamp(s).ok_or_else(fail)?)
        }

        _ => return Err(fail()),
    };
    Ok(coerced)
}
