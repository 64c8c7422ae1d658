// Copyright 2025 Csvql Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value type for csvql - runtime scalars with SQL coercion
//!
//! Fields read from delimited text files always start life as strings (or
//! Null for unquoted empty fields); the coercion methods here implement the
//! implicit promotion table used everywhere else: predicates convert through
//! [`Value::ternary`], arithmetic through [`Value::as_integer`] /
//! [`Value::as_float`], and grouping/DISTINCT/set operations through the
//! normalized [`Value::comparison_key`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::ternary::Ternary;

/// Datetime formats accepted by implicit string conversion
/// Order matters - more specific formats first
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A runtime value
///
/// This is the scalar kind of the query language. String uses `Arc<str>`
/// for cheap cloning: records are cloned on every working-view copy and on
/// every join candidate row.
#[derive(Debug, Clone)]
pub enum Value {
    /// UTF-8 text
    String(Arc<str>),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit IEEE float
    Float(f64),

    /// Boolean scalar
    Boolean(bool),

    /// Predicate result, kept distinct from Boolean so UNKNOWN survives
    Ternary(Ternary),

    /// Point in time (UTC)
    Datetime(DateTime<Utc>),

    /// NULL
    Null,
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(Arc::from(value.into().as_str()))
    }

    /// Create a string value from an existing Arc (zero-copy)
    pub fn string_arc(value: Arc<str>) -> Self {
        Value::String(value)
    }

    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    pub fn float(value: f64) -> Self {
        Value::Float(value)
    }

    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    pub fn datetime(value: DateTime<Utc>) -> Self {
        Value::Datetime(value)
    }

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // =========================================================================
    // Coercions
    // =========================================================================

    /// Convert to three-valued logic
    ///
    /// Null converts to UNKNOWN; strings go through the boolean spellings
    /// and numeric forms; numbers treat non-zero as TRUE.
    pub fn ternary(&self) -> Ternary {
        match self {
            Value::Boolean(b) => Ternary::from(*b),
            Value::Ternary(t) => *t,
            Value::Integer(i) => Ternary::from(*i != 0),
            Value::Float(f) => Ternary::from(*f != 0.0),
            Value::String(s) => Ternary::parse(s.trim()).unwrap_or(Ternary::Unknown),
            Value::Datetime(_) => Ternary::Unknown,
            Value::Null => Ternary::Unknown,
        }
    }

    /// Extract as i64 when the value is integral
    ///
    /// Strings must spell an integer (or an integral float); floats must
    /// have no fractional part. Booleans and datetimes do not convert.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Value::String(s) => {
                let t = s.trim();
                t.parse::<i64>().ok().or_else(|| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }

    /// Extract as f64, with numeric string conversion
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Extract as a datetime, parsing strings through the format table
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Datetime(t) => Some(*t),
            Value::String(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }

    /// Extract the text content, converting non-strings to their display form
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    /// SQL ordering comparison
    ///
    /// Returns None when either side is NULL or the sides are incomparable;
    /// predicates turn that into UNKNOWN. Numeric mixing widens to Float,
    /// strings that both spell numbers compare numerically, and everything
    /// else falls back to codepoint-wise string comparison.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }

        if let (Some(a), Some(b)) = (self.as_float(), other.as_float()) {
            return a.partial_cmp(&b);
        }

        if let (Some(a), Some(b)) = (self.as_datetime(), other.as_datetime()) {
            return Some(a.cmp(&b));
        }

        match (self, other) {
            (Value::Boolean(_), _)
            | (_, Value::Boolean(_))
            | (Value::Ternary(_), _)
            | (_, Value::Ternary(_)) => {
                // Logical values only test equality
                let a = self.ternary();
                let b = other.ternary();
                if a == Ternary::Unknown || b == Ternary::Unknown {
                    None
                } else if a == b {
                    Some(Ordering::Equal)
                } else {
                    Some(Ordering::Less)
                }
            }
            _ => {
                let a = self.to_string();
                let b = other.to_string();
                Some(a.cmp(&b))
            }
        }
    }

    /// SQL equality as a ternary predicate
    pub fn equal(&self, other: &Value) -> Ternary {
        match self.compare(other) {
            Some(Ordering::Equal) => Ternary::True,
            Some(_) => Ternary::False,
            None => Ternary::Unknown,
        }
    }

    /// Total ordering for sorting, with NULL handled by the caller
    ///
    /// Values that the SQL rules cannot order still need a deterministic
    /// sort position, so incomparable pairs order by display form.
    pub fn order(&self, other: &Value) -> Ordering {
        match self.compare(other) {
            Some(ord) => ord,
            None => self.to_string().cmp(&other.to_string()),
        }
    }

    /// Normalized key for grouping, DISTINCT and set operations
    ///
    /// Values that compare equal under the SQL rules must produce the same
    /// key: `1`, `1.0` and `'1'` collapse to one integer key, strings trim
    /// and uppercase, datetimes key on epoch nanoseconds.
    pub fn comparison_key(&self) -> String {
        if let Some(i) = self.as_integer() {
            return format!("[I]{}", i);
        }
        if let Some(f) = self.as_float() {
            return format!("[F]{}", f);
        }
        match self {
            Value::Datetime(t) => format!("[D]{}", t.timestamp_nanos_opt().unwrap_or(0)),
            Value::Boolean(_) | Value::Ternary(_) => format!("[T]{}", self.ternary()),
            Value::String(s) => format!("[S]{}", s.trim().to_uppercase()),
            Value::Null => "[N]".to_string(),
            // Numerics were handled above
            Value::Integer(_) | Value::Float(_) => unreachable!(),
        }
    }

    /// Render in SQL literal form: quoted strings, bare numbers, NULL
    ///
    /// Used by PRINT and by error messages that embed a value.
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s),
            Value::Datetime(t) => format!("'{}'", format_datetime(t)),
            Value::Null => "NULL".to_string(),
            other => other.to_string(),
        }
    }
}

/// Structural equality, used by tests and AST comparison
///
/// This is not SQL equality: no coercion happens and Null equals Null.
/// Predicates use [`Value::equal`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Ternary(a), Value::Ternary(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Ternary(t) => write!(f, "{}", t),
            Value::Datetime(t) => write!(f, "{}", format_datetime(t)),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<Ternary> for Value {
    fn from(t: Ternary) -> Self {
        Value::Ternary(t)
    }
}

/// Format a float without trailing zeros, keeping `.0`-free integers short
pub fn format_float(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if f.is_nan() {
        return "NaN".to_string();
    }
    format!("{}", f)
}

/// Format a datetime in RFC 3339
pub fn format_datetime(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

/// Parse a datetime string through the format tables
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    for fmt in DATETIME_FORMATS {
        if let Ok(t) = DateTime::parse_from_str(s, fmt) {
            return Some(t.with_timezone(&Utc));
        }
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&t));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}
