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

//! Scalar functions
//!
//! NULL handling follows the SQL convention used throughout the engine:
//! a NULL input makes a NULL output, and an input that does not convert to
//! the type a function needs is treated as NULL rather than an error. The
//! cast functions (STRING, INTEGER, FLOAT, BOOLEAN, TERNARY, DATETIME) are
//! the explicit spellings of the implicit coercion table.

use chrono::{Datelike, Timelike, Utc};

use crate::core::{Result, Ternary, Value};

use super::FunctionRegistry;

/// Register all built-in scalar functions
pub fn register(registry: &mut FunctionRegistry) {
    registry.add_scalar("COALESCE", 1, usize::MAX, coalesce);
    registry.add_scalar("NULLIF", 2, 2, nullif);
    registry.add_scalar("IF", 3, 3, if_fn);
    registry.add_scalar("IFNULL", 2, 2, ifnull);

    registry.add_scalar("ABS", 1, 1, abs);
    registry.add_scalar("CEIL", 1, 1, ceil);
    registry.add_scalar("FLOOR", 1, 1, floor);
    registry.add_scalar("ROUND", 1, 2, round);
    registry.add_scalar("SQRT", 1, 1, sqrt);
    registry.add_scalar("POWER", 2, 2, power);
    registry.add_scalar("EXP", 1, 1, exp);
    registry.add_scalar("LN", 1, 1, ln);
    registry.add_scalar("LOG", 1, 1, log);

    registry.add_scalar("UPPER", 1, 1, upper);
    registry.add_scalar("LOWER", 1, 1, lower);
    registry.add_scalar("TRIM", 1, 1, trim);
    registry.add_scalar("LTRIM", 1, 1, ltrim);
    registry.add_scalar("RTRIM", 1, 1, rtrim);
    registry.add_scalar("LENGTH", 1, 1, length);
    registry.add_scalar("SUBSTR", 2, 3, substr);
    registry.add_scalar("INSTR", 2, 2, instr);
    registry.add_scalar("REPLACE", 3, 3, replace);
    registry.add_scalar("LPAD", 3, 3, lpad);
    registry.add_scalar("RPAD", 3, 3, rpad);
    registry.add_scalar("CONCAT", 1, usize::MAX, concat);

    registry.add_scalar("NOW", 0, 0, now);
    registry.add_scalar("YEAR", 1, 1, year);
    registry.add_scalar("MONTH", 1, 1, month);
    registry.add_scalar("DAY", 1, 1, day);
    registry.add_scalar("HOUR", 1, 1, hour);
    registry.add_scalar("MINUTE", 1, 1, minute);
    registry.add_scalar("SECOND", 1, 1, second);
    registry.add_scalar("DATETIME_FORMAT", 2, 2, datetime_format);

    registry.add_scalar("STRING", 1, 1, cast_string);
    registry.add_scalar("INTEGER", 1, 1, cast_integer);
    registry.add_scalar("FLOAT", 1, 1, cast_float);
    registry.add_scalar("BOOLEAN", 1, 1, cast_boolean);
    registry.add_scalar("TERNARY", 1, 1, cast_ternary);
    registry.add_scalar("DATETIME", 1, 1, cast_datetime);
}

// =============================================================================
// Conditionals
// =============================================================================

fn coalesce(args: &[Value]) -> Result<Value> {
    for arg in args {
        if !arg.is_null() {
            return Ok(arg.clone());
        }
    }
    Ok(Value::Null)
}

fn nullif(args: &[Value]) -> Result<Value> {
    if args[0].equal(&args[1]).is_true() {
        Ok(Value::Null)
    } else {
        Ok(args[0].clone())
    }
}

fn if_fn(args: &[Value]) -> Result<Value> {
    if args[0].ternary().is_true() {
        Ok(args[1].clone())
    } else {
        Ok(args[2].clone())
    }
}

fn ifnull(args: &[Value]) -> Result<Value> {
    if args[0].is_null() {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

// =============================================================================
// Math
// =============================================================================

fn float_fn(args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value> {
    match args[0].as_float() {
        Some(v) => {
            let r = f(v);
            if r.is_nan() {
                Ok(Value::Null)
            } else {
                Ok(Value::Float(r))
            }
        }
        None => Ok(Value::Null),
    }
}

fn abs(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_abs())),
        other => match other.as_float() {
            Some(f) => Ok(Value::Float(f.abs())),
            None => Ok(Value::Null),
        },
    }
}

fn ceil(args: &[Value]) -> Result<Value> {
    float_fn(args, f64::ceil)
}

fn floor(args: &[Value]) -> Result<Value> {
    float_fn(args, f64::floor)
}

fn round(args: &[Value]) -> Result<Value> {
    let places = if args.len() == 2 {
        match args[1].as_integer() {
            Some(p) => p,
            None => return Ok(Value::Null),
        }
    } else {
        0
    };
    match args[0].as_float() {
        Some(v) => {
            let factor = 10f64.powi(places as i32);
            Ok(Value::Float((v * factor).round() / factor))
        }
        None => Ok(Value::Null),
    }
}

fn sqrt(args: &[Value]) -> Result<Value> {
    float_fn(args, f64::sqrt)
}

fn power(args: &[Value]) -> Result<Value> {
    match (args[0].as_float(), args[1].as_float()) {
        (Some(base), Some(exp)) => Ok(Value::Float(base.powf(exp))),
        _ => Ok(Value::Null),
    }
}

fn exp(args: &[Value]) -> Result<Value> {
    float_fn(args, f64::exp)
}

fn ln(args: &[Value]) -> Result<Value> {
    float_fn(args, f64::ln)
}

fn log(args: &[Value]) -> Result<Value> {
    float_fn(args, f64::log10)
}

// =============================================================================
// Strings
// =============================================================================

fn string_fn(args: &[Value], f: impl Fn(&str) -> String) -> Result<Value> {
    match args[0].as_text() {
        Some(s) => Ok(Value::string(f(&s))),
        None => Ok(Value::Null),
    }
}

fn upper(args: &[Value]) -> Result<Value> {
    string_fn(args, |s| s.to_uppercase())
}

fn lower(args: &[Value]) -> Result<Value> {
    string_fn(args, |s| s.to_lowercase())
}

fn trim(args: &[Value]) -> Result<Value> {
    string_fn(args, |s| s.trim().to_string())
}

fn ltrim(args: &[Value]) -> Result<Value> {
    string_fn(args, |s| s.trim_start().to_string())
}

fn rtrim(args: &[Value]) -> Result<Value> {
    string_fn(args, |s| s.trim_end().to_string())
}

fn length(args: &[Value]) -> Result<Value> {
    match args[0].as_text() {
        Some(s) => Ok(Value::Integer(s.chars().count() as i64)),
        None => Ok(Value::Null),
    }
}

/// 1-based substring; a negative start counts back from the end
fn substr(args: &[Value]) -> Result<Value> {
    let (text, start) = match (args[0].as_text(), args[1].as_integer()) {
        (Some(t), Some(s)) => (t, s),
        _ => return Ok(Value::Null),
    };
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let begin = if start > 0 {
        start - 1
    } else if start < 0 {
        len + start
    } else {
        0
    };
    if begin < 0 || begin >= len {
        return Ok(Value::string(""));
    }
    let count = if args.len() == 3 {
        match args[2].as_integer() {
            Some(c) if c >= 0 => c,
            _ => return Ok(Value::Null),
        }
    } else {
        len - begin
    };
    let end = (begin + count).min(len);
    Ok(Value::string(
        chars[begin as usize..end as usize].iter().collect::<String>(),
    ))
}

/// 1-based position of the first occurrence, 0 when absent
fn instr(args: &[Value]) -> Result<Value> {
    match (args[0].as_text(), args[1].as_text()) {
        (Some(haystack), Some(needle)) => {
            let pos = haystack
                .find(&needle)
                .map(|byte| haystack[..byte].chars().count() as i64 + 1)
                .unwrap_or(0);
            Ok(Value::Integer(pos))
        }
        _ => Ok(Value::Null),
    }
}

fn replace(args: &[Value]) -> Result<Value> {
    match (args[0].as_text(), args[1].as_text(), args[2].as_text()) {
        (Some(s), Some(from), Some(to)) => Ok(Value::string(s.replace(&from, &to))),
        _ => Ok(Value::Null),
    }
}

fn pad(args: &[Value], left: bool) -> Result<Value> {
    let (text, width, padding) = match (
        args[0].as_text(),
        args[1].as_integer(),
        args[2].as_text(),
    ) {
        (Some(t), Some(w), Some(p)) if w >= 0 && !p.is_empty() => (t, w as usize, p),
        _ => return Ok(Value::Null),
    };
    let len = text.chars().count();
    if len >= width {
        return Ok(Value::string(text));
    }
    let fill: String = padding.chars().cycle().take(width - len).collect();
    if left {
        Ok(Value::string(format!("{}{}", fill, text)))
    } else {
        Ok(Value::string(format!("{}{}", text, fill)))
    }
}

fn lpad(args: &[Value]) -> Result<Value> {
    pad(args, true)
}

fn rpad(args: &[Value]) -> Result<Value> {
    pad(args, false)
}

fn concat(args: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for arg in args {
        if let Some(s) = arg.as_text() {
            out.push_str(&s);
        }
    }
    Ok(Value::string(out))
}

// =============================================================================
// Date and time
// =============================================================================

fn now(_args: &[Value]) -> Result<Value> {
    Ok(Value::Datetime(Utc::now()))
}

fn datetime_part(args: &[Value], f: impl Fn(chrono::DateTime<Utc>) -> i64) -> Result<Value> {
    match args[0].as_datetime() {
        Some(t) => Ok(Value::Integer(f(t))),
        None => Ok(Value::Null),
    }
}

fn year(args: &[Value]) -> Result<Value> {
    datetime_part(args, |t| t.year() as i64)
}

fn month(args: &[Value]) -> Result<Value> {
    datetime_part(args, |t| t.month() as i64)
}

fn day(args: &[Value]) -> Result<Value> {
    datetime_part(args, |t| t.day() as i64)
}

fn hour(args: &[Value]) -> Result<Value> {
    datetime_part(args, |t| t.hour() as i64)
}

fn minute(args: &[Value]) -> Result<Value> {
    datetime_part(args, |t| t.minute() as i64)
}

fn second(args: &[Value]) -> Result<Value> {
    datetime_part(args, |t| t.second() as i64)
}

fn datetime_format(args: &[Value]) -> Result<Value> {
    match (args[0].as_datetime(), args[1].as_text()) {
        (Some(t), Some(fmt)) => Ok(Value::string(t.format(&fmt).to_string())),
        _ => Ok(Value::Null),
    }
}

// =============================================================================
// Casts
// =============================================================================

fn cast_string(args: &[Value]) -> Result<Value> {
    match args[0].as_text() {
        Some(s) => Ok(Value::string(s)),
        None => Ok(Value::Null),
    }
}

fn cast_integer(args: &[Value]) -> Result<Value> {
    match args[0].as_integer() {
        Some(i) => Ok(Value::Integer(i)),
        None => Ok(Value::Null),
    }
}

fn cast_float(args: &[Value]) -> Result<Value> {
    match args[0].as_float() {
        Some(f) => Ok(Value::Float(f)),
        None => Ok(Value::Null),
    }
}

fn cast_boolean(args: &[Value]) -> Result<Value> {
    match args[0].ternary() {
        Ternary::True => Ok(Value::Boolean(true)),
        Ternary::False => Ok(Value::Boolean(false)),
        Ternary::Unknown => Ok(Value::Null),
    }
}

fn cast_ternary(args: &[Value]) -> Result<Value> {
    Ok(Value::Ternary(args[0].ternary()))
}

fn cast_datetime(args: &[Value]) -> Result<Value> {
    match args[0].as_datetime() {
        Some(t) => Ok(Value::Datetime(t)),
        None => Ok(Value::Null),
    }
}
