//! Built-in converters.
//!
//! The table is built once per process and shared by every mapper.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use super::{ConverterTable, TypePair, converter};
use crate::error::ConvertError;
use crate::types::ValueType;
use crate::value::{DATE_FORMAT, DATETIME_FORMAT, Value};

static BASE: LazyLock<Arc<ConverterTable>> = LazyLock::new(|| Arc::new(builtin_table()));

/// Date-time layouts accepted when parsing text, tried in order.
const DATETIME_LAYOUTS: [&str; 3] = [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub(crate) fn shared_base() -> Arc<ConverterTable> {
    Arc::clone(&BASE)
}

/// Builds a fresh copy of the built-in table.
pub fn builtin_table() -> ConverterTable {
    let mut builtins = Builtins {
        table: ConverterTable::new(),
    };
    builtins.register_text_parsers();
    builtins.register_numeric_functions();
    builtins.register_boolean_functions();
    builtins.register_temporal_functions();
    builtins.register_text_rendering();
    tracing::debug!(converters = builtins.table.len(), "built-in converter table ready");
    builtins.table
}

struct Builtins {
    table: ConverterTable,
}

impl Builtins {
    fn register<F>(&mut self, source: ValueType, target: ValueType, f: F)
    where
        F: Fn(Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        self.table.insert(TypePair::new(source, target), converter(f));
    }

    fn register_text_parsers(&mut self) {
        for target in ValueType::NUMERIC {
            let parse_target = target.clone();
            self.register(ValueType::Text, target, move |v| parse_as(&parse_target, &v.to_string()));
        }
        self.register(ValueType::Text, ValueType::Bool, |v| {
            Ok(Value::Bool(is_truthy_text(&v.to_string())))
        });
        self.register(ValueType::Text, ValueType::Char, |v| {
            v.to_string()
                .chars()
                .next()
                .map(Value::Char)
                .ok_or_else(|| ConvertError::new("empty text has no first character"))
        });
    }

    fn register_numeric_functions(&mut self) {
        // Cross-width conversion goes through the canonical text so that
        // `12.0` fits an integer while `12.5` and overflows are rejected.
        for target in ValueType::NUMERIC {
            let parse_target = target.clone();
            self.register(ValueType::Number, target, move |v| parse_as(&parse_target, &v.to_string()));
        }
    }

    fn register_boolean_functions(&mut self) {
        self.register(ValueType::Number, ValueType::Bool, |v| {
            v.as_f64()
                .map(|n| Value::Bool(n.trunc() == 1.0))
                .ok_or_else(|| ConvertError::new("not a finite number"))
        });
        for target in ValueType::NUMERIC {
            let parse_target = target.clone();
            self.register(ValueType::Bool, target, move |v| {
                let digit = if v.as_bool().unwrap_or_default() { "1" } else { "0" };
                parse_as(&parse_target, digit)
            });
        }
        self.register(ValueType::Char, ValueType::Bool, |v| {
            Ok(Value::Bool(matches!(v, Value::Char('1' | 'y' | 'Y'))))
        });
    }

    fn register_temporal_functions(&mut self) {
        self.register(ValueType::Text, ValueType::Date, |v| {
            NaiveDate::parse_from_str(&v.to_string(), DATE_FORMAT)
                .map(Value::Date)
                .map_err(ConvertError::new)
        });
        self.register(ValueType::Text, ValueType::DateTime, |v| {
            parse_datetime(&v.to_string()).map(Value::DateTime)
        });
        self.register(ValueType::Text, ValueType::Timestamp, |v| {
            DateTime::parse_from_rfc3339(&v.to_string())
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(ConvertError::new)
        });
        self.register(ValueType::DateTime, ValueType::Date, |v| match v {
            Value::DateTime(dt) => Ok(Value::Date(dt.date())),
            other => Err(unexpected(&other)),
        });
        self.register(ValueType::Date, ValueType::DateTime, |v| match v {
            Value::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(Value::DateTime)
                .ok_or_else(|| ConvertError::new("midnight is out of range")),
            other => Err(unexpected(&other)),
        });
        self.register(ValueType::DateTime, ValueType::Timestamp, |v| match v {
            Value::DateTime(dt) => Local
                .from_local_datetime(&dt)
                .earliest()
                .map(|local| Value::Timestamp(local.with_timezone(&Utc)))
                .ok_or_else(|| ConvertError::new(format!("{dt} does not exist in the local time zone"))),
            other => Err(unexpected(&other)),
        });
        self.register(ValueType::Timestamp, ValueType::DateTime, |v| match v {
            Value::Timestamp(ts) => Ok(Value::DateTime(ts.with_timezone(&Local).naive_local())),
            other => Err(unexpected(&other)),
        });
    }

    fn register_text_rendering(&mut self) {
        self.register(ValueType::Any, ValueType::Text, |v| Ok(Value::Text(v.to_string())));
    }
}

/// Parses `text` strictly as the numeric `target` type.
pub fn parse_as(target: &ValueType, text: &str) -> Result<Value, ConvertError> {
    match target {
        ValueType::I8 => text.parse().map(Value::I8).map_err(ConvertError::new),
        ValueType::I16 => text.parse().map(Value::I16).map_err(ConvertError::new),
        ValueType::I32 => text.parse().map(Value::I32).map_err(ConvertError::new),
        ValueType::I64 => text.parse().map(Value::I64).map_err(ConvertError::new),
        ValueType::U8 => text.parse().map(Value::U8).map_err(ConvertError::new),
        ValueType::U16 => text.parse().map(Value::U16).map_err(ConvertError::new),
        ValueType::U32 => text.parse().map(Value::U32).map_err(ConvertError::new),
        ValueType::U64 => text.parse().map(Value::U64).map_err(ConvertError::new),
        ValueType::F32 => parse_float::<f32>(text, f32::is_finite).map(Value::F32),
        ValueType::F64 => parse_float::<f64>(text, f64::is_finite).map(Value::F64),
        ValueType::Decimal => text.parse::<Decimal>().map(Value::Decimal).map_err(ConvertError::new),
        other => Err(ConvertError::new(format!("{other} is not a numeric type"))),
    }
}

/// Parses a float, rejecting finite input that overflows to infinity.
fn parse_float<F>(text: &str, is_finite: fn(F) -> bool) -> Result<F, ConvertError>
where
    F: std::str::FromStr + Copy,
    F::Err: std::fmt::Display,
{
    let parsed: F = text.parse().map_err(ConvertError::new)?;
    if !is_finite(parsed) && !names_non_finite(text) {
        return Err(ConvertError::new(format!("{text} is out of range")));
    }
    Ok(parsed)
}

fn names_non_finite(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']);
    ["inf", "infinity", "nan"]
        .iter()
        .any(|name| unsigned.eq_ignore_ascii_case(name))
}

fn is_truthy_text(text: &str) -> bool {
    ["1", "y", "yes", "true"]
        .iter()
        .any(|truthy| text.eq_ignore_ascii_case(truthy))
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, ConvertError> {
    let mut last_error = None;
    for layout in DATETIME_LAYOUTS {
        match NaiveDateTime::parse_from_str(text, layout) {
            Ok(dt) => return Ok(dt),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.map_or_else(|| ConvertError::new("no date-time layout"), ConvertError::new))
}

fn unexpected(value: &Value) -> ConvertError {
    ConvertError::new(format!("unexpected {} value", value.type_name()))
}
