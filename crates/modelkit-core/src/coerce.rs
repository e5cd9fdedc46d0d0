//! Coercion engine
//!
//! [`to_model`] turns a loosely typed value, usually straight out of a JSON,
//! YAML or TOML decoder, into a value of a declared [`Type`]. Plain mappings
//! become model instances (external keys are mapped back to field names),
//! raw scalars become enum members, and everything else goes through the
//! same scalar conversions the field converters use.

use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::datetime::{
    parse_date, parse_datetime, parse_time, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT,
    DEFAULT_TIME_FORMAT,
};
use crate::error::{ModelError, Result};
use crate::model::ModelType;
use crate::ty::{EnumType, Type};
use crate::value::{Kwargs, Value};

/// Coerce `value` into the target type
///
/// `Null` and values that already match pass through unchanged.
///
/// # Errors
/// - [`ModelError::UnknownEnumValue`] if no enum member matches
/// - [`ModelError::ExtraKeys`] for unmapped keys on a strict model
/// - [`ModelError::UnresolvedType`] for a deferred model reference with no registered type
/// - [`ModelError::Conversion`] or [`ModelError::TypeMismatch`] if a scalar cannot be converted
/// - any construction error of the target model
pub fn to_model(ty: &Type, value: Value) -> Result<Value> {
    if value.is_null() || ty.matches(&value) {
        return Ok(value);
    }
    tracing::trace!("Coercing {} into {}", value.type_name(), ty);
    match ty {
        Type::Enum(enum_type) => to_enum(enum_type, &value),
        Type::Model(handle) => {
            let model = handle.resolve()?;
            match value {
                Value::Map(map) => from_map(&model, map),
                Value::Mapping(mapping) => from_map(&model, mapping.into_items()),
                other => from_positional(&model, other),
            }
        }
        _ => {
            let converted = convert_scalar(ty, value, None)?;
            if ty.matches(&converted) {
                Ok(converted)
            } else {
                Err(ModelError::type_mismatch(
                    format!("cannot build {ty} from {}", converted.repr()),
                    ty.to_string(),
                    converted.type_name(),
                ))
            }
        }
    }
}

fn to_enum(enum_type: &std::sync::Arc<EnumType>, value: &Value) -> Result<Value> {
    let raw = match value {
        Value::Enum(member) => member.value(),
        other => other,
    };
    enum_type
        .from_value(raw)
        .map(Value::Enum)
        .ok_or_else(|| ModelError::UnknownEnumValue {
            enum_name: enum_type.name().to_string(),
            value: value.repr(),
        })
}

/// Map external keys to field names and construct
///
/// Unmapped keys are dropped, or reported on a strict model.
fn from_map(model: &std::sync::Arc<ModelType>, mut map: IndexMap<Value, Value>) -> Result<Value> {
    let mut kwargs = Kwargs::with_capacity(model.fields().len());
    for field in model.fields() {
        if let Some(v) = map.shift_remove(&Value::from(field.external_key())) {
            kwargs.insert(field.name().to_string(), v);
        }
    }
    if model.is_strict() && !map.is_empty() {
        let mut keys: Vec<String> = map.keys().map(ToString::to_string).collect();
        keys.sort();
        return Err(ModelError::ExtraKeys {
            model: model.name().to_string(),
            keys,
        });
    }
    model.construct(kwargs).map(Value::Model)
}

/// Single-argument construction binds the value to the first declared field
fn from_positional(model: &std::sync::Arc<ModelType>, value: Value) -> Result<Value> {
    let first = model.fields().first().ok_or_else(|| {
        ModelError::type_mismatch(
            format!("{} takes no positional value", model.name()),
            "map",
            value.type_name(),
        )
    })?;
    let mut kwargs = Kwargs::with_capacity(1);
    kwargs.insert(first.name().to_string(), value);
    model.construct(kwargs).map(Value::Model)
}

fn parse_failure(value: &Value, target: &str, reason: impl ToString) -> ModelError {
    ModelError::conversion(value.to_string(), target, reason.to_string())
}

/// Scalar and plain-container conversion toward `target`
///
/// Combinations with no conversion are returned unchanged so the caller's
/// type check reports them. Date and time text is parsed with `formatter`,
/// falling back to the kind's default pattern.
pub(crate) fn convert_scalar(target: &Type, value: Value, formatter: Option<&str>) -> Result<Value> {
    if value.is_null() || target.matches(&value) {
        return Ok(value);
    }
    let converted = match (target, value) {
        (Type::String, v) => Value::String(v.to_string()),
        (Type::Int, Value::Bool(b)) => Value::Int(i64::from(b)),
        (Type::Int, v @ Value::Float(f)) => {
            if f.is_finite() && f.abs() < 9.2e18 {
                #[allow(clippy::cast_possible_truncation)]
                let truncated = f.trunc() as i64;
                Value::Int(truncated)
            } else {
                return Err(parse_failure(&v, "int", "float out of range"));
            }
        }
        (Type::Int, v @ Value::Decimal(d)) => d
            .trunc()
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| parse_failure(&v, "int", "decimal out of range"))?,
        (Type::Int, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| ModelError::conversion(s.clone(), "int", e.to_string()))?,
        #[allow(clippy::cast_precision_loss)]
        (Type::Float, Value::Int(i)) => Value::Float(i as f64),
        (Type::Float, v @ Value::Decimal(d)) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| parse_failure(&v, "float", "decimal out of range"))?,
        (Type::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ModelError::conversion(s.clone(), "float", e.to_string()))?,
        (Type::Decimal, Value::Int(i)) => Value::Decimal(Decimal::from(i)),
        (Type::Decimal, v @ Value::Float(f)) => Decimal::try_from(f)
            .map(Value::Decimal)
            .map_err(|e| parse_failure(&v, "decimal", e))?,
        (Type::Decimal, Value::String(s)) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map(Value::Decimal)
            .map_err(|e| ModelError::conversion(s.clone(), "decimal", e.to_string()))?,
        (Type::Uuid, Value::String(s)) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|e| ModelError::conversion(s.clone(), "uuid", e.to_string()))?,
        (Type::Url, Value::String(s)) => Url::parse(s.trim())
            .map(Value::Url)
            .map_err(|e| ModelError::conversion(s.clone(), "url", e.to_string()))?,
        (Type::Date, Value::String(s)) => {
            Value::Date(parse_date(&s, formatter.unwrap_or(DEFAULT_DATE_FORMAT))?)
        }
        (Type::Date, Value::DateTime(dt)) => Value::Date(dt.date()),
        (Type::DateTime, Value::String(s)) => {
            Value::DateTime(parse_datetime(&s, formatter.unwrap_or(DEFAULT_DATETIME_FORMAT))?)
        }
        (Type::Time, Value::String(s)) => {
            Value::Time(parse_time(&s, formatter.unwrap_or(DEFAULT_TIME_FORMAT))?)
        }
        (Type::Time, Value::DateTime(dt)) => Value::Time(dt.time()),
        (Type::List, Value::Set(items)) => Value::List(items.into_iter().collect()),
        (Type::List, Value::TypedSet(set)) => Value::List(set.into_items().into_iter().collect()),
        (Type::Set, Value::List(items)) => Value::Set(items.into_iter().collect::<IndexSet<_>>()),
        (Type::Set, Value::Sequence(seq)) => Value::Set(seq.into_items().into_iter().collect()),
        (_, other) => other,
    };
    Ok(converted)
}
