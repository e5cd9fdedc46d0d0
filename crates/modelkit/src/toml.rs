//! TOML adapter
//!
//! TOML has no null, so `Null` values are dropped on encode. Non-string keys
//! are written as text, and TOML datetimes decode to their RFC 3339 text for
//! the date/time field converters to parse.

use std::io::Read;

use modelkit_core::{to_dict, Kwargs, Options, Type, Value};

use crate::decode::finish;
use crate::error::Result;

fn to_toml_value(value: &Value) -> Option<::toml::Value> {
    let converted = match value {
        Value::Null => return None,
        Value::Bool(b) => ::toml::Value::Boolean(*b),
        Value::Int(i) => ::toml::Value::Integer(*i),
        Value::Float(f) => ::toml::Value::Float(*f),
        Value::String(s) => ::toml::Value::String(s.clone()),
        Value::List(items) => ::toml::Value::Array(items.iter().filter_map(to_toml_value).collect()),
        Value::Set(items) => ::toml::Value::Array(items.iter().filter_map(to_toml_value).collect()),
        Value::Map(map) => {
            let mut table = ::toml::map::Map::new();
            for (key, value) in map {
                if let Some(converted) = to_toml_value(value) {
                    let key = match key {
                        Value::String(s) => s.clone(),
                        Value::Bool(b) => b.to_string(),
                        other => other.to_string(),
                    };
                    table.insert(key, converted);
                }
            }
            ::toml::Value::Table(table)
        }
        other => ::toml::Value::String(other.to_string()),
    };
    Some(converted)
}

fn from_toml_value(value: ::toml::Value) -> Value {
    match value {
        ::toml::Value::String(s) => Value::String(s),
        ::toml::Value::Integer(i) => Value::Int(i),
        ::toml::Value::Float(f) => Value::Float(f),
        ::toml::Value::Boolean(b) => Value::Bool(b),
        ::toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        ::toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml_value).collect()),
        ::toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(k, v)| (Value::String(k), from_toml_value(v)))
                .collect(),
        ),
    }
}

/// Encode a value as a TOML document
///
/// # Errors
/// Returns dispatch failures and TOML encoding failures, including a
/// top-level value that is not a mapping
pub fn to_toml(value: &Value, options: &Options) -> Result<String> {
    let plain = to_dict(value, options)?;
    let document = to_toml_value(&plain).unwrap_or_else(|| ::toml::Value::Table(::toml::map::Map::new()));
    Ok(::toml::to_string(&document)?)
}

/// Decode TOML text and coerce it into `ty`
///
/// # Errors
/// Returns TOML decoding failures and coercion failures
pub fn from_toml(text: &str, ty: &Type) -> Result<Value> {
    from_toml_with_extras(text, ty, Kwargs::new())
}

/// Decode TOML from a reader and coerce it into `ty`
///
/// # Errors
/// Returns read failures, TOML decoding failures and coercion failures
pub fn from_toml_reader<R: Read>(mut reader: R, ty: &Type) -> Result<Value> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    from_toml(&text, ty)
}

/// Decode TOML text, merge `extras` into the top-level table, then coerce
///
/// # Errors
/// Returns TOML decoding failures and coercion failures
pub fn from_toml_with_extras(text: &str, ty: &Type, extras: Kwargs) -> Result<Value> {
    let table: ::toml::Table = ::toml::from_str(text)?;
    finish(from_toml_value(::toml::Value::Table(table)), ty, extras)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_values_are_dropped() {
        let value = Value::map([
            ("name", Value::from("store")),
            ("closed", Value::Null),
            ("counts", Value::list([Value::Int(1), Value::Null, Value::Int(2)])),
        ]);
        let text = to_toml(&value, &Options::new()).unwrap();
        assert_eq!(text, "name = \"store\"\ncounts = [1, 2]\n");
    }

    #[test]
    fn datetimes_decode_to_text() {
        let value = from_toml("opened = 1979-05-27T07:32:00\nday = 2017-12-18\n", &Type::Any).unwrap();
        assert_eq!(value.get("opened"), Some(&Value::from("1979-05-27T07:32:00")));
        assert_eq!(value.get("day"), Some(&Value::from("2017-12-18")));
    }

    #[test]
    fn tables_round_trip() {
        let text = "[days.monday]\nopen = \"09:00\"\n";
        let value = from_toml(text, &Type::Any).unwrap();
        assert_eq!(
            value,
            Value::map([("days", Value::map([("monday", Value::map([("open", "09:00")]))]))])
        );
        let again = from_toml(&to_toml(&value, &Options::new()).unwrap(), &Type::Any).unwrap();
        assert_eq!(again, value);
    }
}
