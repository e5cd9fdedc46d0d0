//! JSON adapter
//!
//! Encoding runs the dispatcher, then serde_json. Decoding keeps mapping key
//! order and hands the document to the coercion engine.

use std::io::Read;

use modelkit_core::{to_dict, Kwargs, Options, Type, Value};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::decode::finish;
use crate::error::Result;

/// JSON output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    /// Spaces per indent level; `None` writes compact JSON
    pub indent: Option<usize>,
    /// Sort mapping keys
    pub sort_keys: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            indent: Some(4),
            sort_keys: true,
        }
    }
}

impl JsonOptions {
    /// Create default options (indent 4, sorted keys)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compact output, keys in dispatch order
    #[must_use]
    pub fn compact() -> Self {
        Self {
            indent: None,
            sort_keys: false,
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }
}

/// Stringify mapping keys, sorting them when asked
fn prepare(value: Value, sort_keys: bool) -> Value {
    match value {
        Value::Map(map) => {
            let mut pairs: Vec<(Value, Value)> = map
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => s,
                        Value::Bool(b) => b.to_string(),
                        other => other.to_string(),
                    };
                    (Value::String(key), prepare(v, sort_keys))
                })
                .collect();
            if sort_keys {
                pairs.sort_by(|(a, _), (b, _)| a.as_str().cmp(&b.as_str()));
            }
            Value::Map(pairs.into_iter().collect())
        }
        Value::List(items) => Value::List(items.into_iter().map(|v| prepare(v, sort_keys)).collect()),
        Value::Set(items) => Value::List(items.into_iter().map(|v| prepare(v, sort_keys)).collect()),
        other => other,
    }
}

/// Encode a value as JSON
///
/// # Errors
/// Returns dispatch failures and JSON encoding failures
pub fn to_json(value: &Value, json: &JsonOptions, options: &Options) -> Result<String> {
    let plain = prepare(to_dict(value, options)?, json.sort_keys);
    let Some(width) = json.indent else {
        return Ok(serde_json::to_string(&plain)?);
    };
    let indent = " ".repeat(width);
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    plain.serialize(&mut serializer)?;
    Ok(String::from_utf8(out).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?)
}

/// Decode JSON text and coerce it into `ty`
///
/// Pass [`Type::Any`] to get the plain document.
///
/// # Errors
/// Returns JSON decoding failures and coercion failures
pub fn from_json(text: &str, ty: &Type) -> Result<Value> {
    from_json_with_extras(text, ty, Kwargs::new())
}

/// Decode JSON from a reader and coerce it into `ty`
///
/// # Errors
/// Returns read failures, JSON decoding failures and coercion failures
pub fn from_json_reader<R: Read>(mut reader: R, ty: &Type) -> Result<Value> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    from_json(&text, ty)
}

/// Decode JSON text, merge `extras` into the top-level mapping, then coerce
///
/// # Errors
/// Returns JSON decoding failures, [`FormatError::NotAMapping`](crate::FormatError::NotAMapping)
/// and coercion failures
pub fn from_json_with_extras(text: &str, ty: &Type, extras: Kwargs) -> Result<Value> {
    let document: Value = serde_json::from_str(text)?;
    finish(document, ty, extras)
}
