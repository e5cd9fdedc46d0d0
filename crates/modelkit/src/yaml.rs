//! YAML adapter
//!
//! Block-style output in dispatch order; decoding keeps mapping key order.

use std::io::{Read, Write};

use modelkit_core::{to_dict, Kwargs, Options, Type, Value};

use crate::decode::finish;
use crate::error::Result;

/// Encode a value as a YAML document
///
/// # Errors
/// Returns dispatch failures and YAML encoding failures
pub fn to_yaml(value: &Value, options: &Options) -> Result<String> {
    let plain = to_dict(value, options)?;
    Ok(serde_yaml::to_string(&plain)?)
}

/// Encode a value as a YAML document into a writer
///
/// # Errors
/// Returns dispatch failures, YAML encoding failures and write failures
pub fn to_yaml_writer<W: Write>(value: &Value, writer: W, options: &Options) -> Result<()> {
    let plain = to_dict(value, options)?;
    serde_yaml::to_writer(writer, &plain)?;
    Ok(())
}

fn decode(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Decode YAML text and coerce it into `ty`
///
/// An empty document decodes to an empty mapping.
///
/// # Errors
/// Returns YAML decoding failures and coercion failures
pub fn from_yaml(text: &str, ty: &Type) -> Result<Value> {
    from_yaml_with_extras(text, ty, Kwargs::new())
}

/// Decode YAML from a reader and coerce it into `ty`
///
/// # Errors
/// Returns read failures, YAML decoding failures and coercion failures
pub fn from_yaml_reader<R: Read>(mut reader: R, ty: &Type) -> Result<Value> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    from_yaml(&text, ty)
}

/// Decode YAML text, merge `extras` into the top-level mapping, then coerce
///
/// # Errors
/// Returns YAML decoding failures, [`FormatError::NotAMapping`](crate::FormatError::NotAMapping)
/// and coercion failures
pub fn from_yaml_with_extras(text: &str, ty: &Type, extras: Kwargs) -> Result<Value> {
    finish(decode(text)?, ty, extras)
}
