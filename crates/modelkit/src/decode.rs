//! Shared decode tail of every format adapter

use indexmap::IndexMap;
use modelkit_core::{to_model, Kwargs, Type, Value};

use crate::error::{FormatError, Result};

/// Merge extra fields into a decoded document
///
/// An empty document counts as an empty mapping.
pub(crate) fn merge_extras(document: Value, extras: Kwargs) -> Result<Value> {
    let mut map = match document {
        Value::Null => IndexMap::new(),
        Value::Map(map) => map,
        other if extras.is_empty() => return Ok(other),
        other => return Err(FormatError::not_a_mapping(other.type_name())),
    };
    for (name, value) in extras {
        map.insert(Value::String(name), value);
    }
    Ok(Value::Map(map))
}

/// Merge extras, then coerce into `ty`
pub(crate) fn finish(document: Value, ty: &Type, extras: Kwargs) -> Result<Value> {
    let merged = merge_extras(document, extras)?;
    tracing::trace!("Coercing decoded {} into {}", merged.type_name(), ty);
    Ok(to_model(ty, merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::kwargs;

    #[test]
    fn empty_document_becomes_a_map() {
        let merged = merge_extras(Value::Null, Kwargs::new()).unwrap();
        assert_eq!(merged, Value::Map(IndexMap::new()));
    }

    #[test]
    fn extras_override_document_keys() {
        let doc = Value::map([("a", 1), ("b", 2)]);
        let merged = merge_extras(doc, kwargs! { "b" => 3, "c" => 4 }).unwrap();
        assert_eq!(merged, Value::map([("a", 1), ("b", 3), ("c", 4)]));
    }

    #[test]
    fn extras_need_a_mapping() {
        assert!(merge_extras(Value::list([1]), Kwargs::new()).is_ok());
        let err = merge_extras(Value::list([1]), kwargs! { "a" => 1 }).unwrap_err();
        assert!(matches!(err, FormatError::NotAMapping { .. }));
    }
}
