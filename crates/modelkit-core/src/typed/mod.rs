//! Typed containers
//!
//! Sequence, set and mapping wrappers that check every element against a
//! declared [`Type`] before accepting it. A container built for an optional
//! field also accepts `Null` elements.
//!
//! Equality with the plain `Value` containers ignores the element type;
//! equality between two typed containers also requires the same element type.

mod mapping;
mod sequence;
mod set;

pub use mapping::TypedMapping;
pub use sequence::TypedSequence;
pub use set::TypedSet;

use crate::error::{ModelError, Result};
use crate::ty::Type;
use crate::value::Value;

fn check_element(container: &str, ty: &Type, allow_none: bool, value: &Value) -> Result<()> {
    if ty.matches(value) || (allow_none && value.is_null()) {
        return Ok(());
    }
    let expected = if allow_none {
        format!("{ty} or None")
    } else {
        ty.to_string()
    };
    Err(ModelError::type_mismatch(
        format!("{container}<{ty}> element {}", value.repr()),
        expected,
        value.type_name(),
    ))
}
