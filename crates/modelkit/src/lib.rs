//! modelkit - declarative nested object models
//!
//! Declare model types from typed field descriptors, build instances from
//! loosely typed data, and move them through plain values and text formats:
//! - JSON with indent and key sorting control
//! - YAML in block style, keeping mapping key order
//! - TOML behind the default `toml` feature
//!
//! # Example
//!
//! ```rust
//! use modelkit::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let person = ModelType::immutable("readme.Person")
//!     .field(Field::string("first_name"))
//!     .field(Field::string("last_name"))
//!     .build()?;
//!
//! let grace = from_json(
//!     r#"{"first_name": "Grace", "last_name": "Hopper"}"#,
//!     &Type::from(&person),
//! )?;
//! let yaml = to_yaml(&grace, &Options::new())?;
//! assert_eq!(yaml, "first_name: Grace\nlast_name: Hopper\n");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod decode;
pub mod error;
pub mod json;
pub mod serializer;
#[cfg(feature = "toml")]
pub mod toml;
pub mod yaml;

pub use modelkit_core::{
    coerce, datetime, dispatch, field, kwargs, model, ordered_dict, register_global, registry,
    sorted_dict, to_dict, to_model, ty, typed, value, Converter, DeclarationError, DeriveFn,
    DictFactory, Dispatcher, Draft, EnumMember, EnumType, EnumTypeBuilder, ErrorKind, Field,
    FieldDefault, FieldKind, Instance, Kwargs, ModelError, ModelRef, ModelType, ModelTypeBuilder,
    Mutability, OpaqueValue, Options, Property, Type, TypeRegistry, TypeTag, TypedMapping,
    TypedSequence, TypedSet, Validator, Value, ValueKind, DEFAULT_DATETIME_FORMAT,
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, ISO_FORMAT,
};

pub use error::{FormatError, Result};
pub use json::{from_json, from_json_reader, from_json_with_extras, to_json, JsonOptions};
pub use serializer::Serializer;
#[cfg(feature = "toml")]
pub use self::toml::{from_toml, from_toml_reader, from_toml_with_extras, to_toml};
pub use yaml::{from_yaml, from_yaml_reader, from_yaml_with_extras, to_yaml, to_yaml_writer};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring and converting models
    pub use crate::{
        from_json, from_json_with_extras, from_yaml, from_yaml_with_extras, kwargs, to_dict,
        to_json, to_model, to_yaml, EnumType, Field, FormatError, Instance, JsonOptions, Kwargs,
        ModelError, ModelType, Options, Serializer, Type, TypedMapping, TypedSequence, TypedSet,
        Value,
    };
    #[cfg(feature = "toml")]
    pub use crate::{from_toml, from_toml_with_extras, to_toml};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
