//! modelkit core - typed object models and their plain representation
//!
//! The engine behind declarative nested models:
//! - Field descriptors with converters, validators, rename keys and formatters
//! - Typed sequence, set and mapping containers
//! - Coercion of loosely typed values into model instances ([`to_model`])
//! - Polymorphic conversion of instance graphs into plain values ([`to_dict`])
//!
//! # Example
//!
//! ```rust
//! use modelkit_core::{kwargs, to_dict, to_model, Field, ModelType, Options, Type, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let person = ModelType::immutable("docs.Person")
//!     .field(Field::string("first_name"))
//!     .field(Field::string("last_name").key("surname"))
//!     .build()?;
//!
//! let grace = person.construct(kwargs! { "first_name" => "Grace", "last_name" => "Hopper" })?;
//! let plain = to_dict(&Value::Model(grace.clone()), &Options::new())?;
//! assert_eq!(plain.get("surname"), Some(&Value::from("Hopper")));
//!
//! let back = to_model(&Type::from(&person), plain)?;
//! assert_eq!(back, Value::Model(grace));
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod coerce;
pub mod datetime;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod model;
pub mod registry;
pub mod ty;
pub mod typed;
pub mod value;

pub use coerce::to_model;
pub use datetime::{DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, ISO_FORMAT};
pub use dispatch::{
    ordered_dict, register_global, sorted_dict, to_dict, Converter, DictFactory, Dispatcher,
    Options, TypeTag, ValueKind,
};
pub use error::{DeclarationError, ErrorKind, ModelError, Result};
pub use field::{Field, FieldDefault, FieldKind, Validator};
pub use model::{DeriveFn, Draft, Instance, ModelType, ModelTypeBuilder, Mutability, Property};
pub use registry::TypeRegistry;
pub use ty::{EnumMember, EnumType, EnumTypeBuilder, ModelRef, Type};
pub use typed::{TypedMapping, TypedSequence, TypedSet};
pub use value::{Kwargs, OpaqueValue, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
