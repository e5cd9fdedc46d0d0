//! Function wrapper that speaks plain data on both sides
//!
//! A [`Serializer`] coerces declared keyword arguments into their model types,
//! runs the wrapped function, and converts whatever it returns with
//! [`to_dict`]. Arguments without a declared type pass through untouched.

use std::fmt;

use indexmap::IndexMap;
use modelkit_core::{to_dict, to_model, Kwargs, ModelError, Options, Type, Value};

/// Wraps `F` with argument coercion and result conversion
pub struct Serializer<F> {
    func: F,
    params: IndexMap<String, Type>,
    options: Options,
}

impl<F> Serializer<F>
where
    F: Fn(Kwargs) -> Result<Value, ModelError>,
{
    /// Wrap a function with no declared parameters
    pub fn new(func: F) -> Self {
        Self {
            func,
            params: IndexMap::new(),
            options: Options::default(),
        }
    }

    /// Declare the type a keyword argument is coerced into
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<Type>) -> Self {
        self.params.insert(name.into(), ty.into());
        self
    }

    /// Dispatcher options used on the result
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Coerce, call, convert
    ///
    /// # Errors
    /// Returns coercion failures of declared arguments, the wrapped
    /// function's own error, and dispatch failures on its result
    pub fn call(&self, mut kwargs: Kwargs) -> Result<Value, ModelError> {
        for (name, ty) in &self.params {
            if let Some(raw) = kwargs.get_mut(name) {
                tracing::trace!("Coercing argument '{}' into {}", name, ty);
                let coerced = to_model(ty, std::mem::take(raw))?;
                *raw = coerced;
            }
        }
        let result = (self.func)(kwargs)?;
        to_dict(&result, &self.options)
    }
}

impl<F> fmt::Debug for Serializer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("params", &self.params)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
