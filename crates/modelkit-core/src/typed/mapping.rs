use indexmap::IndexMap;

use super::check_element;
use crate::error::{ModelError, Result};
use crate::ty::Type;
use crate::value::Value;

/// Insertion-ordered mapping whose values must match a value type
///
/// The optional key field names the child field that holds each value's
/// mapping key, which lets [`TypedMapping::add`] index a value by itself.
#[derive(Debug, Clone)]
pub struct TypedMapping {
    ty: Type,
    allow_none: bool,
    key: Option<String>,
    items: IndexMap<Value, Value>,
}

impl TypedMapping {
    /// Create an empty mapping
    #[must_use]
    pub fn new(ty: Type, key: Option<String>, allow_none: bool) -> Self {
        Self {
            ty,
            allow_none,
            key,
            items: IndexMap::new(),
        }
    }

    /// Create a mapping from existing pairs, checking each value
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] on the first rejected value
    pub fn from_pairs<I>(ty: Type, key: Option<String>, allow_none: bool, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut mapping = Self::new(ty, key, allow_none);
        for (k, v) in pairs {
            mapping.insert(k, v)?;
        }
        Ok(mapping)
    }

    #[inline]
    #[must_use]
    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    /// Name of the child field holding each value's key
    #[inline]
    #[must_use]
    pub fn key_field(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn allows_none(&self) -> bool {
        self.allow_none
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Underlying plain mapping
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &IndexMap<Value, Value> {
        &self.items
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.items.get(key)
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.items.contains_key(key)
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Value, Value> {
        self.items.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Value, Value> {
        self.items.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Value, Value> {
        self.items.iter()
    }

    /// Assign a value, returning the one it replaced
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if the value type does not match
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<Option<Value>> {
        let value = value.into();
        check_element("mapping", &self.ty, self.allow_none, &value)?;
        Ok(self.items.insert(key.into(), value))
    }

    /// Remove a value, keeping the order of the rest
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.items.shift_remove(key)
    }

    /// Insert `value` under an explicit key, or under the value of its key field
    ///
    /// # Errors
    /// Returns [`ModelError::MissingKey`] if no key is given and the value has
    /// no key field, and [`ModelError::TypeMismatch`] if the value type does
    /// not match
    pub fn add(&mut self, value: impl Into<Value>, key: Option<Value>) -> Result<()> {
        let value = value.into();
        let key = match key {
            Some(key) => key,
            None => self
                .key
                .as_deref()
                .and_then(|field| value.as_model()?.get(field).cloned())
                .ok_or(ModelError::MissingKey)?,
        };
        self.insert(key, value)?;
        Ok(())
    }

    #[must_use]
    pub fn into_items(self) -> IndexMap<Value, Value> {
        self.items
    }
}

impl PartialEq for TypedMapping {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.ty == other.ty
    }
}

impl Eq for TypedMapping {}

impl PartialEq<IndexMap<Value, Value>> for TypedMapping {
    fn eq(&self, other: &IndexMap<Value, Value>) -> bool {
        &self.items == other
    }
}

impl<'a> IntoIterator for &'a TypedMapping {
    type Item = (&'a Value, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
