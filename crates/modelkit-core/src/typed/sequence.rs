use std::ops::Index;

use super::check_element;
use crate::error::{ModelError, Result};
use crate::ty::Type;
use crate::value::Value;

/// Ordered list whose elements must match an element type
#[derive(Debug, Clone)]
pub struct TypedSequence {
    ty: Type,
    allow_none: bool,
    items: Vec<Value>,
}

impl TypedSequence {
    /// Create an empty sequence
    #[must_use]
    pub fn new(ty: Type, allow_none: bool) -> Self {
        Self {
            ty,
            allow_none,
            items: Vec::new(),
        }
    }

    /// Create a sequence from existing elements, checking each one
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] on the first rejected element
    pub fn from_items<I>(ty: Type, allow_none: bool, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut seq = Self::new(ty, allow_none);
        seq.extend(items)?;
        Ok(seq)
    }

    #[inline]
    #[must_use]
    pub fn element_type(&self) -> &Type {
        &self.ty
    }

    /// Whether `Null` elements are accepted
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

    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Append an element
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if the element type does not match
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.check(&value)?;
        self.items.push(value);
        Ok(())
    }

    /// Append every element, stopping at the first rejected one
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if an element type does not match
    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    /// Insert before `index`; positions past the end append
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if the element type does not match
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.check(&value)?;
        let index = index.min(self.items.len());
        self.items.insert(index, value);
        Ok(())
    }

    /// Replace the element at `index`, returning the previous one
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if the element type does not match
    /// and [`ModelError::IndexOutOfRange`] for a position past the end
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        self.check(&value)?;
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(ModelError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    /// Remove and return the element at `index`
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove every element
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    fn check(&self, value: &Value) -> Result<()> {
        check_element("sequence", &self.ty, self.allow_none, value)
    }
}

impl PartialEq for TypedSequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.ty == other.ty
    }
}

impl Eq for TypedSequence {}

impl PartialEq<[Value]> for TypedSequence {
    fn eq(&self, other: &[Value]) -> bool {
        self.items == other
    }
}

impl PartialEq<Vec<Value>> for TypedSequence {
    fn eq(&self, other: &Vec<Value>) -> bool {
        &self.items == other
    }
}

impl Index<usize> for TypedSequence {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a TypedSequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
