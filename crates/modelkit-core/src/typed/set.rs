use indexmap::IndexSet;

use super::check_element;
use crate::error::{ModelError, Result};
use crate::ty::Type;
use crate::value::Value;

/// Deduplicating set whose elements must match an element type
///
/// Iteration follows insertion order, but callers must not rely on it.
#[derive(Debug, Clone)]
pub struct TypedSet {
    ty: Type,
    allow_none: bool,
    items: IndexSet<Value>,
}

impl TypedSet {
    /// Create an empty set
    #[must_use]
    pub fn new(ty: Type, allow_none: bool) -> Self {
        Self {
            ty,
            allow_none,
            items: IndexSet::new(),
        }
    }

    /// Create a set from existing elements, checking each one
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] on the first rejected element
    pub fn from_items<I>(ty: Type, allow_none: bool, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut set = Self::new(ty, allow_none);
        for item in items {
            set.add(item)?;
        }
        Ok(set)
    }

    #[inline]
    #[must_use]
    pub fn element_type(&self) -> &Type {
        &self.ty
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

    /// Underlying plain set
    #[inline]
    #[must_use]
    pub fn as_set(&self) -> &IndexSet<Value> {
        &self.items
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, Value> {
        self.items.iter()
    }

    /// Add an element, returning `false` if an equal one was already present
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if the element type does not match
    /// or the element is not hashable
    pub fn add(&mut self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        check_element("set", &self.ty, self.allow_none, &value)?;
        if !value.is_hashable() {
            return Err(ModelError::type_mismatch(
                format!("set<{}>", self.ty),
                "hashable value",
                value.type_name(),
            ));
        }
        Ok(self.items.insert(value))
    }

    /// Remove an element if present
    pub fn discard(&mut self, value: &Value) -> bool {
        self.items.shift_remove(value)
    }

    #[must_use]
    pub fn into_items(self) -> IndexSet<Value> {
        self.items
    }
}

impl PartialEq for TypedSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.ty == other.ty
    }
}

impl Eq for TypedSet {}

impl PartialEq<IndexSet<Value>> for TypedSet {
    fn eq(&self, other: &IndexSet<Value>) -> bool {
        &self.items == other
    }
}

impl<'a> IntoIterator for &'a TypedSet {
    type Item = &'a Value;
    type IntoIter = indexmap::set::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn deduplicates() {
        let set = TypedSet::from_items(
            Type::String,
            false,
            ["a", "b", "a"].into_iter().map(Value::from),
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::from("a")));
    }

    #[test]
    fn plain_set_equality_ignores_element_type() {
        let typed = TypedSet::from_items(Type::Int, false, [Value::Int(2), Value::Int(1)]).unwrap();
        assert_eq!(Value::TypedSet(typed.clone()), Value::set([1, 2]));

        let any = TypedSet::from_items(Type::Any, false, [Value::Int(1), Value::Int(2)]).unwrap();
        assert_ne!(typed, any);
    }

    #[test]
    fn rejects_unhashable_and_mistyped() {
        let mut set = TypedSet::new(Type::Any, false);
        assert_eq!(set.add(Value::list([1])).unwrap_err().kind(), ErrorKind::TypeMismatch);

        let mut ints = TypedSet::new(Type::Int, false);
        assert!(ints.add("one").is_err());
        assert!(ints.add(1).unwrap());
        assert!(!ints.add(1).unwrap());
    }

    #[test]
    fn discard_removes() {
        let mut set = TypedSet::from_items(Type::Int, false, [Value::Int(1)]).unwrap();
        assert!(set.discard(&Value::Int(1)));
        assert!(!set.discard(&Value::Int(1)));
        assert!(set.is_empty());
    }
}
