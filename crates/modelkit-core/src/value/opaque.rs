//! Values of externally defined types
//!
//! The engine knows nothing about an opaque value beyond its type name,
//! equality and hash. A dispatcher rule registered for the type name gives
//! it a plain representation.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

trait ErasedOpaque: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn Any) -> bool;
    fn hash_erased(&self, state: &mut dyn Hasher);
}

impl<T> ErasedOpaque for T
where
    T: Any + Send + Sync + fmt::Debug + PartialEq + Hash,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn hash_erased(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// Type-erased value tagged with a type name
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: Arc<str>,
    inner: Arc<dyn ErasedOpaque>,
}

impl OpaqueValue {
    /// Wrap a value under the given type name
    pub fn new<T>(type_name: impl Into<Arc<str>>, value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug + PartialEq + Hash,
    {
        Self {
            type_name: type_name.into(),
            inner: Arc::new(value),
        }
    }

    /// Name the dispatcher uses to look up a conversion rule
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the wrapped value if it is a `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.type_name, self.inner)
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && (*self.inner).eq_erased((*other.inner).as_any())
    }
}

impl Eq for OpaqueValue {}

impl Hash for OpaqueValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        (*self.inner).hash_erased(state);
    }
}
