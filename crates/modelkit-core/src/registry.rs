//! Type-name registry for model types
//!
//! Provides [`TypeRegistry`], the name → [`ModelType`] map that deferred
//! [`ModelRef`](crate::ModelRef) handles resolve against.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::model::ModelType;

static GLOBAL: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

/// Registry of declared model types keyed by fully qualified name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<IndexMap<String, Arc<ModelType>>>,
}

impl TypeRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry populated by `ModelTypeBuilder::build`
    #[inline]
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Register a model type under its name
    ///
    /// Returns the type previously registered under the same name.
    pub fn register(&self, model: Arc<ModelType>) -> Option<Arc<ModelType>> {
        let name = model.name().to_string();
        let previous = self.types.write().insert(name.clone(), model);
        if previous.is_some() {
            tracing::warn!("Model type {} re-registered, replacing earlier declaration", name);
        } else {
            tracing::debug!("Registered model type {}", name);
        }
        previous
    }

    /// Look up a model type by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ModelType>> {
        self.types.read().get(name).cloned()
    }

    /// Check if a name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Remove a model type
    pub fn remove(&self, name: &str) -> Option<Arc<ModelType>> {
        self.types.write().shift_remove(name)
    }

    /// List registered names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }

    /// Get number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn register_and_lookup() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());

        let model = ModelType::mutable("registry_tests.Point")
            .field(Field::int("x"))
            .field(Field::int("y"))
            .build_unregistered()
            .unwrap();

        assert!(registry.register(Arc::clone(&model)).is_none());
        assert!(registry.contains("registry_tests.Point"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["registry_tests.Point".to_string()]);

        let again = registry.register(model);
        assert!(again.is_some());
        assert_eq!(registry.len(), 1);

        assert!(registry.remove("registry_tests.Point").is_some());
        assert!(registry.get("registry_tests.Point").is_none());
    }

    #[test]
    fn build_registers_globally() {
        ModelType::immutable("registry_tests.Global")
            .field(Field::string("name"))
            .build()
            .unwrap();
        assert!(TypeRegistry::global().contains("registry_tests.Global"));
    }
}
