//! Model types and instances
//!
//! A [`ModelType`] is an ordered list of [`Field`]s plus a mutability flag,
//! a strict flag, an optional derivation hook and optional computed
//! properties. [`ModelType::construct`] converts and validates keyword
//! arguments into an [`Instance`]; an instance either exists with valid
//! fields or construction fails.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::Arc;

use crate::error::{DeclarationError, ModelError, Result};
use crate::field::{Field, FieldKind};
use crate::registry::TypeRegistry;
use crate::typed::{TypedMapping, TypedSequence, TypedSet};
use crate::value::{Kwargs, Value};

/// Hook run on a fully converted draft before the instance is sealed
pub type DeriveFn = fn(&mut Draft<'_>) -> Result<()>;

/// Computed property body
pub type PropertyFn = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// Whether fields may be assigned after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mutability {
    #[default]
    Mutable,
    /// Fields fixed at construction; instances are hashable
    Immutable,
}

/// Read-only value computed from an instance
#[derive(Clone)]
pub struct Property {
    name: String,
    compute: PropertyFn,
}

impl Property {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn compute(&self, instance: &Instance) -> Value {
        (self.compute)(instance)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("name", &self.name).finish()
    }
}

/// Declared structural type
pub struct ModelType {
    name: String,
    fields: Vec<Field>,
    mutability: Mutability,
    strict: bool,
    derive: Option<DeriveFn>,
    properties: Vec<Property>,
}

impl ModelType {
    /// Start declaring a model whose fields stay assignable
    pub fn mutable(name: impl Into<String>) -> ModelTypeBuilder {
        ModelTypeBuilder::new(name.into(), Mutability::Mutable)
    }

    /// Start declaring a model whose fields are fixed at construction
    pub fn immutable(name: impl Into<String>) -> ModelTypeBuilder {
        ModelTypeBuilder::new(name.into(), Mutability::Immutable)
    }

    /// Fully qualified name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its module path
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Fields in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    #[inline]
    #[must_use]
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    #[inline]
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.mutability == Mutability::Immutable
    }

    /// Whether coercion rejects unmapped input keys
    #[inline]
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Build an instance from keyword arguments keyed by field name
    ///
    /// Every field is converted, then validated. The derivation hook runs
    /// last; fields it writes are converted and validated again.
    ///
    /// # Errors
    /// - [`ModelError::UnknownField`] for a keyword the model does not declare
    /// - [`ModelError::MissingRequiredField`] for a required field with no value
    /// - any converter, validator or derivation failure
    pub fn construct(self: &Arc<Self>, mut kwargs: Kwargs) -> Result<Instance> {
        if let Some(unknown) = kwargs.keys().find(|k| self.field_index(k).is_none()) {
            return Err(ModelError::UnknownField {
                model: self.name.clone(),
                field: unknown.clone(),
            });
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw = match kwargs.shift_remove(field.name()) {
                Some(value) => value,
                None => field
                    .default_value()
                    .ok_or_else(|| ModelError::missing_required(&self.name, field.name()))?,
            };
            values.push(field.convert(raw)?);
        }
        for (field, value) in self.fields.iter().zip(&values) {
            field.validate(&self.name, value)?;
        }

        if let Some(derive) = self.derive {
            let mut draft = Draft {
                model: self,
                values: &mut values,
                touched: vec![false; self.fields.len()],
            };
            derive(&mut draft)?;
            let touched = draft.touched;
            for (index, field) in self.fields.iter().enumerate() {
                if touched[index] {
                    let raw = std::mem::take(&mut values[index]);
                    values[index] = field.convert(raw)?;
                    field.validate(&self.name, &values[index])?;
                }
            }
        }

        tracing::trace!("Constructed {} instance", self.name);
        Ok(Instance {
            model: Arc::clone(self),
            values,
        })
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("mutability", &self.mutability)
            .field("strict", &self.strict)
            .field("derive", &self.derive.is_some())
            .field("properties", &self.properties)
            .finish()
    }
}

/// Builder for [`ModelType`]
#[derive(Debug)]
pub struct ModelTypeBuilder {
    name: String,
    mutability: Mutability,
    fields: Vec<Field>,
    strict: bool,
    derive: Option<DeriveFn>,
    properties: Vec<Property>,
}

impl ModelTypeBuilder {
    fn new(name: String, mutability: Mutability) -> Self {
        Self {
            name,
            mutability,
            fields: Vec::new(),
            strict: false,
            derive: None,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields<I: IntoIterator<Item = Field>>(mut self, fields: I) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Reject unmapped input keys during coercion
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Derive field values from the converted draft before sealing
    #[must_use]
    pub fn derive(mut self, hook: DeriveFn) -> Self {
        self.derive = Some(hook);
        self
    }

    /// Add a computed read-only property
    #[must_use]
    pub fn property<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.properties.push(Property {
            name: name.into(),
            compute: Arc::new(compute),
        });
        self
    }

    /// Validate the declaration and register it in the global registry
    ///
    /// # Errors
    /// Returns [`DeclarationError`] for an empty name, duplicate field names,
    /// colliding external keys or a mapping field without a child key
    pub fn build(self) -> Result<Arc<ModelType>, DeclarationError> {
        let model = self.build_unregistered()?;
        TypeRegistry::global().register(Arc::clone(&model));
        Ok(model)
    }

    /// Validate the declaration without registering it
    ///
    /// # Errors
    /// Same as [`ModelTypeBuilder::build`]
    pub fn build_unregistered(self) -> Result<Arc<ModelType>, DeclarationError> {
        if self.name.is_empty() {
            return Err(DeclarationError::EmptyName);
        }
        for (i, field) in self.fields.iter().enumerate() {
            let earlier = &self.fields[..i];
            if earlier.iter().any(|f| f.name() == field.name()) {
                return Err(DeclarationError::DuplicateField {
                    model: self.name,
                    field: field.name().to_string(),
                });
            }
            if let Some(first) = earlier
                .iter()
                .find(|f| f.external_key() == field.external_key())
            {
                return Err(DeclarationError::DuplicateKey {
                    model: self.name.clone(),
                    key: field.external_key().to_string(),
                    first: first.name().to_string(),
                    second: field.name().to_string(),
                });
            }
            if let FieldKind::Mapping { child_key, .. } = field.kind() {
                if child_key.is_empty() {
                    return Err(DeclarationError::EmptyChildKey {
                        model: self.name,
                        field: field.name().to_string(),
                    });
                }
            }
        }
        tracing::debug!(
            "Declared model type {} ({} fields, {:?}, strict={})",
            self.name,
            self.fields.len(),
            self.mutability,
            self.strict
        );
        Ok(Arc::new(ModelType {
            name: self.name,
            fields: self.fields,
            mutability: self.mutability,
            strict: self.strict,
            derive: self.derive,
            properties: self.properties,
        }))
    }
}

/// Converted field values handed to a derivation hook
pub struct Draft<'a> {
    model: &'a ModelType,
    values: &'a mut Vec<Value>,
    touched: Vec<bool>,
}

impl Draft<'_> {
    #[inline]
    #[must_use]
    pub fn model(&self) -> &ModelType {
        self.model
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.model.field_index(name).map(|i| &self.values[i])
    }

    /// Write a field; the value is converted and validated after the hook returns
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownField`] if the model has no such field
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .model
            .field_index(name)
            .ok_or_else(|| ModelError::UnknownField {
                model: self.model.name.clone(),
                field: name.to_string(),
            })?;
        self.values[index] = value.into();
        self.touched[index] = true;
        Ok(())
    }
}

/// Instance of a [`ModelType`]
#[derive(Clone)]
pub struct Instance {
    model: Arc<ModelType>,
    values: Vec<Value>,
}

impl Instance {
    #[inline]
    #[must_use]
    pub fn model(&self) -> &Arc<ModelType> {
        &self.model
    }

    /// Field values in declaration order
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of a field by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.model.field_index(name).map(|i| &self.values[i])
    }

    /// Value of a computed property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.model
            .properties()
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.compute(self))
    }

    /// Assign a field, running its converter and validator
    ///
    /// # Errors
    /// - [`ModelError::FrozenInstance`] on an immutable instance
    /// - [`ModelError::UnknownField`] if the model has no such field
    /// - any converter or validator failure, leaving the field unchanged
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(name)?;
        if self.model.is_immutable() {
            return Err(ModelError::FrozenInstance {
                model: self.model.name.clone(),
                field: name.to_string(),
            });
        }
        let field = &self.model.fields[index];
        let converted = field.convert(value.into())?;
        field.validate(&self.model.name, &converted)?;
        self.values[index] = converted;
        Ok(())
    }

    /// Mutable access to a sequence field
    ///
    /// Element checks still apply, and this works on immutable instances too.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownField`] or [`ModelError::TypeMismatch`]
    /// if the field does not hold a typed sequence
    pub fn sequence_mut(&mut self, name: &str) -> Result<&mut TypedSequence> {
        match self.container_mut(name)? {
            Value::Sequence(seq) => Ok(seq),
            other => Err(ModelError::type_mismatch(name, "sequence", other.type_name())),
        }
    }

    /// Mutable access to a set field
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownField`] or [`ModelError::TypeMismatch`]
    /// if the field does not hold a typed set
    pub fn typed_set_mut(&mut self, name: &str) -> Result<&mut TypedSet> {
        match self.container_mut(name)? {
            Value::TypedSet(set) => Ok(set),
            other => Err(ModelError::type_mismatch(name, "set", other.type_name())),
        }
    }

    /// Mutable access to a mapping field
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownField`] or [`ModelError::TypeMismatch`]
    /// if the field does not hold a typed mapping
    pub fn mapping_mut(&mut self, name: &str) -> Result<&mut TypedMapping> {
        match self.container_mut(name)? {
            Value::Mapping(mapping) => Ok(mapping),
            other => Err(ModelError::type_mismatch(name, "mapping", other.type_name())),
        }
    }

    /// Hashable when immutable and every compared value is hashable
    #[must_use]
    pub fn is_hashable(&self) -> bool {
        self.model.is_immutable() && self.compared().all(|(_, v)| v.is_hashable())
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.model
            .field_index(name)
            .ok_or_else(|| ModelError::UnknownField {
                model: self.model.name.clone(),
                field: name.to_string(),
            })
    }

    fn container_mut(&mut self, name: &str) -> Result<&mut Value> {
        let index = self.index_of(name)?;
        Ok(&mut self.values[index])
    }

    fn compared(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.model
            .fields
            .iter()
            .zip(&self.values)
            .filter(|(f, _)| f.in_compare())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.model.name == other.model.name
            && self
                .compared()
                .map(|(_, v)| v)
                .eq(other.compared().map(|(_, v)| v))
    }
}

impl Eq for Instance {}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.name.hash(state);
        for (_, value) in self.compared() {
            value.hash(state);
        }
    }
}

impl Index<&str> for Instance {
    type Output = Value;

    /// # Panics
    /// Panics if the model has no field of that name
    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("{} has no field '{name}'", self.model.name),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.model.short_name())?;
        let shown = self
            .model
            .fields
            .iter()
            .zip(&self.values)
            .filter(|(field, _)| field.in_repr());
        for (i, (field, value)) in shown.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field.name(), value.repr())?;
        }
        f.write_str(")")
    }
}
