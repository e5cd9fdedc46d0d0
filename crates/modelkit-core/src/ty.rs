//! Type descriptors
//!
//! [`Type`] is the declared type of a field or container element. Model
//! references are lazy: a [`ModelRef`] may hold only a fully qualified name
//! and is resolved against the global [`TypeRegistry`](crate::TypeRegistry)
//! the first time it is needed, which lets a model refer to itself or to a
//! model declared later.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DeclarationError, ModelError, Result};
use crate::model::ModelType;
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Declared type of a value
#[derive(Debug, Clone)]
pub enum Type {
    /// Accepts every value
    Any,
    Bool,
    Int,
    Float,
    String,
    Decimal,
    Uuid,
    Url,
    Date,
    DateTime,
    Time,
    /// Plain list
    List,
    /// Plain set
    Set,
    /// Plain mapping
    Map,
    Enum(Arc<EnumType>),
    Model(ModelRef),
}

impl Type {
    /// Reference a model by fully qualified name, resolved on first use
    #[inline]
    pub fn model_named(name: impl Into<String>) -> Self {
        Self::Model(ModelRef::named(name))
    }

    /// Capability test: does this type describe a model
    #[inline]
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Instance-of check used by validators and typed containers
    ///
    /// Model and enum values match by type name so a deferred reference
    /// never needs resolving just to check a value.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::String, Value::String(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::Uuid, Value::Uuid(_))
            | (Self::Url, Value::Url(_))
            | (Self::Date, Value::Date(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::Time, Value::Time(_))
            | (Self::List, Value::List(_) | Value::Sequence(_))
            | (Self::Set, Value::Set(_) | Value::TypedSet(_))
            | (Self::Map, Value::Map(_) | Value::Mapping(_)) => true,
            (Self::Enum(ty), Value::Enum(member)) => member.enum_type().name() == ty.name(),
            (Self::Model(model), Value::Model(inst)) => inst.model().name() == model.name(),
            _ => false,
        }
    }

    /// Display name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Decimal => "decimal",
            Self::Uuid => "uuid",
            Self::Url => "url",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Enum(ty) => ty.name(),
            Self::Model(model) => model.name(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Enum(a), Self::Enum(b)) => a.name() == b.name(),
            (Self::Model(a), Self::Model(b)) => a.name() == b.name(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Arc<ModelType>> for Type {
    fn from(model: Arc<ModelType>) -> Self {
        Self::Model(ModelRef::from(model))
    }
}

impl From<&Arc<ModelType>> for Type {
    fn from(model: &Arc<ModelType>) -> Self {
        Self::Model(ModelRef::from(Arc::clone(model)))
    }
}

impl From<Arc<EnumType>> for Type {
    fn from(ty: Arc<EnumType>) -> Self {
        Self::Enum(ty)
    }
}

impl From<&Arc<EnumType>> for Type {
    fn from(ty: &Arc<EnumType>) -> Self {
        Self::Enum(Arc::clone(ty))
    }
}

struct ModelRefInner {
    name: String,
    resolved: OnceCell<Arc<ModelType>>,
}

/// Lazily resolved handle to a model type
#[derive(Clone)]
pub struct ModelRef(Arc<ModelRefInner>);

impl ModelRef {
    /// Deferred reference by fully qualified name
    pub fn named(name: impl Into<String>) -> Self {
        Self(Arc::new(ModelRefInner {
            name: name.into(),
            resolved: OnceCell::new(),
        }))
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Check whether the reference has been resolved
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.0.resolved.get().is_some()
    }

    /// Resolve against the global registry, caching the result
    ///
    /// # Errors
    /// Returns [`ModelError::UnresolvedType`] if no model of that name is registered
    pub fn resolve(&self) -> Result<Arc<ModelType>> {
        self.resolve_in(TypeRegistry::global())
    }

    /// Resolve against a specific registry, caching the result
    ///
    /// # Errors
    /// Returns [`ModelError::UnresolvedType`] if no model of that name is registered
    pub fn resolve_in(&self, registry: &TypeRegistry) -> Result<Arc<ModelType>> {
        self.0
            .resolved
            .get_or_try_init(|| {
                let model = registry
                    .get(&self.0.name)
                    .ok_or_else(|| ModelError::UnresolvedType(self.0.name.clone()))?;
                tracing::debug!("Resolved deferred model reference: {}", self.0.name);
                Ok(model)
            })
            .cloned()
    }
}

impl From<Arc<ModelType>> for ModelRef {
    fn from(model: Arc<ModelType>) -> Self {
        let name = model.name().to_string();
        let resolved = OnceCell::new();
        let _ = resolved.set(model);
        Self(Arc::new(ModelRefInner { name, resolved }))
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("name", &self.0.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Fixed set of named constants
#[derive(Debug)]
pub struct EnumType {
    name: String,
    members: Vec<(String, Value)>,
}

impl EnumType {
    /// Start declaring an enum type
    pub fn builder(name: impl Into<String>) -> EnumTypeBuilder {
        EnumTypeBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of members
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member by name
    #[must_use]
    pub fn member(self: &Arc<Self>, name: &str) -> Option<EnumMember> {
        self.members
            .iter()
            .position(|(n, _)| n == name)
            .map(|index| EnumMember {
                enum_type: Arc::clone(self),
                index,
            })
    }

    /// Member whose underlying value equals `value`
    #[must_use]
    pub fn from_value(self: &Arc<Self>, value: &Value) -> Option<EnumMember> {
        self.members
            .iter()
            .position(|(_, v)| v == value)
            .map(|index| EnumMember {
                enum_type: Arc::clone(self),
                index,
            })
    }

    /// Iterate members in declaration order
    pub fn members(self: &Arc<Self>) -> impl Iterator<Item = EnumMember> + '_ {
        (0..self.members.len()).map(move |index| EnumMember {
            enum_type: Arc::clone(self),
            index,
        })
    }
}

/// Builder for [`EnumType`]
#[derive(Debug)]
pub struct EnumTypeBuilder {
    name: String,
    members: Vec<(String, Value)>,
}

impl EnumTypeBuilder {
    /// Add a member with its underlying scalar value
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Finish the declaration
    ///
    /// # Errors
    /// Returns [`DeclarationError`] for an empty name or duplicate members
    pub fn build(self) -> Result<Arc<EnumType>, DeclarationError> {
        if self.name.is_empty() {
            return Err(DeclarationError::EmptyName);
        }
        for (i, (name, value)) in self.members.iter().enumerate() {
            let duplicate = self.members[..i]
                .iter()
                .any(|(n, v)| n == name || v == value);
            if duplicate {
                return Err(DeclarationError::DuplicateMember {
                    enum_name: self.name,
                    member: name.clone(),
                });
            }
        }
        tracing::debug!("Declared enum type {} ({} members)", self.name, self.members.len());
        Ok(Arc::new(EnumType {
            name: self.name,
            members: self.members,
        }))
    }
}

/// One member of an [`EnumType`]
#[derive(Clone)]
pub struct EnumMember {
    enum_type: Arc<EnumType>,
    index: usize,
}

impl EnumMember {
    #[inline]
    #[must_use]
    pub fn enum_type(&self) -> &Arc<EnumType> {
        &self.enum_type
    }

    /// Member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.enum_type.members[self.index].0
    }

    /// Underlying scalar value
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.enum_type.members[self.index].1
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.enum_type.name == other.enum_type.name
    }
}

impl Eq for EnumMember {}

impl Hash for EnumMember {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.enum_type.name.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}.{}: {}>", self.enum_type.name, self.name(), self.value().repr())
    }
}

impl fmt::Display for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.enum_type.name, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> Arc<EnumType> {
        EnumType::builder("compose.Protocol")
            .member("TCP", "tcp")
            .member("UDP", "udp")
            .build()
            .unwrap()
    }

    #[test]
    fn enum_lookup_by_name_and_value() {
        let ty = protocol();
        let tcp = ty.member("TCP").unwrap();
        assert_eq!(tcp.value(), &Value::from("tcp"));
        assert_eq!(ty.from_value(&Value::from("udp")).unwrap().name(), "UDP");
        assert!(ty.from_value(&Value::from("icmp")).is_none());
        assert_eq!(ty.members().count(), 2);
    }

    #[test]
    fn enum_rejects_duplicate_values() {
        let err = EnumType::builder("Dup")
            .member("A", 1)
            .member("B", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateMember { .. }));
    }

    #[test]
    fn scalar_types_match_values() {
        assert!(Type::Int.matches(&Value::Int(1)));
        assert!(!Type::Int.matches(&Value::Float(1.0)));
        assert!(Type::Any.matches(&Value::Null));
        assert!(!Type::String.matches(&Value::Null));
        assert!(Type::List.matches(&Value::list([1])));
    }

    #[test]
    fn enum_type_matches_members_by_type_name() {
        let ty = protocol();
        let member = Value::Enum(ty.member("TCP").unwrap());
        assert!(Type::from(&ty).matches(&member));
        assert!(!Type::String.matches(&member));
    }

    #[test]
    fn unresolved_reference_reports_name() {
        let handle = ModelRef::named("nowhere.Missing");
        assert!(!handle.is_resolved());
        let err = handle.resolve().unwrap_err();
        assert_eq!(err, ModelError::UnresolvedType("nowhere.Missing".into()));
    }

    #[test]
    fn type_equality_by_name() {
        assert_eq!(Type::model_named("a.B"), Type::model_named("a.B"));
        assert_ne!(Type::model_named("a.B"), Type::model_named("a.C"));
        assert_eq!(Type::Int, Type::Int);
        assert_ne!(Type::Int, Type::Float);
    }
}
