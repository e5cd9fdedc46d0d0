//! Field descriptors
//!
//! A [`Field`] carries everything the engine needs to know about one model
//! attribute: its kind, whether it is required, its default, the external key
//! used in plain representations, an optional formatter, and the flags that
//! control debug output and equality. Each kind brings its own converter
//! (run on raw input before storage) and validator (run on the converted
//! value before the instance exists).

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use uuid::Uuid;

use crate::coerce::{convert_scalar, to_model};
use crate::datetime::{DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};
use crate::error::{DeclarationError, ModelError, Result};
use crate::ty::Type;
use crate::typed::{TypedMapping, TypedSequence, TypedSet};
use crate::value::Value;

/// Extra check run after the kind's own validator
pub type Validator = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// Default of a field when no value is given
#[derive(Clone, Default)]
pub enum FieldDefault {
    /// No explicit default
    #[default]
    Nothing,
    /// Literal value, cloned per instance
    Value(Value),
    /// Zero-argument producer called per instance
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nothing => f.write_str("Nothing"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// What a field holds
#[derive(Debug, Clone)]
pub enum FieldKind {
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
    /// String that must match a pattern at its start
    Regex { pattern: String, regex: Regex },
    /// Single nested value of the given type
    Child(Type),
    /// Typed sequence; `nullable` admits `Null` elements regardless of `required`
    Sequence { ty: Type, nullable: bool },
    Set(Type),
    /// Typed mapping keyed by the `child_key` field of each value
    Mapping { ty: Type, child_key: String },
}

/// Descriptor of one model field
#[derive(Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    required: bool,
    default: FieldDefault,
    key: Option<String>,
    formatter: Option<String>,
    repr: bool,
    compare: bool,
    validators: Vec<Validator>,
}

impl Field {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let repr = !matches!(
            kind,
            FieldKind::Sequence { .. } | FieldKind::Set(_) | FieldKind::Mapping { .. }
        );
        let formatter = match kind {
            FieldKind::Date => Some(DEFAULT_DATE_FORMAT.to_string()),
            FieldKind::DateTime => Some(DEFAULT_DATETIME_FORMAT.to_string()),
            FieldKind::Time => Some(DEFAULT_TIME_FORMAT.to_string()),
            _ => None,
        };
        Self {
            name: name.into(),
            kind,
            required: true,
            default: FieldDefault::Nothing,
            key: None,
            formatter,
            repr,
            compare: true,
            validators: Vec::new(),
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    /// UUID field, optional by default with a fresh v4 UUID as its default
    pub fn uuid(name: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::Uuid);
        field.required = false;
        field
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Url)
    }

    /// Date field, formatted with `%Y-%m-%d` unless overridden
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    /// Datetime field, formatted as ISO-8601 unless overridden
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    /// Time field, formatted with `%H:%M:%S` unless overridden
    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Time)
    }

    /// String field validated against `pattern`
    ///
    /// # Errors
    /// Returns [`DeclarationError::InvalidPattern`] if the pattern does not compile
    pub fn regex(name: impl Into<String>, pattern: &str) -> Result<Self, DeclarationError> {
        let name = name.into();
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            DeclarationError::InvalidPattern {
                field: name.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::new(
            name,
            FieldKind::Regex {
                pattern: pattern.to_string(),
                regex,
            },
        ))
    }

    /// Nested model, enum or scalar of type `ty`
    pub fn child(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self::new(name, FieldKind::Child(ty.into()))
    }

    pub fn sequence(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self::new(
            name,
            FieldKind::Sequence {
                ty: ty.into(),
                nullable: false,
            },
        )
    }

    /// Sequence whose elements may be `Null` even when the field is required
    pub fn nullable_sequence(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self::new(
            name,
            FieldKind::Sequence {
                ty: ty.into(),
                nullable: true,
            },
        )
    }

    pub fn set(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self::new(name, FieldKind::Set(ty.into()))
    }

    /// Mapping of values keyed by their `child_key` field
    pub fn mapping(name: impl Into<String>, ty: impl Into<Type>, child_key: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Mapping {
                ty: ty.into(),
                child_key: child_key.into(),
            },
        )
    }

    /// External name used in plain representations
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Shorthand for `required(false)`
    #[must_use]
    pub fn optional(self) -> Self {
        self.required(false)
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    #[must_use]
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    /// Include in the instance's debug output
    #[must_use]
    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = repr;
        self
    }

    /// Include in instance equality and hashing
    #[must_use]
    pub fn compare(mut self, compare: bool) -> Self {
        self.compare = compare;
        self
    }

    #[must_use]
    pub fn validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(check));
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Rename key, if one was configured
    #[inline]
    #[must_use]
    pub fn key_name(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Key used in plain representations: the rename key or the field name
    #[inline]
    #[must_use]
    pub fn external_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    #[inline]
    #[must_use]
    pub fn formatter_name(&self) -> Option<&str> {
        self.formatter.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn in_repr(&self) -> bool {
        self.repr
    }

    #[inline]
    #[must_use]
    pub fn in_compare(&self) -> bool {
        self.compare
    }

    #[inline]
    #[must_use]
    pub fn default_spec(&self) -> &FieldDefault {
        &self.default
    }

    /// Declared type of the value, or of the elements for container kinds
    #[must_use]
    pub fn value_type(&self) -> Type {
        match &self.kind {
            FieldKind::Bool => Type::Bool,
            FieldKind::Int => Type::Int,
            FieldKind::Float => Type::Float,
            FieldKind::String | FieldKind::Regex { .. } => Type::String,
            FieldKind::Decimal => Type::Decimal,
            FieldKind::Uuid => Type::Uuid,
            FieldKind::Url => Type::Url,
            FieldKind::Date => Type::Date,
            FieldKind::DateTime => Type::DateTime,
            FieldKind::Time => Type::Time,
            FieldKind::Child(ty)
            | FieldKind::Sequence { ty, .. }
            | FieldKind::Set(ty)
            | FieldKind::Mapping { ty, .. } => ty.clone(),
        }
    }

    /// Value used when construction receives none
    ///
    /// `None` means the field is required and has no default. Optional
    /// fields without an explicit default get their kind's empty value.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        match &self.default {
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Factory(make) => Some(make()),
            FieldDefault::Nothing if self.required => None,
            FieldDefault::Nothing => Some(match self.kind {
                FieldKind::Sequence { .. } => Value::List(Vec::new()),
                FieldKind::Set(_) => Value::Set(IndexSet::new()),
                FieldKind::Mapping { .. } => Value::Map(IndexMap::new()),
                FieldKind::Uuid => Value::Uuid(Uuid::new_v4()),
                _ => Value::Null,
            }),
        }
    }

    fn element_allows_none(&self) -> bool {
        match self.kind {
            FieldKind::Sequence { nullable, .. } => nullable || !self.required,
            _ => !self.required,
        }
    }

    /// Normalise a raw value toward the field's kind
    ///
    /// Container kinds always produce a typed container, turning `Null` into
    /// an empty one. Values a scalar converter cannot handle are left for the
    /// validator to reject.
    ///
    /// # Errors
    /// Returns [`ModelError::Conversion`] when parsing or nested coercion
    /// fails, and [`ModelError::TypeMismatch`] for a container element or
    /// mapping input of the wrong shape
    pub fn convert(&self, value: Value) -> Result<Value> {
        match &self.kind {
            FieldKind::Sequence { ty, .. } => {
                let items = self.iterable(value)?;
                let items = items
                    .into_iter()
                    .map(|item| coerce_nested(ty, item))
                    .collect::<Result<Vec<_>>>()?;
                TypedSequence::from_items(ty.clone(), self.element_allows_none(), items)
                    .map(Value::Sequence)
            }
            FieldKind::Set(ty) => {
                let items = self.iterable(value)?;
                let items = items
                    .into_iter()
                    .map(|item| coerce_nested(ty, item))
                    .collect::<Result<Vec<_>>>()?;
                TypedSet::from_items(ty.clone(), self.element_allows_none(), items)
                    .map(Value::TypedSet)
            }
            FieldKind::Mapping { ty, child_key } => self.convert_mapping(ty, child_key, value),
            _ if value.is_null() => Ok(value),
            FieldKind::Child(ty) => coerce_nested(ty, value),
            FieldKind::Bool => Ok(value),
            _ => convert_scalar(&self.value_type(), value, self.formatter.as_deref()),
        }
    }

    fn iterable(&self, value: Value) -> Result<Vec<Value>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => Ok(items),
            Value::Sequence(seq) => Ok(seq.into_items()),
            Value::Set(items) => Ok(items.into_iter().collect()),
            Value::TypedSet(set) => Ok(set.into_items().into_iter().collect()),
            other => Err(ModelError::type_mismatch(
                format!("field '{}'", self.name),
                "list or set",
                other.type_name(),
            )),
        }
    }

    fn convert_mapping(&self, ty: &Type, child_key: &str, value: Value) -> Result<Value> {
        let map = match value {
            Value::Mapping(mapping) => return Ok(Value::Mapping(mapping)),
            Value::Null => IndexMap::new(),
            Value::Map(map) => map,
            other => {
                return Err(ModelError::type_mismatch(
                    format!("field '{}'", self.name),
                    "map",
                    other.type_name(),
                ))
            }
        };
        let injected_key = Value::from(child_external_key(ty, child_key));
        let mut pairs = Vec::with_capacity(map.len());
        for (key, item) in map {
            let item = match item {
                Value::Map(mut inner) => {
                    inner.insert(injected_key.clone(), key.clone());
                    coerce_nested(ty, Value::Map(inner))?
                }
                other => other,
            };
            pairs.push((key, item));
        }
        TypedMapping::from_pairs(
            ty.clone(),
            Some(child_key.to_string()),
            self.element_allows_none(),
            pairs,
        )
        .map(Value::Mapping)
    }

    /// Check a converted value
    ///
    /// # Errors
    /// Returns [`ModelError::TypeMismatch`] if the value has the wrong type,
    /// is `Null` for a required field, or fails the pattern; errors from
    /// extra validators are returned as they are
    pub fn validate(&self, model: &str, value: &Value) -> Result<()> {
        let context = || format!("{model}.{}", self.name);
        if value.is_null() {
            if self.required {
                return Err(ModelError::type_mismatch(context(), self.expected_name(), "null"));
            }
            return Ok(());
        }
        if let (FieldKind::Regex { pattern, regex }, Value::String(text)) = (&self.kind, value) {
            if !regex.is_match(text) {
                return Err(ModelError::type_mismatch(
                    context(),
                    format!("text matching '{pattern}'"),
                    value.repr(),
                ));
            }
        }
        let accepted = match &self.kind {
            FieldKind::Sequence { .. } => matches!(value, Value::Sequence(_)),
            FieldKind::Set(_) => matches!(value, Value::TypedSet(_)),
            FieldKind::Mapping { .. } => matches!(value, Value::Mapping(_)),
            _ => self.value_type().matches(value),
        };
        if !accepted {
            return Err(ModelError::type_mismatch(
                context(),
                self.expected_name(),
                value.type_name(),
            ));
        }
        self.validators.iter().try_for_each(|check| check(value))
    }

    fn expected_name(&self) -> String {
        match &self.kind {
            FieldKind::Sequence { ty, .. } => format!("sequence<{ty}>"),
            FieldKind::Set(ty) => format!("set<{ty}>"),
            FieldKind::Mapping { ty, .. } => format!("mapping<{ty}>"),
            _ => self.value_type().to_string(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("key", &self.key)
            .field("formatter", &self.formatter)
            .field("repr", &self.repr)
            .field("compare", &self.compare)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// External key of the child field a mapping injects its keys into
fn child_external_key(ty: &Type, child_key: &str) -> String {
    let renamed = match ty {
        Type::Model(handle) => handle.resolve().ok().and_then(|model| {
            model
                .field(child_key)
                .map(|field| field.external_key().to_string())
        }),
        _ => None,
    };
    renamed.unwrap_or_else(|| child_key.to_string())
}

/// Coerce one nested value, wrapping value-class failures as conversion errors
fn coerce_nested(target: &Type, value: Value) -> Result<Value> {
    let shown = value.clone();
    to_model(target, value).map_err(|err| {
        if err.is_value_error() {
            ModelError::conversion(shown.to_string(), target.name(), err.to_string())
        } else {
            err
        }
    })
}
