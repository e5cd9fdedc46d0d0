//! Polymorphic serialization dispatcher
//!
//! [`Dispatcher::to_dict`] turns any [`Value`] into its plain form: `Null`,
//! scalars, lists, sets and ordered maps. Rules registered for a
//! [`TypeTag`] are consulted first, so a model, enum, opaque type or value
//! kind can have its own wire representation; everything else goes through
//! [`Dispatcher::to_dict_default`].
//!
//! A process-wide dispatcher backs the free function [`to_dict`]. Tests and
//! embedders can build isolated dispatchers with [`Dispatcher::new`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::datetime::{
    format_date, format_datetime, format_time, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT,
    DEFAULT_TIME_FORMAT,
};
use crate::error::Result;
use crate::model::{Instance, ModelType};
use crate::ty::EnumType;
use crate::typed::TypedMapping;
use crate::value::Value;

/// Conversion rule for one [`TypeTag`]
///
/// Rules receive the dispatcher they run under, so nested values dispatch
/// without touching the global lock.
pub type Converter = Arc<dyn Fn(&Dispatcher, &Value, &Options) -> Result<Value> + Send + Sync>;

/// Builds the plain map emitted for models and mappings
pub type DictFactory = fn(Vec<(Value, Value)>) -> IndexMap<Value, Value>;

/// Keep insertion order
#[must_use]
pub fn ordered_dict(pairs: Vec<(Value, Value)>) -> IndexMap<Value, Value> {
    pairs.into_iter().collect()
}

/// Order keys by their text
#[must_use]
pub fn sorted_dict(mut pairs: Vec<(Value, Value)>) -> IndexMap<Value, Value> {
    pairs.sort_by_cached_key(|(k, _)| k.to_string());
    pairs.into_iter().collect()
}

/// Dispatcher options
#[derive(Debug, Clone)]
pub struct Options {
    /// Skip model fields whose name starts with `_`
    pub suppress_private_attr: bool,
    /// Omit `Null` results; empty collections become `Null`
    pub suppress_empty_values: bool,
    /// Drop the key field from each value of a typed mapping
    pub suppress_map_key_values: bool,
    /// Emit sets as sets instead of lists
    pub retain_collection_types: bool,
    /// Date/time formatter for the current value only
    pub formatter: Option<String>,
    /// Builds every output mapping from its ordered pairs
    pub dict_factory: DictFactory,
    /// Options no built-in rule reads, passed through to custom rules
    pub extra: IndexMap<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            suppress_private_attr: false,
            suppress_empty_values: false,
            suppress_map_key_values: false,
            retain_collection_types: false,
            formatter: None,
            dict_factory: ordered_dict,
            extra: IndexMap::new(),
        }
    }
}

impl Options {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_suppress_private_attr(mut self, suppress: bool) -> Self {
        self.suppress_private_attr = suppress;
        self
    }

    #[must_use]
    pub fn with_suppress_empty_values(mut self, suppress: bool) -> Self {
        self.suppress_empty_values = suppress;
        self
    }

    #[must_use]
    pub fn with_suppress_map_key_values(mut self, suppress: bool) -> Self {
        self.suppress_map_key_values = suppress;
        self
    }

    #[must_use]
    pub fn with_retain_collection_types(mut self, retain: bool) -> Self {
        self.retain_collection_types = retain;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    #[must_use]
    pub fn with_dict_factory(mut self, factory: DictFactory) -> Self {
        self.dict_factory = factory;
        self
    }

    /// Set an option no built-in rule reads
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Options for one field: the field's own formatter replaces the current one
    #[must_use]
    pub fn for_field(&self, formatter: Option<&str>) -> Self {
        Self {
            formatter: formatter.map(str::to_string),
            ..self.clone()
        }
    }

    fn build_map(&self, pairs: Vec<(Value, Value)>) -> Value {
        Value::Map((self.dict_factory)(pairs))
    }
}

/// Plain value kinds a rule can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `Value::Null`
    Null,
    /// Booleans
    Bool,
    /// Integers
    Int,
    /// Floats
    Float,
    /// Strings
    String,
    /// Decimals
    Decimal,
    /// UUIDs
    Uuid,
    /// URLs
    Url,
    /// Calendar dates
    Date,
    /// Datetimes without a zone
    DateTime,
    /// Times of day
    Time,
    /// Plain lists
    List,
    /// Plain sets
    Set,
    /// Plain maps
    Map,
    /// Typed sequences
    Sequence,
    /// Typed sets
    TypedSet,
    /// Typed mappings
    Mapping,
}

/// Key a dispatcher rule is registered under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Instances of the named model type
    Model(String),
    /// Members of the named enum type
    Enum(String),
    /// Opaque values of the named type
    Opaque(String),
    /// Plain values of one kind
    Kind(ValueKind),
}

impl TypeTag {
    /// Tag for the named model type
    pub fn model(name: impl Into<String>) -> Self {
        Self::Model(name.into())
    }

    /// Tag for the named enum type
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Tag for the named opaque type
    pub fn opaque(name: impl Into<String>) -> Self {
        Self::Opaque(name.into())
    }

    /// Tag of a runtime value
    #[must_use]
    pub fn of(value: &Value) -> Self {
        let kind = match value {
            Value::Model(inst) => return Self::Model(inst.model().name().to_string()),
            Value::Enum(member) => return Self::Enum(member.enum_type().name().to_string()),
            Value::Opaque(opaque) => return Self::Opaque(opaque.type_name().to_string()),
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Url(_) => ValueKind::Url,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Time(_) => ValueKind::Time,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::TypedSet(_) => ValueKind::TypedSet,
            Value::Mapping(_) => ValueKind::Mapping,
        };
        Self::Kind(kind)
    }
}

impl From<&Arc<ModelType>> for TypeTag {
    fn from(model: &Arc<ModelType>) -> Self {
        Self::Model(model.name().to_string())
    }
}

impl From<&Arc<EnumType>> for TypeTag {
    fn from(ty: &Arc<EnumType>) -> Self {
        Self::Enum(ty.name().to_string())
    }
}

impl From<ValueKind> for TypeTag {
    fn from(kind: ValueKind) -> Self {
        Self::Kind(kind)
    }
}

/// Registry of per-type conversion rules plus the generic rules
#[derive(Clone, Default)]
pub struct Dispatcher {
    rules: IndexMap<TypeTag, Converter>,
}

static GLOBAL: Lazy<RwLock<Dispatcher>> = Lazy::new(|| RwLock::new(Dispatcher::new()));

impl Dispatcher {
    /// Create a dispatcher with no custom rules
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide dispatcher used by [`to_dict`]
    #[inline]
    #[must_use]
    pub fn global() -> &'static RwLock<Self> {
        &GLOBAL
    }

    /// Register a rule, returning the one it replaced
    pub fn register<F>(&mut self, tag: impl Into<TypeTag>, rule: F) -> Option<Converter>
    where
        F: Fn(&Dispatcher, &Value, &Options) -> Result<Value> + Send + Sync + 'static,
    {
        let tag = tag.into();
        let previous = self.rules.insert(tag.clone(), Arc::new(rule));
        if previous.is_some() {
            tracing::warn!("Dispatcher rule for {:?} overridden", tag);
        } else {
            tracing::debug!("Registered dispatcher rule for {:?}", tag);
        }
        previous
    }

    /// Remove a rule
    pub fn unregister(&mut self, tag: &TypeTag) -> Option<Converter> {
        self.rules.shift_remove(tag)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.rules.contains_key(tag)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Convert a value to its plain form
    ///
    /// # Errors
    /// Returns errors raised by custom rules and
    /// [`ModelError::InvalidFormatter`](crate::ModelError::InvalidFormatter)
    /// for an unusable date/time pattern
    pub fn to_dict(&self, value: &Value, options: &Options) -> Result<Value> {
        if !self.rules.is_empty() {
            if let Some(rule) = self.rules.get(&TypeTag::of(value)) {
                tracing::trace!("Custom rule for {}", value.type_name());
                return rule(self, value, options);
            }
        }
        self.to_dict_default(value, options)
    }

    /// Generic rules, skipping any custom rule for `value` itself
    ///
    /// Nested values still go through [`Dispatcher::to_dict`]. Custom rules
    /// call this to fall back to the generic form.
    ///
    /// # Errors
    /// Same as [`Dispatcher::to_dict`]
    pub fn to_dict_default(&self, value: &Value, options: &Options) -> Result<Value> {
        let plain = match value {
            Value::Model(inst) => self.model_to_dict(inst, options)?,
            Value::List(items) => self.seq_to_dict(items.iter(), items.len(), false, options)?,
            Value::Sequence(seq) => self.seq_to_dict(seq.iter(), seq.len(), false, options)?,
            Value::Set(items) => self.seq_to_dict(items.iter(), items.len(), true, options)?,
            Value::TypedSet(set) => self.seq_to_dict(set.iter(), set.len(), true, options)?,
            Value::Map(map) => self.map_to_dict(map, options)?,
            Value::Mapping(mapping) => self.mapping_to_dict(mapping, options)?,
            Value::Enum(member) => member.value().clone(),
            Value::Decimal(d) => Value::String(d.to_string()),
            Value::Uuid(u) => Value::String(u.to_string()),
            Value::Url(u) => Value::String(u.as_str().to_string()),
            Value::Date(d) => Value::String(format_date(
                *d,
                options.formatter.as_deref().unwrap_or(DEFAULT_DATE_FORMAT),
            )?),
            Value::DateTime(dt) => Value::String(format_datetime(
                *dt,
                options.formatter.as_deref().unwrap_or(DEFAULT_DATETIME_FORMAT),
            )?),
            Value::Time(t) => Value::String(format_time(
                *t,
                options.formatter.as_deref().unwrap_or(DEFAULT_TIME_FORMAT),
            )?),
            other => other.clone(),
        };
        Ok(plain)
    }

    fn model_to_dict(&self, inst: &Instance, options: &Options) -> Result<Value> {
        let model = inst.model();
        let mut pairs = Vec::with_capacity(model.fields().len());
        for (field, value) in model.fields().iter().zip(inst.values()) {
            if options.suppress_private_attr && field.name().starts_with('_') {
                continue;
            }
            let converted = self.to_dict(value, &options.for_field(field.formatter_name()))?;
            if options.suppress_empty_values && converted.is_null() {
                continue;
            }
            pairs.push((Value::from(field.external_key()), converted));
        }
        for property in model.properties() {
            if options.suppress_private_attr && property.name().starts_with('_') {
                continue;
            }
            let converted = self.to_dict(&property.compute(inst), &options.for_field(None))?;
            if options.suppress_empty_values && converted.is_null() {
                continue;
            }
            pairs.push((Value::from(property.name()), converted));
        }
        Ok(options.build_map(pairs))
    }

    fn seq_to_dict<'a, I>(&self, items: I, len: usize, is_set: bool, options: &Options) -> Result<Value>
    where
        I: Iterator<Item = &'a Value>,
    {
        if options.suppress_empty_values && len == 0 {
            return Ok(Value::Null);
        }
        let converted = items
            .map(|item| self.to_dict(item, options))
            .collect::<Result<Vec<_>>>()?;
        if is_set && options.retain_collection_types {
            Ok(Value::Set(converted.into_iter().collect()))
        } else {
            Ok(Value::List(converted))
        }
    }

    fn map_to_dict(&self, map: &IndexMap<Value, Value>, options: &Options) -> Result<Value> {
        let mut pairs = Vec::with_capacity(map.len());
        for (key, value) in map {
            let converted = self.to_dict(value, options)?;
            if options.suppress_empty_values && converted.is_null() {
                continue;
            }
            pairs.push((self.to_dict(key, options)?, converted));
        }
        if options.suppress_empty_values && pairs.is_empty() {
            return Ok(Value::Null);
        }
        Ok(options.build_map(pairs))
    }

    fn mapping_to_dict(&self, mapping: &TypedMapping, options: &Options) -> Result<Value> {
        if options.suppress_empty_values && mapping.is_empty() {
            return Ok(Value::Null);
        }
        let mut pairs = Vec::with_capacity(mapping.len());
        for (key, item) in mapping {
            let mut converted = self.to_dict(item, options)?;
            if options.suppress_map_key_values {
                if let (Some(key_field), Value::Map(child)) = (mapping.key_field(), &mut converted) {
                    let external = item
                        .as_model()
                        .and_then(|inst| inst.model().field(key_field))
                        .map_or(key_field, |field| field.external_key());
                    child.shift_remove(&Value::from(external));
                }
            }
            pairs.push((self.to_dict(key, options)?, converted));
        }
        Ok(options.build_map(pairs))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Convert a value with the global dispatcher
///
/// # Errors
/// Same as [`Dispatcher::to_dict`]
pub fn to_dict(value: &Value, options: &Options) -> Result<Value> {
    Dispatcher::global().read().to_dict(value, options)
}

/// Register a rule on the global dispatcher, returning the one it replaced
pub fn register_global<F>(tag: impl Into<TypeTag>, rule: F) -> Option<Converter>
where
    F: Fn(&Dispatcher, &Value, &Options) -> Result<Value> + Send + Sync + 'static,
{
    Dispatcher::global().write().register(tag, rule)
}
