//! Dynamic value graph
//!
//! [`Value`] carries everything a model can hold: scalars, date/time values,
//! enum members, model instances, plain containers and typed containers.
//! The dispatcher turns any `Value` into its plain subset (null, scalars,
//! lists, sets and ordered maps), which is what the format adapters encode.

mod codec;
mod opaque;

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::model::Instance;
use crate::ty::EnumMember;
use crate::typed::{TypedMapping, TypedSequence, TypedSet};

pub use opaque::OpaqueValue;

/// Keyword arguments keyed by internal field name
pub type Kwargs = IndexMap<String, Value>;

/// A dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Decimal(Decimal),
    Uuid(Uuid),
    Url(Url),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Member of an enum type
    Enum(EnumMember),
    /// Model instance
    Model(Instance),
    /// Plain ordered list
    List(Vec<Value>),
    /// Plain set
    Set(IndexSet<Value>),
    /// Plain ordered mapping
    Map(IndexMap<Value, Value>),
    /// List with an element type constraint
    Sequence(TypedSequence),
    /// Set with an element type constraint
    TypedSet(TypedSet),
    /// Mapping with a value type constraint
    Mapping(TypedMapping),
    /// Externally defined type converted through a registered rule
    Opaque(OpaqueValue),
}

impl Value {
    /// Build a plain list
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a plain set
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a plain ordered map
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check whether this is one of the plain mapping variants
    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&Instance> {
        match self {
            Self::Model(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<Value, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&TypedSequence> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_typed_set(&self) -> Option<&TypedSet> {
        match self {
            Self::TypedSet(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mapping(&self) -> Option<&TypedMapping> {
        match self {
            Self::Mapping(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            Self::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a string key in a plain map
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(&Value::from(key)),
            Self::Mapping(map) => map.get(&Value::from(key)),
            Self::Model(inst) => inst.get(key),
            _ => None,
        }
    }

    /// Number of elements for containers, `None` for anything else
    #[must_use]
    pub fn container_len(&self) -> Option<usize> {
        match self {
            Self::List(v) => Some(v.len()),
            Self::Set(v) => Some(v.len()),
            Self::Map(v) => Some(v.len()),
            Self::Sequence(v) => Some(v.len()),
            Self::TypedSet(v) => Some(v.len()),
            Self::Mapping(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Short name of the runtime type, used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "bool".into(),
            Self::Int(_) => "int".into(),
            Self::Float(_) => "float".into(),
            Self::String(_) => "string".into(),
            Self::Decimal(_) => "decimal".into(),
            Self::Uuid(_) => "uuid".into(),
            Self::Url(_) => "url".into(),
            Self::Date(_) => "date".into(),
            Self::DateTime(_) => "datetime".into(),
            Self::Time(_) => "time".into(),
            Self::Enum(m) => m.enum_type().name().to_string(),
            Self::Model(inst) => inst.model().name().to_string(),
            Self::List(_) => "list".into(),
            Self::Set(_) => "set".into(),
            Self::Map(_) => "map".into(),
            Self::Sequence(s) => format!("sequence<{}>", s.element_type()),
            Self::TypedSet(s) => format!("set<{}>", s.element_type()),
            Self::Mapping(m) => format!("mapping<{}>", m.value_type()),
            Self::Opaque(o) => o.type_name().to_string(),
        }
    }

    /// Whether the value may be placed in a set
    ///
    /// Mutable model instances and mutable containers are unhashable.
    #[must_use]
    pub fn is_hashable(&self) -> bool {
        match self {
            Self::List(_)
            | Self::Set(_)
            | Self::Map(_)
            | Self::Sequence(_)
            | Self::TypedSet(_)
            | Self::Mapping(_) => false,
            Self::Model(inst) => inst.is_hashable(),
            _ => true,
        }
    }

    /// Python-like textual representation used inside containers
    pub(crate) fn repr(&self) -> String {
        match self {
            Self::String(s) => format!("'{s}'"),
            Self::Null => "None".into(),
            other => other.to_string(),
        }
    }
}

fn float_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Url(a), Self::Url(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::TypedSet(a), Self::TypedSet(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            (Self::Sequence(a), Self::List(b)) | (Self::List(b), Self::Sequence(a)) => {
                a.items() == b.as_slice()
            }
            (Self::TypedSet(a), Self::Set(b)) | (Self::Set(b), Self::TypedSet(a)) => {
                a.as_set() == b
            }
            (Self::Mapping(a), Self::Map(b)) | (Self::Map(b), Self::Mapping(a)) => {
                a.as_map() == b
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

fn hash_unordered<'a, H, I>(state: &mut H, items: I)
where
    H: Hasher,
    I: Iterator<Item = (&'a Value, Option<&'a Value>)>,
{
    let mut acc = 0u64;
    let mut len = 0usize;
    for (key, value) in items {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        value.hash(&mut hasher);
        acc = acc.wrapping_add(hasher.finish());
        len += 1;
    }
    len.hash(state);
    acc.hash(state);
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Bool(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            Self::Int(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            Self::Float(v) => {
                3u8.hash(state);
                float_bits(*v).hash(state);
            }
            Self::String(v) => {
                4u8.hash(state);
                v.hash(state);
            }
            Self::Decimal(v) => {
                5u8.hash(state);
                v.hash(state);
            }
            Self::Uuid(v) => {
                6u8.hash(state);
                v.hash(state);
            }
            Self::Url(v) => {
                7u8.hash(state);
                v.hash(state);
            }
            Self::Date(v) => {
                8u8.hash(state);
                v.hash(state);
            }
            Self::DateTime(v) => {
                9u8.hash(state);
                v.hash(state);
            }
            Self::Time(v) => {
                10u8.hash(state);
                v.hash(state);
            }
            Self::Enum(v) => {
                11u8.hash(state);
                v.hash(state);
            }
            Self::Model(v) => {
                12u8.hash(state);
                v.hash(state);
            }
            Self::Opaque(v) => {
                13u8.hash(state);
                v.hash(state);
            }
            // typed and plain containers that compare equal must hash equal
            Self::List(items) => {
                14u8.hash(state);
                items.hash(state);
            }
            Self::Sequence(seq) => {
                14u8.hash(state);
                seq.items().hash(state);
            }
            Self::Set(items) => {
                15u8.hash(state);
                hash_unordered(state, items.iter().map(|v| (v, None)));
            }
            Self::TypedSet(set) => {
                15u8.hash(state);
                hash_unordered(state, set.iter().map(|v| (v, None)));
            }
            Self::Map(map) => {
                16u8.hash(state);
                hash_unordered(state, map.iter().map(|(k, v)| (k, Some(v))));
            }
            Self::Mapping(map) => {
                16u8.hash(state);
                hash_unordered(state, map.iter().map(|(k, v)| (k, Some(v))));
            }
        }
    }
}

fn write_joined<I>(f: &mut fmt::Formatter<'_>, open: &str, close: &str, items: I) -> fmt::Result
where
    I: Iterator<Item = String>,
{
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&item)?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Self::String(v) => f.write_str(v),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Url(v) => f.write_str(v.as_str()),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => f.write_str(&crate::datetime::iso_datetime(*v)),
            Self::Time(v) => write!(f, "{v}"),
            Self::Enum(v) => write!(f, "{v}"),
            Self::Model(v) => write!(f, "{v:?}"),
            Self::Opaque(v) => write!(f, "{v:?}"),
            Self::List(items) => write_joined(f, "[", "]", items.iter().map(Value::repr)),
            Self::Sequence(seq) => write_joined(f, "[", "]", seq.iter().map(Value::repr)),
            Self::Set(items) => write_joined(f, "{", "}", items.iter().map(Value::repr)),
            Self::TypedSet(set) => write_joined(f, "{", "}", set.iter().map(Value::repr)),
            Self::Map(map) => write_joined(
                f,
                "{",
                "}",
                map.iter().map(|(k, v)| format!("{}: {}", k.repr(), v.repr())),
            ),
            Self::Mapping(map) => write_joined(
                f,
                "{",
                "}",
                map.iter().map(|(k, v)| format!("{}: {}", k.repr(), v.repr())),
            ),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => String,
    Decimal => Decimal,
    Uuid => Uuid,
    Url => Url,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
    EnumMember => Enum,
    Instance => Model,
    TypedSequence => Sequence,
    TypedSet => TypedSet,
    TypedMapping => Mapping,
    OpaqueValue => Opaque,
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    #[inline]
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&String> for Value {
    #[inline]
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<IndexMap<Value, Value>> for Value {
    #[inline]
    fn from(map: IndexMap<Value, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Kwargs> for Value {
    fn from(kwargs: Kwargs) -> Self {
        Self::Map(
            kwargs
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
        )
    }
}

/// Build [`Kwargs`] from `name => value` pairs
///
/// ```
/// use modelkit_core::{kwargs, Value};
///
/// let args = kwargs! { "first_name" => "Grace", "age" => 85 };
/// assert_eq!(args["age"], Value::Int(85));
/// ```
#[macro_export]
macro_rules! kwargs {
    () => {
        $crate::Kwargs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut kwargs = $crate::Kwargs::new();
        $(
            kwargs.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        kwargs
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn float_equality_and_hash_are_consistent() {
        let a = Value::Float(0.0);
        let b = Value::Float(-0.0);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));

        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn map_equality_ignores_order() {
        let a = Value::map([("a", 1), ("b", 2)]);
        let b = Value::map([("b", 2), ("a", 1)]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn display_renders_plain_text() {
        assert_eq!(Value::from(123).to_string(), "123");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(80.4).to_string(), "80.4");
        assert_eq!(Value::list(["a", "b"]).to_string(), "['a', 'b']");
        assert_eq!(Value::map([("k", Value::Null)]).to_string(), "{'k': None}");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::list([false]).to_string(), "[False]");
    }

    #[test]
    fn datetime_text_matches_iso_formatter() {
        let whole = NaiveDate::from_ymd_opt(2017, 12, 18)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        assert_eq!(Value::DateTime(whole).to_string(), "2017-12-18T08:30:00");
        assert_eq!(
            Value::DateTime(whole).to_string(),
            crate::datetime::format_datetime(whole, crate::datetime::ISO_FORMAT).unwrap()
        );

        let fractional = NaiveDate::from_ymd_opt(2017, 12, 18)
            .and_then(|d| d.and_hms_milli_opt(8, 30, 0, 250))
            .unwrap();
        assert_eq!(Value::DateTime(fractional).to_string(), "2017-12-18T08:30:00.250");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn kwargs_macro_builds_ordered_map() {
        let args = kwargs! { "b" => 1, "a" => "two" };
        let keys: Vec<_> = args.keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(args["a"], Value::from("two"));
    }

    #[test]
    fn hashable_values() {
        assert!(Value::from("x").is_hashable());
        assert!(!Value::list([1]).is_hashable());
        assert!(!Value::map([("a", 1)]).is_hashable());
    }

    #[test]
    fn get_reads_string_keys() {
        let map = Value::map([("name", "root")]);
        assert_eq!(map.get("name"), Some(&Value::from("root")));
        assert_eq!(map.get("missing"), None);
    }
}
