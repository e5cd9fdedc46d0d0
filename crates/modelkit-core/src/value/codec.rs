//! serde support for [`Value`]
//!
//! Plain values map one-to-one onto the serde data model. Rich values
//! serialize through their canonical text form so a value graph can always be
//! handed to an encoder; the dispatcher is still the place where formatters
//! and suppression options apply.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Value;
use crate::datetime::{format_date, format_datetime, format_time, ISO_FORMAT};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Decimal(v) => serializer.collect_str(v),
            Self::Uuid(v) => serializer.collect_str(v),
            Self::Url(v) => serializer.serialize_str(v.as_str()),
            Self::Date(v) => {
                serializer.serialize_str(&format_date(*v, ISO_FORMAT).map_err(ser::Error::custom)?)
            }
            Self::DateTime(v) => serializer
                .serialize_str(&format_datetime(*v, ISO_FORMAT).map_err(ser::Error::custom)?),
            Self::Time(v) => {
                serializer.serialize_str(&format_time(*v, ISO_FORMAT).map_err(ser::Error::custom)?)
            }
            Self::Enum(member) => member.value().serialize(serializer),
            Self::Model(inst) => {
                let fields = inst.model().fields();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (field, value) in fields.iter().zip(inst.values()) {
                    map.serialize_entry(field.external_key(), value)?;
                }
                map.end()
            }
            Self::List(items) => serializer.collect_seq(items),
            Self::Sequence(seq) => serializer.collect_seq(seq.iter()),
            Self::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::TypedSet(set) => serializer.collect_seq(set.iter()),
            Self::Map(map) => serializer.collect_map(map),
            Self::Mapping(map) => serializer.collect_map(map.iter()),
            Self::Opaque(v) => Err(ser::Error::custom(format!(
                "no conversion registered for opaque type {}",
                v.type_name()
            ))),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any plain value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<Value, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
