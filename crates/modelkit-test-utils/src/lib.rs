//! Testing utilities for modelkit workspace
//!
//! Shared fixture models and a tracing initialiser. Every fixture is declared
//! once per process and registered in the global type registry under the
//! `fixtures.` namespace.

#![allow(missing_docs)]

use std::sync::Arc;

use modelkit_core::{
    register_global, Draft, EnumType, Field, ModelError, ModelType, Type, TypeTag, Value,
};
use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Install a fmt subscriber filtered by `RUST_LOG`, once per process
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

// Sets and hashes

static PERSON: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.Person")
        .field(Field::string("first_name"))
        .field(Field::string("last_name"))
        .build()
        .unwrap()
});

static ROLE_MODELS: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.RoleModels")
        .field(Field::set("scientists", person()))
        .build()
        .unwrap()
});

pub fn person() -> &'static Arc<ModelType> {
    &PERSON
}

pub fn role_models() -> &'static Arc<ModelType> {
    &ROLE_MODELS
}

// Company

static COMPANY: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::mutable("fixtures.Company")
        .field(Field::string("name"))
        .field(Field::uuid("uuid"))
        .field(Field::regex("email", "[^@]+@[^@]+").unwrap().optional())
        .field(Field::bool("is_active").optional())
        .field(Field::url("url").optional())
        .field(Field::child("meta", Type::Map).optional())
        .field(Field::sequence("nicknames", Type::String).optional())
        .field(Field::float("temperature").optional())
        .field(Field::set("guess", Type::Int).optional())
        .field(Field::date("established").formatter("%m/%d/%Y").optional())
        .field(Field::date("closed").optional())
        .build()
        .unwrap()
});

pub fn company() -> &'static Arc<ModelType> {
    &COMPANY
}

// Self reference

pub const NODE: &str = "fixtures.Node";

static NODE_TYPE: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::mutable(NODE)
        .field(Field::string("name"))
        .field(Field::child("node_child", Type::model_named(NODE)).optional())
        .field(Field::sequence("node_list", Type::model_named(NODE)).optional())
        .field(Field::mapping("node_map", Type::model_named(NODE), "name").optional())
        .build()
        .unwrap()
});

pub fn node() -> &'static Arc<ModelType> {
    &NODE_TYPE
}

// Compose file

static PROTOCOL: Lazy<Arc<EnumType>> = Lazy::new(|| {
    EnumType::builder("fixtures.Protocol")
        .member("TCP", "tcp")
        .member("UDP", "udp")
        .build()
        .unwrap()
});

static MODE: Lazy<Arc<EnumType>> = Lazy::new(|| {
    EnumType::builder("fixtures.Mode")
        .member("HOST", "host")
        .member("INGRESS", "ingress")
        .build()
        .unwrap()
});

/// Split `"published:target"` into the two port numbers
fn expand_short_form(draft: &mut Draft<'_>) -> Result<(), ModelError> {
    let Some(short) = draft.get("_short_form").and_then(Value::as_str).map(str::to_string) else {
        return Ok(());
    };
    let (published, target) = short
        .split_once(':')
        .ok_or_else(|| ModelError::conversion(&short, "fixtures.Port", "expected 'published:target'"))?;
    draft.set("published", published.trim())?;
    draft.set("target", target.trim())?;
    Ok(())
}

static PORT: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.Port")
        .field(Field::string("_short_form").optional().repr(false).compare(false))
        .field(Field::int("target").optional())
        .field(Field::int("published").optional())
        .field(Field::child("protocol", protocol()).default(protocol().member("TCP").unwrap()))
        .field(Field::child("mode", mode()).default(mode().member("HOST").unwrap()))
        .derive(expand_short_form)
        .build()
        .unwrap()
});

// a port read from the short form is written back in it
static PORT_RULE: Lazy<()> = Lazy::new(|| {
    register_global(TypeTag::from(port()), |dispatcher, value, options| {
        match value.as_model().and_then(|inst| inst.get("_short_form")) {
            Some(short @ Value::String(_)) => Ok(short.clone()),
            _ => dispatcher.to_dict_default(value, options),
        }
    });
});

static SERVICE: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.Service")
        .field(Field::string("name"))
        .field(Field::string("image").optional())
        .field(Field::string("build").optional())
        .field(Field::sequence("ports", port()).optional())
        .field(Field::sequence("volumes", Type::String).optional())
        .field(Field::string("command").optional())
        .build()
        .unwrap()
});

static COMPOSE: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.Compose")
        .field(Field::string("version").optional())
        .field(Field::mapping("services", service(), "name").optional())
        .build()
        .unwrap()
});

pub fn protocol() -> &'static Arc<EnumType> {
    &PROTOCOL
}

pub fn mode() -> &'static Arc<EnumType> {
    &MODE
}

pub fn port() -> &'static Arc<ModelType> {
    &PORT
}

/// Register the global rule writing short-form ports back as `"published:target"`
///
/// Must not be called from inside a global `to_dict`, which holds the
/// dispatcher read lock.
pub fn register_port_rule() {
    Lazy::force(&PORT_RULE);
}

pub fn service() -> &'static Arc<ModelType> {
    &SERVICE
}

pub fn compose() -> &'static Arc<ModelType> {
    &COMPOSE
}

// Store data

static DAY_TYPE: Lazy<Arc<EnumType>> = Lazy::new(|| {
    EnumType::builder("fixtures.DayType")
        .member("NORMAL", "Normal")
        .member("HOLIDAY", "Holiday")
        .build()
        .unwrap()
});

static DAY_DATA: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.DayData")
        .field(Field::date("date"))
        .field(Field::time("logged_on").formatter("%H:%M"))
        .field(Field::time("open_at"))
        .field(Field::time("closed_on"))
        .field(Field::int("customers"))
        .field(Field::child("day_type", day_type()))
        .field(Field::float("sales").optional())
        .build()
        .unwrap()
});

static STORE_DATA: Lazy<Arc<ModelType>> = Lazy::new(|| {
    ModelType::immutable("fixtures.StoreData")
        .field(Field::string("name"))
        .field(Field::int("id"))
        .field(Field::datetime("created_on").formatter("%m/%d/%Y %H:%M:%S"))
        .field(Field::datetime("data_from"))
        .field(Field::datetime("data_to"))
        .field(Field::sequence("days", day_data()))
        .field(Field::decimal("price"))
        .build()
        .unwrap()
});

pub fn day_type() -> &'static Arc<EnumType> {
    &DAY_TYPE
}

pub fn day_data() -> &'static Arc<ModelType> {
    &DAY_DATA
}

pub fn store_data() -> &'static Arc<ModelType> {
    &STORE_DATA
}

/// Store data document with one normal day and one holiday without sales
pub const STORE_DATA_TOML: &str = r#"name = "Acme store"
id = 982
created_on = "12/18/2017 09:30:00"
data_from = 2017-12-18T00:00:00
data_to = 2017-12-19T23:59:59
price = "98237.448"

[[days]]
date = 2017-12-18
logged_on = "19:22"
open_at = 08:00:00
closed_on = 19:00:00
customers = 487
day_type = "Normal"
sales = 27223.65

[[days]]
date = 2017-12-19
logged_on = "13:05"
open_at = 10:30:00
closed_on = 17:30:00
customers = 192
day_type = "Holiday"
"#;

/// Version 3 compose file mixing short-form and long-form ports
pub const COMPOSE_YAML: &str = r#"version: '3'
services:
  web:
    build: .
    ports:
    - "5000:5000"
    - target: 80
      published: 8080
      protocol: udp
      mode: ingress
    volumes:
    - .:/code
  redis:
    image: redis:alpine
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::{kwargs, to_dict, Options};

    #[test]
    fn port_rule_applies_only_once_registered() {
        let short = Value::Model(port().construct(kwargs! { "_short_form" => "5000:5000" }).unwrap());
        let plain = to_dict(&short, &Options::new()).unwrap();
        assert_eq!(plain.get("published"), Some(&Value::Int(5000)));

        register_port_rule();
        register_port_rule();
        assert_eq!(to_dict(&short, &Options::new()).unwrap(), Value::from("5000:5000"));

        let long = Value::Model(port().construct(kwargs! { "target" => 80 }).unwrap());
        assert_eq!(to_dict(&long, &Options::new()).unwrap().get("target"), Some(&Value::Int(80)));
    }
}
