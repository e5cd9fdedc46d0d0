//! End-to-end scenarios over the shared fixture models

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use modelkit::prelude::*;
use modelkit::{DeclarationError, EnumMember, ErrorKind};
use modelkit_test_utils::{
    company, compose, day_type, init_tracing, mode, node, person, port, protocol,
    register_port_rule, role_models, store_data, COMPOSE_YAML, STORE_DATA_TOML,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn model(value: &Value) -> &Instance {
    value.as_model().unwrap()
}

fn grace_and_katherines() -> Vec<Value> {
    let make = |first: &str, last: &str| {
        Value::Model(
            person()
                .construct(kwargs! { "first_name" => first, "last_name" => last })
                .unwrap(),
        )
    };
    vec![
        make("Grace", "Hopper"),
        make("Katherine", "Johnson"),
        make("Katherine", "Johnson"),
    ]
}

/// Duplicate immutable instances collapse in a set field and the YAML
/// output lists each scientist once
#[test]
fn set_field_deduplicates_and_encodes_as_yaml_sequence() {
    init_tracing();
    let models = role_models()
        .construct(kwargs! { "scientists" => grace_and_katherines() })
        .unwrap();
    assert_eq!(models["scientists"].as_typed_set().unwrap().len(), 2);

    let yaml = to_yaml(&Value::Model(models.clone()), &Options::new()).unwrap();
    let grace = "- first_name: Grace\n  last_name: Hopper\n";
    let katherine = "- first_name: Katherine\n  last_name: Johnson\n";
    assert!(
        yaml == format!("scientists:\n{grace}{katherine}")
            || yaml == format!("scientists:\n{katherine}{grace}"),
        "unexpected yaml:\n{yaml}"
    );

    let back = from_yaml(&yaml, &Type::from(role_models())).unwrap();
    assert_eq!(back, Value::Model(models));
}

/// Mutable instances cannot go into a set
#[test]
fn mutable_instances_are_rejected_by_set_fields() {
    let holder = ModelType::immutable("scenarios.Holder")
        .field(Field::set("nodes", node()))
        .build()
        .unwrap();
    let leaf = node().construct(kwargs! { "name" => "leaf" }).unwrap();
    let err = holder
        .construct(kwargs! { "nodes" => vec![Value::Model(leaf)] })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

fn acme() -> Instance {
    company()
        .construct(kwargs! {
            "name" => "Acme Inc.",
            "url" => "http://www.acme-inc-website.net/",
            "email" => "info@acme-inc.net",
            "meta" => Value::map([("key1", "value1"), ("key2", "value2")]),
            "nicknames" => vec![Value::from("Acme"), Value::from("Acme"), Value::from(123)],
            "temperature" => 80.4,
            "guess" => vec![1, 4, 6, 8, 9, 14, 27, 45],
            "established" => "1/2/1903",
            "closed" => NaiveDate::from_ymd_opt(1904, 5, 6).unwrap(),
        })
        .unwrap()
}

/// Field converters normalise raw input on construction
#[test]
fn company_fields_are_converted() {
    let acme = acme();
    assert!(acme["uuid"].as_uuid().is_some());
    let url = acme["url"].as_url().unwrap();
    assert_eq!(url.scheme(), "http");
    assert_eq!(url.host_str(), Some("www.acme-inc-website.net"));
    assert_eq!(acme["nicknames"], Value::list(["Acme", "Acme", "123"]));
    assert_eq!(acme["guess"], Value::set([1, 4, 6, 8, 9, 14, 27, 45]));
    assert_eq!(acme["temperature"], Value::Float(80.4));
    assert_eq!(acme["established"].as_date(), NaiveDate::from_ymd_opt(1903, 1, 2));
    assert_eq!(acme["closed"].as_date(), NaiveDate::from_ymd_opt(1904, 5, 6));
}

/// Dates are written with the field formatter or the default one
#[test]
fn company_dict_uses_field_formatters() {
    let acme = acme();
    let plain = to_dict(&Value::Model(acme.clone()), &Options::new()).unwrap();
    assert_eq!(plain.get("name"), Some(&Value::from("Acme Inc.")));
    assert_eq!(plain.get("established"), Some(&Value::from("01/02/1903")));
    assert_eq!(plain.get("closed"), Some(&Value::from("1904-05-06")));
    assert_eq!(
        plain.get("uuid"),
        Some(&Value::from(acme["uuid"].as_uuid().unwrap().to_string()))
    );
    assert_eq!(plain.get("url"), Some(&Value::from("http://www.acme-inc-website.net/")));
}

/// The same instance survives every text format
#[test]
fn company_round_trips_through_every_format() {
    let acme = Value::Model(acme());
    let ty = Type::from(company());
    let options = Options::new();

    let json = to_json(&acme, &JsonOptions::new(), &options).unwrap();
    assert_eq!(from_json(&json, &ty).unwrap(), acme);

    let yaml = to_yaml(&acme, &options).unwrap();
    let uuid = acme.get("uuid").map(ToString::to_string).unwrap();
    assert!(yaml.contains(&format!("uuid: {uuid}")));
    assert_eq!(from_yaml(&yaml, &ty).unwrap(), acme);

    let toml = to_toml(&acme, &options).unwrap();
    assert!(toml.contains(&format!("uuid = \"{uuid}\"")));
    assert!(toml.contains("url = \"http://www.acme-inc-website.net/\""));
    assert_eq!(from_toml(&toml, &ty).unwrap(), acme);
}

/// A value that does not match the pattern is a type mismatch
#[test]
fn regex_field_rejects_non_matching_text() {
    let err = company()
        .construct(kwargs! { "name" => "Acme", "email" => "nobody" })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

fn renamed_models() -> (Arc<ModelType>, Arc<EnumType>, Arc<EnumType>) {
    let data_type = EnumType::builder("scenarios.DataType")
        .member("STRING", "string")
        .member("OBJECT", "object")
        .build()
        .unwrap();
    let int_enum = EnumType::builder("scenarios.IntEnum")
        .member("A", 1)
        .member("B", 2)
        .build()
        .unwrap();
    let child = ModelType::immutable("scenarios.MyChild")
        .field(Field::int("my_int").key("int"))
        .field(Field::float("my_float").key("float"))
        .field(Field::uuid("my_uuid").key("uuid"))
        .build()
        .unwrap();
    let model = ModelType::immutable("scenarios.MyModel")
        .field(Field::string("is_for").key("for"))
        .field(Field::string("criss").key("cross"))
        .field(Field::string("cross").key("criss"))
        .field(Field::bool("is_not").key("not"))
        .field(Field::sequence("is_list", Type::String).key("list"))
        .field(Field::nullable_sequence("is_nullable_list", Type::String).key("nullable_list"))
        .field(Field::child("is_type", &data_type).key("type"))
        .field(Field::mapping("is_dict", &child, "my_int").key("dict").optional())
        .field(Field::child("is_enum", &int_enum).key("enum").optional())
        .build()
        .unwrap();
    (model, data_type, int_enum)
}

/// Fields are written under their external keys, including two fields
/// swapped through each other's names
#[test]
fn renamed_fields_round_trip() {
    let (model, data_type, int_enum) = renamed_models();
    let child_type = match model.field("is_dict").unwrap().value_type() {
        Type::Model(handle) => handle.resolve().unwrap(),
        other => panic!("unexpected type {other}"),
    };
    let child = child_type
        .construct(kwargs! { "my_int" => 5, "my_float" => 2.5, "my_uuid" => uuid::Uuid::new_v4() })
        .unwrap();
    let obj = model
        .construct(kwargs! {
            "is_for" => "Elise",
            "criss" => "A",
            "cross" => "B",
            "is_not" => true,
            "is_list" => vec!["a", "b", "c"],
            "is_nullable_list" => vec![Value::from("a"), Value::Null, Value::from("c")],
            "is_dict" => Value::map([(5, child)]),
            "is_type" => data_type.member("OBJECT").unwrap(),
            "is_enum" => int_enum.member("A").unwrap(),
        })
        .unwrap();

    let mut plain = to_dict(&Value::Model(obj.clone()), &Options::new()).unwrap();
    assert_eq!(to_model(&Type::from(&model), plain.clone()).unwrap(), Value::Model(obj));

    plain.as_map_mut().unwrap().shift_remove(&Value::from("dict"));
    assert_eq!(
        plain,
        Value::map([
            ("for", Value::from("Elise")),
            ("criss", Value::from("B")),
            ("cross", Value::from("A")),
            ("not", Value::from(true)),
            ("list", Value::list(["a", "b", "c"])),
            ("nullable_list", Value::list([Value::from("a"), Value::Null, Value::from("c")])),
            ("type", Value::from("object")),
            ("enum", Value::from(1)),
        ])
    );
}

/// Two fields sharing an external key are rejected at declaration
#[test]
fn colliding_external_keys_are_rejected() {
    let result = ModelType::immutable("scenarios.Collision")
        .field(Field::string("first").key("name"))
        .field(Field::string("name"))
        .build();
    assert!(matches!(result, Err(DeclarationError::DuplicateKey { .. })));
}

/// Unknown keys fail a strict type and are dropped by a lenient one
#[test]
fn strict_mode_reports_extra_keys() {
    let strict = ModelType::immutable("scenarios.StrictPoint")
        .field(Field::int("x"))
        .strict(true)
        .build()
        .unwrap();
    let lenient = ModelType::immutable("scenarios.LenientPoint")
        .field(Field::int("x"))
        .build()
        .unwrap();
    let input = r#"{"x": 1, "bogus": 1, "also": 2}"#;

    let err = from_json(input, &Type::from(&strict)).unwrap_err();
    match err.as_model_error() {
        Some(ModelError::ExtraKeys { keys, .. }) => assert_eq!(keys, &vec!["also", "bogus"]),
        other => panic!("unexpected error {other:?}"),
    }

    let point = from_json(input, &Type::from(&lenient)).unwrap();
    assert_eq!(model(&point)["x"], Value::Int(1));
}

/// A model refers to itself by name through child, sequence and mapping fields
#[test]
fn self_referencing_nodes_decode() {
    let json = r#"
    {
      "name": "root",
      "node_list": [{"name": "A"}, {"name": "B"}],
      "node_child": {"name": "C"},
      "node_map": {
        "E": {},
        "F": {"node_child": {"name": "G"}}
      }
    }"#;
    let root = from_json(json, &Type::from(node())).unwrap();
    let root = model(&root);
    assert_eq!(root["name"], Value::from("root"));

    let list = root["node_list"].as_sequence().unwrap();
    assert_eq!(model(&list[0])["name"], Value::from("A"));
    assert_eq!(model(&list[1])["name"], Value::from("B"));
    assert_eq!(model(&root["node_child"])["name"], Value::from("C"));

    let map = root["node_map"].as_mapping().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(model(map.get(&Value::from("E")).unwrap())["name"], Value::from("E"));
    let f = model(map.get(&Value::from("F")).unwrap());
    assert_eq!(f["name"], Value::from("F"));
    assert_eq!(model(&f["node_child"])["name"], Value::from("G"));
}

/// Nodes are mutable; assignment converts the new value
#[test]
fn mutable_node_accepts_assignment() {
    let mut leaf = node().construct(kwargs! { "name" => "leaf" }).unwrap();
    leaf.set("node_child", Value::map([("name", "child")])).unwrap();
    assert_eq!(model(&leaf["node_child"])["name"], Value::from("child"));
    leaf.sequence_mut("node_list")
        .unwrap()
        .push(node().construct(kwargs! { "name" => "sibling" }).unwrap())
        .unwrap();
    assert_eq!(leaf["node_list"].container_len(), Some(1));
}

fn port_member(name: &str) -> EnumMember {
    protocol().member(name).unwrap()
}

/// Short-form ports expand on input and are written back in short form
#[test]
fn compose_ports_keep_their_short_form() {
    init_tracing();
    register_port_rule();
    let file = from_yaml(COMPOSE_YAML, &Type::from(compose())).unwrap();
    let services = model(&file)["services"].as_mapping().unwrap();
    let web = model(services.get(&Value::from("web")).unwrap());
    assert_eq!(web["name"], Value::from("web"));

    let ports = web["ports"].as_sequence().unwrap();
    let short = model(&ports[0]);
    assert_eq!(short["published"], Value::Int(5000));
    assert_eq!(short["target"], Value::Int(5000));
    assert_eq!(short["protocol"], Value::Enum(port_member("TCP")));
    let long = model(&ports[1]);
    assert_eq!(long["target"], Value::Int(80));
    assert_eq!(long["published"], Value::Int(8080));
    assert_eq!(long["protocol"], Value::Enum(port_member("UDP")));
    assert_eq!(long["mode"], Value::Enum(mode().member("INGRESS").unwrap()));

    let expanded = port()
        .construct(kwargs! { "published" => 5000, "target" => 5000 })
        .unwrap();
    assert_eq!(short, &expanded);
    assert!(!format!("{short:?}").contains("_short_form"));

    let options = Options::new()
        .with_suppress_empty_values(true)
        .with_suppress_map_key_values(true);
    let plain = to_dict(&file, &options).unwrap();
    let web_plain = plain.get("services").and_then(|s| s.get("web")).unwrap();
    assert!(web_plain.get("name").is_none());
    assert_eq!(
        web_plain.get("ports"),
        Some(&Value::list([
            Value::from("5000:5000"),
            Value::map([
                ("target", Value::from(80)),
                ("published", Value::from(8080)),
                ("protocol", Value::from("udp")),
                ("mode", Value::from("ingress")),
            ]),
        ]))
    );

    let yaml = to_yaml(&file, &options).unwrap();
    assert!(yaml.contains("5000:5000"));
    assert_eq!(from_yaml(&yaml, &Type::from(compose())).unwrap(), file);
}

/// TOML dates, times and decimals reach typed fields and round-trip
#[test]
fn store_data_reads_from_toml() {
    let ty = Type::from(store_data());
    let data = from_toml(STORE_DATA_TOML, &ty).unwrap();
    let store = model(&data);

    assert_eq!(store["name"], Value::from("Acme store"));
    assert_eq!(store["id"], Value::Int(982));
    assert_eq!(store["price"].as_decimal(), Some(Decimal::from_str("98237.448").unwrap()));
    assert_eq!(
        store["created_on"].as_datetime(),
        NaiveDateTime::parse_from_str("2017-12-18 09:30:00", "%Y-%m-%d %H:%M:%S").ok()
    );
    assert_eq!(
        store["data_to"].as_datetime(),
        NaiveDateTime::parse_from_str("2017-12-19 23:59:59", "%Y-%m-%d %H:%M:%S").ok()
    );

    let days = store["days"].as_sequence().unwrap();
    assert_eq!(days.len(), 2);
    let monday = model(&days[0]);
    assert_eq!(monday["date"].as_date(), NaiveDate::from_ymd_opt(2017, 12, 18));
    assert_eq!(monday["open_at"].as_time(), NaiveTime::from_hms_opt(8, 0, 0));
    assert_eq!(monday["logged_on"].as_time(), NaiveTime::from_hms_opt(19, 22, 0));
    assert_eq!(monday["customers"], Value::Int(487));
    assert_eq!(monday["day_type"], Value::Enum(day_type().member("NORMAL").unwrap()));
    assert_eq!(monday["sales"], Value::Float(27223.65));
    let tuesday = model(&days[1]);
    assert_eq!(tuesday["closed_on"].as_time(), NaiveTime::from_hms_opt(17, 30, 0));
    assert_eq!(tuesday["day_type"], Value::Enum(day_type().member("HOLIDAY").unwrap()));
    assert!(tuesday["sales"].is_null());

    let options = Options::new().with_suppress_empty_values(true);
    let text = to_toml(&data, &options).unwrap();
    assert_eq!(text.matches("sales").count(), 1);
    assert!(text.contains("logged_on = \"19:22\""));
    assert!(text.contains("created_on = \"12/18/2017 09:30:00\""));
    assert_eq!(from_toml(&text, &ty).unwrap(), data);
}

/// Extra fields merge into the document before coercion
#[test]
fn extras_complete_a_document() {
    let value = from_toml_with_extras("first_name = \"Grace\"\n", &Type::from(person()), kwargs! {
        "last_name" => "Hopper",
    })
    .unwrap();
    assert_eq!(model(&value)["last_name"], Value::from("Hopper"));

    let err = from_json_with_extras("[1]", &Type::Any, kwargs! { "a" => 1 }).unwrap_err();
    assert!(matches!(err, FormatError::NotAMapping { .. }));
}

/// A serializer takes nested plain data and answers with plain data
#[test]
fn serializer_wraps_an_api_function() {
    let shared = ModelType::immutable("scenarios.SharedModel")
        .field(Field::string("name"))
        .field(Field::date("some_date"))
        .build()
        .unwrap();
    let input = ModelType::immutable("scenarios.InputModel")
        .field(Field::string("lower_case"))
        .field(Field::int("positive_number"))
        .field(Field::mapping("shared", &shared, "name"))
        .build()
        .unwrap();
    let output = ModelType::immutable("scenarios.OutputModel")
        .field(Field::string("upper_case"))
        .field(Field::int("negative_number"))
        .field(Field::mapping("shared", &shared, "name"))
        .build()
        .unwrap();

    let api = Serializer::new(move |kwargs: Kwargs| {
        let input = model(&kwargs["input"]);
        let upper = input["lower_case"].as_str().unwrap_or_default().to_uppercase();
        let negative = -input["positive_number"].as_int().unwrap_or_default();
        output
            .construct(kwargs! {
                "upper_case" => upper,
                "negative_number" => negative,
                "shared" => input["shared"].clone(),
            })
            .map(Value::Model)
    })
    .param("input", &input);

    let shared_plain = Value::map([
        ("one", Value::map([("name", "one"), ("some_date", "2001-01-01")])),
        ("two", Value::map([("name", "two"), ("some_date", "2002-02-02")])),
    ]);
    let result = api
        .call(kwargs! {
            "input" => Value::map([
                ("lower_case", Value::from("hello world.")),
                ("positive_number", Value::from(123)),
                ("shared", shared_plain.clone()),
            ]),
        })
        .unwrap();

    assert_eq!(
        result,
        Value::map([
            ("upper_case", Value::from("HELLO WORLD.")),
            ("negative_number", Value::from(-123)),
            ("shared", shared_plain),
        ])
    );
}

/// Empty optional fields disappear only when suppression is on
#[test]
fn suppression_omits_empty_values() {
    let bare = Value::Model(company().construct(kwargs! { "name" => "Bare" }).unwrap());

    let full = to_dict(&bare, &Options::new()).unwrap();
    assert_eq!(full.get("is_active"), Some(&Value::Null));
    assert_eq!(full.get("nicknames"), Some(&Value::list(Vec::<Value>::new())));

    let suppressed = to_dict(&bare, &Options::new().with_suppress_empty_values(true)).unwrap();
    assert!(suppressed.get("is_active").is_none());
    assert!(suppressed.get("nicknames").is_none());
    assert_eq!(suppressed.get("name"), Some(&Value::from("Bare")));
}

/// Typed containers check every element and compare like plain ones
#[test]
fn typed_sequence_rejects_wrong_elements() {
    let mut seq = TypedSequence::from_items(Type::Int, false, [Value::from(1), Value::from(2)]).unwrap();
    let err = seq.push("x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(seq, vec![Value::from(1), Value::from(2)]);
    assert_eq!(Value::Sequence(seq), Value::list([1, 2]));
}

/// A date formatter is used for reading and writing
#[test]
fn date_formatter_reads_and_writes() {
    let event = ModelType::immutable("scenarios.Event")
        .field(Field::date("on").formatter("%m/%d/%Y"))
        .build()
        .unwrap();
    let inst = event.construct(kwargs! { "on" => "1/2/1903" }).unwrap();
    assert_eq!(inst["on"].as_date(), NaiveDate::from_ymd_opt(1903, 1, 2));
    let plain = to_dict(&Value::Model(inst), &Options::new()).unwrap();
    assert_eq!(plain.get("on"), Some(&Value::from("01/02/1903")));
}
