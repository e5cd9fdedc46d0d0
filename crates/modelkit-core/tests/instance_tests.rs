use modelkit_core::{
    kwargs, to_dict, to_model, ErrorKind, Field, ModelType, Options, Type, TypeRegistry, Value,
};
use pretty_assertions::assert_eq;

#[test]
fn forward_reference_resolves_once_declared() {
    let team = ModelType::immutable("instance_tests.Team")
        .field(Field::string("name"))
        .field(Field::sequence("members", Type::model_named("instance_tests.Member")))
        .build()
        .unwrap();

    let early = to_model(
        &Type::from(&team),
        Value::map([("name", Value::from("core")), ("members", Value::list([Value::map([("handle", "ada")])]))]),
    )
    .unwrap_err();
    assert_eq!(early.kind(), ErrorKind::UnresolvedType);

    ModelType::immutable("instance_tests.Member")
        .field(Field::string("handle"))
        .build()
        .unwrap();
    assert!(TypeRegistry::global().contains("instance_tests.Member"));

    let built = to_model(
        &Type::from(&team),
        Value::map([("name", Value::from("core")), ("members", Value::list([Value::map([("handle", "ada")])]))]),
    )
    .unwrap();
    let members = built.get("members").and_then(Value::as_sequence).unwrap();
    assert_eq!(members[0].get("handle"), Some(&Value::from("ada")));
}

#[test]
fn immutable_fields_reject_assignment_but_containers_mutate() {
    let tag = ModelType::immutable("instance_tests.Tag")
        .field(Field::string("label"))
        .field(Field::int("weight").default(1))
        .build()
        .unwrap();
    let board = ModelType::immutable("instance_tests.Board")
        .field(Field::string("title"))
        .field(Field::mapping("tags", &tag, "label").optional())
        .build()
        .unwrap();

    let mut inst = board.construct(kwargs! { "title" => "todo" }).unwrap();
    let err = inst.set("title", "done").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FrozenInstance);

    let urgent = tag.construct(kwargs! { "label" => "urgent" }).unwrap();
    inst.mapping_mut("tags").unwrap().add(urgent, None).unwrap();
    let err = inst.mapping_mut("tags").unwrap().add(Value::from(3), Some(Value::from("low"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let plain = to_dict(&Value::Model(inst), &Options::new().with_suppress_map_key_values(true)).unwrap();
    assert_eq!(
        plain,
        Value::map([
            ("title", Value::from("todo")),
            ("tags", Value::map([("urgent", Value::map([("weight", 1)]))])),
        ])
    );
}

#[test]
fn construction_reports_the_first_problem() {
    let pair = ModelType::mutable("instance_tests.Pair")
        .field(Field::int("left"))
        .field(Field::int("right"))
        .build()
        .unwrap();

    let missing = pair.construct(kwargs! { "left" => 1 }).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::MissingRequiredField);

    let unknown = pair
        .construct(kwargs! { "left" => 1, "right" => 2, "middle" => 3 })
        .unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::UnknownField);

    let bad = pair.construct(kwargs! { "left" => "one", "right" => 2 }).unwrap_err();
    assert_eq!(bad.kind(), ErrorKind::Conversion);
}
