//! End-to-end conversions through [`Mapper`].

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use common::{BaseEntity, Company, Node, Role, Token, User, johnd};
use nebula_mapper::prelude::*;
use nebula_mapper::{ConversionDecision, ListRef, MapperConfig, RecordRef};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn identity_returns_the_same_handle() {
    let mapper = Mapper::new();

    let map = value_map! { "a" => 1i32 };
    assert!(mapper.convert(map.clone(), &ValueType::Map).unwrap().same_ref(&map));
    assert!(mapper.convert(map.clone(), &ValueType::Any).unwrap().same_ref(&map));

    let user = Value::from(johnd());
    assert!(mapper.convert(user.clone(), &User::value_type()).unwrap().same_ref(&user));
    assert!(
        mapper
            .convert(user.clone(), &BaseEntity::value_type())
            .unwrap()
            .same_ref(&user)
    );

    assert_eq!(mapper.convert(Value::I16(7), &ValueType::Number).unwrap(), Value::I16(7));
}

#[test]
fn null_never_reaches_a_converter() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mapper = Mapper::builder()
        .register(ValueType::Any, ValueType::I64, move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(v)
        })
        .build();

    for target in [
        ValueType::I64,
        ValueType::Text,
        ValueType::Map,
        User::value_type(),
        Role::value_type(),
        ValueType::list_of(ValueType::I32),
    ] {
        assert!(matches!(mapper.decide(&Value::Null, &target), ConversionDecision::Absent));
        assert_eq!(mapper.convert(Value::Null, &target).unwrap(), Value::Null);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(mapper.to::<Option<i64>>(Value::Null).unwrap(), None);
}

#[test]
fn scalar_round_trips() {
    let mapper = Mapper::new();

    let n: i64 = mapper.to("42").unwrap();
    assert_eq!(n, 42);
    assert_eq!(mapper.to::<String>(n).unwrap(), "42");

    let text: String = mapper.to(true).unwrap();
    assert_eq!(text, "true");
    assert!(mapper.to::<bool>(text).unwrap());

    let date = NaiveDate::from_ymd_opt(1997, 8, 29).unwrap();
    let at_midnight = mapper.convert(Value::Date(date), &ValueType::DateTime).unwrap();
    assert_eq!(mapper.to::<NaiveDate>(at_midnight).unwrap(), date);

    let rendered: String = mapper.to(date).unwrap();
    assert_eq!(rendered, "1997-08-29");
    assert_eq!(mapper.to::<NaiveDate>(rendered).unwrap(), date);
}

#[test]
fn numbers_cross_widths_through_text() {
    let mapper = Mapper::new();
    assert_eq!(mapper.to::<i64>(42.0f64).unwrap(), 42);
    assert_eq!(mapper.to::<u8>(200i64).unwrap(), 200);
    assert!(mapper.to::<bool>(1i32).unwrap());
    assert_eq!(mapper.to::<i32>(true).unwrap(), 1);

    let err = mapper.to::<u8>(300i64).unwrap_err();
    assert_eq!(err.code(), "conversion_failed");
    let err = mapper.to::<i64>(42.5f64).unwrap_err();
    assert_eq!(err.code(), "conversion_failed");
    let err = mapper.to::<f32>(1e40f64).unwrap_err();
    assert_eq!(err.code(), "conversion_failed");
    assert_eq!(mapper.to::<f32>(0.5f64).unwrap(), 0.5);
}

#[test]
fn map_to_record_copies_the_intersection() {
    let mapper = Mapper::new();
    let user: User = mapper
        .to(value_map! {
            "username" => "johnd",
            "since" => "1997",
            "extra" => "ignored",
        })
        .unwrap();
    assert_eq!(
        user,
        User {
            username: "johnd".to_owned(),
            since: Some(1997),
            ..User::default()
        }
    );
}

#[test]
fn record_to_map_uses_readable_properties() {
    let mapper = Mapper::new();
    let map = mapper.as_map(johnd()).unwrap().unwrap();
    assert_eq!(
        map.keys(),
        vec!["id", "username", "since", "role", "company", "tags", "joined"]
    );
    assert_eq!(map.get("id"), Some(Value::I64(1)));
    assert_eq!(map.get("role"), Some(Value::from(Role::Admin)));
    assert!(!map.contains_key("password"));

    let company = map.get("company").unwrap();
    assert!(company.as_record().is_some());
}

#[test]
fn nested_maps_become_nested_records() {
    let mapper = Mapper::new();
    let user: User = mapper
        .to(value_map! {
            "id" => "7",
            "username" => "johnd",
            "role" => "admin",
            "company" => value_map! { "name" => "Nike", "since" => "1964" },
            "tags" => vec![Value::text("x"), Value::I32(1)],
            "joined" => "2020-01-02",
            "password" => "hunter2",
        })
        .unwrap();

    assert_eq!(user.base.id, Some(7));
    assert_eq!(user.role, Some(Role::Admin));
    assert_eq!(
        user.company,
        Some(Company {
            name: "Nike".to_owned(),
            since: Some(1964),
        })
    );
    assert_eq!(user.tags, vec!["x".to_owned(), "1".to_owned()]);
    assert_eq!(user.joined, NaiveDate::from_ymd_opt(2020, 1, 2));
    assert_eq!(user.password, "hunter2");
}

#[test]
fn record_to_other_record_copies_shared_names() {
    let mapper = Mapper::new();
    let company: Company = mapper.to(johnd()).unwrap();
    assert_eq!(
        company,
        Company {
            name: String::new(),
            since: Some(1997),
        }
    );
}

#[test]
fn subtype_extracts_as_parent() {
    let mapper = Mapper::new();
    let base: BaseEntity = mapper.to(johnd()).unwrap();
    assert_eq!(base, BaseEntity { id: Some(1) });
}

#[test]
fn structural_copy_aborts_on_first_failure() {
    let mapper = Mapper::new();
    let err = mapper
        .to::<User>(value_map! { "username" => "a", "since" => "abc" })
        .unwrap_err();
    let MapperError::ConversionFailed {
        source_type,
        target_type,
        value,
        ..
    } = err
    else {
        panic!("expected a conversion failure");
    };
    assert_eq!(
        (source_type.as_str(), target_type.as_str(), value.as_str()),
        ("text", "i32", "abc")
    );
}

#[test]
fn null_into_required_property_fails() {
    let err = Mapper::new()
        .to::<User>(value_map! { "username" => Value::Null })
        .unwrap_err();
    assert_eq!(err.code(), "property_access_failed");
}

#[test]
fn widening_uses_registered_supertype_converter() {
    let mapper = Mapper::builder()
        .register(ValueType::Number, ValueType::I64, |v| {
            v.as_f64()
                .map(|n| Value::I64(n.round() as i64))
                .ok_or_else(|| ConvertError::new("not a number"))
        })
        .build();
    assert_eq!(mapper.to::<i64>(42.7f64).unwrap(), 43);
    assert!(Mapper::new().to::<i64>(42.7f64).is_err());
}

#[test]
fn overrides_do_not_leak_between_mappers() {
    let custom = Mapper::builder()
        .register(ValueType::Text, ValueType::I64, |_| Ok(Value::I64(-1)))
        .build();
    let plain = Mapper::new();

    assert_eq!(custom.to::<i64>("12").unwrap(), -1);
    assert_eq!(custom.to::<i32>("12").unwrap(), 12);
    assert_eq!(plain.to::<i64>("12").unwrap(), 12);
}

#[test]
fn enums_resolve_by_member_name() {
    let mapper = Mapper::new();
    assert_eq!(mapper.to::<Role>("admin").unwrap(), Role::Admin);
    assert_eq!(mapper.to::<String>(Role::Visitor).unwrap(), "visitor");

    let err = mapper.to::<Role>("root").unwrap_err();
    assert_eq!(err.code(), "conversion_failed");
    assert!(err.to_string().contains("root"));
}

#[test]
fn record_without_constructor_cannot_be_target() {
    let err = Mapper::new()
        .to::<Token>(value_map! { "value" => "abc" })
        .unwrap_err();
    assert_eq!(
        err,
        MapperError::InstantiationFailed {
            type_name: "Token".to_owned(),
        }
    );
}

#[test]
fn opaque_source_has_no_structural_path() {
    let err = Mapper::new().to::<Company>("Nike").unwrap_err();
    assert_eq!(err.code(), "no_converter_resolved");
}

#[test]
fn lists_of_records() {
    let mapper = Mapper::new();
    let companies: Vec<Company> = mapper
        .to(vec![
            value_map! { "name" => "Nike", "since" => 1964i64 },
            value_map! { "name" => "Acme" },
        ])
        .unwrap();
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0].since, Some(1964));
    assert_eq!(companies[1].name, "Acme");
}

#[test]
fn self_referencing_input_is_rejected() {
    let root = MapRef::new();
    root.insert("name", "root");
    root.insert("children", ListRef::from_vec(vec![Value::Map(root.clone())]));

    let err = Mapper::new().to::<Node>(Value::Map(root.clone())).unwrap_err();
    assert_eq!(err.code(), "cycle_detected");

    let unchecked = Mapper::builder().detect_cycles(false).max_depth(10).build();
    let err = unchecked.to::<Node>(Value::Map(root)).unwrap_err();
    assert_eq!(err, MapperError::DepthLimitExceeded { limit: 10 });
}

#[test]
fn shared_but_acyclic_input_is_accepted() {
    let leaf = value_map! { "name" => "leaf" };
    let root = value_map! {
        "name" => "root",
        "children" => vec![leaf.clone(), leaf],
    };
    let node: Node = Mapper::new().to(root).unwrap();
    assert_eq!(node.children.len(), 2);
    assert_eq!(node.children[1].name, "leaf");
}

#[test]
fn zero_depth_config_still_maps_records() {
    let mapper = Mapper::builder()
        .config(MapperConfig {
            max_depth: 0,
            ..MapperConfig::default()
        })
        .build();
    let company: Company = mapper.to(value_map! { "name" => "Nike" }).unwrap();
    assert_eq!(company.name, "Nike");
}

#[test]
fn primitive_default_fallback_is_opt_in() {
    let date = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());

    let err = Mapper::new().to::<i32>(date.clone()).unwrap_err();
    assert_eq!(err.code(), "no_converter_resolved");

    let lenient = Mapper::builder().primitive_default_fallback(true).build();
    assert_eq!(lenient.to::<i32>(date.clone()).unwrap(), 0);
    assert!(!lenient.to::<bool>(date).unwrap());
}

#[test]
fn json_documents_map_both_ways() {
    let mapper = Mapper::new();
    let user: User = mapper
        .from_json(json!({
            "id": 3,
            "username": "johnd",
            "since": 1997,
            "role": "user",
            "company": { "name": "Nike", "since": 1964 },
            "tags": ["a"],
            "joined": "2020-01-02"
        }))
        .unwrap();
    assert_eq!(user.base.id, Some(3));
    assert_eq!(user.role, Some(Role::User));

    assert_eq!(
        mapper.to_json(user),
        json!({
            "id": 3,
            "username": "johnd",
            "since": 1997,
            "role": "user",
            "company": { "name": "Nike", "since": 1964 },
            "tags": ["a"],
            "joined": "2020-01-02"
        })
    );
}

#[test]
fn converted_records_are_fresh_instances() {
    let mapper = Mapper::new();
    let source = RecordRef::new(johnd());
    let copy = mapper
        .convert(Value::Map(mapper.as_map(source.clone()).unwrap().unwrap()), &User::value_type())
        .unwrap();
    assert!(!copy.same_ref(&Value::Record(source)));
    let user = User::from_value(copy).unwrap();
    assert_eq!(user.username, "johnd");
    assert_eq!(user.password, "");
}
