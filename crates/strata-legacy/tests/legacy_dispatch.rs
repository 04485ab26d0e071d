//! Integration tests for dispatch over legacy classes
//!
//! Tests cover:
//! - Formal classes dispatching through their linearization
//! - Informal tag stacks, including the order-insensitive instance test
//! - Informal classes sharing a leading tag
//! - Formal and native keys never colliding
//! - Legacy values as native property types

use strata_core::{
    Args, BaseType, ClassDescriptor, Function, InformalClass, NativeClass, PropertySpec, Runtime, StrataError, Value,
};
use strata_legacy::{structure, subclass, SlotClass};

fn returns(params: &[&str], tag: &'static str) -> Function {
    Function::new(params.iter().copied(), move |_| Ok(Value::string(tag)))
}

fn informal(tags: &[&str]) -> ClassDescriptor {
    ClassDescriptor::Informal(InformalClass::new(tags.iter().copied()).unwrap())
}

#[test]
fn test_formal_dispatch_follows_linearization() {
    let rt = Runtime::new();
    let shape = SlotClass::builder("Shape").package("geo").build().unwrap();
    let circle = SlotClass::builder("Circle")
        .package("geo")
        .contains(&shape)
        .slot("r", BaseType::Double)
        .build()
        .unwrap();
    rt.register_class(shape.descriptor()).unwrap();
    rt.register_class(circle.descriptor()).unwrap();

    rt.new_generic("area", ["x"]).unwrap();
    rt.register_method("area", [shape.descriptor()], returns(&["x"], "shape"))
        .unwrap();

    let c = circle.instantiate([("r", Value::double(2.0))]).unwrap();
    assert_eq!(rt.dispatch("area", &Args::new().arg(c.clone())).unwrap(), Value::string("shape"));

    rt.register_method("area", [circle.descriptor()], returns(&["x"], "circle"))
        .unwrap();
    assert_eq!(rt.dispatch("area", &Args::new().arg(c)).unwrap(), Value::string("circle"));
}

#[test]
fn test_formal_and_native_keys_do_not_collide() {
    let rt = Runtime::new();
    let formal = SlotClass::builder("Point").build().unwrap();
    let native = rt.new_class(NativeClass::builder("Point")).unwrap();
    assert_ne!(
        formal.descriptor().register_key(),
        ClassDescriptor::Native(native.clone()).register_key()
    );

    rt.new_generic("kind", ["x"]).unwrap();
    rt.register_method("kind", [formal.descriptor()], returns(&["x"], "formal"))
        .unwrap();
    rt.register_method("kind", [ClassDescriptor::Native(native.clone())], returns(&["x"], "native"))
        .unwrap();

    let f = formal.instantiate(Vec::<(String, Value)>::new()).unwrap();
    let n = native.construct(&Args::new()).unwrap();
    assert_eq!(rt.dispatch("kind", &Args::new().arg(f)).unwrap(), Value::string("formal"));
    assert_eq!(rt.dispatch("kind", &Args::new().arg(n)).unwrap(), Value::string("native"));
}

#[test]
fn test_informal_dispatch_walks_tag_stack() {
    let rt = Runtime::new();
    rt.new_generic("summary", ["x"]).unwrap();
    rt.register_method("summary", [informal(&["factor"])], returns(&["x"], "factor"))
        .unwrap();

    let factor = structure(Value::integer(1), ["factor"]).unwrap();
    let ordered = subclass(&factor, "ordered").unwrap();
    assert_eq!(
        rt.dispatch("summary", &Args::new().arg(ordered.clone())).unwrap(),
        Value::string("factor")
    );

    rt.register_method("summary", [informal(&["ordered", "factor"])], returns(&["x"], "ordered"))
        .unwrap();
    assert_eq!(
        rt.dispatch("summary", &Args::new().arg(ordered)).unwrap(),
        Value::string("ordered")
    );
    assert_eq!(
        rt.dispatch("summary", &Args::new().arg(factor)).unwrap(),
        Value::string("factor")
    );
}

#[test]
fn test_informal_classes_sharing_key_rejected() {
    let rt = Runtime::new();
    rt.new_generic("summary", ["x"]).unwrap();
    let ordered_factor = informal(&["ordered", "factor"]);
    let ordered = informal(&["ordered"]);
    assert_eq!(ordered_factor.register_key(), ordered.register_key());

    rt.register_method("summary", [ordered_factor.clone()], returns(&["x"], "ordered/factor"))
        .unwrap();
    assert!(matches!(
        rt.register_method("summary", [ordered], returns(&["x"], "ordered")),
        Err(StrataError::InvalidSignature(_))
    ));
    assert_eq!(rt.generic("summary").unwrap().methods().len(), 1);

    assert!(rt
        .register_method("summary", [ordered_factor], returns(&["x"], "again"))
        .unwrap());
}

#[test]
fn test_informal_dispatch_requires_all_tags() {
    let rt = Runtime::new();
    rt.new_generic("summary", ["x"]).unwrap();
    let ordered_factor = informal(&["ordered", "factor"]);
    rt.register_method("summary", [ordered_factor.clone()], returns(&["x"], "ordered/factor"))
        .unwrap();

    let partial = structure(Value::integer(1), ["ordered"]).unwrap();
    assert!(!partial.is_a(&ordered_factor));
    assert!(matches!(
        rt.dispatch("summary", &Args::new().arg(partial.clone())),
        Err(StrataError::MethodNotFound { .. })
    ));

    rt.register_method("summary", [ClassDescriptor::Any], returns(&["x"], "default"))
        .unwrap();
    assert_eq!(
        rt.dispatch("summary", &Args::new().arg(partial)).unwrap(),
        Value::string("default")
    );

    let full = structure(Value::integer(1), ["ordered", "factor"]).unwrap();
    assert_eq!(
        rt.dispatch("summary", &Args::new().arg(full)).unwrap(),
        Value::string("ordered/factor")
    );
}

#[test]
fn test_informal_is_a_ignores_order() {
    let reversed = structure(Value::integer(1), ["factor", "ordered"]).unwrap();
    assert!(reversed.is_a(&informal(&["ordered", "factor"])));
}

#[test]
fn test_informal_method_not_found_describes_tags() {
    let rt = Runtime::new();
    rt.new_generic("summary", ["x"]).unwrap();
    let value = structure(Value::integer(1), ["ordered", "factor"]).unwrap();
    let err = rt.dispatch("summary", &Args::new().arg(value)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Can't find method for `summary(x)`:\n- x: informal<ordered/factor>"
    );
}

#[test]
fn test_formal_property_type_on_native_class() {
    let rt = Runtime::new();
    let person = SlotClass::builder("Person").slot("name", BaseType::Character).build().unwrap();
    let team = rt
        .new_class(NativeClass::builder("Team").property(PropertySpec::new("lead").typed(person.descriptor())))
        .unwrap();

    assert!(matches!(
        team.construct(&Args::new()),
        Err(StrataError::Validation { .. })
    ));

    let ada = person.instantiate([("name", Value::string("Ada"))]).unwrap();
    let t = team.construct(&Args::new().named("lead", ada)).unwrap();
    assert!(matches!(
        t.set("lead", Value::string("Bob")),
        Err(StrataError::PropertyType { .. })
    ));
}

#[test]
fn test_runtime_validates_formal_instances() {
    let rt = Runtime::new();
    let positive = SlotClass::builder("Positive")
        .slot("value", BaseType::Double)
        .validity(|instance| match instance.slot("value").and_then(Value::as_f64) {
            Some(v) if v <= 0.0 => vec!["@value must be positive".to_string()],
            _ => Vec::new(),
        })
        .build()
        .unwrap();

    let mut instance = match positive.instantiate([("value", Value::double(1.0))]).unwrap() {
        Value::Formal(instance) => (*instance).clone(),
        other => panic!("expected a formal instance, got {:?}", other),
    };
    assert!(rt.validate(&Value::Formal(instance.clone().into())).is_ok());

    instance.set_slot("value", Value::double(-2.0));
    assert!(matches!(
        rt.validate(&Value::Formal(instance.into())),
        Err(StrataError::Validation { .. })
    ));
}
