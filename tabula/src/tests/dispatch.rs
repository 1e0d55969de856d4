use crate::dispatch::{Dispatch, TypeTag};
use crate::value::Value;
use crate::TabulaError;

#[test]
fn test_most_specific_handler_wins() {
    let mut dispatch: Dispatch<Value, &'static str> = Dispatch::new();
    dispatch.register(&[TypeTag::Number], |_| Ok("number")).unwrap();
    dispatch.register(&[TypeTag::Int], |_| Ok("int")).unwrap();

    assert_eq!(dispatch.call(&Value::Int(1)).unwrap(), "int");
    assert_eq!(
        dispatch.call(&Value::Number("1.5".parse().unwrap())).unwrap(),
        "number"
    );
}

#[test]
fn test_category_handler_covers_members() {
    let mut dispatch: Dispatch<Value, &'static str> = Dispatch::new();
    dispatch
        .register(&[TypeTag::Temporal], |_| Ok("temporal"))
        .unwrap();

    let date = Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(dispatch.call(&date).unwrap(), "temporal");
}

#[test]
fn test_default_handler_catches_the_rest() {
    let mut dispatch: Dispatch<Value, &'static str> = Dispatch::new();
    dispatch.register(&[TypeTag::Bool], |_| Ok("bool")).unwrap();
    dispatch.register_default(|_| Ok("anything")).unwrap();

    assert_eq!(dispatch.call(&Value::Bool(true)).unwrap(), "bool");
    assert_eq!(dispatch.call(&Value::Null).unwrap(), "anything");
}

#[test]
fn test_exhausted_dispatch_fails() {
    let dispatch: Dispatch<Value, ()> = Dispatch::new();
    let err = dispatch.call(&Value::Int(1)).unwrap_err();
    assert!(matches!(err, TabulaError::DispatchExhausted(_)));
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut dispatch: Dispatch<Value, ()> = Dispatch::new();
    dispatch.register(&[TypeTag::Int], |_| Ok(())).unwrap();
    let err = dispatch.register(&[TypeTag::Int], |_| Ok(())).unwrap_err();
    assert!(matches!(err, TabulaError::Configuration(_)));
}

#[test]
fn test_duplicate_default_is_rejected() {
    let mut dispatch: Dispatch<Value, ()> = Dispatch::new();
    dispatch.register_default(|_| Ok(())).unwrap();
    let err = dispatch.register_default(|_| Ok(())).unwrap_err();
    assert!(matches!(err, TabulaError::Configuration(_)));
}

#[test]
fn test_one_handler_for_many_tags() {
    let mut dispatch: Dispatch<Value, &'static str> = Dispatch::new();
    dispatch
        .register(&[TypeTag::List, TypeTag::Map], |_| Ok("container"))
        .unwrap();

    assert_eq!(dispatch.call(&Value::List(Vec::new())).unwrap(), "container");
    assert_eq!(dispatch.call(&Value::Map(Vec::new())).unwrap(), "container");
}

#[test]
fn test_registration_without_types_is_rejected() {
    let mut dispatch: Dispatch<Value, ()> = Dispatch::new();
    let err = dispatch.register(&[], |_| Ok(())).unwrap_err();
    assert!(matches!(err, TabulaError::Configuration(_)));
}

#[test]
fn test_ancestry_chains() {
    let chain: Vec<TypeTag> = TypeTag::Int.ancestry().collect();
    assert_eq!(chain, vec![TypeTag::Int, TypeTag::Number]);

    let chain: Vec<TypeTag> = TypeTag::Duration.ancestry().collect();
    assert_eq!(chain, vec![TypeTag::Duration, TypeTag::Temporal]);

    let chain: Vec<TypeTag> = TypeTag::Text.ancestry().collect();
    assert_eq!(chain, vec![TypeTag::Text]);
}
