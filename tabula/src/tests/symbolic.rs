use crate::evaluator::{evaluate, Context};
use crate::symbolic::{symbol, Expr};
use crate::value::Value;
use crate::TabulaError;
use rust_decimal::Decimal;

fn eval(expr: &Expr, context: &Context) -> Expr {
    evaluate(expr, context).unwrap()
}

#[test]
fn test_unbound_expressions_evaluate_to_themselves() {
    let exprs = vec![
        symbol("x").add(2),
        symbol("int").call(vec![symbol("x")]),
        symbol("x").add(symbol("z")).add(symbol("y")),
        symbol("x").call(vec![2.into(), 3.into(), 4.into()]),
        symbol("x").method("join", vec![Expr::list(vec!["a".into(), "b".into()])]),
        symbol("x").index("foo"),
        symbol("x").slice(2, 3),
    ];
    for expr in exprs {
        assert_eq!(eval(&expr, &Context::new()), expr);
    }
}

#[test]
fn test_simple_substitution() {
    let expr = symbol("x").add(2);
    let context = Context::new().bind("x", 2);
    assert_eq!(eval(&expr, &context), Expr::Literal(Value::Int(4)));
}

#[test]
fn test_int_conversion() {
    let expr = symbol("int").call(vec![symbol("x")]);
    let context = Context::new().bind("x", "3.2".parse::<Decimal>().unwrap());
    assert_eq!(eval(&expr, &context), Expr::Literal(Value::Int(3)));
}

#[test]
fn test_chained_aliasing() {
    // x -> y - 2, y -> z * 4, z -> 2: x + z + y = 6 + 2 + 8
    let expr = symbol("x").add(symbol("z")).add(symbol("y"));
    let context = Context::new()
        .bind("x", symbol("y").sub(2))
        .bind("y", symbol("z").mul(4))
        .bind("z", 2);
    assert_eq!(eval(&expr, &context), Expr::Literal(Value::Int(16)));
}

#[test]
fn test_host_function_application() {
    let expr = symbol("x").call(vec![2.into(), 3.into(), 4.into()]);
    let context = Context::new().bind_fn("x", |args| {
        let mut total = 0;
        for arg in args {
            match arg {
                Value::Int(n) => total += n,
                other => {
                    return Err(TabulaError::Engine(format!(
                        "expected int, got {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(Value::Int(total))
    });
    assert_eq!(eval(&expr, &context), Expr::Literal(Value::Int(9)));
}

#[test]
fn test_join_builtin() {
    let expr = symbol("x").method("join", vec![Expr::list(vec!["ciao".into(), "bella".into()])]);
    let context = Context::new().bind("x", ", ");
    assert_eq!(
        eval(&expr, &context),
        Expr::Literal(Value::Text("ciao, bella".to_string()))
    );
}

#[test]
fn test_index_into_map() {
    let expr = symbol("x").index("foo");
    let context = Context::new().bind(
        "x",
        Expr::Literal(Value::Map(vec![(
            Value::Text("foo".to_string()),
            Value::Int(2),
        )])),
    );
    assert_eq!(eval(&expr, &context), Expr::Literal(Value::Int(2)));
}

#[test]
fn test_slice_of_list() {
    let expr = symbol("x").slice(2, 3);
    let items: Vec<Value> = (1..=5).map(Value::Int).collect();
    let context = Context::new().bind("x", Expr::Literal(Value::List(items)));
    assert_eq!(
        eval(&expr, &context),
        Expr::Literal(Value::List(vec![Value::Int(3)]))
    );
}

#[test]
fn test_containers_evaluate_elementwise() {
    let expr = Expr::list(vec![symbol("x").add(1), symbol("x").mul(2)]);
    let context = Context::new().bind("x", 3);
    assert_eq!(
        eval(&expr, &context),
        Expr::List(vec![
            Expr::Literal(Value::Int(4)),
            Expr::Literal(Value::Int(6)),
        ])
    );
}

#[test]
fn test_map_keys_evaluate_too() {
    let expr = Expr::map(vec![(symbol("k"), symbol("v"))]);
    let context = Context::new().bind("k", "name").bind("v", 7);
    assert_eq!(
        eval(&expr, &context),
        Expr::Map(vec![(
            Expr::Literal(Value::Text("name".to_string())),
            Expr::Literal(Value::Int(7)),
        )])
    );
}

#[test]
fn test_nary_fold() {
    // add(1, 2, 3) folds left
    let expr = symbol("add").call(vec![1.into(), 2.into(), 3.into()]);
    assert_eq!(eval(&expr, &Context::new()), Expr::Literal(Value::Int(6)));
}

#[test]
fn test_division_produces_decimal() {
    let expr = Expr::literal(1).div(4);
    assert_eq!(
        eval(&expr, &Context::new()),
        Expr::Literal(Value::Number("0.25".parse().unwrap()))
    );
}

#[test]
fn test_division_by_zero_errors() {
    let expr = Expr::literal(1).div(0);
    let err = evaluate(&expr, &Context::new()).unwrap_err();
    assert!(matches!(err, TabulaError::Engine(_)));
}

#[test]
fn test_caller_context_is_not_mutated() {
    // Reusing one context across calls never observes leftover state.
    let context = Context::new().bind("x", 1);
    let expr = symbol("x").add(symbol("y"));
    let first = eval(&expr, &context);
    let second = eval(&expr, &context);
    assert_eq!(first, second);
    assert_eq!(first, Expr::Literal(Value::Int(1)).add(symbol("y")));
}

#[test]
fn test_depth_limit() {
    use crate::limits::EvalLimits;
    let mut expr = symbol("x");
    for _ in 0..40 {
        expr = expr.add(1);
    }
    let context = Context::new().with_limits(EvalLimits {
        max_expression_depth: 10,
    });
    let err = evaluate(&expr, &context).unwrap_err();
    assert!(matches!(err, TabulaError::Limit { .. }));
}

#[test]
fn test_calling_a_non_function_errors() {
    let expr = symbol("x").call(vec![1.into()]);
    let context = Context::new().bind("x", 5);
    let err = evaluate(&expr, &context).unwrap_err();
    assert!(matches!(err, TabulaError::Engine(_)));
}

#[test]
fn test_comparison_and_logic() {
    let cases = vec![
        (Expr::literal(2).lt(3), true),
        (Expr::literal(3).le(3), true),
        (Expr::literal(2).gt(3), false),
        (Expr::literal("a").equals("a"), true),
        (Expr::literal(true).and(false), false),
        (Expr::literal(true).or(false), true),
    ];
    for (expr, expected) in cases {
        assert_eq!(
            eval(&expr, &Context::new()),
            Expr::Literal(Value::Bool(expected))
        );
    }
}

#[test]
fn test_date_arithmetic() {
    use chrono::{Duration, NaiveDate};
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let expr = Expr::literal(date).add(Duration::days(5));
    assert_eq!(
        eval(&expr, &Context::new()),
        Expr::Literal(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()))
    );
}

#[test]
fn test_record_fields() {
    let list = Expr::list(vec![1.into(), 2.into()]);
    let fields = list.record_fields().unwrap();
    assert_eq!(fields[0].0, "f0");
    assert_eq!(fields[1].0, "f1");
    assert_eq!(fields[1].1, Expr::Literal(Value::Int(2)));

    let map = Expr::map(vec![("k".into(), 9.into())]);
    let fields = map.record_fields().unwrap();
    assert_eq!(fields[0].0, "k");

    assert!(symbol("x").record_fields().is_none());
}
