use crate::frame::column::ColumnSpec;
use crate::frame::workbook::Workbook;
use crate::frame::Frame;
use crate::symbolic::{symbol, Expr};
use crate::value::Value;
use crate::TabulaError;

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

fn identity() -> ColumnSpec {
    ColumnSpec::new(|raw| Expr::Literal(raw.clone()))
}

fn plus(offset: i64) -> ColumnSpec {
    ColumnSpec::new(move |raw| Expr::Literal(raw.clone()).add(offset))
}

#[test]
fn test_positional_and_named_column_slicing() {
    let frame = Frame::new(
        ints(&[1, 2, 3]),
        vec![identity(), plus(2), plus(4).named("last")],
    )
    .unwrap();

    assert_eq!(frame.column_values(0).unwrap(), ints(&[1, 2, 3]));
    assert_eq!(frame.column_values(1).unwrap(), ints(&[3, 4, 5]));
    assert_eq!(frame.column_values_named("last").unwrap(), ints(&[5, 6, 7]));
    assert_eq!(
        frame.column_values_named("last").unwrap()[0],
        Value::Int(5)
    );
}

#[test]
fn test_named_columns() {
    let frame = Frame::new(
        ints(&[1, 2, 3]),
        vec![plus(4).named("foo"), plus(6).named("bar")],
    )
    .unwrap();

    assert_eq!(frame.column_values_named("foo").unwrap(), ints(&[5, 6, 7]));
    assert_eq!(frame.column_values_named("bar").unwrap(), ints(&[7, 8, 9]));
}

#[test]
fn test_sibling_column_resolution() {
    let frame = Frame::new(
        ints(&[1, 2, 3]),
        vec![
            identity().named("baz"),
            ColumnSpec::new(|_| symbol("baz").add(2)).named("foo"),
            ColumnSpec::new(|_| symbol("foo").mul(10)).named("bar"),
        ],
    )
    .unwrap();

    assert_eq!(frame.column_values_named("foo").unwrap(), ints(&[3, 4, 5]));
    assert_eq!(
        frame.column_values_named("bar").unwrap(),
        ints(&[30, 40, 50])
    );
}

#[test]
fn test_unknown_symbol_lists_declared_columns() {
    let frame = Frame::new(
        ints(&[1]),
        vec![
            identity().named("baz"),
            ColumnSpec::new(|_| symbol("nope")).named("foo"),
        ],
    )
    .unwrap();

    let err = frame.cell_value(1, 0).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, TabulaError::Resolution { .. }));
    assert!(message.contains("nope"));
    assert!(message.contains("dataframe"));
    assert!(message.contains("column"));
    assert!(message.contains("baz"));
    assert!(message.contains("foo"));
}

#[test]
fn test_empty_column_specification_is_rejected() {
    let err = Frame::new(ints(&[1]), Vec::new()).unwrap_err();
    assert!(matches!(err, TabulaError::Configuration(_)));
}

#[test]
fn test_duplicate_column_names_are_rejected() {
    let err = Frame::new(
        ints(&[1]),
        vec![identity().named("a"), plus(1).named("a")],
    )
    .unwrap_err();
    assert!(matches!(err, TabulaError::Configuration(_)));
}

#[test]
fn test_value_snapshot_has_header_row_first() {
    let frame = Frame::new(
        ints(&[1, 2]),
        vec![
            identity().named("amount"),
            plus(1).named("total").described("Grand Total"),
        ],
    )
    .unwrap();

    let rows = frame.values().unwrap();
    assert_eq!(
        rows[0],
        vec![
            Value::Text("Amount".to_string()),
            Value::Text("Grand Total".to_string()),
        ]
    );
    assert_eq!(rows[1], ints(&[1, 2]));
    assert_eq!(rows[2], ints(&[2, 3]));
}

#[test]
fn test_column_snapshot_has_header_first() {
    let frame = Frame::new(ints(&[1, 2]), vec![plus(1).named("total")]).unwrap();
    assert_eq!(
        frame.column_snapshot(0, None).unwrap(),
        vec![Value::Text("Total".to_string()), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn test_snapshots_are_recomputed_per_call() {
    let frame = Frame::new(ints(&[1, 2, 3]), vec![plus(2)]).unwrap();
    assert_eq!(frame.values().unwrap(), frame.values().unwrap());
}

#[test]
fn test_container_cells() {
    let frame = Frame::new(
        ints(&[1]),
        vec![ColumnSpec::new(|_| Expr::list(vec![1.into(), 2.into(), 3.into()])).named("arr")],
    )
    .unwrap();

    assert_eq!(
        frame.cell_value(0, 0).unwrap(),
        Value::List(ints(&[1, 2, 3]))
    );

    let cell = frame.column_named("arr").unwrap().cell(0).unwrap();
    let fields = cell.record_fields().unwrap();
    assert_eq!(fields[0].0, "f0");
    assert_eq!(fields[2].0, "f2");
}

#[test]
fn test_unknown_function_head_fails_in_value_mode() {
    let frame = Frame::new(
        ints(&[1, 2, 3]),
        vec![
            identity().named("n"),
            ColumnSpec::new(|_| symbol("sum").call(vec![symbol("dataframe").index("n")]))
                .named("total"),
        ],
    )
    .unwrap();

    // `sum` is not a builtin: value mode surfaces it as unresolved.
    let err = frame.cell_value(1, 0).unwrap_err();
    assert!(matches!(err, TabulaError::Resolution { .. }));
}

#[test]
fn test_current_column_binding_recurses_to_the_limit() {
    // `column` materializes the current column eagerly, which includes
    // the referencing cell itself.
    let frame = Frame::new(
        ints(&[1]),
        vec![ColumnSpec::new(|_| symbol("column").index(0)).named("head")],
    )
    .unwrap();

    let err = frame.cell_value(0, 0).unwrap_err();
    assert!(matches!(err, TabulaError::Limit { .. }));
}

#[test]
fn test_table_binding_materializes_columns() {
    let frame = Frame::new(
        ints(&[1]),
        vec![
            identity().named("n"),
            ColumnSpec::new(|_| symbol("dataframe").index("n").index(0)).named("first"),
        ],
    )
    .unwrap();

    // dataframe -> {n: [1], first: [...]} recurses through `first`
    // itself, so the depth limit reports non-termination.
    let err = frame.cell_value(1, 0).unwrap_err();
    assert!(matches!(err, TabulaError::Limit { .. }));
}

#[test]
fn test_self_referential_column_hits_depth_limit() {
    let frame = Frame::new(
        ints(&[1]),
        vec![ColumnSpec::new(|_| symbol("loop").add(1)).named("loop")],
    )
    .unwrap();

    let err = frame.cell_value(0, 0).unwrap_err();
    assert!(matches!(err, TabulaError::Limit { .. }));
}

#[test]
fn test_formatted_applies_column_formatter() {
    let frame = Frame::new(
        ints(&[1, 2]),
        vec![identity()
            .named("amount")
            .with_formatter(|v| format!("{} EUR", v))],
    )
    .unwrap();

    let rows = frame.formatted().unwrap();
    assert_eq!(rows[0], vec!["Amount".to_string()]);
    assert_eq!(rows[1], vec!["1 EUR".to_string()]);

    let rendered = frame.to_string();
    assert!(rendered.contains("| Amount |"));
    assert!(rendered.contains("| 1 EUR  |"));
}

#[test]
fn test_workbook_rejects_duplicate_names() {
    let a = Frame::new(ints(&[1]), vec![identity()]).unwrap();
    let b = Frame::new(ints(&[1]), vec![identity()]).unwrap();
    let err =
        Workbook::from_frames(vec![("data".to_string(), a), ("data".to_string(), b)]).unwrap_err();
    assert!(matches!(err, TabulaError::Configuration(_)));
}

#[test]
fn test_workbook_value_snapshots() {
    let data = Frame::new(ints(&[1, 2]), vec![plus(1).named("n")]).unwrap();
    let workbook = Workbook::from_frames(vec![("data".to_string(), data)]).unwrap();

    let snapshots = workbook.values().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].0, "data");
    assert_eq!(snapshots[0].1[1], ints(&[2]));
}
