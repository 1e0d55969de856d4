use crate::frame::address::{column_letter, column_letters, SheetRef, TableLayout, WorkbookRef};
use crate::value::Value;
use crate::TabulaError;
use std::sync::Arc;

fn layout() -> Arc<TableLayout> {
    Arc::new(TableLayout::new(
        vec![
            ("amount".to_string(), "A".to_string()),
            ("total".to_string(), "B".to_string()),
            ("note".to_string(), "C".to_string()),
        ],
        1,
    ))
}

#[test]
fn test_column_letters_are_base_26() {
    assert_eq!(column_letter(0), "A");
    assert_eq!(column_letter(25), "Z");
    assert_eq!(column_letter(26), "AA");
    assert_eq!(column_letter(27), "AB");
    assert_eq!(column_letter(701), "ZZ");
    assert_eq!(column_letter(702), "AAA");

    let first: Vec<String> = column_letters().take(3).collect();
    assert_eq!(first, vec!["A", "B", "C"]);
}

#[test]
fn test_table_reference_spans_all_columns() {
    let reference = SheetRef::table(layout(), None);
    assert_eq!(reference.address(), "A:C");
}

#[test]
fn test_progressive_specialization() {
    let table = SheetRef::table(layout(), None);
    let column = table.index(&Value::Text("total".to_string())).unwrap();
    assert_eq!(column.address(), "B:B");
    let cell = column.index(&Value::Int(5)).unwrap();
    assert_eq!(cell.address(), "B5");
}

#[test]
fn test_column_selection_by_position() {
    let table = SheetRef::table(layout(), None);
    let column = table.index(&Value::Int(2)).unwrap();
    assert_eq!(column.address(), "C:C");
}

#[test]
fn test_complete_reference_rejects_further_indexing() {
    let cell = SheetRef::cell(layout(), None, "B".to_string(), 5);
    let err = cell.index(&Value::Int(1)).unwrap_err();
    assert!(matches!(err, TabulaError::Resolution { .. }));
    assert!(err.to_string().contains("B5"));
}

#[test]
fn test_unknown_column_lists_choices() {
    let table = SheetRef::table(layout(), None);
    let err = table.index(&Value::Text("missing".to_string())).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("missing"));
    assert!(message.contains("amount"));
    assert!(message.contains("note"));
}

#[test]
fn test_sheet_qualified_addresses() {
    let workbook = WorkbookRef::new(vec![("other".to_string(), layout())]);
    let table = workbook.table("other").unwrap();
    assert_eq!(table.address(), "'other'!A:C");
    let column = table.index(&Value::Text("amount".to_string())).unwrap();
    assert_eq!(column.address(), "'other'!A:A");

    let err = workbook.table("absent").unwrap_err();
    assert!(err.to_string().contains("other"));
}
