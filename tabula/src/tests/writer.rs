use crate::formula::{Compiled, FormulaValue, DEC_FORMAT, INT_FORMAT};
use crate::frame::column::ColumnSpec;
use crate::frame::workbook::Workbook;
use crate::frame::Frame;
use crate::symbolic::{symbol, Expr};
use crate::value::Value;
use crate::writer::{write_workbook, BufferSink, SheetWriter};

fn sized(width: usize) -> Compiled {
    Compiled::Formula(FormulaValue::atom("x").with_width(width))
}

#[test]
fn test_column_width_is_running_maximum() {
    let mut writer = SheetWriter::new(BufferSink::new());
    writer.new_sheet("Data").unwrap();
    writer.write_row(&[sized(3)]).unwrap();
    writer.write_row(&[sized(18)]).unwrap();
    writer.write_row(&[sized(5)]).unwrap();

    assert_eq!(writer.column_width(0), Some(18));

    let sink = writer.finish().unwrap();
    assert_eq!(sink.sheet("Data").unwrap().widths.get(&0), Some(&18));
}

#[test]
fn test_widths_reset_per_sheet() {
    let mut writer = SheetWriter::new(BufferSink::new());
    writer.new_sheet("First").unwrap();
    writer.write_row(&[sized(18)]).unwrap();
    writer.new_sheet("Second").unwrap();
    writer.write_row(&[sized(4)]).unwrap();

    let sink = writer.finish().unwrap();
    assert_eq!(sink.sheet("First").unwrap().widths.get(&0), Some(&18));
    assert_eq!(sink.sheet("Second").unwrap().widths.get(&0), Some(&4));
}

#[test]
fn test_format_cache_resolves_each_tag_once() {
    let int_cell = || {
        Compiled::Formula(FormulaValue::atom("1").with_format(INT_FORMAT))
    };
    let dec_cell = || {
        Compiled::Formula(FormulaValue::atom("1.5").with_format(DEC_FORMAT))
    };

    let mut writer = SheetWriter::new(BufferSink::new());
    writer.new_sheet("Data").unwrap();
    writer
        .write_row(&[int_cell(), int_cell(), dec_cell()])
        .unwrap();
    writer.write_row(&[int_cell()]).unwrap();
    // The cache persists across sheets.
    writer.new_sheet("More").unwrap();
    writer.write_row(&[dec_cell()]).unwrap();

    let sink = writer.finish().unwrap();
    assert_eq!(sink.formats.len(), 2);
}

#[test]
fn test_text_cells_escape_only_when_needed() {
    let mut writer = SheetWriter::new(BufferSink::new());
    writer.new_sheet("Data").unwrap();
    writer
        .write_row(&[
            Compiled::Text("plain".to_string()),
            Compiled::Text("line\nbreak".to_string()),
        ])
        .unwrap();

    let sink = writer.finish().unwrap();
    assert_eq!(sink.cell_text("Data", 0, 0), Some("plain"));
    assert_eq!(sink.cell_text("Data", 0, 1), Some("\"line\\nbreak\""));
}

#[test]
fn test_text_width_tracks_rendered_length() {
    let mut writer = SheetWriter::new(BufferSink::new());
    writer.new_sheet("Data").unwrap();
    writer
        .write_row(&[Compiled::Text("header".to_string())])
        .unwrap();
    assert_eq!(writer.column_width(0), Some(6));
}

#[test]
fn test_writing_without_a_sheet_fails() {
    let mut writer = SheetWriter::new(BufferSink::new());
    assert!(writer.write_row(&[Compiled::Text("x".to_string())]).is_err());
}

#[test]
fn test_freeze_rows_forwarded_to_sink() {
    let mut writer = SheetWriter::new(BufferSink::new()).with_freeze_rows(2);
    writer.new_sheet("Data").unwrap();
    let sink = writer.finish().unwrap();
    assert_eq!(sink.sheet("Data").unwrap().frozen_rows, 2);
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

#[test]
fn test_write_workbook_renders_sheet_per_table() {
    let other = Frame::new(
        ints(&[10, 20]),
        vec![ColumnSpec::new(|raw| Expr::Literal(raw.clone())).named("val")],
    )
    .unwrap();
    let data = Frame::new(
        ints(&[1, 2]),
        vec![
            ColumnSpec::new(|raw| Expr::Literal(raw.clone())).named("n"),
            ColumnSpec::new(|_| {
                symbol("sum").call(vec![symbol("dataframes").index("other").index("val")])
            })
            .named("total"),
        ],
    )
    .unwrap();
    let workbook = Workbook::from_frames(vec![
        ("data".to_string(), data),
        ("other".to_string(), other),
    ])
    .unwrap();

    let sink = write_workbook(&workbook, BufferSink::new()).unwrap();

    // Headers first, data rows below.
    assert_eq!(sink.cell_text("data", 0, 0), Some("N"));
    assert_eq!(sink.cell_text("data", 1, 0), Some("1"));
    assert_eq!(sink.cell_text("data", 1, 1), Some("SUM('other'!A:A)"));
    assert_eq!(sink.cell_text("other", 1, 0), Some("10"));
    assert_eq!(sink.sheet("data").unwrap().frozen_rows, 1);
}
