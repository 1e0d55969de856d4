//! Worksheet sink boundary and the sheet-writing driver
//!
//! The engine does no file I/O itself; it hands compiled cells to a
//! `WorksheetSink`. The driver owns the two pieces of per-render state
//! the compiler does not: the format cache (one sink format per distinct
//! tag name, resolved lazily) and the per-column running maximum
//! rendered width used for auto-sizing (monotonic, reset per sheet).

use crate::formula::escape::escape_if_needed;
use crate::formula::{Compiled, FormatTag};
use crate::frame::workbook::Workbook;
use crate::{TabulaError, TabulaResult};
use std::collections::HashMap;
use tracing::debug;

/// Opaque handle to a format the sink has materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatId(pub usize);

/// Cell-writing backend: accepts plain text or formula text at
/// (row, col) with an optional format handle.
pub trait WorksheetSink {
    fn new_sheet(&mut self, name: &str) -> TabulaResult<()>;

    /// Materialize a display format; called at most once per tag name.
    fn add_format(&mut self, tag: &FormatTag) -> TabulaResult<FormatId>;

    fn write(
        &mut self,
        value: &Compiled,
        row: u32,
        col: u32,
        format: Option<FormatId>,
    ) -> TabulaResult<()>;

    fn set_column_width(&mut self, _col: u32, _width: usize) -> TabulaResult<()> {
        Ok(())
    }

    fn freeze_rows(&mut self, _rows: u32) -> TabulaResult<()> {
        Ok(())
    }

    fn close(&mut self) -> TabulaResult<()> {
        Ok(())
    }
}

/// Drives a sink sheet by sheet, tracking formats and column widths.
pub struct SheetWriter<S: WorksheetSink> {
    sink: S,
    line: u32,
    sheet_open: bool,
    formats: HashMap<&'static str, FormatId>,
    widths: HashMap<u32, usize>,
    auto_sizing: bool,
    freeze_rows: u32,
}

impl<S: WorksheetSink> SheetWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            line: 0,
            sheet_open: false,
            formats: HashMap::new(),
            widths: HashMap::new(),
            auto_sizing: true,
            freeze_rows: 1,
        }
    }

    pub fn with_auto_sizing(mut self, auto_sizing: bool) -> Self {
        self.auto_sizing = auto_sizing;
        self
    }

    pub fn with_freeze_rows(mut self, rows: u32) -> Self {
        self.freeze_rows = rows;
        self
    }

    /// Start a new sheet, flushing the previous sheet's column widths.
    pub fn new_sheet(&mut self, name: &str) -> TabulaResult<()> {
        self.flush_sheet()?;
        self.sink.new_sheet(name)?;
        if self.freeze_rows > 0 {
            self.sink.freeze_rows(self.freeze_rows)?;
        }
        self.line = 0;
        self.widths.clear();
        self.sheet_open = true;
        Ok(())
    }

    fn flush_sheet(&mut self) -> TabulaResult<()> {
        if self.sheet_open && self.auto_sizing {
            let mut columns: Vec<_> = self.widths.iter().collect();
            columns.sort();
            for (&col, &width) in columns {
                self.sink.set_column_width(col, width)?;
            }
        }
        self.sheet_open = false;
        Ok(())
    }

    pub fn write_row(&mut self, cells: &[Compiled]) -> TabulaResult<()> {
        for (col, cell) in cells.iter().enumerate() {
            self.write_cell(cell, self.line, col as u32)?;
        }
        self.line += 1;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[Vec<Compiled>]) -> TabulaResult<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    fn write_cell(&mut self, cell: &Compiled, row: u32, col: u32) -> TabulaResult<()> {
        if !self.sheet_open {
            return Err(TabulaError::Engine(
                "no sheet open; call new_sheet first".to_string(),
            ));
        }
        match cell {
            Compiled::Formula(formula) => {
                if let Some(width) = formula.estimated_width {
                    self.observe_width(col, width);
                }
                let format = match formula.format {
                    Some(tag) => Some(self.format_id(&tag)?),
                    None => None,
                };
                self.sink.write(cell, row, col, format)
            }
            Compiled::Text(text) => {
                let text = escape_if_needed(text);
                self.observe_width(col, text.chars().count());
                self.sink.write(&Compiled::Text(text), row, col, None)
            }
        }
    }

    fn observe_width(&mut self, col: u32, width: usize) {
        let entry = self.widths.entry(col).or_insert(0);
        *entry = (*entry).max(width);
    }

    /// Resolve a format tag through the cache, materializing it in the
    /// sink the first time the tag name is seen.
    fn format_id(&mut self, tag: &FormatTag) -> TabulaResult<FormatId> {
        if let Some(&id) = self.formats.get(tag.name) {
            return Ok(id);
        }
        let id = self.sink.add_format(tag)?;
        self.formats.insert(tag.name, id);
        Ok(id)
    }

    /// The running maximum rendered width for a column of the current
    /// sheet.
    pub fn column_width(&self, col: u32) -> Option<usize> {
        self.widths.get(&col).copied()
    }

    /// Flush the current sheet and close the sink, returning it.
    pub fn finish(mut self) -> TabulaResult<S> {
        self.flush_sheet()?;
        self.sink.close()?;
        Ok(self.sink)
    }
}

/// Render every table of a workbook to the sink, one sheet per table,
/// header row first.
pub fn write_workbook<S: WorksheetSink>(workbook: &Workbook, sink: S) -> TabulaResult<S> {
    let mut writer = SheetWriter::new(sink);
    for (name, frame) in workbook.iter() {
        debug!(sheet = name, "rendering sheet");
        writer.new_sheet(name)?;
        writer.write_rows(&frame.formula_rows_with(Some(workbook))?)?;
    }
    writer.finish()
}

/// In-memory sink for tests and hosts that post-process rendered sheets.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub sheets: Vec<BufferSheet>,
    pub formats: Vec<FormatTag>,
}

#[derive(Debug, Default)]
pub struct BufferSheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), String>,
    pub widths: HashMap<u32, usize>,
    pub frozen_rows: u32,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&BufferSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn cell_text(&self, sheet: &str, row: u32, col: u32) -> Option<&str> {
        self.sheet(sheet)
            .and_then(|s| s.cells.get(&(row, col)))
            .map(String::as_str)
    }

    fn current(&mut self) -> TabulaResult<&mut BufferSheet> {
        self.sheets
            .last_mut()
            .ok_or_else(|| TabulaError::Engine("no sheet open".to_string()))
    }
}

impl WorksheetSink for BufferSink {
    fn new_sheet(&mut self, name: &str) -> TabulaResult<()> {
        self.sheets.push(BufferSheet {
            name: name.to_string(),
            ..BufferSheet::default()
        });
        Ok(())
    }

    fn add_format(&mut self, tag: &FormatTag) -> TabulaResult<FormatId> {
        self.formats.push(*tag);
        Ok(FormatId(self.formats.len() - 1))
    }

    fn write(
        &mut self,
        value: &Compiled,
        row: u32,
        col: u32,
        _format: Option<FormatId>,
    ) -> TabulaResult<()> {
        let text = value.text().to_string();
        self.current()?.cells.insert((row, col), text);
        Ok(())
    }

    fn set_column_width(&mut self, col: u32, width: usize) -> TabulaResult<()> {
        self.current()?.widths.insert(col, width);
        Ok(())
    }

    fn freeze_rows(&mut self, rows: u32) -> TabulaResult<()> {
        self.current()?.frozen_rows = rows;
        Ok(())
    }
}
