//! Spreadsheet addressing
//!
//! Base-26 column letters and the progressively specialized reference
//! proxies used by formula-mode resolution. References carry an
//! immutable layout snapshot of their table instead of a back-pointer,
//! so they stay valid wherever the expression tree travels.

use crate::value::Value;
use crate::{TabulaError, TabulaResult};
use std::sync::Arc;

/// Spreadsheet-style letters for a zero-based column index
/// (0 → A, 25 → Z, 26 → AA).
pub fn column_letter(index: usize) -> String {
    let mut result = String::new();
    let mut n = index as u128 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// The unbounded letter sequence A, B, …, Z, AA, AB, … .
pub fn column_letters() -> impl Iterator<Item = String> {
    (0..).map(column_letter)
}

/// Immutable addressing snapshot of one table: column names with their
/// letters, in declaration order, plus the rows reserved for headers.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    columns: Vec<(String, String)>,
    header_rows: u32,
}

impl TableLayout {
    pub fn new(columns: Vec<(String, String)>, header_rows: u32) -> Self {
        Self {
            columns,
            header_rows,
        }
    }

    pub fn header_rows(&self) -> u32 {
        self.header_rows
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn letter_for(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, letter)| letter.as_str())
    }

    pub fn letter_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|(_, letter)| letter.as_str())
    }

    fn first_letter(&self) -> &str {
        self.columns.first().map(|(_, l)| l.as_str()).unwrap_or("A")
    }

    fn last_letter(&self) -> &str {
        self.columns.last().map(|(_, l)| l.as_str()).unwrap_or("A")
    }
}

/// A symbolic cell/column/row/table address, lazily specialized by
/// successive indexing until both column and row are fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRef {
    layout: Arc<TableLayout>,
    sheet: Option<String>,
    col: Option<String>,
    row: Option<u32>,
}

impl SheetRef {
    /// A reference to a whole table, optionally qualified by its sheet
    /// name (for cross-sheet references).
    pub fn table(layout: Arc<TableLayout>, sheet: Option<String>) -> Self {
        Self {
            layout,
            sheet,
            col: None,
            row: None,
        }
    }

    /// A reference to one column, selected by name.
    pub fn column(
        layout: Arc<TableLayout>,
        sheet: Option<String>,
        name: &str,
    ) -> TabulaResult<Self> {
        let letter = layout
            .letter_for(name)
            .ok_or_else(|| TabulaError::unresolved(name, layout.column_names()))?
            .to_string();
        Ok(Self {
            layout,
            sheet,
            col: Some(letter),
            row: None,
        })
    }

    /// A reference to one column, by its letters directly.
    pub fn column_by_letter(
        layout: Arc<TableLayout>,
        sheet: Option<String>,
        letter: String,
    ) -> Self {
        Self {
            layout,
            sheet,
            col: Some(letter),
            row: None,
        }
    }

    /// A reference to a single cell, by column letter and 1-based row.
    pub fn cell(layout: Arc<TableLayout>, sheet: Option<String>, letter: String, row: u32) -> Self {
        Self {
            layout,
            sheet,
            col: Some(letter),
            row: Some(row),
        }
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// The concrete address text: `A:C` for a table, `B:B` for a column,
    /// `5:5` for a row, `B5` for a cell, each optionally prefixed with a
    /// quoted sheet name.
    pub fn address(&self) -> String {
        let body = match (&self.col, self.row) {
            (None, None) => format!(
                "{}:{}",
                self.layout.first_letter(),
                self.layout.last_letter()
            ),
            (Some(col), None) => format!("{}:{}", col, col),
            (None, Some(row)) => format!("{}:{}", row, row),
            (Some(col), Some(row)) => format!("{}{}", col, row),
        };
        match &self.sheet {
            Some(sheet) => format!("'{}'!{}", sheet, body),
            None => body,
        }
    }

    /// Specialize by one index step: an unfixed column is selected first
    /// (by name or position), then the row. Indexing a complete address
    /// is an error.
    pub fn index(&self, key: &Value) -> TabulaResult<SheetRef> {
        match (&self.col, self.row) {
            (Some(_), Some(_)) => Err(TabulaError::Resolution {
                message: format!(
                    "reference {} already has column and row",
                    self.address()
                ),
                choices: Vec::new(),
            }),
            (Some(_), None) => match key {
                Value::Int(row) if *row >= 1 => Ok(Self {
                    row: Some(*row as u32),
                    ..self.clone()
                }),
                other => Err(TabulaError::Engine(format!(
                    "row index must be a positive integer, got {}",
                    other
                ))),
            },
            _ => self.select_column(key),
        }
    }

    fn select_column(&self, key: &Value) -> TabulaResult<SheetRef> {
        let letter = match key {
            Value::Text(name) => self
                .layout
                .letter_for(name)
                .ok_or_else(|| TabulaError::unresolved(name, self.layout.column_names()))?,
            Value::Int(position) if *position >= 0 => self
                .layout
                .letter_at(*position as usize)
                .ok_or_else(|| {
                    TabulaError::Engine(format!("column position {} out of range", position))
                })?,
            other => {
                return Err(TabulaError::Engine(format!(
                    "column selector must be a name or position, got {}",
                    other
                )))
            }
        };
        Ok(Self {
            col: Some(letter.to_string()),
            ..self.clone()
        })
    }
}

/// A reference to a collection of tables; indexing by table name yields
/// that table's sheet-qualified reference.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookRef {
    tables: Vec<(String, Arc<TableLayout>)>,
}

impl WorkbookRef {
    pub fn new(tables: Vec<(String, Arc<TableLayout>)>) -> Self {
        Self { tables }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn table(&self, name: &str) -> TabulaResult<SheetRef> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, layout)| SheetRef::table(layout.clone(), Some(n.clone())))
            .ok_or_else(|| TabulaError::unresolved(name, self.table_names()))
    }
}
