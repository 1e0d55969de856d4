//! Column definitions and cells
//!
//! A column is declared by a row function producing a value or an
//! expression per row. The function runs exactly once per cell at
//! construction; the resulting expression is immutable, and its
//! value/formula is recomputed on every read.

use crate::symbolic::Expr;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

pub type RowFn = Arc<dyn Fn(&Value) -> Expr + Send + Sync>;
pub type DisplayFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Declaration of one column: the row function plus optional name,
/// header description and display formatter.
#[derive(Clone)]
pub struct ColumnSpec {
    pub(crate) function: RowFn,
    pub(crate) name: Option<String>,
    pub(crate) short_description: Option<String>,
    pub(crate) formatter: Option<DisplayFn>,
}

impl ColumnSpec {
    /// Declare a column from a bare row function.
    pub fn new(function: impl Fn(&Value) -> Expr + Send + Sync + 'static) -> Self {
        Self {
            function: Arc::new(function),
            name: None,
            short_description: None,
            formatter: None,
        }
    }

    /// Declare a column whose every cell holds the same expression.
    pub fn constant(expr: impl Into<Expr>) -> Self {
        let expr = expr.into();
        Self::new(move |_| expr.clone())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Short description used as the rendered column header.
    pub fn described(mut self, text: impl Into<String>) -> Self {
        self.short_description = Some(text.into());
        self
    }

    /// Display formatter applied to cell values in value mode only.
    pub fn with_formatter(
        mut self,
        formatter: impl Fn(&Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("name", &self.name)
            .field("short_description", &self.short_description)
            .finish_non_exhaustive()
    }
}

/// One table entry: the raw row input and the expression the column's
/// row function produced from it.
#[derive(Debug, Clone)]
pub struct Cell {
    raw: Value,
    row: usize,
    expr: Expr,
}

impl Cell {
    pub(crate) fn new(raw: Value, row: usize, expr: Expr) -> Self {
        Self { raw, row, expr }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// The unevaluated expression, computed once at construction.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// View a mapping/sequence cell as an ordered record with positional
    /// field names.
    pub fn record_fields(&self) -> Option<Vec<(String, Expr)>> {
        self.expr.record_fields()
    }
}

/// An ordered sequence of cells sharing one column definition.
#[derive(Debug, Clone)]
pub struct Column {
    spec: ColumnSpec,
    index: usize,
    letter: String,
    cells: Vec<Cell>,
}

impl Column {
    pub(crate) fn build(spec: ColumnSpec, index: usize, letter: String, rows: &[Value]) -> Self {
        let cells = rows
            .iter()
            .enumerate()
            .map(|(row, raw)| Cell::new(raw.clone(), row, (spec.function)(raw)))
            .collect();
        Self {
            spec,
            index,
            letter,
            cells,
        }
    }

    /// The column's name; positional columns derive one from their index.
    pub fn name(&self) -> String {
        self.spec
            .name
            .clone()
            .unwrap_or_else(|| format!("column_{}", self.index))
    }

    /// The rendered header: the short description when declared, else
    /// the title-cased name.
    pub fn header(&self) -> String {
        self.spec
            .short_description
            .clone()
            .unwrap_or_else(|| title_case(&self.name()))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The derived spreadsheet column letters (A, B, …, AA, …).
    pub fn letter(&self) -> &str {
        &self.letter
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, row: usize) -> Option<&Cell> {
        self.cells.get(row)
    }

    pub(crate) fn format_value(&self, value: &Value) -> String {
        match &self.spec.formatter {
            Some(formatter) => formatter(value),
            None => value.to_string(),
        }
    }
}

/// Title-case a name the way headers are rendered: the first letter of
/// each alphabetic run is uppercased, the rest lowercased.
pub(crate) fn title_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}
