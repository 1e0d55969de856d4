//! Tabular column model
//!
//! A frame is an ordered, name-unique set of columns over shared row
//! inputs. Cells hold unevaluated expressions; reading a cell re-walks
//! its expression with a context built fresh from the chosen resolution
//! strategy (value or spreadsheet formula), so reads are always current
//! and never cached.

pub mod address;
pub mod column;
pub mod workbook;

use crate::evaluator::{evaluate, Context, SymbolResolver};
use crate::formula::{Compiled, FormulaCompiler};
use crate::limits::EvalLimits;
use crate::symbolic::{Expr, Symbol};
use crate::value::Value;
use crate::{TabulaError, TabulaResult};
use address::{column_letters, SheetRef, TableLayout};
use column::{Column, ColumnSpec};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use workbook::Workbook;

/// Names every cell resolver understands besides the declared columns.
const SELF_TABLE: &str = "dataframe";
const SELF_COLUMN: &str = "column";
const ALL_TABLES: &str = "dataframes";

/// An ordered set of named columns over shared row inputs.
///
/// Membership is fixed at construction; no columns are added or removed
/// afterwards.
#[derive(Debug)]
pub struct Frame {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    row_count: usize,
    header_rows: u32,
    limits: EvalLimits,
}

impl Frame {
    /// Build a frame from row inputs and column specifications. Column
    /// letters are assigned in declaration order from the unbounded
    /// base-26 sequence.
    pub fn new(rows: Vec<Value>, specs: Vec<ColumnSpec>) -> TabulaResult<Frame> {
        if specs.is_empty() {
            return Err(TabulaError::Configuration(
                "empty column specification".to_string(),
            ));
        }
        let row_count = rows.len();
        let mut columns = Vec::with_capacity(specs.len());
        let mut by_name = HashMap::new();
        for ((index, spec), letter) in specs.into_iter().enumerate().zip(column_letters()) {
            let column = Column::build(spec, index, letter, &rows);
            if by_name.insert(column.name(), index).is_some() {
                return Err(TabulaError::Configuration(format!(
                    "duplicate column name `{}`",
                    column.name()
                )));
            }
            columns.push(column);
        }
        debug!(columns = columns.len(), rows = row_count, "frame built");
        Ok(Frame {
            columns,
            by_name,
            row_count,
            header_rows: 1,
            limits: EvalLimits::default(),
        })
    }

    /// Number of leading rows reserved for headers when addressing
    /// spreadsheet cells (default 1).
    pub fn with_header_rows(mut self, header_rows: u32) -> Self {
        self.header_rows = header_rows;
        self
    }

    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn header_rows(&self) -> u32 {
        self.header_rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&index| &self.columns[index])
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(Column::name).collect()
    }

    pub(crate) fn layout(&self) -> Arc<TableLayout> {
        Arc::new(TableLayout::new(
            self.columns
                .iter()
                .map(|c| (c.name(), c.letter().to_string()))
                .collect(),
            self.header_rows,
        ))
    }

    fn resolver_choices(&self) -> Vec<String> {
        let mut choices = vec![SELF_TABLE.to_string(), SELF_COLUMN.to_string()];
        choices.extend(self.column_names());
        choices
    }

    fn require_cell(&self, col: usize, row: usize) -> TabulaResult<&column::Cell> {
        let column = self.column(col).ok_or_else(|| {
            TabulaError::Engine(format!("column index {} out of range", col))
        })?;
        column
            .cell(row)
            .ok_or_else(|| TabulaError::Engine(format!("row index {} out of range", row)))
    }

    /// Evaluate one cell to a concrete value (value mode, no workbook).
    pub fn cell_value(&self, col: usize, row: usize) -> TabulaResult<Value> {
        self.cell_value_with(col, row, None)
    }

    /// Evaluate one cell to a concrete value, resolving sibling columns
    /// at the same row through the given workbook if present.
    pub fn cell_value_with(
        &self,
        col: usize,
        row: usize,
        workbook: Option<&Workbook>,
    ) -> TabulaResult<Value> {
        self.cell_value_inner(col, row, workbook, 0)
    }

    fn cell_value_inner(
        &self,
        col: usize,
        row: usize,
        workbook: Option<&Workbook>,
        hops: usize,
    ) -> TabulaResult<Value> {
        if hops > self.limits.max_expression_depth {
            return Err(TabulaError::Limit {
                limit: format!("max_expression_depth = {}", self.limits.max_expression_depth),
                value: "cross-column resolution does not terminate".to_string(),
            });
        }
        let cell = self.require_cell(col, row)?;
        let resolver = ValueResolver {
            frame: self,
            workbook,
            row,
            col,
            hops,
        };
        let context = Context::new()
            .with_resolver(&resolver)
            .with_limits(self.limits.clone());
        let reduced = evaluate(cell.expr(), &context)?;
        reduced.to_value().ok_or_else(|| {
            TabulaError::Engine(format!("cell did not reduce to a value: {}", reduced))
        })
    }

    /// Compile one cell to spreadsheet formula text (formula mode).
    pub fn cell_formula(&self, col: usize, row: usize) -> TabulaResult<Compiled> {
        let compiler = FormulaCompiler::standard()?;
        self.cell_formula_using(&compiler, col, row, None)
    }

    /// Compile one cell with a caller-supplied compiler and optional
    /// workbook for cross-sheet references.
    pub fn cell_formula_using(
        &self,
        compiler: &FormulaCompiler,
        col: usize,
        row: usize,
        workbook: Option<&Workbook>,
    ) -> TabulaResult<Compiled> {
        let cell = self.require_cell(col, row)?;
        let resolver = FormulaResolver {
            frame: self,
            workbook,
            row,
            col,
        };
        let context = Context::structural()
            .with_resolver(&resolver)
            .with_limits(self.limits.clone());
        let reduced = evaluate(cell.expr(), &context)?;
        compiler.compile(&reduced)
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, col: usize) -> TabulaResult<Vec<Value>> {
        self.column_values_with(col, None)
    }

    pub fn column_values_with(
        &self,
        col: usize,
        workbook: Option<&Workbook>,
    ) -> TabulaResult<Vec<Value>> {
        (0..self.row_count)
            .map(|row| self.cell_value_with(col, row, workbook))
            .collect()
    }

    /// Aggregate snapshot of one column: the header first, then each
    /// cell's value in row order.
    pub fn column_snapshot(
        &self,
        col: usize,
        workbook: Option<&Workbook>,
    ) -> TabulaResult<Vec<Value>> {
        let column = self.column(col).ok_or_else(|| {
            TabulaError::Engine(format!("column index {} out of range", col))
        })?;
        let mut values = vec![Value::Text(column.header())];
        values.extend(self.column_values_with(col, workbook)?);
        Ok(values)
    }

    /// All values of a named column, in row order.
    pub fn column_values_named(&self, name: &str) -> TabulaResult<Vec<Value>> {
        let column = self
            .column_named(name)
            .ok_or_else(|| TabulaError::unresolved(name, self.resolver_choices()))?;
        self.column_values(column.index())
    }

    /// Snapshot of the whole table as values: the header row first, then
    /// each data row. Produced fresh on every call.
    pub fn values(&self) -> TabulaResult<Vec<Vec<Value>>> {
        self.values_with(None)
    }

    pub fn values_with(&self, workbook: Option<&Workbook>) -> TabulaResult<Vec<Vec<Value>>> {
        let mut rows = Vec::with_capacity(self.row_count + 1);
        rows.push(
            self.columns
                .iter()
                .map(|c| Value::Text(c.header()))
                .collect(),
        );
        for row in 0..self.row_count {
            rows.push(
                (0..self.columns.len())
                    .map(|col| self.cell_value_with(col, row, workbook))
                    .collect::<TabulaResult<Vec<_>>>()?,
            );
        }
        Ok(rows)
    }

    /// Snapshot of the whole table as compiled spreadsheet cells, header
    /// row first.
    pub fn formula_rows(&self) -> TabulaResult<Vec<Vec<Compiled>>> {
        self.formula_rows_with(None)
    }

    pub fn formula_rows_with(
        &self,
        workbook: Option<&Workbook>,
    ) -> TabulaResult<Vec<Vec<Compiled>>> {
        let compiler = FormulaCompiler::standard()?;
        self.formula_rows_using(&compiler, workbook)
    }

    pub fn formula_rows_using(
        &self,
        compiler: &FormulaCompiler,
        workbook: Option<&Workbook>,
    ) -> TabulaResult<Vec<Vec<Compiled>>> {
        let mut rows = Vec::with_capacity(self.row_count + 1);
        rows.push(
            self.columns
                .iter()
                .map(|c| Compiled::Text(c.header()))
                .collect(),
        );
        for row in 0..self.row_count {
            rows.push(
                (0..self.columns.len())
                    .map(|col| self.cell_formula_using(compiler, col, row, workbook))
                    .collect::<TabulaResult<Vec<_>>>()?,
            );
        }
        Ok(rows)
    }

    /// Snapshot with each value passed through its column's display
    /// formatter, header row first.
    pub fn formatted(&self) -> TabulaResult<Vec<Vec<String>>> {
        self.formatted_with(None)
    }

    pub fn formatted_with(&self, workbook: Option<&Workbook>) -> TabulaResult<Vec<Vec<String>>> {
        let mut rows = Vec::with_capacity(self.row_count + 1);
        rows.push(self.columns.iter().map(Column::header).collect());
        for row in 0..self.row_count {
            rows.push(
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(col, column)| {
                        self.cell_value_with(col, row, workbook)
                            .map(|v| column.format_value(&v))
                    })
                    .collect::<TabulaResult<Vec<_>>>()?,
            );
        }
        Ok(rows)
    }

    /// The value-mode `dataframe` binding: an ordered map of column name
    /// to that column's values.
    fn table_value(&self, workbook: Option<&Workbook>, hops: usize) -> TabulaResult<Value> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, column)| {
                let values = (0..self.row_count)
                    .map(|row| self.cell_value_inner(col, row, workbook, hops))
                    .collect::<TabulaResult<Vec<_>>>()?;
                Ok((Value::Text(column.name()), Value::List(values)))
            })
            .collect::<TabulaResult<Vec<_>>>()
            .map(Value::Map)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.formatted() {
            Ok(rows) => write!(f, "{}", format_table(&rows)),
            Err(err) => write!(f, "<frame error: {}>", err),
        }
    }
}

/// Render rows as a pipe-delimited table with aligned columns.
pub(crate) fn format_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    rows.iter()
        .map(|row| {
            let cells = (0..columns)
                .map(|i| {
                    let text = row.get(i).map(String::as_str).unwrap_or("");
                    format!("{:width$}", text, width = widths[i])
                })
                .collect::<Vec<_>>()
                .join(" | ");
            format!("| {} |", cells)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Value-mode symbol resolution: sibling columns evaluate to their value
/// at the same row; unknown symbols fail, listing the legal choices.
struct ValueResolver<'a> {
    frame: &'a Frame,
    workbook: Option<&'a Workbook>,
    row: usize,
    col: usize,
    hops: usize,
}

impl SymbolResolver for ValueResolver<'_> {
    fn resolve(&self, symbol: &Symbol) -> TabulaResult<Option<Expr>> {
        let name = symbol.name();
        if let Some(column) = self.frame.column_named(name) {
            let value = self.frame.cell_value_inner(
                column.index(),
                self.row,
                self.workbook,
                self.hops + 1,
            )?;
            return Ok(Some(Expr::Literal(value)));
        }
        match name {
            SELF_TABLE => self
                .frame
                .table_value(self.workbook, self.hops + 1)
                .map(|v| Some(Expr::Literal(v))),
            SELF_COLUMN => (0..self.frame.row_count)
                .map(|row| {
                    self.frame
                        .cell_value_inner(self.col, row, self.workbook, self.hops + 1)
                })
                .collect::<TabulaResult<Vec<_>>>()
                .map(|values| Some(Expr::Literal(Value::List(values)))),
            _ => Err(TabulaError::unresolved(name, self.frame.resolver_choices())),
        }
    }
}

/// Formula-mode symbol resolution: the same names resolve to spreadsheet
/// reference proxies instead; unknown symbols stay unresolved so they
/// render as spreadsheet function names.
struct FormulaResolver<'a> {
    frame: &'a Frame,
    workbook: Option<&'a Workbook>,
    row: usize,
    col: usize,
}

impl FormulaResolver<'_> {
    fn reference(&self, reference: SheetRef) -> TabulaResult<Option<Expr>> {
        Ok(Some(Expr::Literal(Value::Reference(reference))))
    }
}

impl SymbolResolver for FormulaResolver<'_> {
    fn resolve(&self, symbol: &Symbol) -> TabulaResult<Option<Expr>> {
        let name = symbol.name();
        let layout = self.frame.layout();
        if let Some(column) = self.frame.column_named(name) {
            // Bias the row by the header offset into 1-based sheet rows.
            let sheet_row = self.row as u32 + self.frame.header_rows + 1;
            return self.reference(SheetRef::cell(
                layout,
                None,
                column.letter().to_string(),
                sheet_row,
            ));
        }
        match name {
            SELF_TABLE => self.reference(SheetRef::table(layout, None)),
            SELF_COLUMN => {
                let letter = self.frame.columns[self.col].letter().to_string();
                self.reference(SheetRef::column_by_letter(layout, None, letter))
            }
            ALL_TABLES => match self.workbook {
                Some(workbook) => Ok(Some(Expr::Literal(Value::Workbook(workbook.reference())))),
                None => Err(TabulaError::Resolution {
                    message: "`dataframes` is only available when the table belongs to a workbook"
                        .to_string(),
                    choices: Vec::new(),
                }),
            },
            _ => Ok(None),
        }
    }
}
