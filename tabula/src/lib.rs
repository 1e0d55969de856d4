//! # Tabula
//!
//! A symbolic expression engine with two downstream compilers sharing
//! one IR: a context-based evaluator reducing expression trees to
//! concrete values, and a spreadsheet-formula compiler rendering the
//! same trees into formula text with cell-address resolution and
//! cross-sheet references.
//!
//! ## Quick Start
//!
//! ```rust
//! use tabula::{evaluate, symbol, Context, Expr, TabulaResult, Value};
//!
//! fn main() -> TabulaResult<()> {
//!     // Build an expression tree and evaluate it against a context.
//!     let expr = symbol("x").add(2);
//!     let result = evaluate(&expr, &Context::new().bind("x", 2))?;
//!     assert_eq!(result, Expr::Literal(Value::Int(4)));
//!
//!     // Unresolved symbols are valid terminal values.
//!     let partial = evaluate(&expr, &Context::new())?;
//!     assert_eq!(partial, expr);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Expressions
//! Immutable trees of symbols, deferred calls and literals, built with
//! explicit builder methods (`add`, `index`, `call`, …).
//!
//! ### Frames
//! A frame is a name-unique set of columns over shared row inputs; each
//! cell stores the expression its column's row function produced. Cells
//! are re-evaluated on every read, in one of two modes: value (a
//! concrete `Value`) or spreadsheet formula (address-resolving text).
//!
//! ### Workbooks
//! A workbook names its frames and resolves cross-table references,
//! which render as sheet-qualified addresses (`'other'!B2`).

pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod frame;
pub mod limits;
pub mod serializers;
pub mod symbolic;
pub mod value;
pub mod writer;

pub use dispatch::{Dispatch, Tagged, TypeTag};
pub use error::TabulaError;
pub use evaluator::{evaluate, Builtins, Context, SymbolResolver};
pub use formula::{
    Compiled, FormatSpec, FormatTag, FormulaCompiler, FormulaValue, DATETIME_FORMAT, DATE_FORMAT,
    DEC_FORMAT, INT_FORMAT, TIME_FORMAT,
};
pub use frame::address::{column_letter, column_letters, SheetRef, TableLayout, WorkbookRef};
pub use frame::column::{Cell, Column, ColumnSpec};
pub use frame::workbook::Workbook;
pub use frame::Frame;
pub use limits::EvalLimits;
pub use symbolic::{symbol, Call, Expr, Symbol};
pub use value::{NativeFn, Value};
pub use writer::{write_workbook, BufferSink, FormatId, SheetWriter, WorksheetSink};

/// Result type for tabula operations
pub type TabulaResult<T> = Result<T, TabulaError>;

#[cfg(test)]
mod tests;
