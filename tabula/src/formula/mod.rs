//! Spreadsheet formula compilation
//!
//! Renders expression trees and literal values into spreadsheet formula
//! text. Operator symbols become infix syntax, literals become typed
//! literal text carrying a display format and an estimated rendered
//! width, references become cell/range addresses. Literal handling lives
//! in an open dispatch table so host applications can extend the value
//! set.

pub mod escape;

use crate::dispatch::{Dispatch, TypeTag};
use crate::symbolic::{ops, Call, Expr};
use crate::value::Value;
use crate::{TabulaError, TabulaResult};
use chrono::{Datelike, Duration, Timelike};
use std::fmt;

/// A named display format: the tag names the format (it keys the
/// writer's format cache), the spec describes it to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatTag {
    pub name: &'static str,
    pub spec: FormatSpec,
}

/// Either one of the sink's built-in numeric formats (by index) or an
/// explicit format pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSpec {
    Indexed(u8),
    Pattern(&'static str),
}

/// Thousands separator, no decimals (`#,##0`).
pub const INT_FORMAT: FormatTag = FormatTag {
    name: "int_format",
    spec: FormatSpec::Indexed(3),
};

/// Thousands separator, two decimals (`#,##0.00`).
pub const DEC_FORMAT: FormatTag = FormatTag {
    name: "dec_format",
    spec: FormatSpec::Indexed(4),
};

pub const DATE_FORMAT: FormatTag = FormatTag {
    name: "date_format",
    spec: FormatSpec::Indexed(15),
};

pub const TIME_FORMAT: FormatTag = FormatTag {
    name: "time_format",
    spec: FormatSpec::Indexed(21),
};

pub const DATETIME_FORMAT: FormatTag = FormatTag {
    name: "datetime_format",
    spec: FormatSpec::Pattern("dd-mmm-yy hh:mm:ss"),
};

/// Compiled formula text plus display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaValue {
    pub text: String,
    pub format: Option<FormatTag>,
    pub estimated_width: Option<usize>,
    /// Whether the text must be parenthesized when nested inside another
    /// operator expression.
    pub needs_parenthesis: bool,
}

impl FormulaValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: None,
            estimated_width: None,
            needs_parenthesis: true,
        }
    }

    /// Self-delimiting text (a literal, an address, a function call).
    pub fn atom(text: impl Into<String>) -> Self {
        Self {
            needs_parenthesis: false,
            ..Self::new(text)
        }
    }

    pub fn with_format(mut self, format: FormatTag) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.estimated_width = Some(width);
        self
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_parenthesis {
            write!(f, "({})", self.text)
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// The result of compiling one cell: either formula text with metadata,
/// or plain text that flows through to the sink as-is (containers, null,
/// fallback values).
#[derive(Debug, Clone, PartialEq)]
pub enum Compiled {
    Text(String),
    Formula(FormulaValue),
}

impl Compiled {
    pub fn text(&self) -> &str {
        match self {
            Compiled::Text(s) => s,
            Compiled::Formula(f) => &f.text,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Compiled::Formula(_))
    }

    pub fn formula(&self) -> Option<&FormulaValue> {
        match self {
            Compiled::Formula(f) => Some(f),
            Compiled::Text(_) => None,
        }
    }
}

fn infix_operator(name: &str) -> Option<&'static str> {
    match name {
        ops::ADD => Some(" + "),
        ops::SUB => Some(" - "),
        ops::MUL => Some(" * "),
        ops::POW => Some("^"),
        ops::DIV | ops::FLOORDIV => Some(" / "),
        ops::EQ => Some(" = "),
        ops::NE => Some(" <> "),
        ops::LT => Some(" < "),
        ops::LE => Some(" <= "),
        ops::GT => Some(" > "),
        ops::GE => Some(" >= "),
        _ => None,
    }
}

/// Total seconds of a duration as decimal text.
pub(crate) fn duration_seconds(d: &Duration) -> String {
    let micros = d
        .num_microseconds()
        .unwrap_or_else(|| d.num_milliseconds().saturating_mul(1000));
    if micros % 1_000_000 == 0 {
        format!("{}", micros / 1_000_000)
    } else {
        format!("{}", micros as f64 / 1e6)
    }
}

/// Seconds-with-fraction text for a clock second and its nanoseconds.
fn seconds_text(second: u32, nanosecond: u32) -> String {
    let micros = nanosecond / 1_000;
    if micros == 0 {
        format!("{}", second)
    } else {
        format!("{}", second as f64 + micros as f64 / 1e6)
    }
}

fn mismatch(expected: &str, value: &Value) -> TabulaError {
    TabulaError::Engine(format!(
        "formula handler expected {}, got {}",
        expected,
        value.type_name()
    ))
}

/// Compiles expressions and literal values to spreadsheet formula text.
pub struct FormulaCompiler {
    literals: Dispatch<Value, Compiled>,
}

impl FormulaCompiler {
    /// A compiler with no literal handlers registered.
    pub fn empty() -> Self {
        Self {
            literals: Dispatch::new(),
        }
    }

    /// The standard literal-type table: booleans, integers, decimals,
    /// temporals, containers, null, references, and a text fallback.
    pub fn standard() -> TabulaResult<Self> {
        let mut compiler = Self::empty();

        compiler.register(&[TypeTag::Bool], |value| match value {
            Value::Bool(b) => Ok(Compiled::Formula(
                FormulaValue::atom(if *b { "TRUE" } else { "FALSE" })
                    .with_width(if *b { 4 } else { 5 }),
            )),
            other => Err(mismatch("bool", other)),
        })?;

        compiler.register(&[TypeTag::Int], |value| match value {
            Value::Int(n) => Ok(Compiled::Formula(
                FormulaValue::atom(n.to_string()).with_format(INT_FORMAT),
            )),
            other => Err(mismatch("int", other)),
        })?;

        compiler.register(&[TypeTag::Decimal], |value| match value {
            Value::Number(d) => Ok(Compiled::Formula(
                FormulaValue::atom(d.to_string()).with_format(DEC_FORMAT),
            )),
            other => Err(mismatch("decimal", other)),
        })?;

        compiler.register(&[TypeTag::Duration], |value| match value {
            Value::Duration(d) => Ok(Compiled::Formula(FormulaValue::new(format!(
                "TIME(0, 0, 0) + ({} / 86400) - TIME(0, 0, 0)",
                duration_seconds(d)
            )))),
            other => Err(mismatch("duration", other)),
        })?;

        compiler.register(&[TypeTag::DateTime], |value| match value {
            Value::DateTime(dt) => Ok(Compiled::Formula(
                FormulaValue::new(format!(
                    "DATE({}, {}, {}) + ({} * 3600 + {} * 60 + {}) / 86400",
                    dt.year(),
                    dt.month(),
                    dt.day(),
                    dt.hour(),
                    dt.minute(),
                    seconds_text(dt.second(), dt.nanosecond()),
                ))
                .with_format(DATETIME_FORMAT)
                .with_width(18),
            )),
            other => Err(mismatch("datetime", other)),
        })?;

        compiler.register(&[TypeTag::Date], |value| match value {
            Value::Date(d) => Ok(Compiled::Formula(
                FormulaValue::atom(format!("DATE({}, {}, {})", d.year(), d.month(), d.day()))
                    .with_format(DATE_FORMAT)
                    .with_width(9),
            )),
            other => Err(mismatch("date", other)),
        })?;

        compiler.register(&[TypeTag::Time], |value| match value {
            Value::Time(t) => {
                let fraction = (t.nanosecond() / 1_000) as f64 / 1e6;
                Ok(Compiled::Formula(
                    FormulaValue::atom(format!(
                        "TIME({}, {}, {}) + ({} / 86400)",
                        t.hour(),
                        t.minute(),
                        t.second(),
                        fraction,
                    ))
                    .with_format(TIME_FORMAT)
                    .with_width(8),
                ))
            }
            other => Err(mismatch("time", other)),
        })?;

        compiler.register(&[TypeTag::Collection], |value| match value {
            Value::List(items) => Ok(Compiled::Text(
                items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            )),
            Value::Map(_) => Ok(Compiled::Text(value.to_string())),
            other => Err(mismatch("collection", other)),
        })?;

        compiler.register(&[TypeTag::Null], |_| Ok(Compiled::Text(String::new())))?;

        compiler.register(&[TypeTag::Reference], |value| match value {
            Value::Reference(r) => Ok(Compiled::Formula(FormulaValue::atom(r.address()))),
            other => Err(mismatch("reference", other)),
        })?;

        compiler.register_default(|value| Ok(Compiled::Text(value.to_string())))?;

        Ok(compiler)
    }

    /// Register a literal handler for one or more type tags.
    pub fn register(
        &mut self,
        tags: &[TypeTag],
        handler: impl Fn(&Value) -> TabulaResult<Compiled> + Send + Sync + 'static,
    ) -> TabulaResult<()> {
        self.literals.register(tags, handler)
    }

    /// Register the fallback literal handler.
    pub fn register_default(
        &mut self,
        handler: impl Fn(&Value) -> TabulaResult<Compiled> + Send + Sync + 'static,
    ) -> TabulaResult<()> {
        self.literals.register_default(handler)
    }

    /// Compile an expression to a spreadsheet cell.
    pub fn compile(&self, expr: &Expr) -> TabulaResult<Compiled> {
        match expr {
            Expr::Literal(value) => self.literals.call(value),
            Expr::Symbol(symbol) => {
                Ok(Compiled::Formula(FormulaValue::atom(symbol.name())))
            }
            Expr::Call(call) => self.compile_call(call).map(Compiled::Formula),
            Expr::List(items) => Ok(Compiled::Text(
                items
                    .iter()
                    .map(|item| self.compile(item).map(|c| c.text().to_string()))
                    .collect::<TabulaResult<Vec<_>>>()?
                    .join(","),
            )),
            Expr::Map(_) => Ok(Compiled::Text(expr.to_string())),
        }
    }

    fn compile_call(&self, call: &Call) -> TabulaResult<FormulaValue> {
        if !call.kwargs.is_empty() {
            return Err(TabulaError::Engine(
                "keyword arguments are not supported in spreadsheet formulas".to_string(),
            ));
        }
        let name = match call.head.as_ref() {
            Expr::Symbol(symbol) => symbol.name().to_string(),
            other => self.compile(other)?.text().to_string(),
        };
        let mut parts = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            if let Some(text) = self.render_arg(arg)? {
                parts.push(text);
            }
        }
        match infix_operator(&name) {
            Some(op) => {
                let inner = parts.join(op);
                if name == ops::FLOORDIV {
                    Ok(FormulaValue::atom(format!("FLOOR({}, 1)", inner)))
                } else {
                    Ok(FormulaValue::new(inner))
                }
            }
            None => Ok(FormulaValue::atom(format!(
                "{}({})",
                name.to_uppercase(),
                parts.join(", ")
            ))),
        }
    }

    /// Render one operand: formulas are parenthesized when flagged,
    /// plain text is escaped, empty text (null) is omitted.
    fn render_arg(&self, arg: &Expr) -> TabulaResult<Option<String>> {
        match self.compile(arg)? {
            Compiled::Formula(f) => Ok(Some(if f.needs_parenthesis {
                format!("({})", f.text)
            } else {
                f.text
            })),
            Compiled::Text(s) => {
                if s.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(escape::escape(&s)))
                }
            }
        }
    }
}
