//! Symbolic expressions
//!
//! Immutable expression trees: a free variable (`Symbol`), a deferred
//! call (`Call`), container literals, or a concrete `Value`. Expressions
//! are built with explicit builder methods (`add`, `index`, `call`, …);
//! every builder returns a new tree and never materializes a value.

use crate::value::Value;
use std::fmt;

/// Names of the built-in operators, shared between the expression
/// builders, the evaluator's default table and the formula renderer.
pub mod ops {
    pub const ADD: &str = "add";
    pub const SUB: &str = "sub";
    pub const MUL: &str = "mul";
    pub const DIV: &str = "div";
    pub const FLOORDIV: &str = "floordiv";
    pub const MOD: &str = "mod";
    pub const POW: &str = "pow";
    pub const NEG: &str = "neg";
    pub const ABS: &str = "abs";
    pub const NOT: &str = "not";
    pub const EQ: &str = "eq";
    pub const NE: &str = "ne";
    pub const LT: &str = "lt";
    pub const LE: &str = "le";
    pub const GT: &str = "gt";
    pub const GE: &str = "ge";
    pub const AND: &str = "and";
    pub const OR: &str = "or";
    pub const XOR: &str = "xor";
    pub const LSHIFT: &str = "lshift";
    pub const RSHIFT: &str = "rshift";
    pub const INT: &str = "int";
    pub const NUMBER: &str = "number";
    pub const INDEX: &str = "index";
    pub const SLICE: &str = "slice";
    pub const JOIN: &str = "join";
}

/// A named placeholder, resolved against a context during evaluation.
/// Equality and hashing are by name; a symbol is not owned by any
/// context and the same name may appear in many expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred application of a head to arguments. The head may itself be
/// a symbol, another call, or a literal function value. Keyword argument
/// keys are unique; rebinding a key replaces the earlier entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub head: Box<Expr>,
    pub args: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
}

impl Call {
    pub fn new(head: Expr, args: Vec<Expr>) -> Self {
        Self {
            head: Box::new(head),
            args,
            kwargs: Vec::new(),
        }
    }
}

/// An immutable expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Symbol(Symbol),
    Call(Call),
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
}

/// Create a symbol expression. Replaces the original's attribute-style
/// factory with an explicit constructor.
pub fn symbol(name: impl Into<String>) -> Expr {
    Expr::Symbol(Symbol::new(name))
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn list(items: Vec<Expr>) -> Expr {
        Expr::List(items)
    }

    pub fn map(pairs: Vec<(Expr, Expr)>) -> Expr {
        Expr::Map(pairs)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expr::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Convert a fully reduced expression into a concrete value.
    /// Container nodes convert element-wise; returns `None` as soon as an
    /// unresolved symbol or call remains.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Expr::Literal(v) => Some(v.clone()),
            Expr::List(items) => items
                .iter()
                .map(Expr::to_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            Expr::Map(pairs) => pairs
                .iter()
                .map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
                .collect::<Option<Vec<_>>>()
                .map(Value::Map),
            Expr::Symbol(_) | Expr::Call(_) => None,
        }
    }

    /// Interpret a mapping or sequence node as an ordered record.
    /// Sequences receive positional field names `f0`, `f1`, … .
    pub fn record_fields(&self) -> Option<Vec<(String, Expr)>> {
        match self {
            Expr::Map(pairs) => Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ),
            Expr::List(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("f{}", i), v.clone()))
                    .collect(),
            ),
            Expr::Literal(Value::Map(pairs)) => Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), Expr::Literal(v.clone())))
                    .collect(),
            ),
            Expr::Literal(Value::List(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("f{}", i), Expr::Literal(v.clone())))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn unary(op: &str, operand: Expr) -> Expr {
        Expr::Call(Call::new(symbol(op), vec![operand]))
    }

    fn binary(op: &str, left: Expr, right: Expr) -> Expr {
        Expr::Call(Call::new(symbol(op), vec![left, right]))
    }

    pub fn add(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::ADD, self, other.into())
    }

    pub fn sub(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::SUB, self, other.into())
    }

    pub fn mul(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::MUL, self, other.into())
    }

    pub fn div(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::DIV, self, other.into())
    }

    pub fn floor_div(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::FLOORDIV, self, other.into())
    }

    pub fn rem(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::MOD, self, other.into())
    }

    pub fn pow(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::POW, self, other.into())
    }

    pub fn neg(self) -> Expr {
        Expr::unary(ops::NEG, self)
    }

    pub fn abs(self) -> Expr {
        Expr::unary(ops::ABS, self)
    }

    pub fn not(self) -> Expr {
        Expr::unary(ops::NOT, self)
    }

    pub fn equals(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::EQ, self, other.into())
    }

    pub fn not_equals(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::NE, self, other.into())
    }

    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::LT, self, other.into())
    }

    pub fn le(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::LE, self, other.into())
    }

    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::GT, self, other.into())
    }

    pub fn ge(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::GE, self, other.into())
    }

    pub fn and(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::AND, self, other.into())
    }

    pub fn or(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::OR, self, other.into())
    }

    pub fn xor(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(ops::XOR, self, other.into())
    }

    /// Apply this expression to positional arguments.
    pub fn call(self, args: Vec<Expr>) -> Expr {
        Expr::Call(Call::new(self, args))
    }

    /// Apply with positional and keyword arguments. Duplicate keyword
    /// keys keep the last binding (mapping semantics).
    pub fn call_with(self, args: Vec<Expr>, kwargs: Vec<(String, Expr)>) -> Expr {
        let mut unique: Vec<(String, Expr)> = Vec::with_capacity(kwargs.len());
        for (key, value) in kwargs {
            if let Some(existing) = unique.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                unique.push((key, value));
            }
        }
        let mut call = Call::new(self, args);
        call.kwargs = unique;
        Expr::Call(call)
    }

    /// Build a method-style call: `recv.method(name, args)` becomes
    /// `name(recv, args…)`, resolved like any other head symbol.
    pub fn method(self, name: impl Into<String>, mut args: Vec<Expr>) -> Expr {
        let mut all = vec![self];
        all.append(&mut args);
        Expr::Call(Call::new(symbol(name), all))
    }

    /// Index by key or position: `x.index(k)` is `x[k]`.
    pub fn index(self, key: impl Into<Expr>) -> Expr {
        Expr::binary(ops::INDEX, self, key.into())
    }

    /// Half-open slice: `x.slice(2, 3)` is `x[2..3]`.
    pub fn slice(self, start: impl Into<Expr>, stop: impl Into<Expr>) -> Expr {
        Expr::Call(Call::new(
            symbol(ops::SLICE),
            vec![self, start.into(), stop.into()],
        ))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::Call(call) => {
                write!(f, "{}(", call.head)?;
                let mut first = true;
                for arg in &call.args {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", arg)?;
                }
                for (key, value) in &call.kwargs {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{} = {}", key, value)?;
                }
                write!(f, ")")
            }
            Expr::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expr::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        Expr::Symbol(s)
    }
}

macro_rules! impl_literal_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Literal(Value::from(v))
                }
            }
        )+
    };
}

impl_literal_from!(
    bool,
    i32,
    i64,
    usize,
    rust_decimal::Decimal,
    &str,
    String,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::Duration,
);
