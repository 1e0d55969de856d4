//! Runtime values
//!
//! The closed set of concrete values an expression can reduce to. Numbers
//! follow the engine-wide convention: `Int` for integers (rendered with the
//! integer display format) and `Number` (a `Decimal`) for everything else.

use crate::dispatch::{Tagged, TypeTag};
use crate::frame::address::{SheetRef, WorkbookRef};
use crate::TabulaResult;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::ser::{Error as SerError, SerializeMap, SerializeSeq};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

type NativeImpl = dyn Fn(&[Value], &[(String, Value)]) -> TabulaResult<Value> + Send + Sync;

/// A host function bound into an evaluation context.
///
/// Equality is by identity (two bindings of the same closure compare
/// equal, two distinct closures never do), which keeps structural
/// equality on expressions meaningful.
#[derive(Clone)]
pub struct NativeFn {
    name: String,
    f: Arc<NativeImpl>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&[Value], &[(String, Value)]) -> TabulaResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Wrap a positional-only function, ignoring the keyword channel.
    pub fn positional(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> TabulaResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move |args, _kwargs| f(args))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, args: &[Value], kwargs: &[(String, Value)]) -> TabulaResult<Value> {
        (self.f)(args, kwargs)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// A concrete runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Number(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Duration(Duration),
    List(Vec<Value>),
    /// Ordered mapping; key order is preserved through evaluation.
    Map(Vec<(Value, Value)>),
    Function(NativeFn),
    Reference(SheetRef),
    Workbook(WorkbookRef),
}

impl Value {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }
}

impl Tagged for Value {
    fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Number(_) => TypeTag::Decimal,
            Value::Text(_) => TypeTag::Text,
            Value::Date(_) => TypeTag::Date,
            Value::Time(_) => TypeTag::Time,
            Value::DateTime(_) => TypeTag::DateTime,
            Value::Duration(_) => TypeTag::Duration,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
            Value::Function(_) => TypeTag::Function,
            Value::Reference(_) => TypeTag::Reference,
            Value::Workbook(_) => TypeTag::Workbook,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Number(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::Duration(d) => write!(f, "{}s", crate::formula::duration_seconds(d)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<{}>", func.name()),
            Value::Reference(r) => write!(f, "{}", r.address()),
            Value::Workbook(_) => write!(f, "<workbook>"),
        }
    }
}

/// Serialization covers the data variants; native functions and workbook
/// handles refuse, since they have no wire representation. References
/// serialize as their address text.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Number(d) => serde::Serialize::serialize(d, serializer),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
                serializer.collect_str(self)
            }
            Value::Duration(d) => {
                serializer.serialize_str(&crate::formula::duration_seconds(d))
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
            Value::Function(func) => Err(S::Error::custom(format!(
                "native function {} cannot be serialized",
                func.name()
            ))),
            Value::Reference(r) => serializer.serialize_str(&r.address()),
            Value::Workbook(_) => {
                Err(S::Error::custom("workbook references cannot be serialized"))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<NativeFn> for Value {
    fn from(v: NativeFn) -> Self {
        Value::Function(v)
    }
}

impl From<SheetRef> for Value {
    fn from(v: SheetRef) -> Self {
        Value::Reference(v)
    }
}
