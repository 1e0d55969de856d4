//! Built-in operator semantics
//!
//! The default context: type-aware arithmetic, comparisons, bitwise
//! operators, conversions and the structural operators (`index`,
//! `slice`, `join`). Binary operators are exposed as n-ary left folds,
//! so `add(1, 2, 3)` is `(1 + 2) + 3`.

use crate::symbolic::ops;
use crate::value::{NativeFn, Value};
use crate::{TabulaError, TabulaResult};
use chrono::Duration;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

fn type_mismatch(op: &str, left: &Value, right: &Value) -> TabulaError {
    TabulaError::Engine(format!(
        "operation {} not supported for types {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(n) => Some(Decimal::from(*n)),
        Value::Number(d) => Some(*d),
        _ => None,
    }
}

fn decimal_arithmetic(left: Decimal, op: ArithmeticOp, right: Decimal) -> TabulaResult<Decimal> {
    match op {
        ArithmeticOp::Add => Ok(left + right),
        ArithmeticOp::Sub => Ok(left - right),
        ArithmeticOp::Mul => Ok(left * right),
        ArithmeticOp::Div => {
            if right == Decimal::ZERO {
                return Err(TabulaError::Engine("division by zero".to_string()));
            }
            Ok(left / right)
        }
        ArithmeticOp::FloorDiv => {
            if right == Decimal::ZERO {
                return Err(TabulaError::Engine("division by zero".to_string()));
            }
            Ok((left / right).floor())
        }
        ArithmeticOp::Mod => {
            if right == Decimal::ZERO {
                return Err(TabulaError::Engine("division by zero".to_string()));
            }
            Ok(left % right)
        }
        ArithmeticOp::Pow => {
            let (l, r) = match (left.to_f64(), right.to_f64()) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(TabulaError::Engine(
                        "exponentiation operands out of range".to_string(),
                    ))
                }
            };
            Decimal::from_f64(l.powf(r)).ok_or_else(|| {
                TabulaError::Engine("exponentiation result out of range".to_string())
            })
        }
    }
}

fn int_arithmetic(left: i64, op: ArithmeticOp, right: i64) -> TabulaResult<Value> {
    let overflow = || TabulaError::Engine("integer overflow".to_string());
    match op {
        ArithmeticOp::Add => left.checked_add(right).map(Value::Int).ok_or_else(overflow),
        ArithmeticOp::Sub => left.checked_sub(right).map(Value::Int).ok_or_else(overflow),
        ArithmeticOp::Mul => left.checked_mul(right).map(Value::Int).ok_or_else(overflow),
        // True division of integers produces a decimal.
        ArithmeticOp::Div => {
            decimal_arithmetic(Decimal::from(left), op, Decimal::from(right)).map(Value::Number)
        }
        ArithmeticOp::FloorDiv => {
            if right == 0 {
                return Err(TabulaError::Engine("division by zero".to_string()));
            }
            left.checked_div_euclid(right)
                .map(Value::Int)
                .ok_or_else(overflow)
        }
        ArithmeticOp::Mod => {
            if right == 0 {
                return Err(TabulaError::Engine("division by zero".to_string()));
            }
            left.checked_rem_euclid(right)
                .map(Value::Int)
                .ok_or_else(overflow)
        }
        ArithmeticOp::Pow => {
            if (0..=u32::MAX as i64).contains(&right) {
                left.checked_pow(right as u32)
                    .map(Value::Int)
                    .ok_or_else(overflow)
            } else {
                decimal_arithmetic(Decimal::from(left), op, Decimal::from(right)).map(Value::Number)
            }
        }
    }
}

fn scale_duration(d: &Duration, factor: &Value) -> Option<Duration> {
    let micros = d.num_microseconds()?;
    let scaled = match factor {
        Value::Int(n) => micros.checked_mul(*n)?,
        Value::Number(dec) => (Decimal::from(micros) * dec).trunc().to_i64()?,
        _ => return None,
    };
    Some(Duration::microseconds(scaled))
}

/// Type-aware binary arithmetic.
fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> TabulaResult<Value> {
    use ArithmeticOp::*;
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => int_arithmetic(*l, op, *r),

        (Value::Text(l), Value::Text(r)) if op == Add => {
            Ok(Value::Text(format!("{}{}", l, r)))
        }

        (Value::List(l), Value::List(r)) if op == Add => {
            let mut joined = l.clone();
            joined.extend(r.iter().cloned());
            Ok(Value::List(joined))
        }

        // Date/time arithmetic with durations.
        (Value::Date(d), Value::Duration(dur)) if op == Add => Ok(Value::Date(*d + *dur)),
        (Value::Date(d), Value::Duration(dur)) if op == Sub => Ok(Value::Date(*d - *dur)),
        (Value::Duration(dur), Value::Date(d)) if op == Add => Ok(Value::Date(*d + *dur)),
        (Value::DateTime(d), Value::Duration(dur)) if op == Add => Ok(Value::DateTime(*d + *dur)),
        (Value::DateTime(d), Value::Duration(dur)) if op == Sub => Ok(Value::DateTime(*d - *dur)),
        (Value::Duration(dur), Value::DateTime(d)) if op == Add => Ok(Value::DateTime(*d + *dur)),
        (Value::Time(t), Value::Duration(dur)) if op == Add => Ok(Value::Time(*t + *dur)),
        (Value::Time(t), Value::Duration(dur)) if op == Sub => Ok(Value::Time(*t - *dur)),
        (Value::Date(l), Value::Date(r)) if op == Sub => Ok(Value::Duration(*l - *r)),
        (Value::DateTime(l), Value::DateTime(r)) if op == Sub => Ok(Value::Duration(*l - *r)),
        (Value::Time(l), Value::Time(r)) if op == Sub => Ok(Value::Duration(*l - *r)),
        (Value::Duration(l), Value::Duration(r)) if op == Add => Ok(Value::Duration(*l + *r)),
        (Value::Duration(l), Value::Duration(r)) if op == Sub => Ok(Value::Duration(*l - *r)),
        (Value::Duration(d), n @ (Value::Int(_) | Value::Number(_))) if op == Mul => {
            scale_duration(d, n)
                .map(Value::Duration)
                .ok_or_else(|| TabulaError::Engine("duration out of range".to_string()))
        }
        (n @ (Value::Int(_) | Value::Number(_)), Value::Duration(d)) if op == Mul => {
            scale_duration(d, n)
                .map(Value::Duration)
                .ok_or_else(|| TabulaError::Engine("duration out of range".to_string()))
        }

        _ => match (as_decimal(left), as_decimal(right)) {
            (Some(l), Some(r)) => decimal_arithmetic(l, op, r).map(Value::Number),
            _ => Err(type_mismatch(op_name(op), left, right)),
        },
    }
}

fn op_name(op: ArithmeticOp) -> &'static str {
    match op {
        ArithmeticOp::Add => ops::ADD,
        ArithmeticOp::Sub => ops::SUB,
        ArithmeticOp::Mul => ops::MUL,
        ArithmeticOp::Div => ops::DIV,
        ArithmeticOp::FloorDiv => ops::FLOORDIV,
        ArithmeticOp::Mod => ops::MOD,
        ArithmeticOp::Pow => ops::POW,
    }
}

/// Total ordering between comparable values.
fn ordering(op: &str, left: &Value, right: &Value) -> TabulaResult<Ordering> {
    if let (Some(l), Some(r)) = (as_decimal(left), as_decimal(right)) {
        return Ok(l.cmp(&r));
    }
    match (left, right) {
        (Value::Text(l), Value::Text(r)) => Ok(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Ok(l.cmp(r)),
        (Value::Date(l), Value::Date(r)) => Ok(l.cmp(r)),
        (Value::Time(l), Value::Time(r)) => Ok(l.cmp(r)),
        (Value::DateTime(l), Value::DateTime(r)) => Ok(l.cmp(r)),
        (Value::Duration(l), Value::Duration(r)) => Ok(l.cmp(r)),
        _ => Err(type_mismatch(op, left, right)),
    }
}

fn logical(op: &str, left: &Value, right: &Value) -> TabulaResult<Value> {
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(match op {
            ops::AND => *l && *r,
            ops::OR => *l || *r,
            _ => *l ^ *r,
        })),
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(match op {
            ops::AND => l & r,
            ops::OR => l | r,
            _ => l ^ r,
        })),
        _ => Err(type_mismatch(op, left, right)),
    }
}

fn shift(op: &str, left: &Value, right: &Value) -> TabulaResult<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => {
            if !(0..64).contains(r) {
                return Err(TabulaError::Engine(format!(
                    "shift amount {} out of range",
                    r
                )));
            }
            Ok(Value::Int(if op == ops::LSHIFT {
                l << r
            } else {
                l >> r
            }))
        }
        _ => Err(type_mismatch(op, left, right)),
    }
}

/// Normalize a possibly negative index against a length; `None` when out
/// of range.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    if (0..len).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

/// Clamp a slice bound the way Python does: negative counts from the
/// end, anything past the end stops there.
fn clamp_bound(bound: i64, len: usize) -> usize {
    let len = len as i64;
    let bound = if bound < 0 { len + bound } else { bound };
    bound.clamp(0, len) as usize
}

fn index_value(container: &Value, key: &Value) -> TabulaResult<Value> {
    match (container, key) {
        (Value::List(items), Value::Int(i)) => normalize_index(*i, items.len())
            .map(|i| items[i].clone())
            .ok_or_else(|| {
                TabulaError::Engine(format!("list index {} out of range", i))
            }),
        (Value::Text(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            normalize_index(*i, chars.len())
                .map(|i| Value::Text(chars[i].to_string()))
                .ok_or_else(|| {
                    TabulaError::Engine(format!("text index {} out of range", i))
                })
        }
        (Value::Map(pairs), key) => pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| TabulaError::Engine(format!("key {} not found in map", key))),
        (Value::Reference(r), key) => r.index(key).map(Value::Reference),
        (Value::Workbook(wb), Value::Text(name)) => wb.table(name).map(Value::Reference),
        _ => Err(type_mismatch(ops::INDEX, container, key)),
    }
}

fn slice_value(container: &Value, start: &Value, stop: &Value) -> TabulaResult<Value> {
    let (start, stop) = match (start, stop) {
        (Value::Int(a), Value::Int(b)) => (*a, *b),
        _ => {
            return Err(TabulaError::Engine(
                "slice bounds must be integers".to_string(),
            ))
        }
    };
    match container {
        Value::List(items) => {
            let from = clamp_bound(start, items.len());
            let to = clamp_bound(stop, items.len()).max(from);
            Ok(Value::List(items[from..to].to_vec()))
        }
        Value::Text(s) => {
            let chars: Vec<char> = s.chars().collect();
            let from = clamp_bound(start, chars.len());
            let to = clamp_bound(stop, chars.len()).max(from);
            Ok(Value::Text(chars[from..to].iter().collect()))
        }
        _ => Err(TabulaError::Engine(format!(
            "{} value cannot be sliced",
            container.type_name()
        ))),
    }
}

fn join_value(separator: &Value, items: &Value) -> TabulaResult<Value> {
    match (separator, items) {
        (Value::Text(sep), Value::List(items)) => Ok(Value::Text(
            items
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(sep),
        )),
        _ => Err(type_mismatch(ops::JOIN, separator, items)),
    }
}

fn unary(name: &'static str, value: &Value) -> TabulaResult<Value> {
    match (name, value) {
        (ops::NEG, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| TabulaError::Engine("integer overflow".to_string())),
        (ops::NEG, Value::Number(d)) => Ok(Value::Number(-d)),
        (ops::NEG, Value::Duration(d)) => Ok(Value::Duration(-*d)),
        (ops::ABS, Value::Int(n)) => Ok(Value::Int(n.abs())),
        (ops::ABS, Value::Number(d)) => Ok(Value::Number(d.abs())),
        (ops::ABS, Value::Duration(d)) => Ok(Value::Duration(if *d < Duration::zero() {
            -*d
        } else {
            *d
        })),
        (ops::NOT, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (ops::NOT, Value::Int(n)) => Ok(Value::Int(!n)),
        (ops::INT, Value::Int(n)) => Ok(Value::Int(*n)),
        (ops::INT, Value::Number(d)) => d
            .trunc()
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| TabulaError::Engine("number out of integer range".to_string())),
        (ops::INT, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (ops::INT, Value::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| TabulaError::Engine(format!("invalid integer text: {:?}", s))),
        (ops::NUMBER, Value::Number(d)) => Ok(Value::Number(*d)),
        (ops::NUMBER, Value::Int(n)) => Ok(Value::Number(Decimal::from(*n))),
        (ops::NUMBER, Value::Text(s)) => s
            .trim()
            .parse::<Decimal>()
            .map(Value::Number)
            .map_err(|_| TabulaError::Engine(format!("invalid number text: {:?}", s))),
        _ => Err(TabulaError::Engine(format!(
            "operation {} not supported for type {}",
            name,
            value.type_name()
        ))),
    }
}

fn require_arity(name: &str, args: &[Value], arity: usize) -> TabulaResult<()> {
    if args.len() != arity {
        return Err(TabulaError::Engine(format!(
            "operator {} expects {} arguments, got {}",
            name,
            arity,
            args.len()
        )));
    }
    Ok(())
}

/// Left-fold a binary operation over two or more arguments.
fn fold(
    name: &'static str,
    f: impl Fn(&Value, &Value) -> TabulaResult<Value> + Send + Sync + 'static,
) -> NativeFn {
    NativeFn::positional(name, move |args| {
        if args.len() < 2 {
            return Err(TabulaError::Engine(format!(
                "operator {} expects at least 2 arguments, got {}",
                name,
                args.len()
            )));
        }
        let mut acc = args[0].clone();
        for arg in &args[1..] {
            acc = f(&acc, arg)?;
        }
        Ok(acc)
    })
}

fn comparison(name: &'static str, keep: impl Fn(Ordering) -> bool + Send + Sync + 'static) -> NativeFn {
    NativeFn::positional(name, move |args| {
        require_arity(name, args, 2)?;
        ordering(name, &args[0], &args[1]).map(|o| Value::Bool(keep(o)))
    })
}

fn unary_op(name: &'static str) -> NativeFn {
    NativeFn::positional(name, move |args| {
        require_arity(name, args, 1)?;
        unary(name, &args[0])
    })
}

fn index_op() -> NativeFn {
    NativeFn::positional(ops::INDEX, |args| {
        require_arity(ops::INDEX, args, 2)?;
        index_value(&args[0], &args[1])
    })
}

fn slice_op() -> NativeFn {
    NativeFn::positional(ops::SLICE, |args| {
        require_arity(ops::SLICE, args, 3)?;
        slice_value(&args[0], &args[1], &args[2])
    })
}

/// The full built-in operator table.
pub(crate) fn default_table() -> &'static HashMap<&'static str, NativeFn> {
    static TABLE: OnceLock<HashMap<&'static str, NativeFn>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        for (name, op) in [
            (ops::ADD, ArithmeticOp::Add),
            (ops::SUB, ArithmeticOp::Sub),
            (ops::MUL, ArithmeticOp::Mul),
            (ops::DIV, ArithmeticOp::Div),
            (ops::FLOORDIV, ArithmeticOp::FloorDiv),
            (ops::MOD, ArithmeticOp::Mod),
            (ops::POW, ArithmeticOp::Pow),
        ] {
            table.insert(name, fold(name, move |l, r| arithmetic(op, l, r)));
        }
        table.insert(ops::EQ, {
            NativeFn::positional(ops::EQ, |args| {
                require_arity(ops::EQ, args, 2)?;
                Ok(Value::Bool(args[0] == args[1]))
            })
        });
        table.insert(ops::NE, {
            NativeFn::positional(ops::NE, |args| {
                require_arity(ops::NE, args, 2)?;
                Ok(Value::Bool(args[0] != args[1]))
            })
        });
        table.insert(ops::LT, comparison(ops::LT, |o| o == Ordering::Less));
        table.insert(ops::LE, comparison(ops::LE, |o| o != Ordering::Greater));
        table.insert(ops::GT, comparison(ops::GT, |o| o == Ordering::Greater));
        table.insert(ops::GE, comparison(ops::GE, |o| o != Ordering::Less));
        for name in [ops::AND, ops::OR, ops::XOR] {
            table.insert(name, fold(name, move |l, r| logical(name, l, r)));
        }
        for name in [ops::LSHIFT, ops::RSHIFT] {
            table.insert(name, fold(name, move |l, r| shift(name, l, r)));
        }
        for name in [ops::NEG, ops::ABS, ops::NOT, ops::INT, ops::NUMBER] {
            table.insert(name, unary_op(name));
        }
        table.insert(ops::INDEX, index_op());
        table.insert(ops::SLICE, slice_op());
        table.insert(ops::JOIN, {
            NativeFn::positional(ops::JOIN, |args| {
                require_arity(ops::JOIN, args, 2)?;
                join_value(&args[0], &args[1])
            })
        });
        table
    })
}

/// The structural subset used by formula-mode evaluation: reference and
/// container indexing reduces, everything else stays symbolic.
pub(crate) fn structural_table() -> &'static HashMap<&'static str, NativeFn> {
    static TABLE: OnceLock<HashMap<&'static str, NativeFn>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        table.insert(ops::INDEX, index_op());
        table.insert(ops::SLICE, slice_op());
        table
    })
}
