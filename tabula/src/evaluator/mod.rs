//! Generic expression evaluation
//!
//! Reduces an expression tree against a context. Unresolved symbols are
//! valid terminal values: evaluation under an empty context is the
//! identity, which is what makes partial evaluation and symbolic
//! round-tripping work.

pub mod context;
pub mod operations;

pub use context::{Builtins, Context, SymbolResolver};

use crate::symbolic::{Call, Expr};
use crate::value::Value;
use crate::{TabulaError, TabulaResult};

/// Evaluate an expression against a context.
///
/// - symbols resolve through the context's lookup chain and their
///   replacement is evaluated recursively (chained aliasing);
/// - calls evaluate head and arguments, then apply the head when it
///   reduced to a function and every argument reduced to a value;
/// - containers rebuild with each element (and mapping key) evaluated;
/// - everything else passes through unchanged.
pub fn evaluate(expr: &Expr, context: &Context) -> TabulaResult<Expr> {
    evaluate_at(expr, context, 0)
}

fn check_depth(context: &Context, depth: usize) -> TabulaResult<()> {
    let max = context.limits().max_expression_depth;
    if depth > max {
        return Err(TabulaError::Limit {
            limit: format!("max_expression_depth = {}", max),
            value: format!("expression nesting exceeds {}", max),
        });
    }
    Ok(())
}

fn evaluate_at(expr: &Expr, context: &Context, depth: usize) -> TabulaResult<Expr> {
    check_depth(context, depth)?;

    match expr {
        Expr::Literal(_) => Ok(expr.clone()),

        Expr::List(items) => items
            .iter()
            .map(|item| evaluate_at(item, context, depth + 1))
            .collect::<TabulaResult<Vec<_>>>()
            .map(Expr::List),

        Expr::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| {
                Ok((
                    evaluate_at(k, context, depth + 1)?,
                    evaluate_at(v, context, depth + 1)?,
                ))
            })
            .collect::<TabulaResult<Vec<_>>>()
            .map(Expr::Map),

        Expr::Symbol(symbol) => match context.lookup(symbol)? {
            Some(bound) => evaluate_at(&bound, context, depth + 1),
            None => Ok(expr.clone()),
        },

        Expr::Call(call) => {
            let head = evaluate_at(&call.head, context, depth + 1)?;
            let args = call
                .args
                .iter()
                .map(|arg| evaluate_at(arg, context, depth + 1))
                .collect::<TabulaResult<Vec<_>>>()?;
            let kwargs = call
                .kwargs
                .iter()
                .map(|(k, v)| Ok((k.clone(), evaluate_at(v, context, depth + 1)?)))
                .collect::<TabulaResult<Vec<_>>>()?;

            if let Expr::Literal(Value::Function(func)) = &head {
                let arg_values: Option<Vec<Value>> = args.iter().map(Expr::to_value).collect();
                let kwarg_values: Option<Vec<(String, Value)>> = kwargs
                    .iter()
                    .map(|(k, v)| v.to_value().map(|v| (k.clone(), v)))
                    .collect();
                if let (Some(arg_values), Some(kwarg_values)) = (arg_values, kwarg_values) {
                    return func.invoke(&arg_values, &kwarg_values).map(Expr::Literal);
                }
                // Some argument is still symbolic. Keep the original head
                // so the partially evaluated tree round-trips through a
                // later evaluation.
                return Ok(Expr::Call(Call {
                    head: call.head.clone(),
                    args,
                    kwargs,
                }));
            }

            if let Expr::Literal(value) = &head {
                return Err(TabulaError::Engine(format!(
                    "{} value is not callable",
                    value.type_name()
                )));
            }

            Ok(Expr::Call(Call {
                head: Box::new(head),
                args,
                kwargs,
            }))
        }
    }
}
