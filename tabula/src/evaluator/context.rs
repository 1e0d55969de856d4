//! Evaluation context
//!
//! Name bindings plus the lookup chain used to resolve symbols. The
//! built-in operator table is consulted *behind* the caller's bindings at
//! lookup time; it is never merged into a caller-owned map, so reusing a
//! context across calls can never observe leftover defaults.

use super::operations;
use crate::limits::EvalLimits;
use crate::symbolic::{Expr, Symbol};
use crate::value::{NativeFn, Value};
use crate::TabulaResult;
use std::collections::HashMap;

/// Fallback resolution hook, consulted after bindings and builtins.
///
/// `Ok(None)` leaves the symbol unresolved (a valid terminal value);
/// `Err` aborts evaluation, which is how the tabular model surfaces
/// unknown column names together with the legal choices.
pub trait SymbolResolver {
    fn resolve(&self, symbol: &Symbol) -> TabulaResult<Option<Expr>>;
}

/// Which built-in operator table a context exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtins {
    /// The full operator table: arithmetic, comparisons, bitwise,
    /// conversions, `index`/`slice`/`join`.
    Full,
    /// Only the structural operators (`index`, `slice`), so reference
    /// specialization reduces while arithmetic stays symbolic. Used by
    /// formula-mode rendering.
    Structural,
    /// No builtins at all.
    Disabled,
}

/// A name → expression mapping used to resolve symbols during
/// evaluation.
pub struct Context<'a> {
    bindings: HashMap<String, Expr>,
    resolver: Option<&'a dyn SymbolResolver>,
    builtins: Builtins,
    limits: EvalLimits,
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Context<'a> {
    /// A context with the full built-in operator table and no bindings.
    pub fn new() -> Self {
        Self::with_builtins(Builtins::Full)
    }

    /// A context exposing only the structural builtins.
    pub fn structural() -> Self {
        Self::with_builtins(Builtins::Structural)
    }

    /// A context with no built-in operators.
    pub fn bare() -> Self {
        Self::with_builtins(Builtins::Disabled)
    }

    fn with_builtins(builtins: Builtins) -> Self {
        Self {
            bindings: HashMap::new(),
            resolver: None,
            builtins,
            limits: EvalLimits::default(),
        }
    }

    /// Bind a name to an expression. Bindings shadow built-in operators.
    pub fn bind(mut self, name: impl Into<String>, expr: impl Into<Expr>) -> Self {
        self.bindings.insert(name.into(), expr.into());
        self
    }

    /// Bind a name to a positional host function.
    pub fn bind_fn(
        self,
        name: &str,
        f: impl Fn(&[Value]) -> TabulaResult<Value> + Send + Sync + 'static,
    ) -> Self {
        let func = NativeFn::positional(name, f);
        self.bind(name, Expr::Literal(Value::Function(func)))
    }

    pub fn with_resolver(mut self, resolver: &'a dyn SymbolResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }

    /// Resolve a symbol through bindings, then builtins, then the
    /// fallback resolver. `Ok(None)` means the symbol stays unresolved.
    pub(crate) fn lookup(&self, symbol: &Symbol) -> TabulaResult<Option<Expr>> {
        if let Some(bound) = self.bindings.get(symbol.name()) {
            return Ok(Some(bound.clone()));
        }
        let table = match self.builtins {
            Builtins::Full => Some(operations::default_table()),
            Builtins::Structural => Some(operations::structural_table()),
            Builtins::Disabled => None,
        };
        if let Some(func) = table.and_then(|t| t.get(symbol.name())) {
            return Ok(Some(Expr::Literal(Value::Function(func.clone()))));
        }
        match self.resolver {
            Some(resolver) => resolver.resolve(symbol),
            None => Ok(None),
        }
    }
}
