//! Type-directed dispatch
//!
//! An open registry mapping a type tag to a handler, with an optional
//! default. Resolution walks the tag's category ancestry (most specific
//! first), so a handler registered for `Number` covers both `Int` and
//! `Decimal` unless a more specific handler exists. The formula compiler
//! keeps its literal handlers in one of these tables so host applications
//! can extend the value-type set.

use crate::{TabulaError, TabulaResult};
use std::collections::HashMap;

/// Tag identifying the runtime type of a value, plus the category tags
/// (`Number`, `Temporal`, `Collection`) usable as coarser registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Decimal,
    Number,
    Text,
    Date,
    Time,
    DateTime,
    Duration,
    Temporal,
    List,
    Map,
    Collection,
    Function,
    Reference,
    Workbook,
}

impl TypeTag {
    /// The next, less specific tag in this tag's ancestry, if any.
    pub fn parent(self) -> Option<TypeTag> {
        match self {
            TypeTag::Int | TypeTag::Decimal => Some(TypeTag::Number),
            TypeTag::Date | TypeTag::Time | TypeTag::DateTime | TypeTag::Duration => {
                Some(TypeTag::Temporal)
            }
            TypeTag::List | TypeTag::Map => Some(TypeTag::Collection),
            _ => None,
        }
    }

    /// The tag's ancestry chain, most specific first.
    pub fn ancestry(self) -> impl Iterator<Item = TypeTag> {
        std::iter::successors(Some(self), |tag| tag.parent())
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Decimal => "decimal",
            TypeTag::Number => "number",
            TypeTag::Text => "text",
            TypeTag::Date => "date",
            TypeTag::Time => "time",
            TypeTag::DateTime => "datetime",
            TypeTag::Duration => "duration",
            TypeTag::Temporal => "temporal",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Collection => "collection",
            TypeTag::Function => "function",
            TypeTag::Reference => "reference",
            TypeTag::Workbook => "workbook",
        }
    }
}

/// Implemented by values that carry a runtime type tag.
pub trait Tagged {
    fn tag(&self) -> TypeTag;
}

pub type Handler<T, R> = Box<dyn Fn(&T) -> TabulaResult<R> + Send + Sync>;

/// A type → handler registry with ancestry-aware lookup.
pub struct Dispatch<T: ?Sized, R> {
    handlers: HashMap<TypeTag, Handler<T, R>>,
    default: Option<Handler<T, R>>,
}

impl<T: ?Sized, R> Default for Dispatch<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, R> Dispatch<T, R> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            default: None,
        }
    }

    /// Register a handler for one or more tags.
    ///
    /// A tag may be registered at most once per table; re-registration is
    /// a configuration error.
    pub fn register(
        &mut self,
        tags: &[TypeTag],
        handler: impl Fn(&T) -> TabulaResult<R> + Send + Sync + 'static,
    ) -> TabulaResult<()>
    where
        T: 'static,
        R: 'static,
    {
        for tag in tags {
            if self.handlers.contains_key(tag) {
                return Err(TabulaError::Configuration(format!(
                    "duplicate handler registration for type {}",
                    tag.name()
                )));
            }
        }
        let handler: Handler<T, R> = Box::new(handler);
        match tags {
            [] => {
                return Err(TabulaError::Configuration(
                    "handler registered without any type".to_string(),
                ))
            }
            [tag] => {
                self.handlers.insert(*tag, handler);
            }
            _ => {
                // Multiple tags share one implementation behind an Arc.
                let shared = std::sync::Arc::new(handler);
                for tag in tags {
                    let shared = shared.clone();
                    self.handlers
                        .insert(*tag, Box::new(move |value| (shared)(value)));
                }
            }
        }
        Ok(())
    }

    /// Register the fallback handler used when no tag matches.
    pub fn register_default(
        &mut self,
        handler: impl Fn(&T) -> TabulaResult<R> + Send + Sync + 'static,
    ) -> TabulaResult<()> {
        if self.default.is_some() {
            return Err(TabulaError::Configuration(
                "dispatch table already has a default handler".to_string(),
            ));
        }
        self.default = Some(Box::new(handler));
        Ok(())
    }

    /// Find the most specific handler for a tag by walking its ancestry,
    /// falling back to the default.
    pub fn resolve(&self, tag: TypeTag) -> TabulaResult<&Handler<T, R>> {
        for candidate in tag.ancestry() {
            if let Some(handler) = self.handlers.get(&candidate) {
                return Ok(handler);
            }
        }
        self.default
            .as_ref()
            .ok_or_else(|| TabulaError::DispatchExhausted(tag.name().to_string()))
    }

    /// Resolve and invoke in one step.
    pub fn call(&self, value: &T) -> TabulaResult<R>
    where
        T: Tagged,
    {
        self.resolve(value.tag())?(value)
    }
}
