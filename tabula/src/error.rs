use std::fmt;

/// Error types for the tabula engine.
///
/// Every failure is fatal and propagates synchronously; nothing is
/// swallowed or retried inside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TabulaError {
    /// Misconfiguration detected at construction time: duplicate dispatch
    /// registration, duplicate default handler, empty column
    /// specification, duplicate frame or column names.
    Configuration(String),

    /// A symbol or reference could not be resolved. `choices` enumerates
    /// the legal alternatives when they are known, so misconfiguration is
    /// self-diagnosing.
    Resolution {
        message: String,
        choices: Vec<String>,
    },

    /// No handler registered for a type tag and no default available.
    DispatchExhausted(String),

    /// A resource limit was exceeded during evaluation.
    Limit { limit: String, value: String },

    /// Runtime error during evaluation: unsupported operand types,
    /// division by zero, malformed call shapes.
    Engine(String),
}

impl TabulaError {
    /// Create a resolution error for an unresolvable symbol, listing the
    /// names that would have resolved.
    pub fn unresolved(symbol: &str, choices: Vec<String>) -> Self {
        Self::Resolution {
            message: format!("symbol `{}` not found", symbol),
            choices,
        }
    }
}

impl fmt::Display for TabulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabulaError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            TabulaError::Resolution { message, choices } => {
                write!(f, "resolution error: {}", message)?;
                if !choices.is_empty() {
                    write!(f, ". Choices are: {}", choices.join(", "))?;
                }
                Ok(())
            }
            TabulaError::DispatchExhausted(tag) => {
                write!(f, "no handler registered for type {} and no default", tag)
            }
            TabulaError::Limit { limit, value } => {
                write!(f, "resource limit exceeded: {} (limit {})", value, limit)
            }
            TabulaError::Engine(msg) => write!(f, "engine error: {}", msg),
        }
    }
}

impl std::error::Error for TabulaError {}
