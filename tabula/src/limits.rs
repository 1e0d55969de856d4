/// Resource limits for expression evaluation.
///
/// Evaluation re-walks expression trees recursively; the depth limit
/// turns runaway recursion (e.g. a column whose cells reference the
/// whole table that contains them) into an error instead of a stack
/// overflow.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalLimits {
    /// Maximum expression nesting depth during evaluation.
    /// Real usage: ~5 levels. Limit: 128.
    pub max_expression_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_expression_depth: 128,
        }
    }
}

impl EvalLimits {
    pub fn new() -> Self {
        Self::default()
    }
}
