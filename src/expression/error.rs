//! Error types for the expression module

use thiserror::Error;

/// Result type for expression parsing and evaluation
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Errors raised while parsing or evaluating a distribution formula
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    /// The formula text is not a well-formed expression
    #[error("Syntax error at position {position}: {reason}")]
    Syntax { position: usize, reason: String },

    /// The formula references a variable with no binding
    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// The formula calls a function the evaluator does not provide
    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    /// A function was called with the wrong number of arguments
    #[error("Function '{name}' expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Division or remainder by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// The result has no real value (log of a non-positive number, ...)
    #[error("Domain error in '{operation}': {reason}")]
    Domain { operation: String, reason: String },

    /// Intermediate value does not fit the decimal representation
    #[error("Arithmetic overflow in '{operation}'")]
    Overflow { operation: String },
}

impl ExpressionError {
    /// Create a syntax error at the given character position (not byte offset)
    pub fn syntax(position: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            reason: reason.into(),
        }
    }

    /// Create a domain error
    pub fn domain(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an overflow error
    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    /// Whether the formula is valid but was evaluated outside its mathematical domain
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = ExpressionError::syntax(4, "expected ')'");
        assert_eq!(err.to_string(), "Syntax error at position 4: expected ')'");
    }

    #[test]
    fn test_is_domain() {
        assert!(ExpressionError::domain("log", "argument must be positive").is_domain());
        assert!(!ExpressionError::DivisionByZero.is_domain());
    }
}
