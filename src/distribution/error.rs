//! Error types for the distribution module

use rust_decimal::Decimal;
use thiserror::Error;

use crate::expression::ExpressionError;

/// Result type for distribution operations
pub type DistributionResult<T> = Result<T, DistributionError>;

/// Errors raised while computing how many ads run in an hour
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The formula could not be parsed or evaluated
    #[error("Formula '{formula}' failed: {source}")]
    Formula {
        formula: String,
        #[source]
        source: ExpressionError,
    },

    /// The formula is well formed but has no real value for these inputs
    #[error("Formula '{formula}' is undefined for these inputs: {reason}")]
    Domain { formula: String, reason: String },

    /// The rounded result does not fit an ad count
    #[error("Formula '{formula}' produced {value}, which is not a usable ad count")]
    CountOutOfRange { formula: String, value: Decimal },
}

impl DistributionError {
    /// Wrap an evaluator failure, keeping domain errors distinct
    pub fn from_expression(formula: impl Into<String>, source: ExpressionError) -> Self {
        let formula = formula.into();
        if source.is_domain() {
            Self::Domain {
                formula,
                reason: source.to_string(),
            }
        } else {
            Self::Formula { formula, source }
        }
    }

    /// Create a domain error
    pub fn domain(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    /// Formula text that caused the error
    pub fn formula(&self) -> &str {
        match self {
            Self::Formula { formula, .. }
            | Self::Domain { formula, .. }
            | Self::CountOutOfRange { formula, .. } => formula,
        }
    }
}
