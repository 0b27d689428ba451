//! Formula evaluation
//!
//! The distribution engine only depends on the [`ExpressionEvaluator`]
//! contract: a formula string plus a set of named decimal bindings in, a
//! decimal (or a structured error) out. [`DecimalEvaluator`] is the bundled
//! implementation.
//!
//! ```
//! use adsky::expression::{Bindings, DecimalEvaluator, ExpressionEvaluator};
//! use rust_decimal::Decimal;
//!
//! let bindings = Bindings::new().with("x", Decimal::from(3));
//! let value = DecimalEvaluator::new().evaluate("x^2 + 1", &bindings).unwrap();
//! assert_eq!(value, Decimal::from(10));
//! ```

pub mod decimal;
pub mod error;
pub mod parser;

use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub use decimal::DecimalEvaluator;
pub use error::{ExpressionError, ExpressionResult};
pub use parser::{BinaryOp, Expr, Expression, UnaryOp};

/// Named variable values for a single evaluation
///
/// Bindings are built per call and handed to the evaluator by reference,
/// so no evaluator ever holds variables between evaluations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<String, Decimal>,
}

impl Bindings {
    /// Create an empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a binding
    pub fn with(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace a binding in place
    pub fn set(&mut self, name: impl Into<String>, value: Decimal) {
        self.values.insert(name.into(), value);
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.values.get(name).copied()
    }

    /// Names of all bound variables
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Contract for anything that can evaluate a distribution formula
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `formula` against `bindings`
    fn evaluate(&self, formula: &str, bindings: &Bindings) -> ExpressionResult<Decimal>;
}

impl<E: ExpressionEvaluator + ?Sized> ExpressionEvaluator for &E {
    fn evaluate(&self, formula: &str, bindings: &Bindings) -> ExpressionResult<Decimal> {
        (**self).evaluate(formula, bindings)
    }
}

impl<E: ExpressionEvaluator + ?Sized> ExpressionEvaluator for Box<E> {
    fn evaluate(&self, formula: &str, bindings: &Bindings) -> ExpressionResult<Decimal> {
        (**self).evaluate(formula, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_replace() {
        let bindings = Bindings::new()
            .with("n", Decimal::from(1))
            .with("n", Decimal::from(2));
        assert_eq!(bindings.get("n"), Some(Decimal::from(2)));
        assert_eq!(bindings.names().count(), 1);
    }

    #[test]
    fn test_boxed_evaluator() {
        let evaluator: Box<dyn ExpressionEvaluator> = Box::new(DecimalEvaluator::new());
        let value = evaluator.evaluate("1 + 1", &Bindings::new()).unwrap();
        assert_eq!(value, Decimal::from(2));
    }
}
