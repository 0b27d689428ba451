//! Exact decimal evaluator
//!
//! Evaluates parsed formulas with `rust_decimal` arithmetic so repeated hourly
//! evaluations never pick up binary floating point drift.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use super::error::{ExpressionError, ExpressionResult};
use super::parser::{BinaryOp, Expr, Expression, UnaryOp};
use super::{Bindings, ExpressionEvaluator};

/// Stateless evaluator over [`Decimal`] values
///
/// Holds no state between calls: every evaluation parses the formula and
/// reads only the bindings it is handed, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalEvaluator;

impl DecimalEvaluator {
    /// Create a new evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate an already parsed expression
    pub fn evaluate_parsed(
        &self,
        expression: &Expression,
        bindings: &Bindings,
    ) -> ExpressionResult<Decimal> {
        eval(expression.root(), bindings)
    }
}

impl ExpressionEvaluator for DecimalEvaluator {
    fn evaluate(&self, formula: &str, bindings: &Bindings) -> ExpressionResult<Decimal> {
        let expression = Expression::parse(formula)?;
        self.evaluate_parsed(&expression, bindings)
    }
}

fn eval(expr: &Expr, bindings: &Bindings) -> ExpressionResult<Decimal> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable(name) => bindings
            .get(name)
            .ok_or_else(|| ExpressionError::UnknownVariable { name: name.clone() }),
        Expr::Unary { op, operand } => {
            let value = eval(operand, bindings)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Plus => value,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, bindings)?;
            let rhs = eval(rhs, bindings)?;
            apply_binary(*op, lhs, rhs)
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, bindings))
                .collect::<ExpressionResult<Vec<_>>>()?;
            call(name, &values)
        }
    }
}

fn apply_binary(op: BinaryOp, lhs: Decimal, rhs: Decimal) -> ExpressionResult<Decimal> {
    let overflow = || ExpressionError::overflow(op.symbol());
    match op {
        BinaryOp::Add => lhs.checked_add(rhs).ok_or_else(overflow),
        BinaryOp::Sub => lhs.checked_sub(rhs).ok_or_else(overflow),
        BinaryOp::Mul => lhs.checked_mul(rhs).ok_or_else(overflow),
        BinaryOp::Div => {
            if rhs.is_zero() {
                return Err(ExpressionError::DivisionByZero);
            }
            lhs.checked_div(rhs).ok_or_else(overflow)
        }
        BinaryOp::Rem => {
            if rhs.is_zero() {
                return Err(ExpressionError::DivisionByZero);
            }
            lhs.checked_rem(rhs).ok_or_else(overflow)
        }
        BinaryOp::Pow => power(lhs, rhs),
    }
}

fn power(base: Decimal, exponent: Decimal) -> ExpressionResult<Decimal> {
    if exponent.fract().is_zero() {
        let exp = exponent.to_i64().ok_or_else(|| ExpressionError::overflow("^"))?;
        let magnitude = i64::try_from(exp.unsigned_abs())
            .ok()
            .and_then(|e| base.checked_powi(e))
            .ok_or_else(|| ExpressionError::overflow("^"))?;
        if exp >= 0 {
            return Ok(magnitude);
        }
        if magnitude.is_zero() {
            return Err(ExpressionError::DivisionByZero);
        }
        return Decimal::ONE
            .checked_div(magnitude)
            .ok_or_else(|| ExpressionError::overflow("^"));
    }

    if base.is_sign_negative() && !base.is_zero() {
        return Err(ExpressionError::domain(
            "^",
            format!("{base} raised to non-integer power {exponent} has no real value"),
        ));
    }
    base.checked_powd(exponent)
        .ok_or_else(|| ExpressionError::overflow("^"))
}

fn call(name: &str, args: &[Decimal]) -> ExpressionResult<Decimal> {
    match name {
        "log" | "ln" => {
            let [value] = unary_args(name, args)?;
            positive(name, value)?;
            value
                .checked_ln()
                .ok_or_else(|| ExpressionError::overflow(name))
        }
        "log10" => {
            let [value] = unary_args(name, args)?;
            positive(name, value)?;
            value
                .checked_log10()
                .ok_or_else(|| ExpressionError::overflow(name))
        }
        "sqrt" => {
            let [value] = unary_args(name, args)?;
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ExpressionError::domain(
                    name,
                    format!("argument {value} must not be negative"),
                ));
            }
            value.sqrt().ok_or_else(|| ExpressionError::overflow(name))
        }
        "exp" => {
            let [value] = unary_args(name, args)?;
            match value.checked_exp() {
                Some(result) => Ok(result),
                // Too small to represent
                None if value.is_sign_negative() => Ok(Decimal::ZERO),
                None => Err(ExpressionError::overflow(name)),
            }
        }
        "abs" => unary_args(name, args).map(|[v]| v.abs()),
        "floor" => unary_args(name, args).map(|[v]| v.floor()),
        "ceil" => unary_args(name, args).map(|[v]| v.ceil()),
        "min" => binary_args(name, args).map(|[a, b]| a.min(b)),
        "max" => binary_args(name, args).map(|[a, b]| a.max(b)),
        _ => Err(ExpressionError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

fn positive(name: &str, value: Decimal) -> ExpressionResult<()> {
    if value <= Decimal::ZERO {
        return Err(ExpressionError::domain(
            name,
            format!("argument {value} must be positive"),
        ));
    }
    Ok(())
}

fn unary_args(name: &str, args: &[Decimal]) -> ExpressionResult<[Decimal; 1]> {
    match args {
        [a] => Ok([*a]),
        _ => Err(arity(name, 1, args.len())),
    }
}

fn binary_args(name: &str, args: &[Decimal]) -> ExpressionResult<[Decimal; 2]> {
    match args {
        [a, b] => Ok([*a, *b]),
        _ => Err(arity(name, 2, args.len())),
    }
}

fn arity(name: &str, expected: usize, got: usize) -> ExpressionError {
    ExpressionError::Arity {
        name: name.to_string(),
        expected,
        got,
    }
}
