//! Formula parser
//!
//! Turns formula text such as `((-1/n) * (x-h)^2) + log(n)` into an [`Expr`]
//! tree. Precedence, from loosest to tightest:
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | additive | `+` `-` | left |
//! | multiplicative | `*` `/` `%` | left |
//! | unary | `-` `+` | prefix |
//! | power | `^` | right |
//!
//! `-2^2` therefore parses as `-(2^2)`.
//!
//! Nesting is limited to [`MAX_NESTING`] levels and a formula to
//! [`MAX_NODES`] operators and calls, so hostile input fails with a syntax
//! error instead of exhausting the stack while parsing or evaluating.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::{ExpressionError, ExpressionResult};

/// Deepest allowed nesting of groups, prefix operators and exponents
pub const MAX_NESTING: usize = 256;

/// Most operator and call nodes a single formula may contain
pub const MAX_NODES: usize = 1024;

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    /// Operator symbol as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "^",
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Decimal),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => {
                out.insert(name.as_str());
            }
            Self::Unary { operand, .. } => operand.collect_variables(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

/// A formula together with its parsed tree
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parse formula text
    pub fn parse(source: &str) -> ExpressionResult<Self> {
        let root = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Original formula text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root of the parsed tree
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Names of all variables referenced by the formula
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.root.collect_variables(&mut out);
        out
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Parser {
    chars: Vec<char>,
    index: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn parse(mut self) -> ExpressionResult<Expr> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_additive()?;
        self.skip_whitespace();
        if let Some(ch) = self.peek() {
            return Err(self.error(format!("unexpected '{ch}'")));
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> ExpressionResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.consume_if('+') {
                BinaryOp::Add
            } else if self.consume_if('-') {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_multiplicative()?;
            self.count_node()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> ExpressionResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.consume_if('*') {
                BinaryOp::Mul
            } else if self.consume_if('/') {
                BinaryOp::Div
            } else if self.consume_if('%') {
                BinaryOp::Rem
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_unary()?;
            self.count_node()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    // Every nested group, prefix operator, exponent and call argument passes through here
    fn parse_unary(&mut self) -> ExpressionResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        let expr = self.parse_prefixed();
        self.depth -= 1;
        expr
    }

    fn parse_prefixed(&mut self) -> ExpressionResult<Expr> {
        let op = if self.consume_if('-') {
            UnaryOp::Neg
        } else if self.consume_if('+') {
            UnaryOp::Plus
        } else {
            return self.parse_power();
        };
        let operand = self.parse_unary()?;
        self.count_node()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> ExpressionResult<Expr> {
        let base = self.parse_atom()?;
        if self.consume_if('^') {
            // Right-hand side goes back through unary so `2^-1` and `2^3^2` both work
            let exponent = self.parse_unary()?;
            self.count_node()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> ExpressionResult<Expr> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of expression")),
            Some('(') => {
                self.index += 1;
                let expr = self.parse_additive()?;
                if !self.consume_if(')') {
                    return Err(self.error("missing closing ')'"));
                }
                Ok(expr)
            }
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.parse_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_identifier(),
            Some(ch) => Err(self.error(format!("unexpected '{ch}'"))),
        }
    }

    fn parse_number(&mut self) -> ExpressionResult<Expr> {
        let start = self.index;
        let mut seen_dot = false;
        while let Some(ch) = self.peek() {
            if ch == '.' && !seen_dot {
                seen_dot = true;
            } else if !ch.is_ascii_digit() {
                break;
            }
            self.index += 1;
        }
        let literal: String = self.chars[start..self.index].iter().collect();
        Decimal::from_str(&literal)
            .map(Expr::Number)
            .map_err(|e| ExpressionError::syntax(start, format!("invalid number '{literal}': {e}")))
    }

    fn parse_identifier(&mut self) -> ExpressionResult<Expr> {
        let start = self.index;
        while let Some(ch) = self.peek() {
            if !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            self.index += 1;
        }
        let name: String = self.chars[start..self.index].iter().collect();

        if !self.consume_if('(') {
            return Ok(Expr::Variable(name));
        }
        self.count_node()?;

        let mut args = Vec::new();
        if self.consume_if(')') {
            return Ok(Expr::Call { name, args });
        }
        loop {
            args.push(self.parse_additive()?);
            if self.consume_if(',') {
                continue;
            }
            if self.consume_if(')') {
                return Ok(Expr::Call { name, args });
            }
            return Err(self.error(format!("expected ',' or ')' in call to '{name}'")));
        }
    }

    fn count_node(&mut self) -> ExpressionResult<()> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(self.error("expression too large"));
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.index += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn consume_if(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, reason: impl Into<String>) -> ExpressionError {
        ExpressionError::syntax(self.index, reason)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
