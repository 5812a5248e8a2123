//! A restricted arithmetic expression evaluator.
//!
//! Expressions are made up of numeric literals, named variables, the binary operators `+`, `-`,
//! `*`, `/` and `**`, unary `+` and `-`, and parentheses. Operator precedence and associativity
//! follow the usual mathematical conventions: `**` binds tightest and is right-associative, and it
//! binds more tightly than a unary operator on its left, so `-2**2 == -4`.
//!
//! Integer arithmetic is preserved where possible (`2 * 3` is the integer `6`) whereas division
//! always produces a floating-point result. This distinction matters when results are substituted
//! back into configuration text (see [`crate::input`]).
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::hash::BuildHasher;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Errors which can occur when evaluating an expression
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ExpressionError {
    /// The expression contains something other than arithmetic on numbers and variables
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    /// The expression refers to a variable with no binding
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
    /// The expression refers to a variable whose value is not a number
    #[error("variable {0} does not hold a numeric value")]
    NonNumericVariable(String),
}

/// A numeric value, either an integer or a floating-point number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// An integer
    Int(i64),
    /// A floating-point number
    Float(f64),
}

impl Number {
    /// The value as a f64
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// Whether the value is neither infinite nor NaN
    pub fn is_finite(self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(value) => value.is_finite(),
        }
    }

    /// Raise to a power, keeping integer results where they fit
    pub fn pow(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(base), Number::Int(exp)) if exp >= 0 => u32::try_from(exp)
                .ok()
                .and_then(|exp| base.checked_pow(exp))
                .map_or_else(|| Number::Float((base as f64).powf(exp as f64)), Number::Int),
            (a, b) => Number::Float(a.as_f64().powf(b.as_f64())),
        }
    }
}

macro_rules! impl_checked_op {
    ($trait:ident, $method:ident, $checked:ident, $op:tt) => {
        impl std::ops::$trait for Number {
            type Output = Number;

            fn $method(self, rhs: Number) -> Number {
                match (self, rhs) {
                    (Number::Int(a), Number::Int(b)) => a
                        .$checked(b)
                        .map_or_else(|| Number::Float(a as f64 $op b as f64), Number::Int),
                    (a, b) => Number::Float(a.as_f64() $op b.as_f64()),
                }
            }
        }
    };
}

impl_checked_op!(Add, add, checked_add, +);
impl_checked_op!(Sub, sub, checked_sub, -);
impl_checked_op!(Mul, mul, checked_mul, *);

impl std::ops::Div for Number {
    type Output = Number;

    /// Division always gives a float
    fn div(self, rhs: Number) -> Number {
        Number::Float(self.as_f64() / rhs.as_f64())
    }
}

impl std::ops::Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Int(value) => value
                .checked_neg()
                .map_or_else(|| Number::Float(-(value as f64)), Number::Int),
            Number::Float(value) => Number::Float(-value),
        }
    }
}

impl fmt::Display for Number {
    /// Integers are written without a decimal point; floats always have one (e.g. `10.0`)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{value}"),
            Number::Float(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// A source of values for the variables named in an expression
pub trait Bindings {
    /// Look up the numeric value bound to `name`
    fn lookup(&self, name: &str) -> Result<Number, ExpressionError>;
}

impl<S: BuildHasher> Bindings for IndexMap<String, Number, S> {
    fn lookup(&self, name: &str) -> Result<Number, ExpressionError> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UnknownVariable(name.to_string()))
    }
}

/// A unary operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a ** b`
    Pow,
}

/// A parsed arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Number(Number),
    /// A reference to a named variable
    Variable(String),
    /// A unary operation
    Unary(UnaryOp, Box<Expr>),
    /// A binary operation
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression from a string.
    ///
    /// Any construct outside the supported grammar (function calls, comparisons, string
    /// literals, other operators, trailing tokens) gives
    /// [`ExpressionError::UnsupportedExpression`], as does an expression nested more than
    /// [`MAX_DEPTH`] levels deep.
    pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
        let unsupported = || ExpressionError::UnsupportedExpression(source.to_string());
        let tokens = tokenise(source).ok_or_else(unsupported)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_sum().ok_or_else(unsupported)?;
        if parser.pos != parser.tokens.len() {
            return Err(unsupported());
        }

        Ok(expr)
    }

    /// Evaluate the expression against the given variable bindings
    pub fn eval<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<Number, ExpressionError> {
        Ok(match self {
            Expr::Number(value) => *value,
            Expr::Variable(name) => bindings.lookup(name)?,
            Expr::Unary(op, operand) => {
                let operand = operand.eval(bindings)?;
                match op {
                    UnaryOp::Plus => operand,
                    UnaryOp::Minus => -operand,
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(bindings)?;
                let rhs = rhs.eval(bindings)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => lhs / rhs,
                    BinaryOp::Pow => lhs.pow(rhs),
                }
            }
        })
    }

    /// The names of all variables referenced by the expression, in order of first appearance
    pub fn dependencies(&self) -> IndexSet<String> {
        let mut names = IndexSet::new();
        self.collect_dependencies(&mut names);
        names
    }

    /// Number of levels in the expression tree
    fn depth(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Variable(_) => 1,
            Expr::Unary(_, operand) => 1 + operand.depth(),
            Expr::Binary(_, lhs, rhs) => 1 + lhs.depth().max(rhs.depth()),
        }
    }

    fn collect_dependencies(&self, names: &mut IndexSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                names.insert(name.clone());
            }
            Expr::Unary(_, operand) => operand.collect_dependencies(names),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_dependencies(names);
                rhs.collect_dependencies(names);
            }
        }
    }
}

/// Parse and evaluate an expression in one go.
///
/// # Arguments
///
/// * `expr` - The expression text (without surrounding braces)
/// * `bindings` - Values for the variables the expression may reference
pub fn evaluate<B: Bindings + ?Sized>(expr: &str, bindings: &B) -> Result<Number, ExpressionError> {
    Expr::parse(expr)?.eval(bindings)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    LParen,
    RParen,
}

/// Split the source into tokens, returning `None` on any unrecognised character
fn tokenise(source: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => tokens.push(Token::Number(lex_number(&mut chars)?)),
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(name));
            }
            '*' => {
                chars.next();
                if chars.next_if_eq(&'*').is_some() {
                    tokens.push(Token::DoubleStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            _ => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => return None,
                });
            }
        }
    }

    Some(tokens)
}

/// Read a numeric literal such as `12`, `3.5`, `.5` or `1e-3`
fn lex_number(chars: &mut Peekable<Chars<'_>>) -> Option<Number> {
    let mut text = String::new();
    let mut is_float = false;
    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' => text.push(c),
            '.' if !is_float => {
                is_float = true;
                text.push(c);
            }
            _ => break,
        }
        chars.next();
    }

    // An exponent is only consumed if digits follow it; otherwise "2e" lexes as `2` then `e`,
    // which the parser rejects
    if matches!(chars.peek(), Some('e' | 'E')) {
        let mut lookahead = chars.clone();
        lookahead.next();
        let mut exponent = String::from("e");
        if let Some(sign) = lookahead.next_if(|c| *c == '+' || *c == '-') {
            exponent.push(sign);
        }
        if lookahead.peek().is_some_and(char::is_ascii_digit) {
            while let Some(digit) = lookahead.next_if(char::is_ascii_digit) {
                exponent.push(digit);
            }
            *chars = lookahead;
            text.push_str(&exponent);
            is_float = true;
        }
    }

    if text == "." {
        return None;
    }

    if is_float {
        text.parse().ok().map(Number::Float)
    } else {
        match text.parse() {
            Ok(value) => Some(Number::Int(value)),
            Err(_) => text.parse().ok().map(Number::Float),
        }
    }
}

/// The deepest expression tree the parser will build.
///
/// Parsing and evaluation both recurse over the tree, so this bounds their stack use.
pub const MAX_DEPTH: usize = 200;

/// A recursive-descent parser over a token stream.
///
/// Each method returns `None` if the tokens don't match the grammar.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Levels of nesting (parentheses, unary operators, exponents) above the current position
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Parse a nested sub-expression, failing if it would be too deep
    fn nested(&mut self, parse: fn(&mut Self) -> Option<Expr>) -> Option<Expr> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    /// Build a binary expression, failing if the chain of operands has grown too deep
    fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Option<Expr> {
        let expr = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        (self.depth + expr.depth() <= MAX_DEPTH).then_some(expr)
    }

    /// sum := product (("+" | "-") product)*
    fn parse_sum(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_product()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    /// product := unary (("*" | "/") unary)*
    fn parse_product(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Some(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    /// unary := ("+" | "-") unary | power
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Minus,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        Some(Expr::Unary(op, Box::new(self.nested(Self::parse_unary)?)))
    }

    /// power := atom ("**" unary)?
    fn parse_power(&mut self) -> Option<Expr> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.nested(Self::parse_unary)?;
            return self.binary(BinaryOp::Pow, base, exponent);
        }

        Some(base)
    }

    /// atom := number | name | "(" sum ")"
    fn parse_atom(&mut self) -> Option<Expr> {
        match self.advance()? {
            Token::Number(value) => Some(Expr::Number(value)),
            Token::Ident(name) => Some(Expr::Variable(name)),
            Token::LParen => {
                let inner = self.nested(Self::parse_sum)?;
                (self.advance()? == Token::RParen).then_some(inner)
            }
            _ => None,
        }
    }
}
