//! Tokens
use std::{fmt, ops};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[inline]
    pub fn value(&self) -> Option<i64> {
        match self.kind {
            TokenKind::Value(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Integer literal
    Value(i64),
    Operator(OpKind),
    ParenOpen,  // (
    ParenClose, // )
    /// The function argument.
    ///
    /// Every identifier refers to the same single argument,
    /// so the identifier text is not kept.
    Name,
}

impl TokenKind {
    /// Indicates whether the token completes a factor, so that
    /// an operand directly following it implies a multiplication.
    #[inline]
    pub fn ends_factor(&self) -> bool {
        matches!(self, Self::Value(_) | Self::Name | Self::ParenClose)
    }
}

impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Operator(op) => write!(f, "{op}"),
            Self::ParenOpen    => write!(f, "("),
            Self::ParenClose   => write!(f, ")"),
            Self::Name         => write!(f, "x"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum OpKind {
    Mul, // *
    Add, // +
    Sub, // -
    Div, // /
}

impl OpKind {
    #[rustfmt::skip]
    pub fn parse(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Mul),
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '/' => Some(Self::Div),
            _   => None,
        }
    }

    #[inline]
    pub fn precedence(self) -> Precedence {
        match self {
            Self::Mul | Self::Div => Precedence::High,
            Self::Add | Self::Sub => Precedence::Low,
        }
    }

    /// Apply the operator to two operands.
    ///
    /// This is the arithmetic of the generated machine code: addition,
    /// subtraction and multiplication wrap around on overflow, and
    /// division truncates towards zero. The cases where the hardware
    /// divide would trap are returned as errors.
    pub fn apply(self, lhs: i64, rhs: i64) -> Result<i64, ArithError> {
        match self {
            Self::Mul => Ok(lhs.wrapping_mul(rhs)),
            Self::Add => Ok(lhs.wrapping_add(rhs)),
            Self::Sub => Ok(lhs.wrapping_sub(rhs)),
            Self::Div => {
                if rhs == 0 {
                    Err(ArithError::DivisionByZero)
                } else {
                    lhs.checked_div(rhs).ok_or(ArithError::Overflow)
                }
            }
        }
    }
}

impl fmt::Display for OpKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mul => write!(f, "*"),
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Div => write!(f, "/"),
        }
    }
}

/// Operator precedence class.
///
/// All operators are left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithError {
    DivisionByZero,
    Overflow,
}

impl std::error::Error for ArithError {}

impl fmt::Display for ArithError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Overflow => write!(f, "division overflow"),
        }
    }
}

/// Chunk of source code, encoded as a starting byte position and size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.end() as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }

    /// Combine two spans to produce a new span that
    /// covers both (and everything inbetween).
    ///
    /// ```
    /// use exprjit::tokens::Span;
    ///
    /// let span1 = Span::new(4, 13);
    /// let span2 = Span::new(21, 13);
    /// let span3 = span1.merge(&span2);
    /// assert_eq!(4, span3.index);
    /// assert_eq!(30, span3.size);
    /// ```
    pub fn merge(&self, other: &Span) -> Span {
        let index = u32::min(self.index, other.index);
        let size = u32::max(self.end(), other.end()) - index;
        Span { index, size }
    }
}

impl ops::Add for Span {
    type Output = Span;

    #[allow(clippy::suspicious_arithmetic_impl)] // subtract needed to merge spans
    fn add(self, rhs: Self) -> Self::Output {
        self.merge(&rhs)
    }
}
