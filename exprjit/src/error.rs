//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

use crate::{
    lex::LexError,
    tokens::{Span, Token},
};

pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[derive(Debug)]
pub enum CompileError {
    /// Source text could not be scanned.
    Lex(LexError),
    /// Token in a position where the grammar doesn't allow it.
    UnexpectedToken(Token),
    /// Source ended where an operand was expected.
    UnexpectedEnd,
    /// Closing parenthesis without a matching open, or
    /// an opening parenthesis that was never closed.
    UnbalancedParentheses(Span),
    /// Division by a constant zero.
    DivisionByZero(Span),
    /// Constant division that doesn't fit in 64 bits (`i64::MIN / -1`).
    Overflow(Span),
    /// Expression nests deeper than the operator stack allows.
    CapacityExceeded(usize),
    /// Executable memory could not be mapped.
    Memory(io::Error),
}

/// Broad classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    UnbalancedParentheses,
    DivisionByZero,
    Overflow,
    CapacityExceeded,
    Memory,
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lex(_) | Self::UnexpectedToken(_) | Self::UnexpectedEnd => ErrorKind::Syntax,
            Self::UnbalancedParentheses(_) => ErrorKind::UnbalancedParentheses,
            Self::DivisionByZero(_) => ErrorKind::DivisionByZero,
            Self::Overflow(_) => ErrorKind::Overflow,
            Self::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            Self::Memory(_) => ErrorKind::Memory,
        }
    }

    /// Location in the source text that caused the error, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lex(err) => err.span(),
            Self::UnexpectedToken(token) => Some(token.span),
            Self::UnbalancedParentheses(span)
            | Self::DivisionByZero(span)
            | Self::Overflow(span) => Some(*span),
            Self::UnexpectedEnd | Self::CapacityExceeded(_) | Self::Memory(_) => None,
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "syntax error: {err}"),
            Self::UnexpectedToken(token) => write!(f, "syntax error: unexpected '{}'", token.kind),
            Self::UnexpectedEnd => write!(f, "syntax error: unexpected end of expression"),
            Self::UnbalancedParentheses(_) => write!(f, "unbalanced parentheses"),
            Self::DivisionByZero(_) => write!(f, "division by zero"),
            Self::Overflow(_) => write!(f, "constant division overflows 64 bits"),
            Self::CapacityExceeded(limit) => write!(f, "expression exceeds capacity of {limit}"),
            Self::Memory(err) => write!(f, "failed to map executable memory: {err}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lex(err) => Some(err),
            Self::Memory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Lex(err)
    }
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> Self {
        CompileError::Memory(err)
    }
}
