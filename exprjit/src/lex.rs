//! Lexical analysis (tokenizer)
use crate::{
    constants::MAX_TOKENS,
    tokens::{OpKind, Span, Token, TokenKind},
};

use itertools::{multipeek, MultiPeek};
use std::{error, fmt, str::CharIndices};

/// Scan the source text into a flat sequence of tokens.
pub fn tokenize(source_code: &str, capacity: usize) -> Result<Vec<Token>, LexError> {
    Lexer::with_capacity(source_code, capacity).tokenize()
}

/// Lexical analyzer.
///
/// Besides splitting the source into tokens, the lexer does two
/// rewrites so later stages only deal with integers and explicit
/// operators:
///
/// - A decimal literal `W.F` becomes the integer division
///   `(WF / 10^d)`, where `d` is the number of fraction digits.
/// - A multiplication is inserted when a completed factor is
///   directly followed by a name or an opening parenthesis,
///   so `2x` reads as `2 * x`.
pub struct Lexer<'a> {
    source: SourceText<'a>,
    /// Output token buffer, bounded by `capacity`.
    tokens: Vec<Token>,
    capacity: usize,
    /// Start byte position of the current token in the source.
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self::with_capacity(source_code, MAX_TOKENS)
    }

    pub fn with_capacity(source_code: &'a str, capacity: usize) -> Self {
        Self {
            source: SourceText::new(source_code),
            tokens: Vec::new(),
            capacity,
            token_start: 0,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.source.original
    }

    #[rustfmt::skip]
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        use TokenKind as T;

        while let Some((index, next_char)) = self.source.next_char() {
            self.token_start = index;

            match next_char {
                ' ' | '\t' | '\r' | '\n'
                    | '\x0B' | '\x0C'    => continue,
                '('                      => {
                    self.implicit_mul()?;
                    self.make_token(T::ParenOpen)?;
                }
                ')'                      => self.make_token(T::ParenClose)?,
                '0'..='9'                => self.consume_number()?,
                '_' | 'a'..='z'
                    | 'A'..='Z'          => {
                    self.implicit_mul()?;
                    self.consume_ident()?;
                }
                _ => match OpKind::parse(next_char) {
                    Some(op) => self.make_token(T::Operator(op))?,
                    None     => return Err(LexError::UnknownCharacter(next_char, self.span())),
                },
            }
        }

        Ok(self.tokens)
    }

    /// Span from the start of the current token up to the cursor.
    fn span(&self) -> Span {
        Span::new(
            self.token_start as u32,
            (self.source.offset - self.token_start) as u32,
        )
    }

    fn make_token(&mut self, kind: TokenKind) -> Result<(), LexError> {
        let span = self.span();
        self.push(Token::new(kind, span))
    }

    fn push(&mut self, token: Token) -> Result<(), LexError> {
        if self.tokens.len() >= self.capacity {
            return Err(LexError::TooManyTokens(self.capacity));
        }
        self.tokens.push(token);
        Ok(())
    }

    /// Insert a multiplication when the previous token completed a factor.
    ///
    /// Must be called before the operand token is pushed.
    fn implicit_mul(&mut self) -> Result<(), LexError> {
        match self.tokens.last() {
            Some(token) if token.kind.ends_factor() => {
                // Zero sized, there is no source text for it.
                let span = Span::new(self.token_start as u32, 0);
                self.push(Token::new(TokenKind::Operator(OpKind::Mul), span))
            }
            _ => Ok(()),
        }
    }

    fn consume_ident(&mut self) -> Result<(), LexError> {
        self.source.reset_peek();

        while let Some('_' | 'a'..='z' | 'A'..='Z' | '0'..='9') = self.source.peek_char() {
            self.source.next_char();
        }

        // Only one argument is supported, so the
        // name itself doesn't matter.
        self.make_token(TokenKind::Name)
    }

    fn consume_number(&mut self) -> Result<(), LexError> {
        self.consume_digits();
        let whole_end = self.source.offset;

        self.source.reset_peek();
        match self.source.peek_char2() {
            (Some('.'), Some('0'..='9')) => {
                // Decimal point
                self.source.next_char();
                let fraction_start = self.source.offset;
                self.consume_digits();
                self.make_decimal(whole_end, fraction_start)
            }
            (Some('.'), _) => {
                self.source.next_char();
                Err(LexError::MalformedNumber(self.span()))
            }
            _ => {
                let value = self.parse_digits(self.token_start, whole_end)?;
                self.make_token(TokenKind::Value(value))
            }
        }
    }

    /// Desugar the decimal literal into an integer division sub-expression.
    ///
    /// Trailing fraction digits that don't fit in 64 bits are dropped.
    /// Only a whole part that doesn't fit by itself is an error.
    fn make_decimal(&mut self, whole_end: usize, fraction_start: usize) -> Result<(), LexError> {
        use TokenKind as T;

        let whole = self.parse_digits(self.token_start, whole_end)?;
        let (numerator, denominator) = self.decimal_ratio(whole, fraction_start);

        let start = self.token_start as u32;
        let end = self.source.offset as u32;
        let point = Span::new(whole_end as u32, 1);
        let fraction = Span::new(fraction_start as u32, end - fraction_start as u32);

        self.push(Token::new(T::ParenOpen, Span::new(start, 0)))?;
        self.push(Token::new(T::Value(numerator), self.span()))?;
        self.push(Token::new(T::Operator(OpKind::Div), point))?;
        self.push(Token::new(T::Value(denominator), fraction))?;
        self.push(Token::new(T::ParenClose, Span::new(end, 0)))
    }

    /// Largest prefix of the fraction digits for which `whole.fraction`
    /// is representable as `numerator / 10^digits`.
    fn decimal_ratio(&self, whole: i64, fraction_start: usize) -> (i64, i64) {
        let digits = &self.source.original[fraction_start..self.source.offset];

        (0..=digits.len())
            .rev()
            .find_map(|len| {
                let denominator = 10_i64.checked_pow(len as u32)?;
                let fraction = match len {
                    0 => 0,
                    _ => digits[..len].parse::<i64>().ok()?,
                };
                let numerator = whole.checked_mul(denominator)?.checked_add(fraction)?;
                Some((numerator, denominator))
            })
            .unwrap_or((whole, 1))
    }

    fn consume_digits(&mut self) {
        self.source.reset_peek();

        while let Some('0'..='9') = self.source.peek_char() {
            self.source.next_char();
        }
    }

    fn parse_digits(&self, start: usize, end: usize) -> Result<i64, LexError> {
        self.source.original[start..end]
            .parse::<i64>()
            .map_err(|_| LexError::MalformedNumber(self.span()))
    }
}

/// Wrapper for source code that keeps a cursor position.
///
/// Allows forward lookup via peeking.
struct SourceText<'a> {
    original: &'a str,

    /// Iterator over UTF-8 encoded source code.
    ///
    /// Peeking the `MultiPeek` advances its internal peek cursor by 1,
    /// so each call returns the next element. The peek cursor offset is
    /// restored to 0 when calling `MultiPeek::next()` or `MultiPeek::reset_peek()`.
    source: MultiPeek<CharIndices<'a>>,

    /// Byte position just past the last consumed character.
    offset: usize,
}

impl<'a> SourceText<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            original: source,
            source: multipeek(source.char_indices()),
            offset: 0,
        }
    }

    /// Advance the cursor and return the next position and character.
    fn next_char(&mut self) -> Option<(usize, char)> {
        let (index, c) = self.source.next()?;
        self.offset = index + c.len_utf8();
        Some((index, c))
    }

    /// This call advances the peek cursor. Subsequent
    /// calls will look ahead by one character each call.
    fn peek_char(&mut self) -> Option<char> {
        self.source.peek().map(|(_, c)| *c)
    }

    /// Two character lookahead.
    fn peek_char2(&mut self) -> (Option<char>, Option<char>) {
        (
            self.source.peek().map(|(_, c)| *c),
            self.source.peek().map(|(_, c)| *c),
        )
    }

    fn reset_peek(&mut self) {
        self.source.reset_peek()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnknownCharacter(char, Span),
    /// Decimal point without digits on both sides,
    /// or a literal that doesn't fit in 64 bits.
    MalformedNumber(Span),
    /// Token buffer capacity exceeded.
    TooManyTokens(usize),
}

impl LexError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnknownCharacter(_, span) | Self::MalformedNumber(span) => Some(*span),
            Self::TooManyTokens(_) => None,
        }
    }
}

impl error::Error for LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownCharacter(c, _) => write!(f, "unknown character {c:?}"),
            Self::MalformedNumber(_) => write!(f, "malformed number literal"),
            Self::TooManyTokens(limit) => write!(f, "expression exceeds {limit} tokens"),
        }
    }
}
