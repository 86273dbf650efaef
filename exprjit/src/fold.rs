//! Constant folding.
use crate::{
    error::{CompileError, CompileResult},
    tokens::{ArithError, OpKind, Token, TokenKind},
};

/// Fold constant sub-expressions of a postfix sequence.
pub fn fold(postfix: &[Token]) -> CompileResult<Vec<Token>> {
    ConstFolder::new().fold(postfix)
}

/// Constant folder.
///
/// A single left-to-right pass that compacts the postfix sequence.
/// An operator whose two operands, at the top of the output, are
/// both literals is replaced with a single literal holding the result.
///
/// Operands are only ever folded values themselves, so an operator
/// with a runtime operand (the argument) is kept as is, even when its
/// sibling sub-expression is constant. `x + 1 + 2` is not folded,
/// because it is `(x + 1) + 2`.
#[derive(Default)]
pub struct ConstFolder {
    output: Vec<Token>,
}

impl ConstFolder {
    #[inline]
    pub fn new() -> Self {
        Self { output: vec![] }
    }

    pub fn fold(mut self, postfix: &[Token]) -> CompileResult<Vec<Token>> {
        self.output.reserve(postfix.len());

        for token in postfix {
            match token.kind {
                TokenKind::Operator(op) => self.fold_operator(op, token)?,
                _ => self.output.push(*token),
            }
        }

        debug_assert!(self.output.len() <= postfix.len());
        Ok(self.output)
    }

    fn fold_operator(&mut self, op: OpKind, token: &Token) -> CompileResult<()> {
        let len = self.output.len();

        let operands = if len >= 2 {
            (self.output[len - 2].value(), self.output[len - 1].value())
        } else {
            (None, self.output.last().and_then(Token::value))
        };

        match operands {
            (Some(lhs), Some(rhs)) => {
                let span = self.output[len - 2].span + self.output[len - 1].span;
                let value = op.apply(lhs, rhs).map_err(|err| match err {
                    ArithError::DivisionByZero => CompileError::DivisionByZero(span),
                    ArithError::Overflow => CompileError::Overflow(span),
                })?;

                self.output.truncate(len - 2);
                self.output.push(Token::new(TokenKind::Value(value), span));
            }
            (None, Some(0)) if op == OpKind::Div => {
                // Dividing a runtime value by a literal zero
                // can only ever trap.
                let span = self.output[len - 1].span + token.span;
                return Err(CompileError::DivisionByZero(span));
            }
            _ => self.output.push(*token),
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{constants::*, display_tokens, error::ErrorKind, lex::tokenize, postfix::to_postfix};

    fn folded(source: &str) -> CompileResult<Vec<Token>> {
        let tokens = tokenize(source, MAX_TOKENS)?;
        let postfix = to_postfix(&tokens, MAX_DEPTH)?;
        fold(&postfix)
    }

    fn folded_str(source: &str) -> String {
        display_tokens(&folded(source).unwrap())
    }

    #[test]
    fn test_fold_constants() {
        assert_eq!(folded_str("2 + 3 * 4"), "14");
        assert_eq!(folded_str("(2 + 3) * 4"), "20");
        assert_eq!(folded_str("10 - 2 - 3"), "5");
        assert_eq!(folded_str("2 * 4.5 + 1.6"), "10");
        assert_eq!(folded_str("1.5"), "1");
    }

    #[test]
    fn test_fold_with_name() {
        assert_eq!(folded_str("x + 9*9 - 1*40"), "x 81 + 40 -");
        assert_eq!(folded_str("x + 1 + 2"), "x 1 + 2 +");
        assert_eq!(folded_str("x + (1 + 2)"), "x 3 +");
        assert_eq!(folded_str("2x"), "2 x *");
    }

    #[test]
    fn test_fold_idempotent() {
        for source in ["x + 9*9 - 1*40", "3(1+2)", "x / 2.5 * (x - 4)", "5000000000"] {
            let once = folded(source).unwrap();
            let twice = fold(&once).unwrap();
            assert_eq!(once, twice, "{source}");
        }
    }

    #[test]
    fn test_fold_span() {
        const CODE: &str = "x + 2 * 3";
        let tokens = folded(CODE).unwrap();
        assert_eq!(tokens[1].span.fragment(CODE), "2 * 3");
    }

    #[test]
    fn test_fold_division_by_zero() {
        for source in ["1/0", "1 / (2 - 2)", "x / 0", "x / 0.0"] {
            let err = folded(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DivisionByZero, "{source}");
        }

        // Not a constant, left for the machine.
        assert!(folded("1 / (x - x)").is_ok());
    }

    #[test]
    fn test_fold_overflow() {
        let err = folded("(0 - 9223372036854775807 - 1) / (0 - 1)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);

        // Wraps like the machine does.
        assert_eq!(folded_str("9223372036854775807 + 1"), i64::MIN.to_string());
    }
}
