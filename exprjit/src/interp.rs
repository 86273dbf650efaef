//! Postfix interpreter.
use crate::tokens::{ArithError, Token, TokenKind};

/// Evaluate a postfix sequence with the given argument.
///
/// Uses the same arithmetic as the generated machine code, so it
/// serves as a reference for the compiled function. Where the machine
/// would trap on a division, an error is returned instead.
///
/// # Panics
///
/// Panics if the sequence is not a well formed postfix expression,
/// as produced by [`to_postfix`](crate::postfix::to_postfix).
pub fn eval(postfix: &[Token], arg: i64) -> Result<i64, ArithError> {
    let mut stack: Vec<i64> = Vec::with_capacity(postfix.len());

    for token in postfix {
        match token.kind {
            TokenKind::Value(value) => stack.push(value),
            TokenKind::Name => stack.push(arg),
            TokenKind::Operator(op) => {
                let rhs = stack.pop().expect("operator is missing its right operand");
                let lhs = stack.pop().expect("operator is missing its left operand");
                stack.push(op.apply(lhs, rhs)?);
            }
            TokenKind::ParenOpen | TokenKind::ParenClose => {
                panic!("parenthesis in postfix sequence")
            }
        }
    }

    debug_assert_eq!(stack.len(), 1);
    Ok(stack.pop().expect("empty postfix sequence"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{constants::*, lex::tokenize, postfix::to_postfix};

    fn eval_str(source: &str, arg: i64) -> Result<i64, ArithError> {
        let tokens = tokenize(source, MAX_TOKENS).unwrap();
        let postfix = to_postfix(&tokens, MAX_DEPTH).unwrap();
        eval(&postfix, arg)
    }

    #[test]
    fn test_eval() {
        assert_eq!(eval_str("x + 9*9 - 1*40", 0), Ok(41));
        assert_eq!(eval_str("x + 9*9 - 1*40", 10), Ok(51));
        assert_eq!(eval_str("2 * 4.5 + 1.6", 0), Ok(10));
        assert_eq!(eval_str("2x", 5), Ok(10));
        assert_eq!(eval_str("x / 2", -7), Ok(-3));
    }

    #[test]
    fn test_eval_traps() {
        assert_eq!(eval_str("1 / x", 0), Err(ArithError::DivisionByZero));
        assert_eq!(eval_str("x / (0 - 1)", i64::MIN), Err(ArithError::Overflow));
    }
}
