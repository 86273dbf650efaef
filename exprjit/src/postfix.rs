//! Infix to postfix conversion.
use crate::{
    error::{CompileError, CompileResult},
    tokens::{Token, TokenKind},
};

/// Convert an infix token sequence into postfix order.
///
/// The output never contains parentheses, so it is never
/// longer than the input.
pub fn to_postfix(tokens: &[Token], max_depth: usize) -> CompileResult<Vec<Token>> {
    PostfixConverter::new(max_depth).convert(tokens)
}

/// Shunting-yard converter.
///
/// Besides reordering, the converter validates the grammar by
/// alternating between expecting an operand and expecting an
/// operator. Code generated from the output can thus trust that
/// every operator has two operands and that exactly one value
/// remains at the end.
pub struct PostfixConverter {
    output: Vec<Token>,
    /// Pending operators and opening parentheses.
    stack: Vec<Token>,
    max_depth: usize,
    expect_operand: bool,
}

impl PostfixConverter {
    pub fn new(max_depth: usize) -> Self {
        Self {
            output: vec![],
            stack: vec![],
            max_depth,
            expect_operand: true,
        }
    }

    pub fn convert(mut self, tokens: &[Token]) -> CompileResult<Vec<Token>> {
        self.output.reserve(tokens.len());

        for token in tokens {
            match token.kind {
                TokenKind::Value(_) | TokenKind::Name => {
                    self.expect(true, token)?;
                    self.output.push(*token);
                    self.expect_operand = false;
                }
                TokenKind::Operator(op) => {
                    self.expect(false, token)?;

                    // Left-associative, so equal precedence pops too.
                    while let Some(top) = self.stack.last() {
                        match top.kind {
                            TokenKind::Operator(top_op)
                                if top_op.precedence() >= op.precedence() =>
                            {
                                self.output.push(*top);
                                self.stack.pop();
                            }
                            _ => break,
                        }
                    }

                    self.push_stack(*token)?;
                    self.expect_operand = true;
                }
                TokenKind::ParenOpen => {
                    self.expect(true, token)?;
                    self.push_stack(*token)?;
                }
                TokenKind::ParenClose => {
                    if !self.stack.iter().any(|t| t.kind == TokenKind::ParenOpen) {
                        return Err(CompileError::UnbalancedParentheses(token.span));
                    }
                    self.expect(false, token)?;

                    while let Some(top) = self.stack.pop() {
                        if top.kind == TokenKind::ParenOpen {
                            break;
                        }
                        self.output.push(top);
                    }
                }
            }
        }

        if self.expect_operand {
            return Err(CompileError::UnexpectedEnd);
        }

        while let Some(top) = self.stack.pop() {
            if top.kind == TokenKind::ParenOpen {
                return Err(CompileError::UnbalancedParentheses(top.span));
            }
            self.output.push(top);
        }

        debug_assert!(self.output.len() <= tokens.len());
        Ok(self.output)
    }

    #[inline]
    fn expect(&self, operand: bool, token: &Token) -> CompileResult<()> {
        if self.expect_operand == operand {
            Ok(())
        } else {
            Err(CompileError::UnexpectedToken(*token))
        }
    }

    fn push_stack(&mut self, token: Token) -> CompileResult<()> {
        if self.stack.len() >= self.max_depth {
            return Err(CompileError::CapacityExceeded(self.max_depth));
        }
        self.stack.push(token);
        Ok(())
    }
}
