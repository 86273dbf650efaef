//! Machine code generation.
use crate::{
    error::{CompileError, CompileResult},
    isa::{Imm, Opcode},
    tokens::{OpKind, Token, TokenKind},
};

/// Generate machine code for a postfix sequence.
pub fn generate(postfix: &[Token]) -> CompileResult<Box<[u8]>> {
    CodeGen::new().compile(postfix)
}

/// Code generator.
///
/// Walks the postfix sequence once, emitting a stack machine:
/// operands are pushed onto the native stack, operators pop two
/// values into the working registers and push the result back.
/// At the end the single remaining value is popped into the
/// return register.
pub struct CodeGen {
    /// Resulting generated code.
    code: Vec<u8>,
    /// Number of values on the evaluation stack at the
    /// current point of the generated code.
    depth: usize,
}

impl CodeGen {
    #[inline]
    pub fn new() -> Self {
        Self { code: vec![], depth: 0 }
    }

    pub fn compile(&mut self, postfix: &[Token]) -> CompileResult<Box<[u8]>> {
        self.reset();

        let mut previous: Option<&Token> = None;

        for token in postfix {
            match token.kind {
                TokenKind::Value(value) => self.emit_value(value),
                TokenKind::Name => self.emit_push(Opcode::PushArg),
                TokenKind::Operator(op) => {
                    // Malformed input would pop past the
                    // return address of the caller.
                    if self.depth < 2 {
                        return Err(CompileError::UnexpectedToken(*token));
                    }
                    if let (OpKind::Div, Some(divisor)) = (op, previous) {
                        if divisor.value() == Some(0) {
                            return Err(CompileError::DivisionByZero(divisor.span + token.span));
                        }
                    }
                    self.emit_operator(op);
                }
                TokenKind::ParenOpen | TokenKind::ParenClose => {
                    return Err(CompileError::UnexpectedToken(*token));
                }
            }

            previous = Some(token);
        }

        if self.depth != 1 {
            return Err(CompileError::UnexpectedEnd);
        }

        // Move the result into the return register.
        self.emit(Opcode::PopA);
        self.emit(Opcode::Return);

        Ok(std::mem::take(&mut self.code).into_boxed_slice())
    }

    /// Clear the internal state so the code generator can be reused.
    pub fn reset(&mut self) {
        self.code.clear();
        self.depth = 0;
    }

    fn emit(&mut self, op: Opcode) {
        let template = op.template();
        debug_assert_eq!(template.imm, Imm::None);
        self.code.extend_from_slice(template.bytes);
    }

    fn emit_push(&mut self, op: Opcode) {
        self.emit(op);
        self.depth += 1;
    }

    fn emit_imm32(&mut self, op: Opcode, imm: i32) {
        let template = op.template();
        debug_assert_eq!(template.imm, Imm::I32);
        self.code.extend_from_slice(template.bytes);
        self.code.extend_from_slice(&imm.to_le_bytes());
    }

    fn emit_imm64(&mut self, op: Opcode, imm: i64) {
        let template = op.template();
        debug_assert_eq!(template.imm, Imm::I64);
        self.code.extend_from_slice(template.bytes);
        self.code.extend_from_slice(&imm.to_le_bytes());
    }

    /// Push a literal.
    ///
    /// `push imm32` sign extends its operand, so it is only used when
    /// the value round-trips through 32 bits. Wider values go through
    /// a 64-bit register load.
    fn emit_value(&mut self, value: i64) {
        match i32::try_from(value) {
            Ok(narrow) => self.emit_imm32(Opcode::PushConst32, narrow),
            Err(_) => {
                self.emit_imm64(Opcode::LoadConst64, value);
                self.emit(Opcode::PushA);
            }
        }
        self.depth += 1;
    }

    fn emit_operator(&mut self, op: OpKind) {
        // Right operand was pushed last.
        self.emit(Opcode::PopB);
        self.emit(Opcode::PopA);

        match op {
            OpKind::Mul => self.emit(Opcode::Mul),
            OpKind::Add => self.emit(Opcode::Add),
            OpKind::Sub => self.emit(Opcode::Sub),
            OpKind::Div => {
                self.emit(Opcode::SignExtendA);
                self.emit(Opcode::Div);
            }
        }

        self.emit(Opcode::PushA);
        self.depth -= 1;
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}
