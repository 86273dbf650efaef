//! Instruction templates for x86-64.
//!
//! The generated code is a stack machine on the native stack, with
//! two working registers:
//!
//! - `RegA` is `rax`, which also holds the return value.
//! - `RegB` is `rcx`.
//!
//! The argument arrives in `rdi` (System V calling convention).
//! Division sign extends `rax` into `rdx`. All of these registers
//! are caller saved, so the function never needs a prologue.
use std::fmt;

/// Abstract opcodes emitted by the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// `pop rax`
    PopA,
    /// `pop rcx`
    PopB,
    /// `push rax`
    PushA,
    /// `push rdi`
    PushArg,
    /// `push imm32`, sign extended to 64 bits.
    PushConst32,
    /// `imul rax, rcx`
    Mul,
    /// `add rax, rcx`
    Add,
    /// `sub rax, rcx`
    Sub,
    /// `cqo`, sign extend `rax` into `rdx:rax`.
    SignExtendA,
    /// `idiv rcx`, quotient in `rax`.
    Div,
    /// `movabs rax, imm64`
    LoadConst64,
    /// `ret`
    Return,
}

impl Opcode {
    pub const ALL: [Opcode; 12] = [
        Self::PopA,
        Self::PopB,
        Self::PushA,
        Self::PushArg,
        Self::PushConst32,
        Self::Mul,
        Self::Add,
        Self::Sub,
        Self::SignExtendA,
        Self::Div,
        Self::LoadConst64,
        Self::Return,
    ];

    /// Machine code template of the opcode.
    #[rustfmt::skip]
    pub fn template(self) -> &'static Template {
        use Imm as I;

        match self {
            Self::PopA        => &Template { bytes: &[0x58],                   imm: I::None, mnemonic: "pop rax" },
            Self::PopB        => &Template { bytes: &[0x59],                   imm: I::None, mnemonic: "pop rcx" },
            Self::PushA       => &Template { bytes: &[0x50],                   imm: I::None, mnemonic: "push rax" },
            Self::PushArg     => &Template { bytes: &[0x57],                   imm: I::None, mnemonic: "push rdi" },
            Self::PushConst32 => &Template { bytes: &[0x68],                   imm: I::I32,  mnemonic: "push" },
            Self::Mul         => &Template { bytes: &[0x48, 0x0F, 0xAF, 0xC1], imm: I::None, mnemonic: "imul rax, rcx" },
            Self::Add         => &Template { bytes: &[0x48, 0x01, 0xC8],       imm: I::None, mnemonic: "add rax, rcx" },
            Self::Sub         => &Template { bytes: &[0x48, 0x29, 0xC8],       imm: I::None, mnemonic: "sub rax, rcx" },
            Self::SignExtendA => &Template { bytes: &[0x48, 0x99],             imm: I::None, mnemonic: "cqo" },
            Self::Div         => &Template { bytes: &[0x48, 0xF7, 0xF9],       imm: I::None, mnemonic: "idiv rcx" },
            Self::LoadConst64 => &Template { bytes: &[0x48, 0xB8],             imm: I::I64,  mnemonic: "movabs rax," },
            Self::Return      => &Template { bytes: &[0xC3],                   imm: I::None, mnemonic: "ret" },
        }
    }

    /// Find the opcode whose template starts the given code.
    ///
    /// Templates are prefix free, so at most one matches.
    pub fn decode(code: &[u8]) -> Option<Opcode> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| code.starts_with(op.template().bytes))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.template().mnemonic)
    }
}

/// Literal machine code of one instruction, without its immediate operand.
#[derive(Debug)]
pub struct Template {
    pub bytes: &'static [u8],
    /// Immediate operand inlined after the bytes.
    pub imm: Imm,
    pub mnemonic: &'static str,
}

impl Template {
    /// Total encoded size, including the immediate operand.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len() + self.imm.size()
    }
}

/// Width of an immediate operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imm {
    None,
    I32,
    I64,
}

impl Imm {
    #[inline]
    pub fn size(self) -> usize {
        use crate::constants::{IMM32_SIZE, IMM64_SIZE};

        match self {
            Self::None => 0,
            Self::I32 => IMM32_SIZE,
            Self::I64 => IMM64_SIZE,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_template_len() {
        assert_eq!(Opcode::PopA.template().size(), 1);
        assert_eq!(Opcode::PushConst32.template().size(), 5);
        assert_eq!(Opcode::Mul.template().size(), 4);
        assert_eq!(Opcode::Div.template().size(), 3);
        assert_eq!(Opcode::LoadConst64.template().size(), 10);
    }

    #[test]
    fn test_templates_prefix_free() {
        for a in Opcode::ALL {
            for b in Opcode::ALL {
                if a != b {
                    assert!(
                        !b.template().bytes.starts_with(a.template().bytes),
                        "{a:?} is a prefix of {b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_decode() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::decode(op.template().bytes), Some(op));
        }
        assert_eq!(Opcode::decode(&[0x90]), None);
        assert_eq!(Opcode::Div.to_string(), "idiv rcx");
        assert_eq!(Opcode::decode(&[]), None);
    }
}
