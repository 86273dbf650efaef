//! Disassembler for generated machine code.
use std::fmt::{self, Write as FmtWrite};

use crate::isa::{Imm, Opcode};

pub struct Disassembler<'a> {
    code: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, cursor: 0 }
    }

    /// Write a listing of the whole buffer to the given writer.
    ///
    /// Bytes that don't decode to a known template are
    /// listed one by one as data.
    pub fn disassemble<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        self.cursor = 0;

        while self.cursor < self.code.len() {
            self.dis_instr(w)?;
        }

        Ok(())
    }

    /// Write a single instruction, and advance the cursor past it.
    fn dis_instr<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        let rest = &self.code[self.cursor..];

        let op = match Opcode::decode(rest) {
            Some(op) if op.template().size() <= rest.len() => op,
            _ => return self.dis_data(w),
        };

        let template = op.template();
        let bytes = &rest[..template.size()];
        let imm = &bytes[template.bytes.len()..];

        write!(w, "{:04X}: {:<30} {op}", self.cursor, hex(bytes))?;
        match template.imm {
            Imm::None => {}
            Imm::I32 => {
                let mut buf = [0; 4];
                buf.copy_from_slice(imm);
                write!(w, " {}", i32::from_le_bytes(buf))?;
            }
            Imm::I64 => {
                let mut buf = [0; 8];
                buf.copy_from_slice(imm);
                write!(w, " {}", i64::from_le_bytes(buf))?;
            }
        }
        writeln!(w)?;

        self.cursor += template.size();
        Ok(())
    }

    fn dis_data<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        let byte = self.code[self.cursor];
        writeln!(w, "{:04X}: {:<30} db 0x{byte:02X}", self.cursor, hex(&[byte]))?;
        self.cursor += 1;
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
