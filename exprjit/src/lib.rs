//! Compiles single-variable arithmetic expressions into native functions.
//!
//! ```
//! # #[cfg(all(unix, target_arch = "x86_64"))]
//! # {
//! let f = exprjit::compile("x + 9*9 - 1*40").unwrap();
//! assert_eq!(f.call(0), 41);
//! assert_eq!(f.call(10), 51);
//! # }
//! ```
pub mod codegen;
pub mod constants;
pub mod disasm;
mod error;
#[cfg(all(unix, target_arch = "x86_64"))]
pub mod exec;
pub mod fold;
pub mod interp;
pub mod isa;
mod jit;
pub mod lex;
pub mod postfix;
pub mod tokens;

pub use self::{
    error::{CompileError, CompileResult, ErrorKind},
    jit::{display_tokens, translate, JitConf, Program},
};

#[cfg(all(unix, target_arch = "x86_64"))]
pub use self::{
    exec::JitFn,
    jit::{compile, compile_with},
};

pub mod prelude {
    pub use super::{
        disasm::Disassembler,
        error::{CompileError, CompileResult, ErrorKind},
        jit::{translate, JitConf, Program},
    };

    #[cfg(all(unix, target_arch = "x86_64"))]
    pub use super::{
        exec::JitFn,
        jit::{compile, compile_with},
    };
}
