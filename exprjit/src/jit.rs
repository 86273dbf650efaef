//! Compilation pipeline.
use log::{debug, trace};

use crate::{
    codegen::CodeGen,
    constants::{MAX_DEPTH, MAX_TOKENS},
    error::CompileResult,
    fold::fold,
    interp,
    lex::tokenize,
    postfix::to_postfix,
    tokens::{ArithError, Token},
};

#[cfg(all(unix, target_arch = "x86_64"))]
use crate::exec::JitFn;

/// Compiler configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JitConf {
    /// Capacity of the token buffer.
    pub max_tokens: usize,
    /// Capacity of the operator stack.
    pub max_depth: usize,
    pub fold_constants: bool,
}

impl Default for JitConf {
    fn default() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            max_depth: MAX_DEPTH,
            fold_constants: true,
        }
    }
}

/// Output of the compiler, before it is loaded into executable memory.
#[derive(Debug, Clone)]
pub struct Program {
    postfix: Vec<Token>,
    code: Box<[u8]>,
}

impl Program {
    /// Final postfix sequence the code was generated from.
    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    /// Generated machine code.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Evaluate the program without running the machine code.
    pub fn eval(&self, arg: i64) -> Result<i64, ArithError> {
        interp::eval(&self.postfix, arg)
    }

    /// Load the machine code into executable memory.
    #[cfg(all(unix, target_arch = "x86_64"))]
    pub fn load(&self) -> CompileResult<JitFn> {
        Ok(JitFn::load(&self.code)?)
    }
}

/// Run every stage of the compiler over the source text.
///
/// Each stage consumes the whole output of the previous one.
/// The first failing stage aborts the rest.
pub fn translate(source: &str, conf: &JitConf) -> CompileResult<Program> {
    let tokens = tokenize(source, conf.max_tokens)?;
    trace!("tokens: {}", display_tokens(&tokens));

    let mut postfix = to_postfix(&tokens, conf.max_depth)?;
    trace!("postfix: {}", display_tokens(&postfix));

    if conf.fold_constants {
        postfix = fold(&postfix)?;
        trace!("folded: {}", display_tokens(&postfix));
    }

    let code = CodeGen::new().compile(&postfix)?;
    debug!(
        "compiled {:?} into {} tokens, {} bytes of code",
        source,
        postfix.len(),
        code.len()
    );

    Ok(Program { postfix, code })
}

/// Compile the expression into a native function of its one argument.
#[cfg(all(unix, target_arch = "x86_64"))]
pub fn compile(source: &str) -> CompileResult<JitFn> {
    compile_with(source, &JitConf::default())
}

#[cfg(all(unix, target_arch = "x86_64"))]
pub fn compile_with(source: &str, conf: &JitConf) -> CompileResult<JitFn> {
    translate(source, conf)?.load()
}

/// Space separated tokens, for logging and listings.
pub fn display_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| token.kind.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_translate() {
        let program = translate("x + 9*9 - 1*40", &JitConf::default()).unwrap();
        assert_eq!(display_tokens(program.postfix()), "x 81 + 40 -");
        assert_eq!(program.eval(0), Ok(41));
        assert_eq!(program.code().last(), Some(&0xC3));
    }

    #[test]
    fn test_translate_without_folding() {
        let conf = JitConf {
            fold_constants: false,
            ..JitConf::default()
        };
        let program = translate("2 + 3 * 4", &conf).unwrap();
        assert_eq!(display_tokens(program.postfix()), "2 3 4 * +");
        assert_eq!(program.eval(0), Ok(14));
    }

    #[test]
    fn test_translate_capacity() {
        let conf = JitConf {
            max_tokens: 4,
            ..JitConf::default()
        };
        let err = translate("1 + 2 + 3", &conf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let conf = JitConf {
            max_depth: 1,
            ..JitConf::default()
        };
        let err = translate("(1 + 2)", &conf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    }
}
