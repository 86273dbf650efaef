use exprjit::{prelude::*, lex::LexError, tokens::Span};

fn error(source: &str) -> CompileError {
    translate(source, &JitConf::default()).unwrap_err()
}

#[test]
fn test_syntax_errors() {
    for source in ["2 +", "* 2", "", "   ", "()", "1 2", "1 $ 2", "1.", "2 + .5", "x²"] {
        assert_eq!(error(source).kind(), ErrorKind::Syntax, "{source:?}");
    }
}

#[test]
fn test_unknown_character_span() {
    const CODE: &str = "1 $ 2";
    match error(CODE) {
        CompileError::Lex(LexError::UnknownCharacter('$', span)) => {
            assert_eq!(span.fragment(CODE), "$");
        }
        err => panic!("unexpected error {err:?}"),
    }
}

#[test]
fn test_unbalanced_parentheses() {
    const CODE: &str = "(1+2";
    let err = error(CODE);
    assert_eq!(err.kind(), ErrorKind::UnbalancedParentheses);
    assert_eq!(err.span(), Some(Span::new(0, 1)));

    assert_eq!(error("1+2)").kind(), ErrorKind::UnbalancedParentheses);
    assert_eq!(error("(x))(").kind(), ErrorKind::UnbalancedParentheses);
}

#[test]
fn test_division_by_zero() {
    for source in ["1/0", "x / (5 - 5)", "2 / 0.0", "x / 0"] {
        assert_eq!(error(source).kind(), ErrorKind::DivisionByZero, "{source:?}");
    }
}

#[test]
fn test_token_capacity() {
    let source = vec!["1"; 64].join("+");
    assert!(translate(&source, &JitConf::default()).is_ok());

    let source = vec!["1"; 65].join("+");
    let err = error(&source);
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(matches!(err, CompileError::Lex(LexError::TooManyTokens(128))));
}

#[test]
fn test_capacity_exceeded() {
    let conf = JitConf {
        max_depth: 2,
        ..JitConf::default()
    };
    let err = translate("(((x)))", &conf).unwrap_err();
    assert!(matches!(err, CompileError::CapacityExceeded(2)));
}

#[test]
fn test_error_display() {
    assert_eq!(error("1 $ 2").to_string(), "syntax error: unknown character '$'");
    assert_eq!(error("2 +").to_string(), "syntax error: unexpected end of expression");
    assert_eq!(error("1/0").to_string(), "division by zero");
}

#[cfg(all(unix, target_arch = "x86_64"))]
#[test]
fn test_compile_errors_produce_no_callable() {
    for source in ["2 +", "(1+2", "1/0", "1 $ 2"] {
        assert!(compile(source).is_err(), "{source:?}");
    }
}
