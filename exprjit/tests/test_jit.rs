#![cfg(all(unix, target_arch = "x86_64"))]
use exprjit::prelude::*;
use rand::prelude::*;

#[test]
fn test_jit_expr() {
    let f = compile("x + 9*9 - 1*40").unwrap();
    for x in 0..25 {
        assert_eq!(f.call(x), x + 41);
    }
}

#[test]
fn test_jit_precedence() {
    assert_eq!(compile("2 + 3 * 4").unwrap().call(0), 14);
    assert_eq!(compile("(2 + 3) * 4").unwrap().call(0), 20);
    assert_eq!(compile("10 - 2 - 3").unwrap().call(0), 5);
    assert_eq!(compile("100 / 10 / 5").unwrap().call(0), 2);
}

#[test]
fn test_jit_decimal() {
    assert_eq!(compile("1.5").unwrap().call(0), 1);
    assert_eq!(compile("2 * 4.5 + 1.6").unwrap().call(0), 10);

    // Division happens at call time when the argument is involved.
    let f = compile("x * 1.5").unwrap();
    assert_eq!(f.call(3), 3);
    assert_eq!(f.call(10), 10);
    let f = compile("x * 15 / 10").unwrap();
    assert_eq!(f.call(10), 15);

    // Fraction digits beyond 64 bits of precision are dropped.
    assert_eq!(compile("3.14159265358979323846").unwrap().call(0), 3);
    assert_eq!(compile("0.0000000000000000001").unwrap().call(0), 0);
    assert_eq!(compile("x * 3.14159265358979323846").unwrap().call(1), 3);
}

#[test]
fn test_jit_implicit_mul() {
    assert_eq!(compile("2x").unwrap().call(5), 10);
    assert_eq!(compile("3(1+2)").unwrap().call(0), 9);
    assert_eq!(compile("x(x + 1)").unwrap().call(4), 20);

    // After a decimal literal.
    assert_eq!(compile("1.5x").unwrap().call(4), 4);
    assert_eq!(compile("2.5(x + 1)").unwrap().call(3), 8);
}

#[test]
fn test_jit_wide_constants() {
    assert_eq!(compile("5000000000").unwrap().call(0), 5_000_000_000);
    assert_eq!(compile("x + 5000000000").unwrap().call(1), 5_000_000_001);
    assert_eq!(compile("0 - 5000000000").unwrap().call(0), -5_000_000_000);
    assert_eq!(compile("9223372036854775807").unwrap().call(0), i64::MAX);
    assert_eq!(compile("2147483647 + x").unwrap().call(1), 2_147_483_648);
    assert_eq!(compile("0 - 2147483648").unwrap().call(0), i32::MIN as i64);
}

#[test]
fn test_jit_signed_arithmetic() {
    let f = compile("x / 2").unwrap();
    assert_eq!(f.call(-7), -3);
    assert_eq!(f.call(7), 3);

    let f = compile("x * (0 - 3)").unwrap();
    assert_eq!(f.call(5), -15);
    assert_eq!(f.call(-5), 15);

    let f = compile("x - 10").unwrap();
    assert_eq!(f.call(3), -7);
}

#[test]
fn test_jit_constant_ignores_argument() {
    let f = compile("(7 + 3) * 2 - 1.5").unwrap();
    for x in [0, 1, -1, i64::MAX, i64::MIN] {
        assert_eq!(f.call(x), 19);
    }
}

#[test]
fn test_jit_without_folding() {
    let conf = JitConf {
        fold_constants: false,
        ..JitConf::default()
    };
    let f = compile_with("x + 9*9 - 1*40", &conf).unwrap();
    assert_eq!(f.call(0), 41);
    assert_eq!(compile_with("2 * 4.5 + 1.6", &conf).unwrap().call(0), 10);
}

#[test]
fn test_jit_code_readback() {
    let program = translate("x + 1", &JitConf::default()).unwrap();
    let f = program.load().unwrap();
    assert_eq!(f.code(), program.code());
    assert!(f.buffer().is_sealed());
}

#[test]
fn test_jit_large_program() {
    // More code than fits in a single page.
    let source = vec!["(x + 5000000000)"; 400].join(" + ");
    let conf = JitConf {
        max_tokens: 4096,
        ..JitConf::default()
    };
    let f = compile_with(&source, &conf).unwrap();
    assert!(f.code().len() > 4096);
    assert_eq!(f.call(1), 400 * 5_000_000_001);
}

#[test]
fn test_jit_threads() {
    let f = std::sync::Arc::new(compile("3x - 1").unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let f = f.clone();
            std::thread::spawn(move || (0..100).all(|x| f.call(x + i) == 3 * (x + i) - 1))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

/// Machine code and the interpreter must agree for any argument.
#[test]
fn test_jit_matches_interpreter() {
    const SOURCES: &[&str] = &[
        "x",
        "x + 9*9 - 1*40",
        "2x + 3",
        "x * x - x / 3",
        "(x - 1)(x + 1)",
        "x / 7 * 7 + x - x / 7 * 7",
        "x * 5000000000 + 3.75",
        "(x + 2) / (0 - 4) - 1.25x",
        "x - (x - (x - (x - 1)))",
    ];

    let mut rng = StdRng::seed_from_u64(0xE8);

    for source in SOURCES {
        let program = translate(source, &JitConf::default()).unwrap();
        let f = program.load().unwrap();

        for _ in 0..1000 {
            let x: i64 = rng.gen_range(-1_000_000_000..1_000_000_000);
            assert_eq!(Ok(f.call(x)), program.eval(x), "{source} with x = {x}");
        }

        for x in [0, 1, -1, i64::MAX, i64::MIN + 1] {
            if let Ok(expected) = program.eval(x) {
                assert_eq!(f.call(x), expected, "{source} with x = {x}");
            }
        }
    }
}

/// Expressions without the argument evaluate to the
/// same value regardless of the argument.
#[test]
fn test_jit_random_constants() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let a: i64 = rng.gen_range(0..100_000);
        let b: i64 = rng.gen_range(1..1000);
        let c: i64 = rng.gen_range(0..100_000);
        let source = format!("({a} + {c}) * {b} - {a} / {b}");
        let expected = (a + c) * b - a / b;

        let f = compile(&source).unwrap();
        assert_eq!(f.call(rng.gen()), expected, "{source}");
    }
}
