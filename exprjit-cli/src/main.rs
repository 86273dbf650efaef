//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    fs,
    io::{self, BufRead},
    ops::Range,
};

use exprjit::{display_tokens, prelude::*, tokens::ArithError};
use log::{error, info};

static USAGE: &str = r#"
usage: exprjit [--conf FILE] CMD [ARGS]

commands:
    eval EXPR [FROM] [TO]   Compile the expression and print f(x) for x in FROM..TO
    dis EXPR                Print the postfix form and the generated machine code
    repl                    Read expressions from stdin and print f(0) for each

options:
    --conf FILE             Load compiler settings from a YAML file

examples:
    exprjit eval "x + 9*9 - 1*40"
    exprjit eval "2x(x - 1.5)" -10 10
    exprjit dis "3(x + 1)"
"#;

const DEFAULT_RANGE: Range<i64> = 0..25;

/// Compiled expression that reports arithmetic faults instead of trapping.
///
/// Native division by zero, or of `i64::MIN` by -1, raises a signal that
/// ends the process. The interpreter checks the argument first, and the
/// machine code only runs when it wouldn't fault.
struct Function {
    program: Program,
    #[cfg(all(unix, target_arch = "x86_64"))]
    native: JitFn,
}

impl Function {
    fn new(program: Program) -> CompileResult<Self> {
        #[cfg(all(unix, target_arch = "x86_64"))]
        let native = program.load()?;

        #[cfg(not(all(unix, target_arch = "x86_64")))]
        info!("native code is not supported on this target, interpreting");

        Ok(Self {
            #[cfg(all(unix, target_arch = "x86_64"))]
            native,
            program,
        })
    }

    fn call(&self, x: i64) -> Result<i64, ArithError> {
        let value = self.program.eval(x)?;

        #[cfg(all(unix, target_arch = "x86_64"))]
        let value = self.native.call(x);

        Ok(value)
    }
}

fn run_eval(source: &str, range: Range<i64>, conf: &JitConf) -> Result<(), Box<dyn Error>> {
    let program = translate(source, conf).map_err(|err| report(source, err))?;
    let func = Function::new(program)?;

    for x in range {
        match func.call(x) {
            Ok(y) => println!("f({x}) = {y}"),
            Err(err) => println!("f({x}) = {err}"),
        }
    }

    Ok(())
}

fn run_disassembler(source: &str, conf: &JitConf) -> Result<(), Box<dyn Error>> {
    let program = translate(source, conf).map_err(|err| report(source, err))?;

    println!("postfix: {}", display_tokens(program.postfix()));
    println!("{} bytes of code", program.code().len());

    let mut listing = String::new();
    Disassembler::new(program.code()).disassemble(&mut listing)?;
    print!("{listing}");

    Ok(())
}

fn run_repl(conf: &JitConf) -> Result<(), Box<dyn Error>> {
    info!("reading expressions from stdin");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let source = line.trim();
        if source.is_empty() {
            continue;
        }

        let program = match translate(source, conf) {
            Ok(program) => program,
            Err(err) => {
                // Keep going, one bad line shouldn't end the session.
                report(source, err);
                continue;
            }
        };

        match Function::new(program)?.call(0) {
            Ok(value) => println!("{value}"),
            Err(err) => println!("{err}"),
        }
    }

    Ok(())
}

/// Log the error, with a marker under the offending source text.
fn report(source: &str, err: CompileError) -> CompileError {
    error!("{err}");

    if let Some(span) = err.span() {
        let prefix = source.get(..span.index as usize).unwrap_or(source);
        let indent = prefix.chars().count();
        let width = span.fragment(source).chars().count().max(1);
        eprintln!("    {source}");
        eprintln!("    {}{}", " ".repeat(indent), "^".repeat(width));
    }

    err
}

fn load_conf(filepath: &str) -> Result<JitConf, Box<dyn Error>> {
    let file = fs::File::open(filepath)?;
    let conf: JitConf = serde_yaml::from_reader(file)?;
    info!("loaded configuration from {filepath}: {conf:?}");
    Ok(conf)
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let Some(args) = parse_args() else {
        print_usage();
        // FreeBSD EX_USAGE (64)
        std::process::exit(64)
    };

    let conf = match args.conf {
        Some(filepath) => load_conf(&filepath)?,
        None => JitConf::default(),
    };

    match args.cmd {
        Cmd::Eval { source, range } => run_eval(&source, range, &conf)?,
        Cmd::Dis { source } => run_disassembler(&source, &conf)?,
        Cmd::Repl => run_repl(&conf)?,
    }

    Ok(())
}

fn parse_args() -> Option<Args> {
    let mut args = env::args().skip(1).peekable();

    let conf = match args.peek().map(String::as_str) {
        Some("--conf") => {
            args.next();
            Some(args.next()?)
        }
        _ => None,
    };

    let cmd = match args.next()?.as_str() {
        "eval" => {
            let source = args.next()?;
            let start = consume_int(&mut args, DEFAULT_RANGE.start)?;
            let end = consume_int(&mut args, DEFAULT_RANGE.end)?;
            Cmd::Eval {
                source,
                range: start..end,
            }
        }
        "dis" => Cmd::Dis {
            source: args.next()?,
        },
        "repl" => Cmd::Repl,
        _ => return None,
    };

    Some(Args { conf, cmd })
}

/// Consumes an optional integer argument.
///
/// Returns `None` when the argument is present but not an integer.
fn consume_int(mut args: impl Iterator<Item = String>, default: i64) -> Option<i64> {
    match args.next() {
        Some(arg) => arg.parse().ok(),
        None => Some(default),
    }
}

fn print_usage() {
    println!("exprjit v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

struct Args {
    conf: Option<String>,
    cmd: Cmd,
}

enum Cmd {
    /// Evaluate over a range of arguments
    Eval { source: String, range: Range<i64> },
    /// Disassemble
    Dis { source: String },
    Repl,
}
