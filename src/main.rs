use clap::Parser;
use kjs_walk::ast::SourceId;
use kjs_walk::{EngineConfig, EngineError, Interpreter, JsFunction, JsValue};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

// Deeply nested scripts recurse through the evaluator.
const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

static TRACING_INIT: Once = Once::new();

#[derive(Parser)]
#[command(name = "kjs-walk", version, about = "A tree-walking ES3 interpreter")]
struct Cli {
    /// JavaScript file to execute
    file: Option<PathBuf>,

    /// Evaluate inline JavaScript
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Print the parsed program as source instead of running it
    #[arg(long)]
    dump_source: bool,

    /// Nested calls allowed before a RangeError is thrown
    #[arg(long, default_value_t = EngineConfig::default().max_call_depth)]
    max_call_depth: usize,
}

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr).with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn new_interpreter(cli: &Cli, source_url: Option<String>) -> Interpreter {
    let mut interp = Interpreter::new(EngineConfig {
        max_call_depth: cli.max_call_depth,
        source_url,
    });
    interp.define_global(
        "print",
        JsFunction::native("print", 1, |interp, _this, args| {
            let mut parts = Vec::with_capacity(args.len());
            for value in args {
                parts.push(interp.to_js_string(value)?.to_rust_string());
            }
            println!("{}", parts.join(" "));
            Ok(JsValue::Undefined)
        }),
    );
    interp
}

fn report(err: &EngineError) -> ExitCode {
    match err {
        EngineError::Uncaught { message, line } => {
            match line {
                Some(line) => eprintln!("Uncaught {message} (line {line})"),
                None => eprintln!("Uncaught {message}"),
            }
            ExitCode::from(1)
        }
        EngineError::Parse(e) => {
            eprintln!("{e} (line {})", e.line);
            ExitCode::from(2)
        }
        EngineError::Io(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}

fn execute_code(cli: &Cli, code: &str, source_url: Option<String>) -> ExitCode {
    let mut interp = new_interpreter(cli, source_url);
    if cli.dump_source {
        return match interp.parse(code, SourceId(0)) {
            Ok(program) => {
                print!("{program}");
                ExitCode::SUCCESS
            }
            Err(e) => report(&EngineError::Parse(e)),
        };
    }
    match interp.eval_source(code) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn run_file(cli: &Cli, path: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return report(&EngineError::from(e)),
    };
    execute_code(cli, &source, Some(path.display().to_string()))
}

fn run_repl(cli: &Cli) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut interp = new_interpreter(cli, None);

    println!("kjs-walk v{}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript statements. Press Ctrl-D to exit.");

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match interp.eval_source(trimmed) {
                    Ok(JsValue::Undefined) => {}
                    Ok(value) => match interp.to_js_string(&value) {
                        Ok(s) => println!("{s}"),
                        Err(_) => println!("{value}"),
                    },
                    Err(e) => {
                        report(&e);
                    }
                }
            }
            Err(e) => {
                eprintln!("Read error: {e}");
                return ExitCode::from(2);
            }
        }
    }

    println!();
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> ExitCode {
    if let Some(code) = &cli.eval {
        return execute_code(&cli, code, None);
    }

    if let Some(path) = &cli.file {
        return run_file(&cli, path);
    }

    run_repl(&cli)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let worker = std::thread::Builder::new()
        .name("kjs-walk".into())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || run(cli));
    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("failed to start interpreter thread: {e}");
            ExitCode::FAILURE
        }
    }
}
