use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::{Parser as ClapParser, ValueEnum};
use env_logger::Builder;
use log::{debug, info};

use lox_interpreter as lox;

use lox::ast_printer::AstPrinter;
use lox::interpreter::INTERPRETER_STACK_SIZE;
use lox::scanner::Scanner;
use lox::Lox;

/// Exit codes (`sysexits.h`).
const EX_OK: i32 = 0;
const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_IOERR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(name = "lox", version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Print the token stream or syntax tree instead of running
    #[arg(long, value_enum)]
    emit: Option<Emit>,

    /// Enable logging to lox.log
    #[arg(long)]
    log: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    /// One `KIND lexeme literal` line per token
    Tokens,

    /// One JSON object per token
    Json,

    /// Prefix-form syntax tree, one statement per line
    Ast,
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).with_context(|| format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("lox.log").context("Failed to create lox.log")?;

    // `[module:line] - message`, Debug by default, RUST_LOG overrides.
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("lox_interpreter::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to lox.log");
    Ok(())
}

/// Token dump for `--emit tokens|json`.  Returns the exit code.
fn emit_tokens(source: &str, json: bool) -> Result<i32> {
    let mut tokenized = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { EX_OK } else { EX_DATAERR })
}

/// Process one source unit (a file or a REPL line) and return its exit code.
fn run_source(session: &mut Lox, emit: Option<Emit>, source: &str) -> Result<i32> {
    match emit {
        Some(Emit::Tokens) => emit_tokens(source, false),
        Some(Emit::Json) => emit_tokens(source, true),

        Some(Emit::Ast) => match session.parse(source) {
            Ok(statements) => {
                for stmt in &statements {
                    println!("{}", AstPrinter::print_stmt(stmt));
                }
                Ok(EX_OK)
            }
            Err(e) => {
                eprintln!("{}", e);
                Ok(e.exit_code())
            }
        },

        None => match session.run(source) {
            Ok(()) => Ok(EX_OK),
            Err(e) => {
                debug!("Run failed: {:?}", e);
                io::stdout().flush().context("Failed to flush stdout")?;
                eprintln!("{}", e);
                Ok(e.exit_code())
            }
        },
    }
}

fn run_file(path: &Path, emit: Option<Emit>) -> Result<i32> {
    let source = match read_file(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            return Ok(EX_IOERR);
        }
    };

    let mut session = Lox::new();
    run_source(&mut session, emit, &source)
}

/// Read‑eval‑print loop.  Errors are reported and the loop goes on; end of
/// input ends the session successfully.
fn run_prompt(emit: Option<Emit>) -> Result<i32> {
    info!("Starting REPL");

    let mut session = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if lines.read_line(&mut line).context("Failed to read stdin")? == 0 {
            println!();
            return Ok(EX_OK);
        }

        let code = run_source(&mut session, emit, &line)?;
        debug!("REPL line finished with code {}", code);
    }
}

fn run(args: Cli) -> Result<i32> {
    match &args.script {
        Some(path) => run_file(path, args.emit),
        None => run_prompt(args.emit),
    }
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            e.print().context("Failed to print usage")?;
            process::exit(EX_USAGE);
        }
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 = thread::Builder::new()
        .name("lox".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(args))
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))??;

    process::exit(code);
}
