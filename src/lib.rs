//! Tree‑walking interpreter for the Lox scripting language.
//!
//! The pipeline is Scanner → Parser → Resolver → Interpreter.  [`Lox`] wires
//! the stages together for one session: every call to [`Lox::run`] scans,
//! parses, resolves and executes a source unit against the same global
//! environment, so a REPL can feed it line after line.

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::{Stdout, Write};

use log::info;

use crate::ast::{ExprId, Stmt};
use crate::error::{LoxError, RunError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// One interpreter session.
pub struct Lox<W: Write = Stdout> {
    interpreter: Interpreter<W>,
    next_id: ExprId,
}

impl Lox<Stdout> {
    pub fn new() -> Self {
        Self::with_output(std::io::stdout())
    }
}

impl Default for Lox<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_output(out: W) -> Self {
        Lox {
            interpreter: Interpreter::with_output(out),
            next_id: ExprId(0),
        }
    }

    /// Scan and parse a source unit without running it.  Lexical and syntax
    /// errors are reported together, ordered by line.
    pub fn parse(&mut self, source: &str) -> Result<Vec<Stmt>, RunError> {
        let (tokens, mut errors) = scan_tokens(source);

        let mut parser = Parser::starting_at(tokens, self.next_id);
        let parsed = parser.parse();
        self.next_id = parser.next_id();

        match parsed {
            Ok(statements) if errors.is_empty() => Ok(statements),
            Ok(_) => Err(RunError::Static(errors)),
            Err(parse_errors) => {
                errors.extend(parse_errors);
                errors.sort_by_key(LoxError::line);
                Err(RunError::Static(errors))
            }
        }
    }

    /// Run one source unit.  Static errors stop the unit before anything
    /// executes; a runtime error stops it at the failing statement.  Either
    /// way the session stays usable.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let statements: Vec<Stmt> = self.parse(source)?;

        let locals = Resolver::new()
            .resolve(&statements)
            .map_err(RunError::Static)?;

        self.interpreter.resolve(locals);

        info!("Executing {} top-level statement(s)", statements.len());

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }

    pub fn interpreter(&self) -> &Interpreter<W> {
        &self.interpreter
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }
}
