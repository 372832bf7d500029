//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  A whole run
//! is summarised by [`RunError`], which replaces process‑wide "had error"
//! flags: the driver inspects the returned value and picks the exit code.
//!
//! The module **does not** print diagnostics itself.

use std::fmt;
use std::io;
use thiserror::Error;

use log::debug;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is `" at end"` or `" at 'x'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis failure (duplicate local, bad `return`, ...).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Where a static diagnostic points: the end of input or a lexeme.
fn location(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Source line the diagnostic refers to, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Runtime(e) => Some(e.token.line),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }

    /// Bare message without the `[line N] Error...` decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. } => message.clone(),
            LoxError::Runtime(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

/// A failure raised while evaluating the program.  Carries the token the
/// failure is attributed to (operator, call paren, property name, ...).
///
/// Displays as the message, the token in its `KIND lexeme literal` form, and
/// a second `[line N]` line.
#[derive(Debug, Clone, Error)]
#[error("{message}: {token}\n[line {}]", .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating Runtime error: line={}, token={}, msg={}",
            token.line, token.lexeme, message
        );

        RuntimeError {
            token: token.clone(),
            message,
        }
    }
}

/// Outcome of a failed run over one source unit.
#[derive(Debug)]
pub enum RunError {
    /// Scanner, parser or resolver diagnostics; the program never ran.
    Static(Vec<LoxError>),

    /// Evaluation stopped at the first runtime error.
    Runtime(RuntimeError),
}

impl RunError {
    /// Process exit code for this failure (`sysexits` numbering).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    /// The individual diagnostics, one per reported problem.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            RunError::Static(errors) => errors.iter().map(ToString::to_string).collect(),
            RunError::Runtime(e) => vec![e.to_string()],
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostics().join("\n"))
    }
}

impl std::error::Error for RunError {}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn static_diagnostics_carry_location() {
        let semi = Token::new(TokenType::SEMICOLON, ";", 4);
        let eof = Token::new(TokenType::EOF, "", 9);

        assert_eq!(
            LoxError::parse(&semi, "Expect expression.").to_string(),
            "[line 4] Error at ';': Expect expression."
        );
        assert_eq!(
            LoxError::parse(&eof, "Expect ';' after value.").to_string(),
            "[line 9] Error at end: Expect ';' after value."
        );
        assert_eq!(
            LoxError::lex(2, "Unexpected character: @").to_string(),
            "[line 2] Error: Unexpected character: @"
        );
    }

    #[test]
    fn runtime_diagnostic_has_second_line() {
        let plus = Token::new(TokenType::PLUS, "+", 7);
        let err = RuntimeError::new(&plus, "Operands must be two numbers or two strings.");

        assert_eq!(
            err.to_string(),
            "Operands must be two numbers or two strings.: PLUS + null\n[line 7]"
        );
        assert_eq!(RunError::Runtime(err).exit_code(), 70);
    }

    #[test]
    fn runtime_diagnostic_shows_token_literal() {
        let name = Token::new(TokenType::IDENTIFIER, "nope", 3);
        let err = RuntimeError::new(&name, "Undefined variable 'nope'.");

        assert_eq!(
            err.to_string(),
            "Undefined variable 'nope'.: IDENTIFIER nope null\n[line 3]"
        );
    }
}
