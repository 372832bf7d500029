use log::trace;
use serde::Serialize;
use std::fmt;
use std::mem;

/// Token kinds.  NUMBER and STRING carry their literal value; every other
/// kind is fully described by its variant.
///
/// Kinds compare by variant only (see the `PartialEq` impl), so a parser can
/// ask `check(TokenType::NUMBER(0.0))` without caring about the payload.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    // Single‑character punctuation.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,

    // One or two character operators.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    /// Contents between the quotes.
    STRING(String),
    NUMBER(f64),

    // Reserved words.
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    /// Reserved, but the grammar has no use for it.
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    EOF,
}

impl TokenType {
    /// Variant name without payload, as printed by `--emit tokens`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// Literal payload of a NUMBER or STRING token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal<'t> {
    Number(f64),
    Str(&'t str),
}

/// One scanned lexeme with its kind and 1‑based source line.
///
/// The lexeme is owned: syntax trees and closures outlive the source unit
/// they were scanned from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        trace!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type,
            lexeme,
            line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }

    /// The literal value carried by NUMBER and STRING tokens.
    pub fn literal(&self) -> Option<Literal<'_>> {
        match &self.token_type {
            TokenType::NUMBER(n) => Some(Literal::Number(*n)),
            TokenType::STRING(s) => Some(Literal::Str(s)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self.token_type, TokenType::EOF)
    }
}

/// Writes a number literal the way the token dump expects: `3` → `3.0`,
/// `3.14` → `3.14`.
fn write_number_literal(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        let mut buf: itoa::Buffer = itoa::Buffer::new();
        write!(f, "{}.0", buf.format(n as i64))
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{}", s),
            TokenType::NUMBER(n) => write_number_literal(f, *n),
            _ => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_compare_by_variant_only() {
        assert_eq!(TokenType::NUMBER(1.0), TokenType::NUMBER(2.0));
        assert_ne!(TokenType::NUMBER(1.0), TokenType::STRING("1".into()));
    }

    #[test]
    fn display_matches_token_dump_format() {
        assert_eq!(
            Token::new(TokenType::NUMBER(42.0), "42", 1).to_string(),
            "NUMBER 42 42.0"
        );
        assert_eq!(
            Token::new(TokenType::NUMBER(1.5), "1.50", 1).to_string(),
            "NUMBER 1.50 1.5"
        );
        assert_eq!(
            Token::new(TokenType::STRING("hi".into()), "\"hi\"", 1).to_string(),
            "STRING \"hi\" hi"
        );
        assert_eq!(Token::new(TokenType::EOF, "", 3).to_string(), "EOF  null");
    }
}
