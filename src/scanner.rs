//! Lexer: source text to [`Token`]s.
//!
//! [`Scanner`] is a [`FusedIterator`] yielding `Result<Token, LoxError>`.  A
//! lexical error does not end the scan; the following call resumes right after
//! the offending character, so one pass reports every problem.  Exactly one
//! `EOF` token closes the stream.
//!
//! * Keywords are looked up in a compile‑time perfect hash (`phf`).
//! * `//` comments are skipped with `memchr` up to the next newline.
//! * Strings may span lines and carry no escapes; numbers are decimal with an
//!   optional fraction.
//!
//! ```rust
//! use lox_interpreter::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // example") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{info, trace};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Streaming lexer over one source unit.  Produces owned [`Token`]s, so the
/// tokens may outlive `src`.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize, // first byte of the lexeme being scanned
    curr: usize,  // one past the last byte consumed
    line: usize,
    done: bool, // EOF already emitted
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Consume one byte.  Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` positions ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn look(&self, offset: usize) -> u8 {
        self.bytes().get(self.curr + offset).copied().unwrap_or(0)
    }

    /// One‑or‑two character operator: `long` if the next byte is `=`.
    #[inline(always)]
    fn with_equal(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.look(0) == b'=' {
            self.curr += 1;
            long
        } else {
            short
        }
    }

    /// `start` and `curr` only ever sit on ASCII bytes or string quotes, so
    /// the slice is on char boundaries.
    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.src[self.start..self.curr]
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan from `self.start`.  `Ok(None)` means whitespace or a comment was
    /// skipped and nothing is to be emitted.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let tt: TokenType = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.look(0) == b'/' => {
                // Stop in front of the newline; the next call counts it.
                self.curr = match memchr(b'\n', &self.bytes()[self.curr..]) {
                    Some(pos) => self.curr + pos,
                    None => self.src.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // One diagnostic per code point, however many bytes it spans.
                let ch: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Some(tt))
    }

    /// Double‑quoted literal; newlines inside are allowed and counted.
    fn string(&mut self) -> Result<TokenType> {
        let body: usize = self.curr;

        while !self.is_at_end() && self.look(0) != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        let text: String = self.src[body..self.curr].to_owned();
        self.curr += 1; // closing quote

        Ok(TokenType::STRING(text))
    }

    /// `123` or `3.14`.  A trailing `.` is left for the next token.
    fn number(&mut self) -> TokenType {
        while self.look(0).is_ascii_digit() {
            self.curr += 1;
        }

        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.curr += 1;

            while self.look(0).is_ascii_digit() {
                self.curr += 1;
            }
        }

        // Digits with at most one interior '.' always parse.
        TokenType::NUMBER(self.lexeme().parse::<f64>().unwrap_or(0.0))
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.look(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        KEYWORDS
            .get(self.lexeme().as_bytes())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;
            // A token belongs to the line it starts on, even a multi-line string.
            let line: usize = self.line;

            match self.scan_token() {
                Ok(Some(tt)) => {
                    trace!("Scanned {} on line {}", tt.name(), line);
                    return Some(Ok(Token::new(tt, self.lexeme(), line)));
                }
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan a whole source unit, separating tokens from lexical diagnostics.
/// The token vector always ends with `EOF`.
pub fn scan_tokens(src: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for result in Scanner::new(src) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
