//! Module `scanner` implements a one‑pass, streaming lexer for Kestrel source.
//!
//! It transforms a `&str` into a sequence of `Token<'a>`s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token<'a>, KestrelError>` on each `.next()`. Lexical errors
//!   do not stop the stream; scanning resumes after the offending character.
//!
//! - `scan_all(src) -> (Vec<Token>, Vec<KestrelError>)`
//!   Convenience split of the stream into tokens and errors.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `[`, `]`, `,`, `-`, `+`, `;`, `*`.
//! - One‑or‑two character operators: `!`/`!=`, `=`/`==`, `<`/`<=`, `>`/`>=`.
//! - `/` or a `//` comment running to end of line (skipped with `memchr`).
//! - String literals `"…"` (may span lines, no escapes).
//! - Integer literals and `digits.digits` float literals.
//! - Identifiers/keywords, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! # Example
//!
//! ```rust
//! use kestrel::scanner::scan_all;
//!
//! let (tokens, errors) = scan_all("var x = 1; // trailing");
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 6);
//! ```

use crate::error::{KestrelError, Result};
use crate::token::{Position, Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// Reserved words, resolved through a compile-time perfect hash.

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"func"   => TokenType::FUNC,
    b"var"    => TokenType::VAR,
    b"true"   => TokenType::TRUE,
    b"false"  => TokenType::FALSE,
    b"null"   => TokenType::NULL,
    b"if"     => TokenType::IF,
    b"else"   => TokenType::ELSE,
    b"return" => TokenType::RETURN,
    b"for"    => TokenType::FOR,
};

/// Look up `ident` in the keyword table, falling back to `IDENTIFIER`.
pub fn lookup_ident(ident: &str) -> TokenType {
    KEYWORDS
        .get(ident.as_bytes())
        .cloned()
        .unwrap_or(TokenType::IDENTIFIER)
}

/// Streaming lexer over a borrowed source string.  Every token it yields
/// borrows its `lexeme` from that string.
pub struct Scanner<'a> {
    source: &'a str,
    src: &'a [u8],              // `source` as bytes; every token boundary is ASCII
    start: usize,               // first byte of the lexeme being scanned
    curr: usize,                // next byte to examine
    line: usize,                // current line, 1-based
    line_start: usize,          // byte index where the current line begins
    start_pos: Position,        // position of `start`
    pending: Option<TokenType>, // kind recognised by the last `scan_token`
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            line_start: 0,
            start_pos: Position::new(1, 1),
            pending: None,
        }
    }

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Lookahead of two; `0` past EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.curr;
    }

    /// Pick `when_eq` if the next byte is `=`, otherwise `otherwise`.
    #[inline(always)]
    fn either(&mut self, when_eq: TokenType, otherwise: TokenType) -> TokenType {
        if self.match_byte(b'=') {
            when_eq
        } else {
            otherwise
        }
    }

    /// Consume one lexeme.  A token kind lands in `self.pending`; whitespace
    /// and comments leave it `None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            // punctuation
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b',' => TokenType::COMMA,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            // `X` or `X=`
            b'!' => self.either(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.newline();

                return Ok(());
            }

            // `//` runs to end of line
            b'/' => {
                if self.match_byte(b'/') {
                    // Leave the newline itself for the next call so the line
                    // counter stays in one place.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                TokenType::SLASH
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                // Step over UTF‑8 continuation bytes so slices stay on char boundaries.
                while !self.is_at_end() && (self.peek() & 0b1100_0000) == 0b1000_0000 {
                    self.advance();
                }

                let c: char = self.source[self.start..self.curr]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);

                return Err(KestrelError::lex(
                    self.start_pos,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// String literal; on success `curr` is past the closing quote.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.newline();
            }
        }

        if self.is_at_end() {
            return Err(KestrelError::lex(self.start_pos, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = &self.source[self.start + 1..self.curr - 1];
        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse an integer (`123`) or float (`3.14`) literal.
    fn parse_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }

            let text: &str = &self.source[self.start..self.curr];

            // digits '.' digits always parses
            return TokenType::FLOAT(text.parse::<f64>().unwrap_or(0.0));
        }

        let text: &str = &self.source[self.start..self.curr];

        TokenType::INT(text.parse::<i64>().ok())
    }

    /// Identifier or keyword.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        lookup_ident(&self.source[self.start..self.curr])
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            self.start = self.curr;
            self.start_pos = Position::new(self.line, self.start - self.line_start + 1);
            self.pending = None;

            // Emit exactly one EOF, then terminate.
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.start_pos)));
            }

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lex: &'a str = &self.source[self.start..self.curr];
                debug!("Scanned token ({:?}) at {}", tt, self.start_pos);

                return Some(Ok(Token::new(tt, lex, self.start_pos)));
            }
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `source` to completion, splitting the stream into tokens (always
/// ending with `EOF`) and lexical errors.
pub fn scan_all(source: &str) -> (Vec<Token<'_>>, Vec<KestrelError>) {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut errors: Vec<KestrelError> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} tokens with {} lexical errors",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
