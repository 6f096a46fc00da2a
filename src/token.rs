use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the Kestrel scanner.
///
/// Variants without data represent punctuation or keyword tokens.
/// `INT(i64)`, `FLOAT(f64)` and `STRING(String)` carry their decoded literal
/// values.  `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// ','
    COMMA,

    /// ';'
    SEMICOLON,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// An integer literal.  Out-of-range literals are reported by the parser.
    INT(Option<i64>),

    /// A floating point literal
    FLOAT(f64),

    /// 'func'
    FUNC,

    /// 'var'
    VAR,

    /// 'true'
    TRUE,

    /// 'false'
    FALSE,

    /// 'null'
    NULL,

    /// 'if'
    IF,

    /// 'else'
    ELSE,

    /// 'return'
    RETURN,

    /// 'for'
    FOR,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Variant name without payload, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
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
            TokenType::STRING(_) => "STRING",
            TokenType::INT(_) => "INT",
            TokenType::FLOAT(_) => "FLOAT",
            TokenType::FUNC => "FUNC",
            TokenType::VAR => "VAR",
            TokenType::TRUE => "TRUE",
            TokenType::FALSE => "FALSE",
            TokenType::NULL => "NULL",
            TokenType::IF => "IF",
            TokenType::ELSE => "ELSE",
            TokenType::RETURN => "RETURN",
            TokenType::FOR => "FOR",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// 1‑based source coordinates of a token's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the position where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    /// Where the lexeme starts in the source.
    pub position: Position,
}

impl<'a> Token<'a> {
    /// Create a new Token with the given type, lexeme, and position.
    pub fn new(token_type: TokenType, lexeme: &'a str, position: Position) -> Self {
        debug!(
            "Creating new token: type={:?}, lexeme={}, position={}",
            token_type, lexeme, position
        );

        Self {
            token_type,
            lexeme,
            position,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant: &'static str = self.token_type.name();

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{} {} {}", variant, self.lexeme, s),

            TokenType::INT(Some(n)) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{} {} {}", variant, self.lexeme, buf.format(*n))
            }

            // 3.0 → "3.0", 3.25 → "3.25"
            TokenType::FLOAT(n) if n.fract() == 0.0 => {
                write!(f, "{} {} {:.1}", variant, self.lexeme, n)
            }

            TokenType::FLOAT(n) => write!(f, "{} {} {}", variant, self.lexeme, n),

            _ => write!(f, "{} {} null", variant, self.lexeme),
        }
    }
}
