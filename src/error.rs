//! Centralised error hierarchy for the **Kestrel interpreter**.
//!
//! The scanner, parser and command-line front end convert their failure
//! modes into one of the variants defined here.  Evaluation-time failures
//! travel separately as [`crate::interpreter::Signal`] values, because they
//! are part of the language's control flow rather than host errors.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Position;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KestrelError {
    /// Lexical (scanner) error with source position.
    #[error("[line {position}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line/column where the error occurred.
        position: Position,
    },

    /// Syntactic (parser) error.
    #[error("[line {position}] {message}")]
    Parse { message: String, position: Position },

    /// Runtime evaluation error surfaced to the host.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl KestrelError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(position: Position, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: position={}, msg={}", position, message);

        KestrelError::Lex { message, position }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(position: Position, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: position={}, msg={}", position, message);

        KestrelError::Parse { message, position }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, KestrelError>;
