pub mod ast_printer;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

use log::debug;

use crate::parser::{Parser, Program};

/// Scan and parse `source`.  Lexical errors come first in the returned
/// list, followed by parse errors; the program is whatever could be parsed.
pub fn parse_source(source: &str) -> (Program, Vec<String>) {
    let (tokens, lex_errors) = scanner::scan_all(source);

    let mut parser = Parser::new(&tokens);
    let (program, parse_errors) = parser.parse_program();

    let mut errors: Vec<String> = lex_errors.iter().map(ToString::to_string).collect();
    errors.extend(parse_errors);

    debug!("parse_source: {} errors", errors.len());

    (program, errors)
}
