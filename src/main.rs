use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use kestrel::interpreter::Interpreter;
use kestrel::scanner::Scanner;
use kestrel::value::Value;

#[derive(ClapParser, Debug)]
#[command(version, about = "Kestrel language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to kestrel.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file (or stdin), printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input and prints the fully parenthesised program
    Parse {
        filename: Option<PathBuf>,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input and prints the final value
    Evaluate { filename: Option<PathBuf> },

    /// Runs input as a Kestrel program for its side effects
    Run { filename: Option<PathBuf> },
}

/// Reads source text from `filename`, or from stdin when absent.
fn read_source(filename: Option<PathBuf>) -> Result<String> {
    let Some(filename) = filename else {
        info!("Reading source from stdin");

        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;

        return Ok(buf);
    };

    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Empty files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read once and copied out before returning; the file
    // is not expected to change while it is mapped.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;
    let text = std::str::from_utf8(&map)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("kestrel.log").context("Failed to create kestrel.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip the crate prefix from module paths
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("kestrel::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG overrides the default
        .init();

    info!("Logger initialized, writing to kestrel.log");
    Ok(())
}

/// Parse `source`, printing every diagnostic and exiting with 65 on failure.
fn parse_or_exit(source: &str) -> kestrel::parser::Program {
    let (program, errors) = kestrel::parse_source(source);

    if !errors.is_empty() {
        for e in &errors {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
        }

        std::process::exit(65);
    }

    info!("Parsed {} statements", program.statements.len());

    program
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            let source = read_source(filename)?;
            let mut tokens = Vec::new();
            let mut tokenized = true;

            for token in Scanner::new(&source) {
                match token {
                    Ok(token) => {
                        if !json {
                            println!("{}", token);
                        }
                        tokens.push(token);
                    }

                    Err(e) => {
                        tokenized = false;
                        debug!("Tokenization debug: {}", e);
                        eprintln!("{}", e);
                    }
                }
            }

            if json {
                let out = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
                println!("{}", out);
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename, json } => {
            info!("Running Parse subcommand");
            let source = read_source(filename)?;
            let program = parse_or_exit(&source);

            if json {
                let out = serde_json::to_string_pretty(&program).context("Failed to encode AST")?;
                println!("{}", out);
            } else {
                println!("{}", program);
            }

            info!("Parse subcommand completed");
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");
            let source = read_source(filename)?;
            let program = parse_or_exit(&source);
            let mut interpreter = Interpreter::new();

            match interpreter.eval_program(&program) {
                Value::Error(message) => {
                    debug!("Runtime debug: {}", message);
                    eprintln!("Runtime error: {}", message);
                    std::process::exit(70);
                }

                value => {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }
            }

            info!("Evaluate subcommand completed");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_source(filename)?;
            let program = parse_or_exit(&source);
            let mut interpreter = Interpreter::new();

            if let Err(e) = interpreter.interpret(&program) {
                debug!("Runtime debug: {}", e);
                eprintln!("{}", e);
                std::process::exit(70);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
