//! Command-line front end: tokenize, validate, parse and replay against a
//! grammar file or the bundled arithmetic grammar.
//!
//! Usage:
//!   parsetree tokens `<input>`
//!   parsetree validate [--grammar `<file>`]
//!   parsetree parse `<input>` [--grammar `<file>`] [--format tree|json]
//!   parsetree steps `<input>` [--grammar `<file>`] [--format tree|json]
//!   parsetree generate [--count N] [--random]
//!   parsetree default-grammar

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};

use parsetree::app;
use parsetree::grammar::generator::{RandomSentences, Sentences};
use parsetree::grammar::grammar::Grammar;
use parsetree::parser::parser::{replay, ParseResult};

#[derive(Debug, Parser)]
#[command(
    name = "parsetree",
    version,
    about = "Parse input against a BNF grammar and show the tree it builds."
)]
struct Args {
    /// Grammar file; the bundled arithmetic grammar when omitted.
    #[arg(short, long, global = true)]
    grammar: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the tokens of the input.
    Tokens { input: String },
    /// Check the grammar and print errors and warnings.
    Validate,
    /// Parse the input and print the tree.
    Parse {
        input: String,
        #[arg(short, long, value_enum, default_value_t = Format::Tree)]
        format: Format,
    },
    /// Parse the input and print the tree after every construction step.
    Steps {
        input: String,
        #[arg(short, long, value_enum, default_value_t = Format::Tree)]
        format: Format,
    },
    /// Print sentences of the grammar's language.
    Generate {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        /// Random derivations instead of breadth-first enumeration.
        #[arg(short, long)]
        random: bool,
        #[arg(long, default_value_t = 1)]
        min_length: usize,
        #[arg(long, default_value_t = 12)]
        max_length: usize,
    },
    /// Print the bundled grammar.
    DefaultGrammar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Tree,
    Json,
}

/// Writes log records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn read_grammar(path: Option<&PathBuf>) -> Result<String, String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("cannot read grammar {}: {}", path.display(), e)),
        None => Ok(app::default_grammar().to_string()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

fn print_result(result: &ParseResult, format: Format, with_steps: bool) -> Result<(), String> {
    match format {
        Format::Json => println!("{}", to_json(result)?),
        Format::Tree if with_steps => {
            for (k, step) in result.steps.iter().enumerate() {
                println!("step {}: {}", k + 1, step.description);
                if let Some(tree) = replay(&result.steps[..=k]) {
                    print!("{}", tree);
                }
            }
        }
        Format::Tree => {
            if let Some(tree) = &result.tree {
                print!("{}", tree);
            }
        }
    }
    match result.message() {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

fn run(args: Args) -> Result<(), String> {
    log::debug!("{:?}", args.command);
    match args.command {
        Command::Tokens { input } => {
            for token in app::tokenize(&input) {
                println!("{:<8} {:>4}  {:?}", token.kind.tag(), token.position, token.text);
            }
            Ok(())
        }
        Command::DefaultGrammar => {
            println!("{}", app::default_grammar());
            Ok(())
        }
        Command::Validate => {
            let text = read_grammar(args.grammar.as_ref())?;
            let validation = app::compile_and_validate_grammar(&text);
            for warning in &validation.warnings {
                println!("warning: {}", warning);
            }
            for error in &validation.errors {
                println!("error: {}", error);
            }
            if validation.valid {
                println!("grammar is valid");
                Ok(())
            } else {
                Err(format!("{} error(s)", validation.errors.len()))
            }
        }
        Command::Parse { input, format } => {
            let text = read_grammar(args.grammar.as_ref())?;
            print_result(&app::parse(&text, &input), format, false)
        }
        Command::Steps { input, format } => {
            let text = read_grammar(args.grammar.as_ref())?;
            print_result(&app::parse_with_steps(&text, &input), format, true)
        }
        Command::Generate {
            count,
            random,
            min_length,
            max_length,
        } => {
            let text = read_grammar(args.grammar.as_ref())?;
            let grammar = Grammar::compile(&text);
            let validation = grammar.validate();
            if !validation.valid {
                return Err(validation.errors.join("; "));
            }
            let sentences: Box<dyn Iterator<Item = Vec<String>>> = if random {
                Box::new(RandomSentences::new(&grammar, min_length, max_length))
            } else {
                Box::new(Sentences::new(&grammar))
            };
            for sentence in sentences.take(count) {
                println!("{}", sentence.join(" "));
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::debug!("exiting with failure");
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
