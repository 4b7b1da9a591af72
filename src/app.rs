//! Entry points for a shell (UI, CLI, test harness) that works with grammar
//! text rather than compiled grammars.

use crate::error::ParseError;
use crate::grammar::grammar::{Grammar, ValidationResult, DEFAULT_GRAMMAR};
use crate::lexer::lexer::Token;
use crate::parser::descent::DescentParser;
use crate::parser::parser::{ParseResult, Parser};

/// Compiles and validates grammar text. Suitable for live feedback while the
/// grammar is being typed.
pub fn compile_and_validate_grammar(text: &str) -> ValidationResult {
    Grammar::compile(text).validate()
}

/// Parses `input` and returns the full tree.
pub fn parse(grammar_text: &str, input: &str) -> ParseResult {
    run(grammar_text, input, false)
}

/// Same as [`parse`], also recording the construction steps.
pub fn parse_with_steps(grammar_text: &str, input: &str) -> ParseResult {
    run(grammar_text, input, true)
}

/// Tokenizes `input` independently of any grammar.
pub fn tokenize(input: &str) -> Vec<Token> {
    crate::lexer::lexer::tokenize(input)
}

pub fn default_grammar() -> &'static str {
    DEFAULT_GRAMMAR
}

pub fn parse_with_default_grammar(input: &str, record_steps: bool) -> ParseResult {
    run(DEFAULT_GRAMMAR, input, record_steps)
}

/// A rejected grammar yields a failed result without tokens.
fn run(grammar_text: &str, input: &str, record_steps: bool) -> ParseResult {
    let grammar = Grammar::compile(grammar_text);
    let validation = grammar.validate();
    if !validation.valid {
        return ParseResult::failure(ParseError::InvalidGrammar(validation.errors), Vec::new());
    }
    DescentParser::new(&grammar).parse(input, record_steps)
}
