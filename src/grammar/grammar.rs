use std::collections::{BTreeSet, HashMap};

use either::Either;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::lexer::lexer::TokenKind;

/// Equivalent of an empty string. Both spellings compile to this symbol.
pub const EPSILON: &str = "ε";

/// The bundled LL(1) arithmetic grammar (left recursion removed).
pub const DEFAULT_GRAMMAR: &str = "E  -> T E'
E' -> + T E' | - T E' | ε
T  -> F T'
T' -> * F T' | / F T' | ε
F  -> ( E ) | number";

/// Symbols that are terminals whether or not a grammar body mentions them.
const BUILTIN_TERMINALS: [&str; 9] = ["+", "-", "*", "/", "(", ")", "number", "ε", "epsilon"];

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"->|→").expect("separator regex"));

/// Returns true if the symbol stands for the empty string.
pub fn is_epsilon(symbol: &str) -> bool {
    symbol == EPSILON || symbol == "epsilon"
}

/// Resolves a terminal symbol to the way it is matched against tokens:
/// built-in terminals by token kind, anything else by exact token text.
pub fn resolve_terminal(symbol: &str) -> Either<TokenKind, &str> {
    match symbol {
        "number" => Either::Left(TokenKind::Number),
        "+" => Either::Left(TokenKind::Plus),
        "-" => Either::Left(TokenKind::Minus),
        "*" => Either::Left(TokenKind::Mult),
        "/" => Either::Left(TokenKind::Div),
        "(" => Either::Left(TokenKind::LParen),
        ")" => Either::Left(TokenKind::RParen),
        literal => Either::Right(literal),
    }
}

/// All alternatives of one non-terminal, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
    pub head: String,
    pub alternatives: Vec<Vec<String>>,
}

/// Describes a context-free grammar compiled from BNF-style text.
///
/// A `Grammar` is never mutated after [`Grammar::compile`] returns, so it can
/// be shared freely between parser instances.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    productions: Vec<Production>,
    index: HashMap<String, usize>,
    start_symbol: Option<String>,
    terminals: BTreeSet<String>,
    non_terminals: BTreeSet<String>,
}

/// Outcome of [`Grammar::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn error(&mut self, msg: impl Into<String>) {
        self.valid = false;
        self.errors.push(msg.into());
    }
}

/// Splits an alternative into symbols, giving `ε` and the word `epsilon`
/// a symbol of their own.
fn parse_symbols(alternative: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    for word in alternative.split_whitespace() {
        if word == "epsilon" {
            symbols.push(EPSILON.to_string());
            continue;
        }
        for (i, part) in word.split(EPSILON).enumerate() {
            if i > 0 {
                symbols.push(EPSILON.to_string());
            }
            if !part.is_empty() {
                symbols.push(part.to_string());
            }
        }
    }
    symbols
}

impl Grammar {
    /// Compiles grammar text of the form
    ///
    /// ```text
    /// E  -> T E'
    /// E' -> + T E' | ε
    /// ```
    ///
    /// Blank lines and lines starting with `//` or `#` are ignored, as are
    /// lines without a `->` (or `→`) separator. Never fails; problems are
    /// reported by [`Grammar::validate`].
    pub fn compile(text: &str) -> Self {
        let mut grammar = Self::default();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }
            let mut parts = SEPARATOR.splitn(line, 2);
            let (head, body) = match (parts.next(), parts.next()) {
                (Some(head), Some(body)) => (head.trim(), body),
                _ => {
                    debug!("grammar line {}: no separator, skipped", line_no + 1);
                    continue;
                }
            };
            if head.is_empty() {
                debug!("grammar line {}: empty head, skipped", line_no + 1);
                continue;
            }

            grammar.non_terminals.insert(head.to_string());
            if grammar.start_symbol.is_none() {
                grammar.start_symbol = Some(head.to_string());
            }

            let bodies = body
                .split('|')
                .map(parse_symbols)
                .filter(|symbols| !symbols.is_empty());
            match grammar.index.get(head) {
                Some(&i) => grammar.productions[i].alternatives.extend(bodies),
                None => {
                    grammar.index.insert(head.to_string(), grammar.productions.len());
                    grammar.productions.push(Production {
                        head: head.to_string(),
                        alternatives: bodies.collect(),
                    });
                }
            }
        }

        let terminals: BTreeSet<String> = grammar
            .body_symbols()
            .filter(|s| !grammar.non_terminals.contains(*s) && !is_epsilon(s))
            .map(str::to_string)
            .collect();
        grammar.terminals = terminals;
        grammar
    }

    /// Iterates over every symbol of every alternative, in declaration order.
    fn body_symbols(&self) -> impl Iterator<Item = &str> {
        self.productions
            .iter()
            .flat_map(|p| p.alternatives.iter())
            .flat_map(|alt| alt.iter())
            .map(String::as_str)
    }

    /// Returns the production for `symbol`, if it was declared as a head.
    pub fn production(&self, symbol: &str) -> Option<&Production> {
        self.index.get(symbol).map(|&i| &self.productions[i])
    }

    /// Productions in declaration order.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// The first head declared.
    pub fn start_symbol(&self) -> Option<&str> {
        self.start_symbol.as_deref()
    }

    pub fn terminals(&self) -> &BTreeSet<String> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &BTreeSet<String> {
        &self.non_terminals
    }

    /// Returns true is symbol is a terminal, either declared by use in a body
    /// or one of the built-in ones.
    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.terminals.contains(symbol) || BUILTIN_TERMINALS.contains(&symbol)
    }

    /// Returns true is symbol is a non-terminal.
    pub fn is_non_terminal(&self, symbol: &str) -> bool {
        self.non_terminals.contains(symbol)
    }

    /// Returns true if `symbol` is a head with at least one alternative.
    pub fn is_defined(&self, symbol: &str) -> bool {
        self.production(symbol)
            .map_or(false, |p| !p.alternatives.is_empty())
    }

    /// Checks that the grammar can be used for parsing.
    ///
    /// A non-terminal declared only as `X ->` has no alternatives and counts
    /// as undefined. Direct left recursion is only a warning: the parser fails
    /// such an alternative when it re-enters the head and goes on to the next.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult {
            valid: true,
            ..Default::default()
        };

        let start = match self.start_symbol() {
            Some(start) => start,
            None => {
                result.error("No start symbol defined");
                return result;
            }
        };
        if !self.is_defined(start) {
            result.error("Start symbol has no productions");
            return result;
        }

        let mut reported = BTreeSet::new();
        for symbol in self.body_symbols() {
            if self.is_non_terminal(symbol) && !self.is_defined(symbol) && reported.insert(symbol) {
                result.error(format!("Undefined non-terminal: {}", symbol));
            }
        }

        for production in &self.productions {
            for alt in &production.alternatives {
                if alt.first() == Some(&production.head) {
                    result.warnings.push(format!(
                        "Potential left recursion in production: {} -> {}",
                        production.head,
                        alt.join(" ")
                    ));
                }
            }
        }

        result
    }
}
