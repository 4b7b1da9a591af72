use either::Either;
use log::{debug, trace};

use super::parser::{ParseResult, Parser, Step, TreeNode};
use crate::error::ParseError;
use crate::grammar::grammar::{is_epsilon, resolve_terminal, Grammar, EPSILON};
use crate::lexer::lexer::{tokenize, Token};

/// Backtracking recursive-descent parser over a compiled grammar.
///
/// Alternatives are tried in declared order and the first one that succeeds
/// wins. The parser itself holds no state between calls, so one instance can
/// serve any number of parses.
pub struct DescentParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> DescentParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }
}

impl Parser for DescentParser<'_> {
    fn parse(&self, input: &str, record_steps: bool) -> ParseResult {
        let tokens = tokenize(input);
        let Some(start) = self.grammar.start_symbol() else {
            return ParseResult::failure(ParseError::UndefinedStartSymbol, tokens);
        };
        debug!("parsing {} tokens from <{}>", tokens.len(), start);
        let result = Engine::new(self.grammar, tokens, record_steps).run(start);
        match &result.error {
            None => debug!("parse succeeded with {} steps", result.steps.len()),
            Some(err) => debug!("parse failed: {}", err),
        }
        result
    }
}

/// Deepest chain of non-terminals being expanded at once. Each level costs
/// native stack, so this keeps deeply nested input from overflowing it.
pub const MAX_DEPTH: usize = 600;

/// Where to come back to when an alternative fails.
#[derive(Clone, Copy, Debug)]
struct Checkpoint {
    cursor: usize,
    steps: usize,
}

/// The furthest token a terminal failed to match, and what was expected there.
struct Furthest {
    cursor: usize,
    expected: Vec<String>,
}

/// State of a single parse invocation.
struct Engine<'g> {
    grammar: &'g Grammar,
    // Always ends with `Eof`.
    tokens: Vec<Token>,
    cursor: usize,
    // Pre-incremented, never rolled back.
    node_id: usize,
    // `None` when steps are not recorded.
    steps: Option<Vec<Step>>,
    // Non-terminals being expanded, with the cursor they started at.
    active: Vec<(&'g str, usize)>,
    furthest: Option<Furthest>,
}

impl<'g> Engine<'g> {
    fn new(grammar: &'g Grammar, tokens: Vec<Token>, record_steps: bool) -> Self {
        Self {
            grammar,
            tokens,
            cursor: 0,
            node_id: 0,
            steps: record_steps.then(Vec::new),
            active: Vec::new(),
            furthest: None,
        }
    }

    fn run(mut self, start: &'g str) -> ParseResult {
        let error = match self.expand_non_terminal(start, None) {
            Ok(tree) if self.current().is_eof() => {
                return ParseResult {
                    success: true,
                    tree: Some(tree),
                    steps: self.steps.unwrap_or_default(),
                    error: None,
                    tokens: self.tokens,
                };
            }
            Ok(_) => {
                let token = self.current();
                self.furthest_beyond(self.cursor)
                    .unwrap_or_else(|| ParseError::TrailingInput {
                        found: token.text.clone(),
                        position: token.position,
                    })
            }
            Err(err) if err.is_fatal() => err,
            Err(err) => self.furthest_beyond(self.cursor).unwrap_or(err),
        };
        ParseResult::failure(error, self.tokens)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    /// Moves to the next token. Never moves past `Eof`.
    fn advance(&mut self) {
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cursor: self.cursor,
            steps: self.steps.as_ref().map_or(0, Vec::len),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.cursor = checkpoint.cursor;
        if let Some(steps) = self.steps.as_mut() {
            steps.truncate(checkpoint.steps);
        }
    }

    /// Creates a new tree node and records a step if needed.
    fn create_node(&mut self, label: &str, is_terminal: bool, parent_id: Option<usize>) -> TreeNode {
        self.node_id += 1;
        let node = TreeNode::new(self.node_id, label, is_terminal);
        if let Some(steps) = self.steps.as_mut() {
            steps.push(Step::add(&node, parent_id));
        }
        node
    }

    /// Parse some non-terminal.
    fn expand_non_terminal(
        &mut self,
        symbol: &'g str,
        parent_id: Option<usize>,
    ) -> Result<TreeNode, ParseError> {
        let grammar = self.grammar;
        let production = grammar
            .production(symbol)
            .filter(|p| !p.alternatives.is_empty())
            .ok_or_else(|| ParseError::UndefinedNonTerminal(symbol.to_string()))?;

        // Re-entering a non-terminal without consuming anything can never
        // terminate, so treat it as a failed alternative.
        if self.active.contains(&(symbol, self.cursor)) {
            trace!("left recursion on <{}> at token {}", symbol, self.cursor);
            return Err(ParseError::LeftRecursion {
                symbol: symbol.to_string(),
                cursor: self.cursor,
            });
        }

        if self.active.len() >= MAX_DEPTH {
            return Err(ParseError::DepthExceeded {
                limit: MAX_DEPTH,
                position: self.current().position,
            });
        }

        let mut node = self.create_node(symbol, false, parent_id);
        self.active.push((symbol, self.cursor));

        let mut outcome = None;
        for (i, alt) in production.alternatives.iter().enumerate() {
            let checkpoint = self.checkpoint();
            trace!("<{}> alternative {}: {}", symbol, i + 1, alt.join(" "));
            match self.expand_alternative(alt, node.id) {
                Ok(children) => {
                    outcome = Some(Ok(children));
                    break;
                }
                Err(err) if err.is_fatal() => {
                    outcome = Some(Err(err));
                    break;
                }
                Err(err) => {
                    trace!("<{}> alternative {} failed: {}", symbol, i + 1, err);
                    self.rollback(checkpoint);
                }
            }
        }
        self.active.pop();

        match outcome {
            Some(Ok(children)) => {
                node.children = children;
                Ok(node)
            }
            Some(Err(err)) => Err(err),
            None => Err(ParseError::ExhaustedAlternatives {
                symbol: symbol.to_string(),
                cursor: self.cursor,
                found: self.current().text.clone(),
            }),
        }
    }

    /// Parses the symbols of one alternative left to right. The first symbol
    /// that fails aborts the whole alternative.
    fn expand_alternative(
        &mut self,
        symbols: &'g [String],
        parent_id: usize,
    ) -> Result<Vec<TreeNode>, ParseError> {
        let mut children = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let child = if is_epsilon(symbol) {
                self.create_node(EPSILON, true, Some(parent_id))
            } else if self.grammar.is_terminal(symbol) {
                self.match_terminal(symbol, parent_id)?
            } else {
                self.expand_non_terminal(symbol, Some(parent_id))?
            };
            children.push(child);
        }
        Ok(children)
    }

    /// Matches the current token against a terminal and consumes it.
    /// The node is labelled with the token text, not the symbol.
    fn match_terminal(&mut self, symbol: &str, parent_id: usize) -> Result<TreeNode, ParseError> {
        let token = self.current().clone();
        let matched = match resolve_terminal(symbol) {
            Either::Left(kind) => token.kind == kind,
            Either::Right(literal) => token.text == literal,
        };
        if !matched {
            self.note_mismatch(symbol);
            return Err(ParseError::UnmatchedTerminal {
                expected: vec![symbol.to_string()],
                found: token.describe(),
                position: token.position,
            });
        }
        let node = self.create_node(&token.text, true, Some(parent_id));
        self.advance();
        Ok(node)
    }

    fn note_mismatch(&mut self, symbol: &str) {
        let cursor = self.cursor;
        if let Some(furthest) = self.furthest.as_mut().filter(|f| f.cursor >= cursor) {
            if furthest.cursor == cursor && !furthest.expected.iter().any(|e| e == symbol) {
                furthest.expected.push(symbol.to_string());
            }
            return;
        }
        self.furthest = Some(Furthest {
            cursor,
            expected: vec![symbol.to_string()],
        });
    }

    /// The deepest terminal mismatch, if it lies past `cursor`.
    fn furthest_beyond(&self, cursor: usize) -> Option<ParseError> {
        let furthest = self.furthest.as_ref().filter(|f| f.cursor > cursor)?;
        let token = &self.tokens[furthest.cursor];
        Some(ParseError::UnmatchedTerminal {
            expected: furthest.expected.clone(),
            found: token.describe(),
            position: token.position,
        })
    }
}
