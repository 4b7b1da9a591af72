use std::collections::{HashSet, VecDeque};

use rand::Rng;

use super::grammar::{is_epsilon, Grammar};

/// Gives up on a random derivation after this many rewrites.
const MAX_REWRITES: usize = 10_000;

/// A sentential form symbol: either still to be rewritten or final.
fn is_non_terminal(grammar: &Grammar, symbol: &str) -> bool {
    !is_epsilon(symbol) && !grammar.is_terminal(symbol)
}

/// Applies an alternative to the string in place of the symbol at `i` and
/// returns the count of terminals it introduced. Epsilon symbols vanish.
fn apply_alternative(grammar: &Grammar, str: &mut Vec<String>, i: usize, alt: &[String]) -> usize {
    let mut count_terminals = 0;
    str.splice(
        i..i + 1,
        alt.iter()
            .filter(|s| !is_epsilon(s))
            .inspect(|s| {
                if grammar.is_terminal(s) {
                    count_terminals += 1;
                }
            })
            .cloned(),
    );
    count_terminals
}

/// Non-terminals that derive at least one finite sentence.
fn productive(grammar: &Grammar) -> HashSet<&str> {
    let mut productive = HashSet::new();
    loop {
        let before = productive.len();
        for production in grammar.productions() {
            let finite = production.alternatives.iter().any(|alt| {
                alt.iter()
                    .all(|s| !is_non_terminal(grammar, s) || productive.contains(s.as_str()))
            });
            if finite {
                productive.insert(production.head.as_str());
            }
        }
        if productive.len() == before {
            return productive;
        }
    }
}

/// Visits the language of a grammar using BFS over leftmost derivations.
/// If the grammar produces the same string several times, returns it several times.
///
/// Alternatives that can never finish (`S -> a S`) are not followed, so the
/// iterator ends instead of growing its queue forever.
///
/// Sentences are sequences of terminal symbols. `number` stays as the word
/// itself, which the lexer reads back as a number token.
pub struct Sentences<'g> {
    grammar: &'g Grammar,
    queue: VecDeque<Vec<String>>,
    productive: HashSet<&'g str>,
}

impl<'g> Sentences<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        let productive = productive(grammar);
        let queue = grammar
            .start_symbol()
            .filter(|start| productive.contains(start))
            .map(|start| VecDeque::from([vec![start.to_string()]]))
            .unwrap_or_default();
        Self {
            grammar,
            queue,
            productive,
        }
    }
}

impl Iterator for Sentences<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(str) = self.queue.pop_front() {
            // Rewrite first non-terminal.
            let Some(i) = str.iter().position(|s| is_non_terminal(self.grammar, s)) else {
                // No non-terminals left, so it is in the language.
                return Some(str);
            };
            // Every queued non-terminal is productive, so it has a production.
            if let Some(production) = self.grammar.production(&str[i]) {
                let finite = production.alternatives.iter().filter(|alt| {
                    alt.iter().all(|s| {
                        !is_non_terminal(self.grammar, s) || self.productive.contains(s.as_str())
                    })
                });
                for alt in finite {
                    let mut nxt = str.clone();
                    apply_alternative(self.grammar, &mut nxt, i, alt);
                    self.queue.push_back(nxt);
                }
            }
        }
        None
    }
}

/// Produces random sentences of a grammar, with `number` replaced by random
/// integers so the output reads like real input.
pub struct RandomSentences<'g, R: Rng> {
    grammar: &'g Grammar,
    /// Tries not to choose alternatives with only terminals while length < min_length.
    min_length: usize,
    /// If exceeds max_length, tries to choose alternatives without non-terminals.
    max_length: usize,
    rng: R,
}

impl<'g> RandomSentences<'g, rand::rngs::ThreadRng> {
    pub fn new(grammar: &'g Grammar, min_length: usize, max_length: usize) -> Self {
        Self::with_rng(grammar, min_length, max_length, rand::thread_rng())
    }
}

impl<'g, R: Rng> RandomSentences<'g, R> {
    pub fn with_rng(grammar: &'g Grammar, min_length: usize, max_length: usize, rng: R) -> Self {
        Self {
            grammar,
            min_length,
            max_length,
            rng,
        }
    }

    /// Returns a random index preferring the `important` set.
    fn take_random_index(&mut self, important: &[usize], non_important: &[usize]) -> usize {
        let pool = if important.is_empty() {
            non_important
        } else {
            important
        };
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn render(&mut self, symbol: String) -> String {
        if symbol == "number" {
            self.rng.gen_range(0..100u32).to_string()
        } else {
            symbol
        }
    }
}

/// Yields `None` only when the grammar has no start symbol, reaches an
/// undefined non-terminal, or keeps rewriting without ever terminating.
impl<R: Rng> Iterator for RandomSentences<'_, R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let grammar = self.grammar;
        let mut cur = vec![grammar.start_symbol()?.to_string()];
        // Current length in terminals.
        let mut length = 0;

        for _ in 0..MAX_REWRITES {
            let non_terminal_idx: Vec<_> = (0..cur.len())
                .filter(|&i| is_non_terminal(grammar, &cur[i]))
                .collect();
            if non_terminal_idx.is_empty() {
                let sentence = cur.into_iter().map(|s| self.render(s)).collect();
                return Some(sentence);
            }
            let id = non_terminal_idx[self.rng.gen_range(0..non_terminal_idx.len())];
            let alternatives = &grammar.production(&cur[id])?.alternatives;
            if alternatives.is_empty() {
                return None;
            }

            let alt_id = if length >= self.min_length && length < self.max_length {
                self.rng.gen_range(0..alternatives.len())
            } else {
                let (with_non_terminals, without_non_terminals): (Vec<_>, Vec<_>) =
                    (0..alternatives.len()).partition(|&i| {
                        alternatives[i].iter().any(|s| is_non_terminal(grammar, s))
                    });
                if length < self.min_length {
                    // Try to choose an alternative with non-terminals.
                    self.take_random_index(&with_non_terminals, &without_non_terminals)
                } else {
                    // length >= self.max_length
                    // Try to choose an alternative without non-terminals.
                    self.take_random_index(&without_non_terminals, &with_non_terminals)
                }
            };

            length += apply_alternative(grammar, &mut cur, id, &alternatives[alt_id]);
        }
        None
    }
}
