use serde::Serializer;
use thiserror::Error;

/// Every way a parse invocation can fail.
///
/// All of them are final for the invocation. Backtracking inside the engine
/// consumes `UnmatchedTerminal` and `ExhaustedAlternatives` while other
/// alternatives remain; only the one that survives to the top is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Grammar has no start symbol")]
    UndefinedStartSymbol,

    #[error("undefined non-terminal: {0}")]
    UndefinedNonTerminal(String),

    #[error("expected {}, got {found} at position {position}", quote_all(.expected))]
    UnmatchedTerminal {
        expected: Vec<String>,
        found: String,
        position: usize,
    },

    /// `cursor` is a token index, not a byte offset.
    #[error("no matching production for {symbol} at position {cursor} (found '{found}')")]
    ExhaustedAlternatives {
        symbol: String,
        cursor: usize,
        found: String,
    },

    /// A non-terminal was re-entered at the token where it started.
    #[error("left recursion on {symbol} at position {cursor}")]
    LeftRecursion { symbol: String, cursor: usize },

    /// Non-terminals nested deeper than the engine allows. Aborts the parse.
    #[error("nesting deeper than {limit} non-terminals at position {position}")]
    DepthExceeded { limit: usize, position: usize },

    #[error("Unexpected token '{found}' at position {position}")]
    TrailingInput { found: String, position: usize },

    #[error("Grammar validation failed: {}", .0.join("; "))]
    InvalidGrammar(Vec<String>),
}

impl ParseError {
    /// Errors that end the parse at once instead of letting another
    /// alternative be tried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UndefinedNonTerminal(_) | Self::DepthExceeded { .. })
    }
}

fn quote_all(expected: &[String]) -> String {
    let quoted: Vec<_> = expected.iter().map(|s| format!("'{}'", s)).collect();
    match quoted.len() {
        0 => "nothing".to_string(),
        1 => quoted[0].clone(),
        _ => format!("one of {}", quoted.join(", ")),
    }
}

/// Serializes an optional error as its message, which is what renderers display.
pub(crate) fn serialize_message<S: Serializer>(
    error: &Option<ParseError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}
