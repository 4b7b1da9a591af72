//! Backtracking recursive-descent parsing against grammars written as text.
//!
//! A grammar such as
//!
//! ```text
//! E  -> T E'
//! E' -> + T E' | - T E' | ε
//! T  -> F T'
//! T' -> * F T' | / F T' | ε
//! F  -> ( E ) | number
//! ```
//!
//! is compiled with [`grammar::grammar::Grammar::compile`], and input is parsed
//! with [`parser::descent::DescentParser`] into a tree and, optionally, a log
//! of steps that replays its construction one node at a time.

pub mod app;
pub mod error;

pub mod grammar {
    pub mod generator;
    pub mod grammar;
}

pub mod lexer {
    pub mod lexer;
}

pub mod parser {
    pub mod descent;
    pub mod parser;
}
