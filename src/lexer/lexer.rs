use std::fmt;

use serde::Serialize;

/// Describes the lexical class of a token.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenKind {
    Number,
    Plus,
    Minus,
    Mult,
    Div,
    LParen,
    RParen,
    Ident,
    Unknown,
    Eof,
}

impl TokenKind {
    /// Returns a human-readable name, the way a grammar author would write it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Mult => "*",
            Self::Div => "/",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Ident => "IDENT",
            Self::Unknown => "UNKNOWN",
            Self::Eof => "EOF",
        }
    }

    /// Returns the upper-case tag used when tokens are serialized.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Number => "NUMBER",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Mult => "MULT",
            Self::Div => "DIV",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::Ident => "IDENT",
            Self::Unknown => "UNKNOWN",
            Self::Eof => "EOF",
        }
    }

    /// Maps a single punctuation character to its kind.
    fn from_punct(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '*' => Some(Self::Mult),
            '/' => Some(Self::Div),
            '(' => Some(Self::LParen),
            ')' => Some(Self::RParen),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lexical token. Position is the byte offset of its first character.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(rename = "value")]
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Text used in diagnostics, `end of input` for EOF.
    pub fn describe(&self) -> String {
        if self.is_eof() {
            "end of input".to_string()
        } else {
            format!("'{}'", self.text)
        }
    }
}

/// Splits the input into tokens. Never fails: characters it does not know
/// become `Unknown` tokens and are left for the parser to reject.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the character under the cursor.
    fn cur(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Shifts the cursor past the current character.
    fn shift(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    /// Consumes characters while `accept` holds and returns the consumed slice.
    fn take_while(&mut self, mut accept: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.cur() {
            if !accept(ch) {
                break;
            }
            self.shift(ch);
        }
        &self.input[start..self.pos]
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let mut has_decimal = false;
        let text = self.take_while(|ch| {
            if ch.is_ascii_digit() {
                true
            } else if ch == '.' && !has_decimal {
                has_decimal = true;
                true
            } else {
                false
            }
        });
        Token::new(TokenKind::Number, text, start)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        let text = self.take_while(|ch| ch.is_alphanumeric() || ch == '_' || ch == '\'');
        // `number` doubles as the lexical class, so grammar authors can type it.
        let kind = if text.eq_ignore_ascii_case("number") {
            TokenKind::Number
        } else {
            TokenKind::Ident
        };
        Token::new(kind, text, start)
    }

    /// Returns the next token, skipping whitespace.
    /// Returns `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        self.take_while(char::is_whitespace);
        let ch = self.cur()?;
        if ch.is_ascii_digit() {
            return Some(self.read_number());
        }
        if ch.is_alphabetic() {
            return Some(self.read_identifier());
        }
        let start = self.pos;
        self.shift(ch);
        let kind = TokenKind::from_punct(ch).unwrap_or(TokenKind::Unknown);
        Some(Token::new(kind, ch.to_string(), start))
    }

    /// Consumes the lexer, returning all tokens followed by `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::Eof, "", self.input.len()));
        tokens
    }
}

/// Tokenizes `input`; the result always ends with an `Eof` token.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn second_dot_ends_number() {
        let tokens = tokenize("1.2.3");
        assert_eq!(tokens[0], Token::new(TokenKind::Number, "1.2", 0));
        assert_eq!(tokens[1], Token::new(TokenKind::Unknown, ".", 3));
        assert_eq!(tokens[2], Token::new(TokenKind::Number, "3", 4));
    }

    #[test]
    fn identifiers_keep_primes() {
        let tokens = tokenize("E' x_1");
        assert_eq!(tokens[0], Token::new(TokenKind::Ident, "E'", 0));
        assert_eq!(tokens[1], Token::new(TokenKind::Ident, "x_1", 3));
    }

    #[test]
    fn number_word_is_a_number() {
        assert_eq!(
            kinds("number NUMBER Number numbers"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(tokenize("  \t\n"), vec![Token::new(TokenKind::Eof, "", 4)]);
    }

    #[test]
    fn multibyte_positions_are_byte_offsets() {
        let tokens = tokenize("é $ 1");
        assert_eq!(tokens[0], Token::new(TokenKind::Ident, "é", 0));
        assert_eq!(tokens[1], Token::new(TokenKind::Unknown, "$", 3));
        assert_eq!(tokens[2], Token::new(TokenKind::Number, "1", 5));
        assert_eq!(tokens[3].position, 6);
    }
}
