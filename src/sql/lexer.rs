//! SQL lexer/tokenizer.
//!
//! The [`Lexer`] converts a SQL string into a stream of [`Token`]s.
//! It handles words, quoted identifiers, literals, operators, and comments.

use super::error::Span;
use super::token::{Token, TokenKind};

/// SQL lexer that tokenizes input strings.
///
/// The lexer implements `Iterator<Item = Token>`. It handles:
/// - Words (keywords and identifiers, left for the parser to classify)
/// - Quoted identifiers (`` `name` `` and `"name"`)
/// - Numeric literals (integers, decimals, exponents)
/// - String literals (single-quoted, with `''` and backslash escapes)
/// - Operators and punctuation
/// - Comments (`--` line comments and `/* */` block comments)
/// - Positional parameters (`?`)
///
/// Lexical errors are returned as `TokenKind::Error` tokens rather than
/// being accumulated separately.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Whether EOF has been returned.
    eof_returned: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            eof_returned: false,
        }
    }

    /// Tokenizes the whole input. The returned vector always ends with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.collect()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    /// Returns the character at `pos + offset` without consuming it.
    fn peek(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    /// Advances the position by `n` characters.
    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(ch) = self.peek(0) {
                self.pos += ch.len_utf8();
            }
        }
    }

    /// Skips whitespace and comments.
    ///
    /// Returns `Some(Token)` if an unterminated block comment was found.
    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            while self.peek(0).is_some_and(|ch| ch.is_whitespace()) {
                self.advance(1);
            }

            if self.starts_with("--") {
                while let Some(ch) = self.peek(0) {
                    self.advance(1);
                    if ch == '\n' {
                        break;
                    }
                }
                continue;
            }

            if self.starts_with("/*") {
                let start = self.pos;
                self.advance(2);
                let mut depth = 1;
                while depth > 0 && !self.is_eof() {
                    if self.starts_with("/*") {
                        depth += 1;
                        self.advance(2);
                    } else if self.starts_with("*/") {
                        depth -= 1;
                        self.advance(2);
                    } else {
                        self.advance(1);
                    }
                }
                if depth > 0 {
                    return Some(Token::new(
                        TokenKind::Error("unterminated block comment".to_string()),
                        Span::new(start, self.pos),
                    ));
                }
                continue;
            }

            return None;
        }
    }

    /// Scans the next token from the input.
    fn scan_token(&mut self) -> Token {
        if let Some(error_token) = self.skip_whitespace_and_comments() {
            return error_token;
        }

        let start = self.pos;
        let Some(ch) = self.peek(0) else {
            return Token::new(TokenKind::Eof, Span::at(start));
        };

        match ch {
            '\'' => self.scan_string_literal(),
            '`' | '"' => self.scan_quoted_identifier(ch),
            '?' => {
                self.advance(1);
                Token::new(TokenKind::Placeholder, Span::new(start, self.pos))
            }
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_word(),
            _ => self.scan_operator_or_punctuation(),
        }
    }

    fn scan_string_literal(&mut self) -> Token {
        let start = self.pos;
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    return Token::new(
                        TokenKind::Error("unterminated string literal".to_string()),
                        Span::new(start, self.pos),
                    );
                }
                Some('\'') => {
                    self.advance(1);
                    if self.peek(0) == Some('\'') {
                        value.push('\'');
                        self.advance(1);
                    } else {
                        break;
                    }
                }
                Some('\\') => {
                    self.advance(1);
                    let Some(escaped) = self.peek(0) else {
                        continue;
                    };
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                    self.advance(1);
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance(1);
                }
            }
        }

        Token::new(TokenKind::String(value), Span::new(start, self.pos))
    }

    fn scan_quoted_identifier(&mut self, quote: char) -> Token {
        let start = self.pos;
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    return Token::new(
                        TokenKind::Error("unterminated quoted identifier".to_string()),
                        Span::new(start, self.pos),
                    );
                }
                Some(ch) if ch == quote => {
                    self.advance(1);
                    if self.peek(0) == Some(quote) {
                        value.push(quote);
                        self.advance(1);
                    } else {
                        break;
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance(1);
                }
            }
        }

        Token::new(TokenKind::QuotedIdentifier(value), Span::new(start, self.pos))
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        let mut is_float = false;

        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek(0) == Some('.') && self.peek(1).is_none_or(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(1);
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            let sign = matches!(self.peek(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance(digit_at);
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.advance(1);
                }
            }
        }

        let text = &self.input[start..self.pos];
        let span = Span::new(start, self.pos);
        let kind = if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .unwrap_or_else(|_| TokenKind::Error("invalid number literal".to_string()))
        } else {
            text.parse::<u64>().map(TokenKind::Integer).unwrap_or_else(|_| {
                TokenKind::Error("integer literal out of range".to_string())
            })
        };
        Token::new(kind, span)
    }

    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance(1);
        }
        let word = self.input[start..self.pos].to_string();
        Token::new(TokenKind::Word(word), Span::new(start, self.pos))
    }

    fn scan_operator_or_punctuation(&mut self) -> Token {
        let start = self.pos;
        let two = [
            ("<>", TokenKind::Neq),
            ("!=", TokenKind::Neq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("==", TokenKind::Eq),
        ];
        for (text, kind) in two {
            if self.starts_with(text) {
                self.advance(2);
                return Token::new(kind, Span::new(start, self.pos));
            }
        }

        let ch = self.peek(0).unwrap_or('\0');
        self.advance(1);
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            other => TokenKind::Error(format!("unexpected character '{other}'")),
        };
        Token::new(kind, Span::new(start, self.pos))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.eof_returned {
            return None;
        }
        let token = self.scan_token();
        if token.is_eof() {
            self.eof_returned = true;
        }
        Some(token)
    }
}
