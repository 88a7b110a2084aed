//! SQL token types.
//!
//! This module defines the [`Token`] type produced by the lexer. Unquoted
//! words keep their original spelling; the parser decides whether a word is
//! acting as a [`Keyword`] or as an identifier, so that names like
//! `database` or `engine` remain usable as column names.

use super::error::Span;

/// A SQL token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// The span of this token in the source.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an end-of-file token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// The kind of a SQL token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Unsigned integer literal (sign is handled by the parser).
    Integer(u64),
    /// Floating-point literal (e.g., 3.14, 1e-7).
    Float(f64),
    /// String literal (e.g., 'hello').
    String(String),

    /// Unquoted word: a keyword or an identifier.
    Word(String),
    /// Back-tick or double-quoted identifier.
    QuotedIdentifier(String),
    /// Positional parameter `?`.
    Placeholder,

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Asterisk,
    /// /
    Slash,
    /// %
    Percent,
    /// = or ==
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,

    // Punctuation
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    /// Lexical error (unterminated string, bad character, ...).
    Error(String),
    /// End of file/input.
    Eof,
}

impl TokenKind {
    /// Returns the keyword this token spells, if any.
    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            TokenKind::Word(w) => Keyword::parse(w),
            _ => None,
        }
    }

    /// Returns the display name for error messages.
    pub fn display_name(&self) -> String {
        match self {
            TokenKind::Integer(n) => format!("integer '{n}'"),
            TokenKind::Float(n) => format!("float '{n}'"),
            TokenKind::String(s) => format!("string '{s}'"),
            TokenKind::Word(w) => match Keyword::parse(w) {
                Some(kw) => format!("keyword '{}'", kw.as_str()),
                None => format!("identifier '{w}'"),
            },
            TokenKind::QuotedIdentifier(s) => format!("identifier '`{s}`'"),
            TokenKind::Placeholder => "'?'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Asterisk => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Neq => "'<>'".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::LtEq => "'<='".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::GtEq => "'>='".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Error(msg) => format!("invalid token ({msg})"),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// SQL keywords.
        ///
        /// Keywords are case-insensitive. Only the ones listed in
        /// [`is_reserved`](Keyword::is_reserved) are refused as identifiers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// Returns the string representation of this keyword.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }

            /// Attempts to parse a keyword from a string (case-insensitive).
            pub fn parse(s: &str) -> Option<Self> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

keywords! {
    All => "ALL",
    And => "AND",
    As => "AS",
    Begin => "BEGIN",
    By => "BY",
    Commit => "COMMIT",
    Create => "CREATE",
    Database => "DATABASE",
    Delete => "DELETE",
    Drop => "DROP",
    Engine => "ENGINE",
    Exists => "EXISTS",
    False => "FALSE",
    From => "FROM",
    Grant => "GRANT",
    Identified => "IDENTIFIED",
    If => "IF",
    Insert => "INSERT",
    Into => "INTO",
    Limit => "LIMIT",
    Not => "NOT",
    Null => "NULL",
    On => "ON",
    Or => "OR",
    Order => "ORDER",
    Primary => "PRIMARY",
    Key => "KEY",
    Rollback => "ROLLBACK",
    Select => "SELECT",
    Set => "SET",
    Settings => "SETTINGS",
    Start => "START",
    Table => "TABLE",
    To => "TO",
    Transaction => "TRANSACTION",
    True => "TRUE",
    Use => "USE",
    User => "USER",
    Values => "VALUES",
    Where => "WHERE",
    With => "WITH",
}

impl Keyword {
    /// Keywords that can never be used as a bare column name or alias.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Keyword::And
                | Keyword::As
                | Keyword::From
                | Keyword::Limit
                | Keyword::Not
                | Keyword::Null
                | Keyword::Or
                | Keyword::Order
                | Keyword::Select
                | Keyword::True
                | Keyword::False
                | Keyword::Values
                | Keyword::Where
                | Keyword::Settings
        )
    }
}
