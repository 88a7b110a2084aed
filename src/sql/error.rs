//! Syntax errors raised while reading a request.

use std::fmt;

use thiserror::Error;

/// Byte range `[start, end)` of a token in the request text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at `pos`, used for end of input.
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Smallest span covering both.
    pub fn extend(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// What the parser rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// The grammar needed `expected` but the request had `found`.
    Unexpected { expected: String, found: String },
    /// A malformed literal or an unsupported construct.
    Invalid(String),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::Unexpected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            SyntaxErrorKind::Invalid(message) => f.write_str(message),
        }
    }
}

/// A rejected request, reported as SYNTAX_ERROR.
///
/// Positions in messages are 1-based, as clients show them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error: failed at position {}: {kind}", .span.start + 1)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::Invalid(message.into()),
            span,
        }
    }

    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::Unexpected {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            span,
        }
    }

    pub fn position(&self) -> usize {
        self.span.start + 1
    }

    /// The message without the position prefix.
    pub fn detail(&self) -> String {
        self.kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_extend() {
        let select = Span::new(0, 6);
        let star = Span::new(7, 8);
        assert_eq!(select.extend(star), Span::new(0, 8));
        assert_eq!(star.extend(Span::at(3)), Span::new(3, 8));
    }

    #[test]
    fn test_syntax_error_message() {
        let err = SyntaxError::unexpected_token("FROM", "'WHERE'", Span::new(9, 14));
        assert_eq!(err.position(), 10);
        assert_eq!(
            err.to_string(),
            "Syntax error: failed at position 10: expected FROM, found 'WHERE'"
        );

        let err = SyntaxError::new("integer literal out of range", Span::at(0));
        assert_eq!(err.detail(), "integer literal out of range");
        assert!(matches!(err.kind, SyntaxErrorKind::Invalid(_)));
    }
}
