//! SQL parsing module.
//!
//! This module provides a handwritten recursive descent parser that converts
//! SQL strings into an Abstract Syntax Tree (AST) for execution. The lexer is
//! also used on its own by the driver to locate `?` placeholders in
//! prepared statements.

mod ast;
mod error;
mod expr;
mod lexer;
mod parser;
mod token;

pub use ast::*;
pub use error::{Span, SyntaxError, SyntaxErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Keyword, Token, TokenKind};
