//! Expression parsing with precedence climbing.
//!
//! This module implements expression parsing using the precedence climbing algorithm,
//! which handles operator precedence and associativity correctly.

use super::ast::{BinaryOperator, Expr, UnaryOperator};
use super::error::SyntaxError;
use super::parser::Parser;
use super::token::{Keyword, TokenKind};
use crate::datum::Value;

/// Operator precedence levels (higher = binds tighter).
///
/// Precedence (low to high):
/// 1. OR
/// 2. AND
/// 3. NOT (unary)
/// 4. =, !=, <>, <, <=, >, >=
/// 5. +, -
/// 6. *, /, %
/// 7. Unary -
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest = 0,
    Or = 1,
    And = 2,
    Not = 3,
    Comparison = 4,
    AddSub = 5,
    MulDiv = 6,
    UnaryMinus = 7,
}

impl Precedence {
    /// Returns the next higher precedence level.
    pub fn next(self) -> Self {
        match self {
            Precedence::Lowest => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Not,
            Precedence::Not => Precedence::Comparison,
            Precedence::Comparison => Precedence::AddSub,
            Precedence::AddSub => Precedence::MulDiv,
            Precedence::MulDiv => Precedence::UnaryMinus,
            Precedence::UnaryMinus => Precedence::UnaryMinus,
        }
    }
}

impl Parser<'_> {
    /// Parses an expression.
    pub fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_expr_with_precedence(Precedence::Lowest)
    }

    /// Parses an expression with minimum precedence.
    pub fn parse_expr_with_precedence(
        &mut self,
        min_prec: Precedence,
    ) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let Some((op, prec)) = self.peek_binary_op() else {
                break;
            };

            if prec < min_prec {
                break;
            }

            self.advance(); // consume operator

            // Left-associative: the right operand binds strictly tighter
            let right = self.parse_expr_with_precedence(prec.next())?;

            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Returns the binary operator at the current position with its precedence.
    fn peek_binary_op(&self) -> Option<(BinaryOperator, Precedence)> {
        let kind = self.peek_kind()?;
        let op = match kind {
            TokenKind::Plus => (BinaryOperator::Add, Precedence::AddSub),
            TokenKind::Minus => (BinaryOperator::Sub, Precedence::AddSub),
            TokenKind::Asterisk => (BinaryOperator::Mul, Precedence::MulDiv),
            TokenKind::Slash => (BinaryOperator::Div, Precedence::MulDiv),
            TokenKind::Percent => (BinaryOperator::Mod, Precedence::MulDiv),
            TokenKind::Eq => (BinaryOperator::Eq, Precedence::Comparison),
            TokenKind::Neq => (BinaryOperator::Neq, Precedence::Comparison),
            TokenKind::Lt => (BinaryOperator::Lt, Precedence::Comparison),
            TokenKind::LtEq => (BinaryOperator::LtEq, Precedence::Comparison),
            TokenKind::Gt => (BinaryOperator::Gt, Precedence::Comparison),
            TokenKind::GtEq => (BinaryOperator::GtEq, Precedence::Comparison),
            _ => match kind.keyword()? {
                Keyword::And => (BinaryOperator::And, Precedence::And),
                Keyword::Or => (BinaryOperator::Or, Precedence::Or),
                _ => return None,
            },
        };
        Some(op)
    }

    /// Parses a unary expression (NOT, -) or primary expression.
    fn parse_unary_expr(&mut self) -> Result<Expr, SyntaxError> {
        // NOT
        if self.consume_keyword(Keyword::Not) {
            let operand = self.parse_expr_with_precedence(Precedence::Not)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        // Unary minus. A minus directly in front of a number literal is folded
        // into the literal so that `-9223372036854775808` stays representable.
        if self.check_token(TokenKind::Minus) {
            let span = self.current_span();
            self.advance();
            match self.peek_kind() {
                Some(TokenKind::Integer(n)) => {
                    let n = *n;
                    let span = span.extend(self.current_span());
                    self.advance();
                    return Value::from_integer(-(n as i128))
                        .map(Expr::Literal)
                        .ok_or_else(|| SyntaxError::new("integer literal out of range", span));
                }
                Some(TokenKind::Float(f)) => {
                    let f = *f;
                    self.advance();
                    return Ok(Expr::Literal(Value::Float64(-f)));
                }
                _ => {}
            }
            let operand = self.parse_expr_with_precedence(Precedence::UnaryMinus)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Minus,
                operand: Box::new(operand),
            });
        }

        // Unary plus is a no-op
        if self.consume_token(TokenKind::Plus) {
            return self.parse_expr_with_precedence(Precedence::UnaryMinus);
        }

        self.parse_primary_expr()
    }

    /// Parses a primary expression (literals, identifiers, function calls, etc.).
    fn parse_primary_expr(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek_kind().and_then(TokenKind::keyword) {
            Some(Keyword::Null) => {
                self.advance();
                return Ok(Expr::Literal(Value::Null));
            }
            Some(Keyword::True) => {
                self.advance();
                return Ok(Expr::Literal(Value::Bool(true)));
            }
            Some(Keyword::False) => {
                self.advance();
                return Ok(Expr::Literal(Value::Bool(false)));
            }
            _ => {}
        }

        match self.peek_kind() {
            Some(TokenKind::Integer(n)) => {
                let n = *n;
                self.advance();
                return Ok(Expr::Literal(Value::UInt64(n)));
            }
            Some(TokenKind::Float(n)) => {
                let n = *n;
                self.advance();
                return Ok(Expr::Literal(Value::Float64(n)));
            }
            Some(TokenKind::String(s)) => {
                let s = s.clone();
                self.advance();
                return Ok(Expr::Literal(Value::String(s)));
            }
            Some(TokenKind::Placeholder) => {
                self.advance();
                return Ok(Expr::Parameter(self.next_parameter()));
            }
            _ => {}
        }

        // Parenthesized expression
        if self.consume_token(TokenKind::LParen) {
            let expr = self.parse_expr()?;
            self.expect_token(TokenKind::RParen)?;
            return Ok(expr);
        }

        // Identifier (column reference or function call)
        if self.check_identifier() {
            let name = self.expect_identifier()?;

            // Check for function call
            if self.check_token(TokenKind::LParen) {
                return self.parse_function_call(name);
            }

            // Check for qualified column reference (table.column)
            if self.consume_token(TokenKind::Dot) {
                let column = self.expect_identifier()?;
                return Ok(Expr::ColumnRef {
                    table: Some(name),
                    column,
                });
            }

            return Ok(Expr::ColumnRef {
                table: None,
                column: name,
            });
        }

        let span = self.current_span();
        Err(SyntaxError::unexpected_token(
            "expression",
            &self.current_token_name(),
            span,
        ))
    }

    /// Parses a function call with arguments.
    fn parse_function_call(&mut self, name: String) -> Result<Expr, SyntaxError> {
        self.expect_token(TokenKind::LParen)?;

        // Empty argument list, or `*` as in count(*)
        if self.consume_token(TokenKind::RParen) {
            return Ok(Expr::Function { name, args: vec![] });
        }
        if self.consume_token(TokenKind::Asterisk) {
            self.expect_token(TokenKind::RParen)?;
            return Ok(Expr::Function { name, args: vec![] });
        }

        let args = self.parse_expr_list()?;
        self.expect_token(TokenKind::RParen)?;

        Ok(Expr::Function { name, args })
    }
}
