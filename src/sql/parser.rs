//! SQL parser using recursive descent.
//!
//! The [`Parser`] converts a stream of tokens into an Abstract Syntax Tree (AST).
//! It uses recursive descent for statements and precedence climbing for
//! expression parsing (see `expr.rs`).

use super::ast::*;
use super::error::{Span, SyntaxError};
use super::lexer::Lexer;
use super::token::{Keyword, Token, TokenKind};
use crate::datum::Value;

/// SQL parser that converts tokens into an AST.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    input: &'a str,
    /// Number of `?` placeholders seen so far in the current statement.
    parameters: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given SQL input.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();

        Self {
            tokens,
            pos: 0,
            input,
            parameters: 0,
        }
    }

    /// Parses the input and returns a single statement.
    ///
    /// Returns `Ok(None)` for empty queries (whitespace/comments only),
    /// `Ok(Some(stmt))` for valid SQL statements.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the input is not valid SQL or contains
    /// more than one statement.
    pub fn parse(&mut self) -> Result<Option<Statement>, SyntaxError> {
        self.check_lexical_errors()?;

        // Empty query (only whitespace/comments)
        if self.is_eof() {
            return Ok(None);
        }

        let stmt = self.parse_statement()?;

        // Optional trailing semicolon
        self.consume_token(TokenKind::Semicolon);

        // Check for unexpected trailing tokens
        if !self.is_eof() {
            let span = self.current_span();
            return Err(SyntaxError::unexpected_token(
                "end of input",
                &self.current_token_name(),
                span,
            ));
        }

        Ok(Some(stmt))
    }

    /// Parses a `;`-separated script. Empty statements are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyntaxError`] encountered; no statement of a
    /// script with a syntax error is returned.
    pub fn parse_script(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        self.check_lexical_errors()?;

        let mut statements = Vec::new();
        loop {
            while self.consume_token(TokenKind::Semicolon) {}
            if self.is_eof() {
                break;
            }

            self.parameters = 0;
            statements.push(self.parse_statement()?);

            if !self.consume_token(TokenKind::Semicolon) && !self.is_eof() {
                let span = self.current_span();
                return Err(SyntaxError::unexpected_token(
                    "';' or end of input",
                    &self.current_token_name(),
                    span,
                ));
            }
        }
        Ok(statements)
    }

    /// Reports the first lexical error, if any.
    fn check_lexical_errors(&self) -> Result<(), SyntaxError> {
        match self.tokens.iter().find_map(|t| match &t.kind {
            TokenKind::Error(msg) => Some((msg, t.span)),
            _ => None,
        }) {
            Some((msg, span)) => Err(SyntaxError::new(msg.clone(), span)),
            None => Ok(()),
        }
    }

    /// Parses a single statement.
    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        // Transaction control
        if self.consume_keyword(Keyword::Begin) {
            // Optional: TRANSACTION
            self.consume_keyword(Keyword::Transaction);
            return Ok(Statement::Begin);
        }

        if self.consume_keyword(Keyword::Start) {
            self.expect_keyword(Keyword::Transaction)?;
            return Ok(Statement::Begin);
        }

        if self.consume_keyword(Keyword::Commit) {
            return Ok(Statement::Commit);
        }

        if self.consume_keyword(Keyword::Rollback) {
            return Ok(Statement::Rollback);
        }

        // SET statement
        if self.consume_keyword(Keyword::Set) {
            return Ok(Statement::Set(self.parse_setting_list()?));
        }

        if self.consume_keyword(Keyword::Use) {
            return Ok(Statement::Use(self.expect_identifier()?));
        }

        // CREATE TABLE / DATABASE / USER
        if self.consume_keyword(Keyword::Create) {
            if self.consume_keyword(Keyword::Table) {
                return self.parse_create_table_stmt();
            }
            if self.consume_keyword(Keyword::Database) {
                let if_not_exists = self.parse_if_not_exists()?;
                let name = self.expect_identifier()?;
                return Ok(Statement::CreateDatabase(CreateDatabaseStmt {
                    if_not_exists,
                    name,
                }));
            }
            if self.consume_keyword(Keyword::User) {
                return self.parse_create_user_stmt();
            }
            let span = self.current_span();
            return Err(SyntaxError::unexpected_token(
                "TABLE, DATABASE or USER",
                &self.current_token_name(),
                span,
            ));
        }

        // DROP TABLE / DATABASE / USER
        if self.consume_keyword(Keyword::Drop) {
            if self.consume_keyword(Keyword::Table) {
                let if_exists = self.parse_if_exists()?;
                let table = self.parse_table_name()?;
                return Ok(Statement::DropTable(DropTableStmt { if_exists, table }));
            }
            if self.consume_keyword(Keyword::Database) {
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                return Ok(Statement::DropDatabase(DropDatabaseStmt { if_exists, name }));
            }
            if self.consume_keyword(Keyword::User) {
                let if_exists = self.parse_if_exists()?;
                let names = self.parse_identifier_list()?;
                return Ok(Statement::DropUser(DropUserStmt { if_exists, names }));
            }
            let span = self.current_span();
            return Err(SyntaxError::unexpected_token(
                "TABLE, DATABASE or USER",
                &self.current_token_name(),
                span,
            ));
        }

        if self.consume_keyword(Keyword::Grant) {
            return self.parse_grant_stmt();
        }

        // SELECT
        if self.check_keyword(Keyword::Select) {
            let select = self.parse_select_stmt()?;
            return Ok(Statement::Select(Box::new(select)));
        }

        // INSERT
        if self.consume_keyword(Keyword::Insert) {
            return self.parse_insert_stmt();
        }

        // DELETE
        if self.consume_keyword(Keyword::Delete) {
            return self.parse_delete_stmt();
        }

        let span = self.current_span();
        Err(SyntaxError::unexpected_token(
            "statement",
            &self.current_token_name(),
            span,
        ))
    }

    /// Parses `name = value[, name = value]` (SET and SETTINGS).
    fn parse_setting_list(&mut self) -> Result<Vec<SettingAssignment>, SyntaxError> {
        let mut list = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect_token(TokenKind::Eq)?;
            let value = self.parse_literal()?;
            list.push(SettingAssignment { name, value });
            if !self.consume_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(list)
    }

    /// Parses a literal value with an optional leading minus.
    fn parse_literal(&mut self) -> Result<Value, SyntaxError> {
        let span = self.current_span();
        match self.parse_expr()? {
            Expr::Literal(value) => Ok(value),
            _ => Err(SyntaxError::new("expected literal value", span)),
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool, SyntaxError> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> Result<bool, SyntaxError> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Parses `[db.]name`.
    fn parse_table_name(&mut self) -> Result<TableName, SyntaxError> {
        let first = self.expect_identifier()?;
        if self.consume_token(TokenKind::Dot) {
            let name = self.expect_identifier()?;
            return Ok(TableName {
                database: Some(first),
                name,
            });
        }
        Ok(TableName::bare(first))
    }

    /// Parses a CREATE TABLE statement.
    fn parse_create_table_stmt(&mut self) -> Result<Statement, SyntaxError> {
        let if_not_exists = self.parse_if_not_exists()?;
        let table = self.parse_table_name()?;

        self.expect_token(TokenKind::LParen)?;
        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let type_name = self.parse_type_name()?;
            columns.push(ColumnSpec { name, type_name });
            if !self.consume_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect_token(TokenKind::RParen)?;

        let mut engine = None;
        let mut order_by = None;
        let mut primary_key = None;
        loop {
            if self.consume_keyword(Keyword::Engine) {
                self.consume_token(TokenKind::Eq);
                let name = self.expect_identifier()?;
                let args = if self.consume_token(TokenKind::LParen) {
                    let args = if self.check_token(TokenKind::RParen) {
                        vec![]
                    } else {
                        self.parse_expr_list()?
                    };
                    self.expect_token(TokenKind::RParen)?;
                    args
                } else {
                    vec![]
                };
                engine = Some(EngineSpec { name, args });
            } else if self.consume_keyword(Keyword::Order) {
                self.expect_keyword(Keyword::By)?;
                order_by = Some(self.parse_key_columns()?);
            } else if self.consume_keyword(Keyword::Primary) {
                self.expect_keyword(Keyword::Key)?;
                primary_key = Some(self.parse_key_columns()?);
            } else {
                break;
            }
        }

        Ok(Statement::CreateTable(Box::new(CreateTableStmt {
            if_not_exists,
            table,
            columns,
            engine,
            order_by,
            primary_key,
        })))
    }

    /// Parses a type name, keeping parenthesized arguments verbatim
    /// (`UInt64`, `Nullable(String)`, `Decimal(10, 2)`).
    fn parse_type_name(&mut self) -> Result<String, SyntaxError> {
        let start = self.current_span();
        let name = match self.peek_kind() {
            Some(TokenKind::Word(w) | TokenKind::QuotedIdentifier(w)) => w.clone(),
            _ => {
                return Err(SyntaxError::unexpected_token(
                    "type name",
                    &self.current_token_name(),
                    start,
                ));
            }
        };
        self.advance();

        if !self.check_token(TokenKind::LParen) {
            return Ok(name);
        }

        let mut depth = 0usize;
        let mut end = start;
        loop {
            let span = self.current_span();
            match self.peek_kind() {
                Some(TokenKind::LParen) => depth += 1,
                Some(TokenKind::RParen) => depth -= 1,
                Some(TokenKind::Eof) | None => {
                    return Err(SyntaxError::unexpected_token("')'", "end of input", span));
                }
                _ => {}
            }
            end = end.extend(span);
            self.advance();
            if depth == 0 {
                break;
            }
        }
        Ok(self.input[start.start..end.end].to_string())
    }

    /// Parses `col`, `(col, ...)` or `tuple()` after ORDER BY / PRIMARY KEY.
    fn parse_key_columns(&mut self) -> Result<Vec<String>, SyntaxError> {
        if matches!(self.peek_kind(), Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("tuple"))
            && self.peek_nth_kind(1) == Some(&TokenKind::LParen)
        {
            self.advance();
            self.advance();
            let columns = if self.check_token(TokenKind::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect_token(TokenKind::RParen)?;
            return Ok(columns);
        }

        if self.consume_token(TokenKind::LParen) {
            let columns = self.parse_identifier_list()?;
            self.expect_token(TokenKind::RParen)?;
            return Ok(columns);
        }

        Ok(vec![self.expect_identifier()?])
    }

    /// Parses a CREATE USER statement.
    fn parse_create_user_stmt(&mut self) -> Result<Statement, SyntaxError> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.expect_identifier()?;

        let mut auth = Authentication::NoPassword;
        if self.consume_keyword(Keyword::Identified) {
            if self.consume_keyword(Keyword::With) {
                let span = self.current_span();
                let method = self.expect_identifier()?;
                match method.to_ascii_lowercase().as_str() {
                    "no_password" => {}
                    "plaintext_password" => {
                        self.expect_keyword(Keyword::By)?;
                        auth = Authentication::Password(self.expect_string()?);
                    }
                    _ => {
                        return Err(SyntaxError::new(
                            format!("unsupported authentication method '{method}'"),
                            span,
                        ));
                    }
                }
            } else {
                self.expect_keyword(Keyword::By)?;
                auth = Authentication::Password(self.expect_string()?);
            }
        }

        let settings = if self.consume_keyword(Keyword::Settings) {
            self.parse_setting_list()?
        } else {
            vec![]
        };

        Ok(Statement::CreateUser(CreateUserStmt {
            if_not_exists,
            name,
            auth,
            settings,
        }))
    }

    /// Parses a GRANT statement.
    fn parse_grant_stmt(&mut self) -> Result<Statement, SyntaxError> {
        let mut privileges = Vec::new();
        loop {
            let span = self.current_span();
            let privilege = match self.peek_kind().and_then(TokenKind::keyword) {
                Some(Keyword::Select) => Privilege::Select,
                Some(Keyword::Insert) => Privilege::Insert,
                Some(Keyword::Delete) => Privilege::Delete,
                Some(Keyword::All) => Privilege::All,
                _ => {
                    return Err(SyntaxError::unexpected_token(
                        "privilege",
                        &self.current_token_name(),
                        span,
                    ));
                }
            };
            self.advance();
            if privilege == Privilege::All
                && matches!(
                    self.peek_kind(),
                    Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("privileges")
                )
            {
                self.advance();
            }
            privileges.push(privilege);
            if !self.consume_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect_keyword(Keyword::On)?;
        let target = if self.consume_token(TokenKind::Asterisk) {
            if self.consume_token(TokenKind::Dot) {
                self.expect_token(TokenKind::Asterisk)?;
                GrantTarget::All
            } else {
                GrantTarget::CurrentDatabase
            }
        } else {
            let first = self.expect_identifier()?;
            if self.consume_token(TokenKind::Dot) {
                if self.consume_token(TokenKind::Asterisk) {
                    GrantTarget::Database(first)
                } else {
                    GrantTarget::Table(TableName {
                        database: Some(first),
                        name: self.expect_identifier()?,
                    })
                }
            } else {
                GrantTarget::Table(TableName::bare(first))
            }
        };

        self.expect_keyword(Keyword::To)?;
        let grantees = self.parse_identifier_list()?;

        Ok(Statement::Grant(GrantStmt {
            privileges,
            target,
            grantees,
        }))
    }

    /// Parses a SELECT statement.
    pub(crate) fn parse_select_stmt(&mut self) -> Result<SelectStmt, SyntaxError> {
        self.expect_keyword(Keyword::Select)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_select_item()?);
            if !self.consume_token(TokenKind::Comma) {
                break;
            }
        }

        // FROM clause
        let from = if self.consume_keyword(Keyword::From) {
            Some(self.parse_table_name()?)
        } else {
            None
        };

        // WHERE clause
        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        // LIMIT clause
        let limit = if self.consume_keyword(Keyword::Limit) {
            Some(self.expect_integer()?)
        } else {
            None
        };

        Ok(SelectStmt {
            columns,
            from,
            where_clause,
            limit,
        })
    }

    /// Parses a single select item.
    fn parse_select_item(&mut self) -> Result<SelectItem, SyntaxError> {
        if self.consume_token(TokenKind::Asterisk) {
            return Ok(SelectItem::Wildcard);
        }

        // Expression with optional alias
        let expr = self.parse_expr()?;
        let alias = if self.consume_keyword(Keyword::As) {
            Some(self.expect_identifier()?)
        } else if self.check_identifier() {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(SelectItem::Expr { expr, alias })
    }

    /// Parses an INSERT statement.
    fn parse_insert_stmt(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Into)?;
        let table = self.parse_table_name()?;

        let columns = if self.consume_token(TokenKind::LParen) {
            let columns = self.parse_identifier_list()?;
            self.expect_token(TokenKind::RParen)?;
            Some(columns)
        } else {
            None
        };

        let mut rows = Vec::new();
        if self.consume_keyword(Keyword::Values) {
            loop {
                self.expect_token(TokenKind::LParen)?;
                rows.push(self.parse_expr_list()?);
                self.expect_token(TokenKind::RParen)?;
                if !self.consume_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(Statement::Insert(Box::new(InsertStmt {
            table,
            columns,
            rows,
        })))
    }

    /// Parses a DELETE statement.
    fn parse_delete_stmt(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::From)?;
        let table = self.parse_table_name()?;

        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Statement::Delete(Box::new(DeleteStmt {
            table,
            where_clause,
        })))
    }

    // ==================== Helper methods ====================

    /// Returns true if at end of tokens.
    pub(crate) fn is_eof(&self) -> bool {
        self.peek().is_none_or(|t| t.is_eof())
    }

    /// Peeks at the current token.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Peeks at the kind of the current token.
    pub(crate) fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Peeks at the nth token ahead.
    fn peek_nth_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    /// Advances to the next token.
    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().map_or(Span::at(self.input.len()), |t| t.span)
    }

    /// Returns a display name for the current token.
    pub(crate) fn current_token_name(&self) -> String {
        self.peek()
            .map_or("end of input".to_string(), |t| t.kind.display_name())
    }

    /// Allocates the ordinal of the next `?` placeholder.
    pub(crate) fn next_parameter(&mut self) -> usize {
        let index = self.parameters;
        self.parameters += 1;
        index
    }

    /// Checks if the current token is a specific keyword.
    pub(crate) fn check_keyword(&self, kw: Keyword) -> bool {
        self.peek_kind().and_then(TokenKind::keyword) == Some(kw)
    }

    /// Consumes the current token if it's a specific keyword.
    pub(crate) fn consume_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific keyword, returning an error if not found.
    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> Result<(), SyntaxError> {
        if self.consume_keyword(kw) {
            Ok(())
        } else {
            let span = self.current_span();
            Err(SyntaxError::unexpected_token(
                &format!("keyword '{}'", kw.as_str()),
                &self.current_token_name(),
                span,
            ))
        }
    }

    /// Checks if the current token matches.
    pub(crate) fn check_token(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(&kind)
    }

    /// Consumes the current token if it matches.
    pub(crate) fn consume_token(&mut self, kind: TokenKind) -> bool {
        if self.check_token(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific token, returning an error if not found.
    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.consume_token(kind.clone()) {
            Ok(())
        } else {
            let span = self.current_span();
            Err(SyntaxError::unexpected_token(
                &kind.display_name(),
                &self.current_token_name(),
                span,
            ))
        }
    }

    /// Returns true if the current token can be used as an identifier:
    /// a quoted identifier or a word that is not a reserved keyword.
    pub(crate) fn check_identifier(&self) -> bool {
        match self.peek_kind() {
            Some(TokenKind::QuotedIdentifier(_)) => true,
            Some(TokenKind::Word(w)) => !Keyword::parse(w).is_some_and(|kw| kw.is_reserved()),
            _ => false,
        }
    }

    /// Expects an identifier, returning its name.
    pub(crate) fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        if self.check_identifier()
            && let Some(TokenKind::Word(name) | TokenKind::QuotedIdentifier(name)) =
                self.peek_kind()
        {
            let name = name.clone();
            self.advance();
            return Ok(name);
        }
        let span = self.current_span();
        Err(SyntaxError::unexpected_token(
            "identifier",
            &self.current_token_name(),
            span,
        ))
    }

    /// Expects a string literal.
    fn expect_string(&mut self) -> Result<String, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::String(s)) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => {
                let span = self.current_span();
                Err(SyntaxError::unexpected_token(
                    "string",
                    &self.current_token_name(),
                    span,
                ))
            }
        }
    }

    /// Expects an integer literal.
    fn expect_integer(&mut self) -> Result<u64, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Integer(n)) => {
                let n = *n;
                self.advance();
                Ok(n)
            }
            _ => {
                let span = self.current_span();
                Err(SyntaxError::unexpected_token(
                    "integer",
                    &self.current_token_name(),
                    span,
                ))
            }
        }
    }

    /// Parses a comma-separated list of identifiers.
    fn parse_identifier_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut list = vec![self.expect_identifier()?];
        while self.consume_token(TokenKind::Comma) {
            list.push(self.expect_identifier()?);
        }
        Ok(list)
    }

    /// Parses a comma-separated list of expressions.
    pub(crate) fn parse_expr_list(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut list = vec![self.parse_expr()?];
        while self.consume_token(TokenKind::Comma) {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Result<Statement, SyntaxError> {
        let mut parser = Parser::new(sql);
        parser.parse().map(|s| s.unwrap())
    }

    fn script(sql: &str) -> Vec<Statement> {
        Parser::new(sql).parse_script().unwrap()
    }

    #[test]
    fn test_empty_query() {
        let mut parser = Parser::new("  -- comment only\n");
        assert_eq!(parser.parse().unwrap(), None);
        assert!(script(" ; ;").is_empty());
    }

    #[test]
    fn test_begin_commit_rollback() {
        assert_eq!(parse("BEGIN").unwrap(), Statement::Begin);
        assert_eq!(parse("begin transaction").unwrap(), Statement::Begin);
        assert_eq!(parse("START TRANSACTION").unwrap(), Statement::Begin);
        assert_eq!(parse("COMMIT").unwrap(), Statement::Commit);
        assert_eq!(parse("ROLLBACK").unwrap(), Statement::Rollback);
    }

    #[test]
    fn test_set() {
        let stmt = parse("set max_result_rows=5, result_overflow_mode = 'break'").unwrap();
        match stmt {
            Statement::Set(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].name, "max_result_rows");
                assert_eq!(list[0].value, Value::UInt64(5));
                assert_eq!(list[1].value, Value::from("break"));
            }
            _ => panic!("expected SET"),
        }
        assert!(parse("set readonly = 1 + 1").is_err());
    }

    #[test]
    fn test_script() {
        let stmts = script("set max_result_rows=5; select 1");
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0], Statement::Set(_)));
        assert!(matches!(stmts[1], Statement::Select(_)));
    }

    #[test]
    fn test_script_requires_separator() {
        assert!(Parser::new("select 1 select 2").parse_script().is_err());
    }

    #[test]
    fn test_create_table_merge_tree() {
        let stmt =
            parse("create table t(id UInt64, value String) engine=MergeTree order by id").unwrap();
        match stmt {
            Statement::CreateTable(ct) => {
                assert!(!ct.if_not_exists);
                assert_eq!(ct.table, TableName::bare("t"));
                assert_eq!(ct.columns.len(), 2);
                assert_eq!(ct.columns[0].type_name, "UInt64");
                assert_eq!(ct.columns[1].name, "value");
                assert_eq!(ct.engine.as_ref().unwrap().name, "MergeTree");
                assert_eq!(ct.order_by, Some(vec!["id".to_string()]));
            }
            _ => panic!("expected CREATE TABLE"),
        }
    }

    #[test]
    fn test_create_table_variants() {
        let stmt = parse(
            "CREATE TABLE IF NOT EXISTS db.t (a Int32, b Nullable(String)) \
             ENGINE = MergeTree() ORDER BY tuple()",
        )
        .unwrap();
        match stmt {
            Statement::CreateTable(ct) => {
                assert!(ct.if_not_exists);
                assert_eq!(ct.table.database.as_deref(), Some("db"));
                assert_eq!(ct.columns[1].type_name, "Nullable(String)");
                assert_eq!(ct.order_by, Some(vec![]));
            }
            _ => panic!("expected CREATE TABLE"),
        }

        let stmt = parse("create table test_readonly(id String)engine=Memory").unwrap();
        match stmt {
            Statement::CreateTable(ct) => {
                assert_eq!(ct.engine.unwrap().name, "Memory");
                assert_eq!(ct.order_by, None);
            }
            _ => panic!("expected CREATE TABLE"),
        }
    }

    #[test]
    fn test_keywords_as_column_names() {
        let stmt = parse("create table t(database String, engine String) engine=Memory").unwrap();
        match stmt {
            Statement::CreateTable(ct) => {
                assert_eq!(ct.columns[0].name, "database");
                assert_eq!(ct.columns[1].name, "engine");
            }
            _ => panic!("expected CREATE TABLE"),
        }
    }

    #[test]
    fn test_select_basic() {
        let stmt = parse("SELECT 1").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.columns.len(), 1);
                assert!(s.from.is_none());
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_select_full() {
        let stmt = parse("select * from system.databases where name='x' limit 1").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert!(matches!(s.columns[0], SelectItem::Wildcard));
                assert_eq!(
                    s.from,
                    Some(TableName {
                        database: Some("system".to_string()),
                        name: "databases".to_string()
                    })
                );
                assert!(s.where_clause.is_some());
                assert_eq!(s.limit, Some(1));
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_select_with_alias() {
        let stmt = parse("SELECT count(*) AS n, id x FROM t").unwrap();
        match stmt {
            Statement::Select(s) => {
                match &s.columns[0] {
                    SelectItem::Expr { alias, .. } => assert_eq!(alias.as_deref(), Some("n")),
                    _ => panic!("expected Expr"),
                }
                match &s.columns[1] {
                    SelectItem::Expr { alias, .. } => assert_eq!(alias.as_deref(), Some("x")),
                    _ => panic!("expected Expr"),
                }
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_insert() {
        let stmt = parse("insert into t values(-1)").unwrap();
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.columns, None);
                assert_eq!(i.rows, vec![vec![Expr::Literal(Value::Int64(-1))]]);
            }
            _ => panic!("expected INSERT"),
        }
    }

    #[test]
    fn test_insert_multi_row_with_columns() {
        let stmt = parse("INSERT INTO db.t (id, value) VALUES (1, 'a'), (2, 'b')").unwrap();
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.table.database.as_deref(), Some("db"));
                assert_eq!(i.columns, Some(vec!["id".to_string(), "value".to_string()]));
                assert_eq!(i.rows.len(), 2);
            }
            _ => panic!("expected INSERT"),
        }
    }

    #[test]
    fn test_bare_insert() {
        let stmt = parse("insert into t").unwrap();
        match stmt {
            Statement::Insert(i) => assert!(i.rows.is_empty()),
            _ => panic!("expected INSERT"),
        }
    }

    #[test]
    fn test_delete() {
        let stmt = parse("DELETE FROM t WHERE id = 1").unwrap();
        match stmt {
            Statement::Delete(d) => {
                assert_eq!(d.table, TableName::bare("t"));
                assert!(d.where_clause.is_some());
            }
            _ => panic!("expected DELETE"),
        }
    }

    #[test]
    fn test_database_statements() {
        assert_eq!(
            parse("create database if not exists `a-b`").unwrap(),
            Statement::CreateDatabase(CreateDatabaseStmt {
                if_not_exists: true,
                name: "a-b".to_string()
            })
        );
        assert_eq!(
            parse("DROP DATABASE IF EXISTS x").unwrap(),
            Statement::DropDatabase(DropDatabaseStmt {
                if_exists: true,
                name: "x".to_string()
            })
        );
        assert_eq!(parse("use x").unwrap(), Statement::Use("x".to_string()));
    }

    #[test]
    fn test_create_user() {
        let stmt =
            parse("create user readonly1 IDENTIFIED WITH no_password SETTINGS readonly=1").unwrap();
        match stmt {
            Statement::CreateUser(u) => {
                assert_eq!(u.name, "readonly1");
                assert_eq!(u.auth, Authentication::NoPassword);
                assert_eq!(u.settings[0].name, "readonly");
                assert_eq!(u.settings[0].value, Value::UInt64(1));
            }
            _ => panic!("expected CREATE USER"),
        }

        let stmt = parse("CREATE USER IF NOT EXISTS dba IDENTIFIED BY 'secret'").unwrap();
        match stmt {
            Statement::CreateUser(u) => {
                assert!(u.if_not_exists);
                assert_eq!(u.auth, Authentication::Password("secret".to_string()));
            }
            _ => panic!("expected CREATE USER"),
        }
    }

    #[test]
    fn test_drop_user() {
        assert_eq!(
            parse("drop user if exists readonly1, readonly2").unwrap(),
            Statement::DropUser(DropUserStmt {
                if_exists: true,
                names: vec!["readonly1".to_string(), "readonly2".to_string()]
            })
        );
    }

    #[test]
    fn test_grant() {
        let stmt = parse("grant insert on test_readonly TO readonly1, readonly2").unwrap();
        assert_eq!(
            stmt,
            Statement::Grant(GrantStmt {
                privileges: vec![Privilege::Insert],
                target: GrantTarget::Table(TableName::bare("test_readonly")),
                grantees: vec!["readonly1".to_string(), "readonly2".to_string()],
            })
        );

        let stmt = parse("GRANT SELECT, DELETE ON db.* TO u").unwrap();
        match stmt {
            Statement::Grant(g) => {
                assert_eq!(g.privileges, vec![Privilege::Select, Privilege::Delete]);
                assert_eq!(g.target, GrantTarget::Database("db".to_string()));
            }
            _ => panic!("expected GRANT"),
        }

        let stmt = parse("GRANT ALL PRIVILEGES ON *.* TO u").unwrap();
        match stmt {
            Statement::Grant(g) => assert_eq!(g.target, GrantTarget::All),
            _ => panic!("expected GRANT"),
        }
    }

    #[test]
    fn test_trailing_semicolon() {
        assert!(parse("SELECT 1;").is_ok());
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("SELEC 1").unwrap_err();
        assert_eq!(err.position(), 1);
        let err = parse("select 'abc").unwrap_err();
        assert_eq!(err.detail(), "unterminated string literal");
    }
}
