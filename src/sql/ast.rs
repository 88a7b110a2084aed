//! Abstract Syntax Tree (AST) for SQL statements.
//!
//! This module defines the data structures that represent parsed SQL statements.
//! The AST is produced by the parser and consumed by the executor.

use std::fmt;

use crate::datum::Value;

/// A SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(Box<SelectStmt>),
    /// INSERT statement.
    Insert(Box<InsertStmt>),
    /// DELETE statement.
    Delete(Box<DeleteStmt>),
    /// CREATE TABLE statement.
    CreateTable(Box<CreateTableStmt>),
    /// DROP TABLE statement.
    DropTable(DropTableStmt),
    /// CREATE DATABASE statement.
    CreateDatabase(CreateDatabaseStmt),
    /// DROP DATABASE statement.
    DropDatabase(DropDatabaseStmt),
    /// USE statement.
    Use(String),
    /// CREATE USER statement.
    CreateUser(CreateUserStmt),
    /// DROP USER statement.
    DropUser(DropUserStmt),
    /// GRANT statement.
    Grant(GrantStmt),
    /// SET statement (session settings).
    Set(Vec<SettingAssignment>),
    /// BEGIN [TRANSACTION] or START TRANSACTION.
    Begin,
    /// COMMIT.
    Commit,
    /// ROLLBACK.
    Rollback,
}

impl Statement {
    /// Returns true for statements that modify data, schema or access
    /// entities. Read-only sessions reject all of them.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Statement::Select(_)
                | Statement::Use(_)
                | Statement::Set(_)
                | Statement::Begin
                | Statement::Commit
                | Statement::Rollback
        )
    }

    /// Returns true for schema and access statements, which take effect
    /// immediately and are never part of a transaction.
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::CreateTable(_)
                | Statement::DropTable(_)
                | Statement::CreateDatabase(_)
                | Statement::DropDatabase(_)
                | Statement::CreateUser(_)
                | Statement::DropUser(_)
                | Statement::Grant(_)
        )
    }

    /// Returns true for transaction control statements.
    pub fn is_transaction_control(&self) -> bool {
        matches!(
            self,
            Statement::Begin | Statement::Commit | Statement::Rollback
        )
    }
}

/// A possibly database-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    /// Explicit database, `None` for the session's current database.
    pub database: Option<String>,
    /// Table name.
    pub name: String,
}

impl TableName {
    /// Creates an unqualified table name.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            database: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{db}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    /// Selected columns/expressions.
    pub columns: Vec<SelectItem>,
    /// FROM table.
    pub from: Option<TableName>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// LIMIT clause.
    pub limit: Option<u64>,
}

/// An item in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// SELECT * - all columns.
    Wildcard,
    /// An expression with optional alias.
    Expr { expr: Expr, alias: Option<String> },
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    /// Target table.
    pub table: TableName,
    /// Column names (`None` means all columns in table order).
    pub columns: Option<Vec<String>>,
    /// VALUES rows. Empty for the bare `INSERT INTO t` form.
    pub rows: Vec<Vec<Expr>>,
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    /// Target table.
    pub table: TableName,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    /// If true, don't error if the table already exists.
    pub if_not_exists: bool,
    /// Table name.
    pub table: TableName,
    /// Column definitions.
    pub columns: Vec<ColumnSpec>,
    /// ENGINE clause.
    pub engine: Option<EngineSpec>,
    /// ORDER BY key columns; `Some(vec![])` for `ORDER BY tuple()`.
    pub order_by: Option<Vec<String>>,
    /// PRIMARY KEY columns.
    pub primary_key: Option<Vec<String>>,
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Type name as written, including any parenthesized arguments.
    pub type_name: String,
}

/// ENGINE = Name[(args)] clause.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSpec {
    /// Engine name.
    pub name: String,
    /// Engine arguments.
    pub args: Vec<Expr>,
}

/// DROP TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableStmt {
    /// If true, don't error if the table doesn't exist.
    pub if_exists: bool,
    /// Table to drop.
    pub table: TableName,
}

/// CREATE DATABASE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDatabaseStmt {
    pub if_not_exists: bool,
    pub name: String,
}

/// DROP DATABASE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropDatabaseStmt {
    pub if_exists: bool,
    pub name: String,
}

/// CREATE USER statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserStmt {
    /// If true, don't error if the user already exists.
    pub if_not_exists: bool,
    /// User name.
    pub name: String,
    /// IDENTIFIED clause.
    pub auth: Authentication,
    /// SETTINGS profile attached to the user.
    pub settings: Vec<SettingAssignment>,
}

/// How a user authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// `IDENTIFIED WITH no_password` (or no IDENTIFIED clause).
    NoPassword,
    /// `IDENTIFIED [WITH plaintext_password] BY 'pw'`.
    Password(String),
}

/// DROP USER statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropUserStmt {
    pub if_exists: bool,
    pub names: Vec<String>,
}

/// GRANT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantStmt {
    /// Granted privileges.
    pub privileges: Vec<Privilege>,
    /// ON target.
    pub target: GrantTarget,
    /// TO users.
    pub grantees: Vec<String>,
}

/// A grantable privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    Select,
    Insert,
    Delete,
    All,
}

impl Privilege {
    /// Returns true if holding `self` allows `wanted`.
    pub fn covers(self, wanted: Privilege) -> bool {
        self == Privilege::All || self == wanted
    }
}

/// ON clause of a GRANT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTarget {
    /// `*.*`
    All,
    /// `*` (every table of the current database).
    CurrentDatabase,
    /// `db.*`
    Database(String),
    /// `[db.]table`
    Table(TableName),
}

/// A `name = value` pair in SET or SETTINGS.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingAssignment {
    /// Setting name.
    pub name: String,
    /// Literal value.
    pub value: Value,
}

/// Expression in SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (NULL, boolean, number, string).
    Literal(Value),
    /// Column reference (optionally qualified with table name).
    ColumnRef {
        table: Option<String>,
        column: String,
    },
    /// Positional parameter `?` (0-based ordinal within the statement).
    Parameter(usize),
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Function call. `count(*)` is represented with no arguments.
    Function { name: String, args: Vec<Expr> },
}

impl fmt::Display for Expr {
    /// Renders the expression the way result column names are spelled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v @ Value::String(_)) => f.write_str(&v.to_sql_literal()),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::ColumnRef {
                table: Some(t),
                column,
            } => write!(f, "{t}.{column}"),
            Expr::ColumnRef { column, .. } => f.write_str(column),
            Expr::Parameter(_) => f.write_str("?"),
            Expr::BinaryOp { left, op, right } => write!(f, "{left} {} {right}", op.as_str()),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand,
            } => write!(f, "NOT {operand}"),
            Expr::UnaryOp { op, operand } => write!(f, "{}{operand}", op.as_str()),
            Expr::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Mod,

    // Comparison
    /// =
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

    // Logical
    /// AND
    And,
    /// OR
    Or,
}

impl BinaryOperator {
    /// Returns the display string for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Neq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }

    /// Returns true for the comparison operators.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Neq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// NOT
    Not,
    /// - (negation)
    Minus,
}

impl UnaryOperator {
    /// Returns the display string for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::Minus => "-",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_str() {
        assert_eq!(BinaryOperator::Add.as_str(), "+");
        assert_eq!(BinaryOperator::And.as_str(), "AND");
        assert!(BinaryOperator::Neq.is_comparison());
        assert!(!BinaryOperator::Mul.is_comparison());
    }

    #[test]
    fn test_expr_display() {
        let expr = Expr::Function {
            name: "count".to_string(),
            args: vec![Expr::Literal(Value::UInt64(1))],
        };
        assert_eq!(expr.to_string(), "count(1)");

        let expr = Expr::BinaryOp {
            left: Box::new(Expr::ColumnRef {
                table: None,
                column: "id".to_string(),
            }),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Literal(Value::from("a"))),
        };
        assert_eq!(expr.to_string(), "id = 'a'");
    }

    #[test]
    fn test_statement_classification() {
        assert!(!Statement::Begin.is_write());
        assert!(Statement::Begin.is_transaction_control());
        let drop = Statement::DropTable(DropTableStmt {
            if_exists: true,
            table: TableName::bare("t"),
        });
        assert!(drop.is_write());
        assert!(drop.is_ddl());
        assert_eq!(TableName::bare("t").to_string(), "t");
    }
}
