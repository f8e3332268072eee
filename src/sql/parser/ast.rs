use crate::sql::parser::lexer::{Token, TokenKind};

/// Parse result for an entire source string
#[derive(Debug, Default, PartialEq)]
pub struct Ast {
    pub statements: Vec<Statement>,
}

/// Abstract Syntax Tree (AST) node definitions for SQL statements
#[derive(Debug, PartialEq)]
pub enum Statement {
    /// SELECT statement
    Select(SelectStatement),
    /// INSERT statement
    Insert(InsertStatement),
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
}

/// SELECT <items> [FROM <table>]
#[derive(Debug, PartialEq)]
pub struct SelectStatement {
    pub items: Vec<Expression>,
    pub from: Option<Token>,
}

/// INSERT INTO <table> VALUES (<values>)
#[derive(Debug, PartialEq)]
pub struct InsertStatement {
    pub table: Token,
    pub values: Vec<Expression>,
}

/// CREATE TABLE <name> (<columns>)
#[derive(Debug, PartialEq)]
pub struct CreateTableStatement {
    pub name: Token,
    pub columns: Vec<ColumnDefinition>,
}

/// Column definition for CREATE TABLE statements
///
/// The datatype is any keyword token; the backend decides which ones it
/// supports.
#[derive(Debug, PartialEq)]
pub struct ColumnDefinition {
    pub name: Token,
    pub datatype: Token,
}

/// Expression types
///
/// Only single-token literals exist today. Operators and function calls will
/// be added as new variants.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// An identifier, numeric or string token
    Literal(Token),
}

impl Expression {
    /// Returns the literal token, or None for non-literal expressions
    pub fn literal(&self) -> Option<&Token> {
        match self {
            Expression::Literal(token) => Some(token),
        }
    }

    /// Returns the identifier name if the expression is a bare column reference
    pub fn identifier(&self) -> Option<&str> {
        self.literal()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.value.as_str())
    }
}

impl From<Token> for Expression {
    fn from(value: Token) -> Self {
        Self::Literal(value)
    }
}
