use log::debug;

use crate::error::{Error, Result};
use ast::{
    Ast, ColumnDefinition, CreateTableStatement, Expression, InsertStatement, SelectStatement,
    Statement,
};
use lexer::{Keyword, Location, Symbol, Token, TokenKind, lex};

pub mod ast;
pub mod lexer;

/// Where an alternative stopped matching and what it expected there
#[derive(Debug)]
struct Failure {
    cursor: usize,
    message: String,
}

impl Failure {
    fn new(cursor: usize, message: impl Into<String>) -> Self {
        Self {
            cursor,
            message: message.into(),
        }
    }

    /// Keeps whichever failure got further into the token stream
    fn furthest(self, other: Failure) -> Failure {
        if other.cursor > self.cursor { other } else { self }
    }
}

/// A parsed node and the cursor just past it
type Parsed<T> = std::result::Result<(T, usize), Failure>;

/// SQL Parser - Converts tokens into an Abstract Syntax Tree (AST)
///
/// Every parse function takes a cursor and hands back a new one, leaving the
/// parser untouched, so a failed alternative can simply be discarded.
pub struct Parser {
    tokens: Vec<Token>,
}

/// Lexes and parses a whole SQL source string
pub fn parse(source: &str) -> Result<Ast> {
    Parser::new(source)?.parse()
}

impl Parser {
    /// Creates a new parser for the given SQL input, lexing it up front
    pub fn new(input: &str) -> Result<Self> {
        Ok(Parser { tokens: lex(input)? })
    }

    /// Parses statements, each followed by at least one semicolon, until all
    /// tokens are consumed
    pub fn parse(&self) -> Result<Ast> {
        let mut ast = Ast::default();
        let mut cursor = 0;

        while cursor < self.tokens.len() {
            let (statement, next) = self.parse_statement(cursor).map_err(|f| self.error(f))?;
            ast.statements.push(statement);
            cursor = next;

            let mut semicolon_found = false;
            while self.expect_token(cursor, Symbol::Semicolon) {
                cursor += 1;
                semicolon_found = true;
            }
            if !semicolon_found {
                return Err(self.error(Failure::new(
                    cursor,
                    "expected semicolon delimiter between statements",
                )));
            }
        }
        Ok(ast)
    }

    /// Tries SELECT, then INSERT, then CREATE TABLE from the same cursor
    fn parse_statement(&self, cursor: usize) -> Parsed<Statement> {
        self.parse_select(cursor)
            .map(|(stmt, next)| (Statement::Select(stmt), next))
            .or_else(|select| {
                self.parse_insert(cursor)
                    .map(|(stmt, next)| (Statement::Insert(stmt), next))
                    .map_err(|insert| select.furthest(insert))
            })
            .or_else(|failure| {
                self.parse_create_table(cursor)
                    .map(|(stmt, next)| (Statement::CreateTable(stmt), next))
                    .map_err(|create| failure.furthest(create))
            })
            .map_err(|failure| {
                if failure.cursor == cursor {
                    Failure::new(cursor, "expected statement")
                } else {
                    failure
                }
            })
    }

    /// Parses SELECT <expressions> [FROM <table>]
    fn parse_select(&self, cursor: usize) -> Parsed<SelectStatement> {
        let cursor = self.next_expect(cursor, Keyword::Select)?;
        let (items, cursor) =
            self.parse_expressions(cursor, &[Keyword::From.into(), Symbol::Semicolon.into()])?;

        if !self.expect_token(cursor, Keyword::From) {
            return Ok((SelectStatement { items, from: None }, cursor));
        }
        let (from, cursor) = self
            .parse_token(cursor + 1, TokenKind::Identifier, "table name after FROM")?;
        Ok((SelectStatement { items, from: Some(from) }, cursor))
    }

    /// Parses INSERT INTO <table> VALUES (<expressions>)
    fn parse_insert(&self, cursor: usize) -> Parsed<InsertStatement> {
        let cursor = self.next_expect(cursor, Keyword::Insert)?;
        let cursor = self.next_expect(cursor, Keyword::Into)?;
        let (table, cursor) = self.parse_token(cursor, TokenKind::Identifier, "table name")?;
        let cursor = self.next_expect(cursor, Keyword::Values)?;
        let cursor = self.next_expect(cursor, Symbol::LeftParen)?;
        let (values, cursor) = self.parse_expressions(cursor, &[Symbol::RightParen.into()])?;
        let cursor = self.next_expect(cursor, Symbol::RightParen)?;
        Ok((InsertStatement { table, values }, cursor))
    }

    /// Parses CREATE TABLE <name> (<column definitions>)
    fn parse_create_table(&self, cursor: usize) -> Parsed<CreateTableStatement> {
        let cursor = self.next_expect(cursor, Keyword::Create)?;
        let cursor = self.next_expect(cursor, Keyword::Table)?;
        let (name, cursor) = self.parse_token(cursor, TokenKind::Identifier, "table name")?;
        let cursor = self.next_expect(cursor, Symbol::LeftParen)?;
        let (columns, cursor) = self.parse_column_definitions(cursor, Symbol::RightParen.into())?;
        let cursor = self.next_expect(cursor, Symbol::RightParen)?;
        Ok((CreateTableStatement { name, columns }, cursor))
    }

    /// Parses comma-separated `<name> <type>` pairs up to the delimiter
    fn parse_column_definitions(&self, initial: usize, delimiter: Token) -> Parsed<Vec<ColumnDefinition>> {
        let mut columns = Vec::new();
        let mut cursor = initial;

        loop {
            let Some(current) = self.tokens.get(cursor) else {
                return Err(Failure::new(
                    cursor,
                    format!("expected column definitions to end with {}", delimiter),
                ));
            };
            if *current == delimiter {
                break;
            }

            if !columns.is_empty() {
                cursor = self.next_expect(cursor, Symbol::Comma)?;
            }
            let (name, next) = self.parse_token(cursor, TokenKind::Identifier, "column name")?;
            let (datatype, next) = self.parse_token(next, TokenKind::Keyword, "column type")?;
            columns.push(ColumnDefinition { name, datatype });
            cursor = next;
        }
        Ok((columns, cursor))
    }

    /// Parses comma-separated expressions until one of the delimiters, which
    /// is left unconsumed
    fn parse_expressions(&self, initial: usize, delimiters: &[Token]) -> Parsed<Vec<Expression>> {
        let mut expressions = Vec::new();
        let mut cursor = initial;

        loop {
            let Some(current) = self.tokens.get(cursor) else {
                let expected: Vec<&str> = delimiters.iter().map(|t| t.value.as_str()).collect();
                return Err(Failure::new(
                    cursor,
                    format!("expected expressions to end with {}", expected.join(" or ")),
                ));
            };
            if delimiters.contains(current) {
                break;
            }

            if !expressions.is_empty() {
                cursor = self.next_expect(cursor, Symbol::Comma)?;
            }
            let (expression, next) = self.parse_expression(cursor)?;
            expressions.push(expression);
            cursor = next;
        }
        Ok((expressions, cursor))
    }

    /// Parses an expression (currently a single identifier, numeric or
    /// string token)
    fn parse_expression(&self, cursor: usize) -> Parsed<Expression> {
        for kind in [TokenKind::Identifier, TokenKind::Numeric, TokenKind::String] {
            if let Ok((token, next)) = self.parse_token(cursor, kind, "literal") {
                return Ok((Expression::Literal(token), next));
            }
        }
        Err(Failure::new(cursor, "expected expression"))
    }

    /// Consumes a token of the given kind
    fn parse_token(&self, cursor: usize, kind: TokenKind, expected: &str) -> Parsed<Token> {
        match self.tokens.get(cursor) {
            Some(token) if token.kind == kind => Ok((token.clone(), cursor + 1)),
            _ => Err(Failure::new(cursor, format!("expected {}", expected))),
        }
    }

    /// Checks whether the token at the cursor equals the given one
    fn expect_token(&self, cursor: usize, token: impl Into<Token>) -> bool {
        let token = token.into();
        self.tokens.get(cursor).is_some_and(|t| *t == token)
    }

    /// Expects a specific token and steps past it
    fn next_expect(&self, cursor: usize, expect: impl Into<Token>) -> std::result::Result<usize, Failure> {
        let expect = expect.into();
        if !self.expect_token(cursor, expect.clone()) {
            return Err(Failure::new(cursor, format!("expected {}", expect)));
        }
        Ok(cursor + 1)
    }

    /// Turns a failure into a parse error pointing at the offending token, or
    /// at the last token when the cursor ran past the end
    fn error(&self, failure: Failure) -> Error {
        let (location, token) = self
            .tokens
            .get(failure.cursor)
            .or_else(|| self.tokens.last())
            .map_or((Location::default(), String::new()), |t| (t.location, t.value.clone()));
        debug!("[Parser] {} at {}, got {}", failure.message, location, token);
        Error::Parse {
            location,
            token,
            message: failure.message,
        }
    }
}
