//! SQL Lexer - Tokenizes SQL input text into a sequence of located tokens

use std::fmt::Display;

use log::trace;

use crate::error::{Error, Result};

/// Line/column position of a token in the source text (both zero-based)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Lexical class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    String,
    Numeric,
    Bool,
    Null,
}

/// Represents a single lexical token in the SQL input
///
/// Two tokens are equal when their value and kind match; the location is
/// diagnostic only.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub location: Location,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind, location: Location) -> Self {
        Self {
            value: value.into(),
            kind,
            location,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.kind == other.kind
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Token::new(keyword.to_str(), keyword.kind(), Location::default())
    }
}

impl From<Symbol> for Token {
    fn from(symbol: Symbol) -> Self {
        Token::new(symbol.to_str(), TokenKind::Symbol, Location::default())
    }
}

/// SQL reserved keywords
///
/// `WHERE`, `AS`, `TRUE`, `FALSE` and `NULL` are lexed but no statement
/// grammar consumes them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    Insert,
    Values,
    As,
    Table,
    Create,
    Where,
    From,
    Into,
    Text,
    True,
    False,
    Null,
    Int,
}

impl Keyword {
    /// Candidate order used by the keyword sub-lexer
    pub const ALL: [Keyword; 14] = [
        Keyword::Select,
        Keyword::Insert,
        Keyword::Values,
        Keyword::As,
        Keyword::Table,
        Keyword::Create,
        Keyword::Where,
        Keyword::From,
        Keyword::Into,
        Keyword::Text,
        Keyword::True,
        Keyword::False,
        Keyword::Null,
        Keyword::Int,
    ];

    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        let ident = ident.to_lowercase();
        Keyword::ALL.into_iter().find(|k| k.to_str() == ident)
    }

    /// Returns the lowercase token value of the keyword
    pub fn to_str(&self) -> &'static str {
        match self {
            Keyword::Select => "select",
            Keyword::Insert => "insert",
            Keyword::Values => "values",
            Keyword::As => "as",
            Keyword::Table => "table",
            Keyword::Create => "create",
            Keyword::Where => "where",
            Keyword::From => "from",
            Keyword::Into => "into",
            Keyword::Text => "text",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Int => "int",
        }
    }

    /// Boolean and null literals get their own token kinds
    pub fn kind(&self) -> TokenKind {
        match self {
            Keyword::True | Keyword::False => TokenKind::Bool,
            Keyword::Null => TokenKind::Null,
            _ => TokenKind::Keyword,
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Operators and punctuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Eq,
    Neq,
    NeqBang,
    Lt,
    Lte,
    Gt,
    Gte,
    Concat,
    Plus,
    Comma,
    LeftParen,
    RightParen,
    Semicolon,
    Asterisk,
}

impl Symbol {
    /// Candidate order used by the symbol sub-lexer
    pub const ALL: [Symbol; 14] = [
        Symbol::Eq,
        Symbol::Neq,
        Symbol::NeqBang,
        Symbol::Lt,
        Symbol::Lte,
        Symbol::Gt,
        Symbol::Gte,
        Symbol::Concat,
        Symbol::Plus,
        Symbol::Comma,
        Symbol::LeftParen,
        Symbol::RightParen,
        Symbol::Semicolon,
        Symbol::Asterisk,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Symbol::Eq => "=",
            Symbol::Neq => "<>",
            Symbol::NeqBang => "!=",
            Symbol::Lt => "<",
            Symbol::Lte => "<=",
            Symbol::Gt => ">",
            Symbol::Gte => ">=",
            Symbol::Concat => "||",
            Symbol::Plus => "+",
            Symbol::Comma => ",",
            Symbol::LeftParen => "(",
            Symbol::RightParen => ")",
            Symbol::Semicolon => ";",
            Symbol::Asterisk => "*",
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Position of a sub-lexer over the source characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub position: usize,
    pub location: Location,
}

impl Cursor {
    /// Moves forward `n` characters on the current line
    fn advance(self, n: usize) -> Self {
        Self {
            position: self.position + n,
            location: Location {
                line: self.location.line,
                col: self.location.col + n,
            },
        }
    }
}

/// A sub-lexer either declines (`None`) or consumes input and yields an
/// optional token plus the cursor after it. The input cursor is never
/// modified, so a declining sub-lexer leaves no trace.
type SubLexer = fn(&[char], Cursor) -> Option<(Option<Token>, Cursor)>;

const SUB_LEXERS: [SubLexer; 5] = [lex_keyword, lex_symbol, lex_string, lex_numeric, lex_identifier];

/// Finds the longest option matching the source at `ic`, case-insensitively.
///
/// Returns the option and the number of source characters it covers.
/// Candidates are dropped as soon as the scanned prefix stops being a prefix
/// of them, so `into` wins over `int` and `<=` over `<`.
fn longest_match(source: &[char], ic: Cursor, options: &[&'static str]) -> Option<(&'static str, usize)> {
    let mut value = String::new();
    let mut skipped = vec![false; options.len()];
    let mut matched: Option<(&'static str, usize)> = None;

    for (consumed, c) in source[ic.position..].iter().enumerate() {
        value.extend(c.to_lowercase());

        for (i, option) in options.iter().enumerate() {
            if skipped[i] {
                continue;
            }
            if *option == value {
                skipped[i] = true;
                if matched.is_none_or(|(m, _)| option.len() > m.len()) {
                    matched = Some((*option, consumed + 1));
                }
                continue;
            }
            if !option.starts_with(value.as_str()) {
                skipped[i] = true;
            }
        }

        if skipped.iter().all(|s| *s) {
            break;
        }
    }
    matched
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '$' || c == '_'
}

/// Scans a keyword; a keyword directly followed by an identifier character
/// is left to the identifier sub-lexer (`selected`, `intox`).
fn lex_keyword(source: &[char], ic: Cursor) -> Option<(Option<Token>, Cursor)> {
    let (matched, len) = longest_match(source, ic, &Keyword::ALL.map(|k| k.to_str()))?;
    if source.get(ic.position + len).is_some_and(|c| is_identifier_char(*c)) {
        return None;
    }
    let keyword = Keyword::from_str(matched)?;
    Some((Some(Token::new(matched, keyword.kind(), ic.location)), ic.advance(len)))
}

/// Scans a symbol, or skips a single whitespace character without a token
fn lex_symbol(source: &[char], ic: Cursor) -> Option<(Option<Token>, Cursor)> {
    match source.get(ic.position)? {
        '\n' => {
            let cursor = Cursor {
                position: ic.position + 1,
                location: Location {
                    line: ic.location.line + 1,
                    col: 0,
                },
            };
            return Some((None, cursor));
        }
        ' ' | '\t' | '\r' => return Some((None, ic.advance(1))),
        _ => {}
    }

    let (matched, len) = longest_match(source, ic, &Symbol::ALL.map(|s| s.to_str()))?;
    Some((Some(Token::new(matched, TokenKind::Symbol, ic.location)), ic.advance(len)))
}

/// Scans a numeric literal such as `105`, `123.`, `.1` or `1.1e-2`
pub(crate) fn lex_numeric(source: &[char], ic: Cursor) -> Option<(Option<Token>, Cursor)> {
    let first = *source.get(ic.position)?;
    if !first.is_ascii_digit() && first != '.' {
        return None;
    }

    let mut position = ic.position + 1;
    let mut period_found = first == '.';
    let mut digit_found = first.is_ascii_digit();
    let mut exp_marker_found = false;

    while let Some(&c) = source.get(position) {
        if c.is_ascii_digit() {
            digit_found = true;
            position += 1;
            continue;
        }

        if c == '.' {
            if period_found {
                trace!("[Lexer] Repeated decimal point at {}", position);
                return None;
            }
            period_found = true;
            position += 1;
            continue;
        }

        if c == 'e' {
            if exp_marker_found || !digit_found {
                return None;
            }
            // No periods allowed after the exponent marker
            period_found = true;
            exp_marker_found = true;
            position += 1;

            if matches!(source.get(position), Some('+' | '-')) {
                position += 1;
            }
            if !source.get(position).is_some_and(char::is_ascii_digit) {
                trace!("[Lexer] Exponent marker without digits at {}", position);
                return None;
            }
            continue;
        }

        break;
    }

    if !digit_found {
        return None;
    }

    let len = position - ic.position;
    let value: String = source[ic.position..position].iter().collect();
    Some((Some(Token::new(value, TokenKind::Numeric, ic.location)), ic.advance(len)))
}

/// Scans text enclosed by `delimiter`. A doubled delimiter inside the text is
/// an escaped delimiter. Declines when the text is never closed.
fn lex_character_delimited(source: &[char], ic: Cursor, delimiter: char) -> Option<(String, Cursor)> {
    if source.get(ic.position) != Some(&delimiter) {
        return None;
    }

    let mut cursor = ic.advance(1);
    let mut value = String::new();
    while let Some(&c) = source.get(cursor.position) {
        if c == delimiter {
            if source.get(cursor.position + 1) != Some(&delimiter) {
                return Some((value, cursor.advance(1)));
            }
            value.push(delimiter);
            cursor = cursor.advance(2);
            continue;
        }

        value.push(c);
        cursor = if c == '\n' {
            Cursor {
                position: cursor.position + 1,
                location: Location {
                    line: cursor.location.line + 1,
                    col: 0,
                },
            }
        } else {
            cursor.advance(1)
        };
    }
    trace!("[Lexer] Unterminated {} literal at {}", delimiter, ic.location);
    None
}

/// Scans a string literal (enclosed in single quotes)
fn lex_string(source: &[char], ic: Cursor) -> Option<(Option<Token>, Cursor)> {
    let (value, cursor) = lex_character_delimited(source, ic, '\'')?;
    Some((Some(Token::new(value, TokenKind::String, ic.location)), cursor))
}

/// Scans an identifier, either double-quoted (case preserved) or bare
/// (folded to lowercase)
fn lex_identifier(source: &[char], ic: Cursor) -> Option<(Option<Token>, Cursor)> {
    if let Some((value, cursor)) = lex_character_delimited(source, ic, '"') {
        return Some((Some(Token::new(value, TokenKind::Identifier, ic.location)), cursor));
    }

    let first = *source.get(ic.position)?;
    if !first.is_alphabetic() {
        return None;
    }

    let len = source[ic.position..]
        .iter()
        .take_while(|c| is_identifier_char(**c))
        .count();
    let value: String = source[ic.position..ic.position + len].iter().collect();
    Some((
        Some(Token::new(value.to_lowercase(), TokenKind::Identifier, ic.location)),
        ic.advance(len),
    ))
}

/// SQL lexical analyzer (lexer/tokenizer)
///
/// Yields tokens until the input is exhausted, or a single error after which
/// iteration stops.
pub struct Lexer {
    source: Vec<char>,
    cursor: Cursor,
    /// Value of the last emitted token, reported on failure
    hint: Option<String>,
    failed: bool,
}

impl Iterator for Lexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.scan() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl Lexer {
    /// Creates a new lexer for the given SQL text
    pub fn new(sql_text: &str) -> Self {
        Self {
            source: sql_text.chars().collect(),
            cursor: Cursor::default(),
            hint: None,
            failed: false,
        }
    }

    /// Runs the sub-lexers in order at the cursor until one emits a token
    fn scan(&mut self) -> Result<Option<Token>> {
        'scan: while self.cursor.position < self.source.len() {
            for lexer in SUB_LEXERS {
                if let Some((token, cursor)) = lexer(&self.source, self.cursor) {
                    self.cursor = cursor;
                    match token {
                        Some(token) => {
                            trace!("[Lexer] {:?} token {} at {}", token.kind, token, token.location);
                            self.hint = Some(token.value.clone());
                            return Ok(Some(token));
                        }
                        None => continue 'scan,
                    }
                }
            }
            return Err(Error::Lex {
                location: self.cursor.location,
                hint: self.hint.clone(),
            });
        }
        Ok(None)
    }
}

/// Lexes the whole source, failing on the first unrecognized character
pub fn lex(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).collect()
}
