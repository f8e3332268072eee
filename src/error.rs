use std::{array::TryFromSliceError, fmt::Display, string::FromUtf8Error, sync::PoisonError};

use bincode::ErrorKind;

use crate::sql::parser::lexer::Location;

/// Custom Result type for MiniSQL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for MiniSQL
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No sub-lexer recognized the input at `location`.
    /// `hint` carries the value of the last token lexed before the failure.
    Lex {
        location: Location,
        hint: Option<String>,
    },
    /// Expected construct not found; `token` is the offending (or final) token
    Parse {
        location: Location,
        token: String,
        message: String,
    },
    TableDoesNotExist(String),
    ColumnDoesNotExist(String),
    InvalidDataType(String),
    /// Insert value count differs from the table's column count
    MissingValues { expected: usize, got: usize },
    /// Internal error (cell decoding, serialization, locking, etc.)
    Internal(String),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<TryFromSliceError> for Error {
    fn from(value: TryFromSliceError) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Lex { location, hint: Some(hint) } => {
                write!(f, "unable to lex token after {}, at {}", hint, location)
            }
            Error::Lex { location, hint: None } => write!(f, "unable to lex token, at {}", location),
            Error::Parse { location, token, message } => {
                write!(f, "[{}]: {}, got: {}", location, message, token)
            }
            Error::TableDoesNotExist(name) => write!(f, "table {} does not exist", name),
            Error::ColumnDoesNotExist(name) => write!(f, "column {} does not exist", name),
            Error::InvalidDataType(err) => write!(f, "invalid data type {}", err),
            Error::MissingValues { expected, got } => {
                write!(f, "missing values, expected {} got {}", expected, got)
            }
            Error::Internal(err) => write!(f, "internal error {}", err),
        }
    }
}
