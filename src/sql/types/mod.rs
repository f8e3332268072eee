use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Text,
}

impl ColumnType {
    /// Maps a datatype keyword (`int`, `text`) to a column type
    pub fn from_datatype(datatype: &str) -> Option<ColumnType> {
        match datatype.to_lowercase().as_str() {
            "int" => Some(ColumnType::Int),
            "text" => Some(ColumnType::Text),
            _ => None,
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ColumnType::Int => "INT",
            ColumnType::Text => "TEXT",
        })
    }
}

/// A single stored value as raw bytes
///
/// The cell carries no type tag: integers are 4-byte big-endian two's
/// complement, text is the literal's UTF-8 bytes. The column type decides how
/// the bytes are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell(#[serde(with = "serde_bytes")] Vec<u8>);

impl Cell {
    pub fn from_int(value: i32) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    pub fn from_text(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }

    /// Reads the cell as an integer; fails unless it holds exactly 4 bytes
    pub fn as_int(&self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.0.as_slice().try_into()?))
    }

    /// Reads the cell as text; fails on invalid UTF-8
    pub fn as_text(&self) -> Result<String> {
        Ok(String::from_utf8(self.0.clone())?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decodes the cell according to its column's type
    pub fn decode(&self, column_type: ColumnType) -> Result<Value> {
        Ok(match column_type {
            ColumnType::Int => Value::Int(self.as_int()?),
            ColumnType::Text => Value::Text(self.as_text()?),
        })
    }
}

/// Decoded form of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Text(String),
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// A row is a vector of cells
pub type Row = Vec<Cell>;

/// Type and name of a result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub column_type: ColumnType,
    pub name: String,
}

/// Output of a SELECT, independent of the table layout it was read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Results {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Row>,
}

impl Results {
    /// Decodes every cell by its result column's type
    pub fn decoded_rows(&self) -> Result<Vec<Vec<Value>>> {
        self.rows
            .iter()
            .map(|row| {
                if row.len() != self.columns.len() {
                    return Err(Error::Internal(format!(
                        "row has {} cells but results have {} columns",
                        row.len(),
                        self.columns.len()
                    )));
                }
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, column)| cell.decode(column.column_type))
                    .collect()
            })
            .collect()
    }

    /// Serializes the results for transport to a remote caller
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Results> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Cell, ColumnType, ResultColumn, Results, Value};
    use crate::error::{Error, Result};

    #[test]
    fn test_cell_encoding() -> Result<()> {
        assert_eq!(Cell::from_int(105).as_bytes(), &[0, 0, 0, 105]);
        assert_eq!(Cell::from_int(-2).as_bytes(), &[0xff, 0xff, 0xff, 0xfe]);
        assert_eq!(Cell::from_int(i32::MAX).as_int()?, i32::MAX);
        assert_eq!(Cell::from_text("héllo").as_bytes(), "héllo".as_bytes());
        assert_eq!(Cell::from_text("héllo").as_text()?, "héllo");
        Ok(())
    }

    #[test]
    fn test_cell_decode_mismatch() -> Result<()> {
        let text = Cell::from_text("hello");
        assert!(matches!(text.as_int(), Err(Error::Internal(_))));
        assert!(matches!(text.decode(ColumnType::Int), Err(Error::Internal(_))));

        // Four text bytes happen to decode as an int
        assert_eq!(Cell::from_text("abcd").decode(ColumnType::Int)?, Value::Int(0x61626364));

        let invalid = Cell(vec![0xff, 0xfe]);
        assert!(matches!(invalid.as_text(), Err(Error::Internal(_))));
        Ok(())
    }

    #[test]
    fn test_column_type() {
        assert_eq!(ColumnType::from_datatype("int"), Some(ColumnType::Int));
        assert_eq!(ColumnType::from_datatype("TEXT"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_datatype("select"), None);
        assert_eq!(ColumnType::Int.to_string(), "INT");
    }

    #[test]
    fn test_results_wire_format() -> Result<()> {
        let results = Results {
            columns: vec![
                ResultColumn { column_type: ColumnType::Int, name: "id".to_string() },
                ResultColumn { column_type: ColumnType::Text, name: "name".to_string() },
            ],
            rows: vec![vec![Cell::from_int(1), Cell::from_text("alice")]],
        };
        let decoded = Results::decode(&results.encode()?)?;
        assert_eq!(decoded, results);
        assert_eq!(decoded.rows[0][0].as_bytes(), &[0, 0, 0, 1]);
        assert_eq!(
            decoded.decoded_rows()?,
            vec![vec![Value::Int(1), Value::Text("alice".to_string())]]
        );

        assert!(matches!(Results::decode(&[1, 2, 3]), Err(Error::Internal(_))));
        Ok(())
    }
}
