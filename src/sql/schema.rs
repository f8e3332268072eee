use crate::{
    error::{Error, Result},
    sql::types::{ColumnType, Row},
};

/// An in-memory table: column layout plus rows in insertion order
///
/// Every row holds one cell per column, encoded per that column's type.
#[derive(Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the index of the first column with the given name
    pub fn get_col_index(&self, col_name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == col_name)
    }

    /// Appends a row after checking it has one cell per column
    pub fn append(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Internal(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column schema definition
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}
