use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    sql::{
        parser::{
            ast::{CreateTableStatement, InsertStatement, SelectStatement},
            lexer::{Token, TokenKind},
        },
        schema::{Column, Table},
        types::{Cell, ColumnType, ResultColumn, Results, Row},
    },
};

use super::Backend;

/// In-memory backend
///
/// Owns the table store exclusively and is its only mutator. Not
/// synchronized; wrap it in a [`super::SharedBackend`] for concurrent use.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: BTreeMap<String, Table>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Returns the table with the given (case-sensitive) name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    fn must_get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableDoesNotExist(name.to_string()))
    }
}

/// Encodes a literal token as a cell of the column's type
///
/// Numeric literals go into INT columns as 4-byte big-endian integers, string
/// literals into TEXT columns as raw bytes. Anything else is rejected so the
/// stored bytes always match the declared column type.
fn token_to_cell(token: &Token, column: &Column) -> Result<Cell> {
    match (token.kind, column.column_type) {
        (TokenKind::Numeric, ColumnType::Int) => {
            let value: i32 = token.value.parse().map_err(|_| {
                Error::InvalidDataType(format!(
                    "{} is not a 32-bit integer for column {}",
                    token.value, column.name
                ))
            })?;
            Ok(Cell::from_int(value))
        }
        (TokenKind::String, ColumnType::Text) => Ok(Cell::from_text(&token.value)),
        (kind, column_type) => Err(Error::InvalidDataType(format!(
            "{:?} literal {} for {} column {}",
            kind, token.value, column_type, column.name
        ))),
    }
}

impl Backend for MemoryBackend {
    /// Creates an empty table, silently replacing any table of the same name
    fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<()> {
        let columns = stmt
            .columns
            .iter()
            .map(|col| {
                let column_type = ColumnType::from_datatype(&col.datatype.value)
                    .ok_or_else(|| Error::InvalidDataType(col.datatype.value.clone()))?;
                Ok(Column {
                    name: col.name.value.clone(),
                    column_type,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let name = stmt.name.value.clone();
        if self.tables.insert(name.clone(), Table::new(columns)).is_some() {
            warn!("[MemoryBackend] Table {} replaced, previous rows dropped", name);
        } else {
            debug!("[MemoryBackend] Table {} created", name);
        }
        Ok(())
    }

    /// Appends one row; every value must be present and match its column
    fn insert(&mut self, stmt: &InsertStatement) -> Result<()> {
        let table_name = stmt.table.value.as_str();
        let table = self.must_get_table(table_name)?;

        if stmt.values.len() != table.columns.len() {
            return Err(Error::MissingValues {
                expected: table.columns.len(),
                got: stmt.values.len(),
            });
        }

        let mut row: Row = Vec::with_capacity(stmt.values.len());
        for (value, column) in stmt.values.iter().zip(&table.columns) {
            let Some(token) = value.literal() else {
                warn!("[MemoryBackend] Skipping non-literal value for column {}", column.name);
                continue;
            };
            row.push(token_to_cell(token, column)?);
        }

        self.tables
            .get_mut(table_name)
            .ok_or_else(|| Error::TableDoesNotExist(table_name.to_string()))?
            .append(row)?;
        debug!("[MemoryBackend] Row appended to {}", table_name);
        Ok(())
    }

    /// Projects the requested columns of every row, in storage order
    ///
    /// Result columns are captured from the first row, so an empty table
    /// yields no columns and does not resolve the requested names at all.
    fn select(&self, stmt: &SelectStatement) -> Result<Results> {
        let table_name = stmt.from.as_ref().map_or("", |t| t.value.as_str());
        let table = self.must_get_table(table_name)?;

        let mut results = Results::default();
        for (i, row) in table.rows.iter().enumerate() {
            let mut result = Vec::with_capacity(stmt.items.len());
            for item in &stmt.items {
                let index = item
                    .identifier()
                    .and_then(|name| table.get_col_index(name))
                    .ok_or_else(|| {
                        let name = item.literal().map_or("", |t| t.value.as_str());
                        Error::ColumnDoesNotExist(name.to_string())
                    })?;

                if i == 0 {
                    let column = &table.columns[index];
                    results.columns.push(ResultColumn {
                        column_type: column.column_type,
                        name: column.name.clone(),
                    });
                }
                result.push(row[index].clone());
            }
            results.rows.push(result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::MemoryBackend;
    use crate::{
        error::{Error, Result},
        sql::{
            engine::Backend,
            parser::{ast::Statement, parse},
            schema::Column,
            types::{Cell, ColumnType, ResultColumn, Results, Value},
        },
    };

    /// Parses and executes a script, returning the last select results
    fn run(backend: &mut MemoryBackend, sql: &str) -> Result<Option<Results>> {
        let mut last = None;
        for stmt in parse(sql)?.statements {
            match &stmt {
                Statement::Select(select) => last = Some(backend.select(select)?),
                Statement::Insert(insert) => backend.insert(insert)?,
                Statement::CreateTable(create) => backend.create_table(create)?,
            }
        }
        Ok(last)
    }

    #[test]
    fn test_create_table() -> Result<()> {
        let mut backend = MemoryBackend::new();
        run(&mut backend, "CREATE TABLE users (id INT, name TEXT);")?;

        let table = backend.table("users").expect("table should exist");
        assert_eq!(
            table.columns,
            vec![
                Column { name: "id".to_string(), column_type: ColumnType::Int },
                Column { name: "name".to_string(), column_type: ColumnType::Text },
            ]
        );
        assert!(table.is_empty());

        // Quoted names keep their case and are a different table
        run(&mut backend, r#"CREATE TABLE "Users" (id INT);"#)?;
        assert!(backend.table("Users").is_some());
        assert_eq!(backend.table("users").map(|t| t.columns.len()), Some(2));
        Ok(())
    }

    #[test]
    fn test_create_table_overwrites() -> Result<()> {
        let mut backend = MemoryBackend::new();
        run(
            &mut backend,
            "CREATE TABLE t (a INT); INSERT INTO t VALUES (1); INSERT INTO t VALUES (2);",
        )?;
        assert_eq!(backend.table("t").map(|t| t.rows.len()), Some(2));

        run(&mut backend, "CREATE TABLE t (b TEXT);")?;
        let table = backend.table("t").expect("table should exist");
        assert!(table.is_empty());
        assert_eq!(table.columns[0].name, "b");
        Ok(())
    }

    #[test]
    fn test_create_table_invalid_type() -> Result<()> {
        let mut backend = MemoryBackend::new();
        run(&mut backend, "CREATE TABLE t (a INT); INSERT INTO t VALUES (7);")?;

        let result = run(&mut backend, "CREATE TABLE t (a INT, b select);");
        assert_eq!(result, Err(Error::InvalidDataType("select".to_string())));
        // Validation happens before the store is touched
        assert_eq!(backend.table("t").map(|t| t.rows.len()), Some(1));
        Ok(())
    }

    #[test]
    fn test_insert() -> Result<()> {
        let mut backend = MemoryBackend::new();
        run(
            &mut backend,
            "CREATE TABLE users (a INT, b INT); INSERT INTO users VALUES(105, 233);",
        )?;

        let table = backend.table("users").expect("table should exist");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec![Cell::from_int(105), Cell::from_int(233)]);
        assert_eq!(table.rows[0][0].as_bytes(), &[0, 0, 0, 105]);
        assert_eq!(table.rows[0][1].as_bytes(), &[0, 0, 0, 233]);
        Ok(())
    }

    #[test]
    fn test_insert_errors() -> Result<()> {
        let mut backend = MemoryBackend::new();
        assert_eq!(
            run(&mut backend, "INSERT INTO users VALUES (1);"),
            Err(Error::TableDoesNotExist("users".to_string()))
        );

        run(&mut backend, "CREATE TABLE users (id INT, name TEXT);")?;
        assert_eq!(
            run(&mut backend, "INSERT INTO users VALUES (1);"),
            Err(Error::MissingValues { expected: 2, got: 1 })
        );
        assert_eq!(
            run(&mut backend, "INSERT INTO users VALUES (1, 'a', 'b');"),
            Err(Error::MissingValues { expected: 2, got: 3 })
        );
        assert!(matches!(
            run(&mut backend, "INSERT INTO users VALUES ('1', 'a');"),
            Err(Error::InvalidDataType(_))
        ));
        assert!(matches!(
            run(&mut backend, "INSERT INTO users VALUES (1.5, 'a');"),
            Err(Error::InvalidDataType(_))
        ));
        assert!(matches!(
            run(&mut backend, "INSERT INTO users VALUES (1, name);"),
            Err(Error::InvalidDataType(_))
        ));
        assert!(matches!(
            run(&mut backend, "INSERT INTO users VALUES (99999999999, 'a');"),
            Err(Error::InvalidDataType(_))
        ));

        // None of the failed inserts left a row behind
        assert_eq!(backend.table("users").map(|t| t.rows.len()), Some(0));
        Ok(())
    }

    #[test]
    fn test_select() -> Result<()> {
        let mut backend = MemoryBackend::new();
        let results = run(
            &mut backend,
            "CREATE TABLE users (id INT, name TEXT);
             INSERT INTO users VALUES (1, 'Alice');
             INSERT INTO users VALUES (2, 'it''s Bob');
             SELECT id, name, id FROM users;",
        )?
        .expect("select should return results");

        assert_eq!(
            results.columns,
            vec![
                ResultColumn { column_type: ColumnType::Int, name: "id".to_string() },
                ResultColumn { column_type: ColumnType::Text, name: "name".to_string() },
                ResultColumn { column_type: ColumnType::Int, name: "id".to_string() },
            ]
        );
        assert_eq!(
            results.decoded_rows()?,
            vec![
                vec![Value::Int(1), Value::Text("Alice".to_string()), Value::Int(1)],
                vec![Value::Int(2), Value::Text("it's Bob".to_string()), Value::Int(2)],
            ]
        );
        assert_eq!(results.rows[1][1].as_text()?, "it's Bob");
        Ok(())
    }

    #[test]
    fn test_select_empty_table() -> Result<()> {
        let mut backend = MemoryBackend::new();
        run(&mut backend, "CREATE TABLE users (id INT, name TEXT);")?;

        let results = run(&mut backend, "SELECT id, name FROM users;")?;
        assert_eq!(results, Some(Results::default()));

        // Names are only resolved against rows, so nothing fails here
        let results = run(&mut backend, "SELECT nope FROM users;")?;
        assert_eq!(results.map(|r| r.columns.len()), Some(0));
        Ok(())
    }

    #[test]
    fn test_select_errors() -> Result<()> {
        let mut backend = MemoryBackend::new();
        assert_eq!(
            run(&mut backend, "SELECT id FROM users;"),
            Err(Error::TableDoesNotExist("users".to_string()))
        );
        assert_eq!(
            run(&mut backend, "SELECT 1;"),
            Err(Error::TableDoesNotExist("".to_string()))
        );

        run(
            &mut backend,
            "CREATE TABLE users (id INT); INSERT INTO users VALUES (1);",
        )?;
        assert_eq!(
            run(&mut backend, "SELECT id, age FROM users;"),
            Err(Error::ColumnDoesNotExist("age".to_string()))
        );
        assert_eq!(
            run(&mut backend, "SELECT 'id' FROM users;"),
            Err(Error::ColumnDoesNotExist("id".to_string()))
        );
        assert_eq!(
            run(&mut backend, "SELECT 5 FROM users;"),
            Err(Error::ColumnDoesNotExist("5".to_string()))
        );

        // Failed selects leave the store untouched
        let table = backend.table("users").expect("table should exist");
        assert_eq!(table.rows, vec![vec![Cell::from_int(1)]]);
        Ok(())
    }
}
