use log::debug;

use crate::error::Result;

use super::{
    parser::{
        Parser,
        ast::{CreateTableStatement, InsertStatement, SelectStatement, Statement},
    },
    types::Results,
};

pub mod memory;
pub mod shared;

pub use memory::MemoryBackend;
pub use shared::SharedBackend;

/// SQL backend trait
///
/// A storage engine that can interpret the three statement kinds. The
/// in-memory backend is one implementation; others can plug in behind the
/// same operations.
pub trait Backend {
    fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<()>;
    fn insert(&mut self, stmt: &InsertStatement) -> Result<()>;
    fn select(&self, stmt: &SelectStatement) -> Result<Results>;

    /// Dispatches a statement to the matching operation
    fn execute(&mut self, stmt: &Statement) -> Result<ResultSet> {
        match stmt {
            Statement::CreateTable(create) => {
                self.create_table(create)?;
                Ok(ResultSet::CreateTable {
                    table_name: create.name.value.clone(),
                })
            }
            Statement::Insert(insert) => {
                self.insert(insert)?;
                Ok(ResultSet::Insert { count: 1 })
            }
            Statement::Select(select) => Ok(ResultSet::Select(self.select(select)?)),
        }
    }
}

/// Execution result of a single statement
#[derive(Debug, PartialEq)]
pub enum ResultSet {
    CreateTable { table_name: String },
    Insert { count: usize },
    Select(Results),
}

/// SQL session running scripts against a backend
pub struct Session<B: Backend> {
    backend: B,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Parses the whole script, then executes its statements in order
    ///
    /// Nothing runs if the script fails to parse. Execution stops at the first
    /// failing statement; statements before it keep their effects.
    pub fn execute(&mut self, sql: &str) -> Result<Vec<ResultSet>> {
        let ast = Parser::new(sql)?.parse()?;
        debug!("[Session] Executing {} statements", ast.statements.len());
        ast.statements
            .iter()
            .map(|stmt| self.backend.execute(stmt))
            .collect()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
