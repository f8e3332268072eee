use std::sync::{Arc, Mutex};

use crate::{
    error::Result,
    sql::{
        parser::ast::{CreateTableStatement, InsertStatement, SelectStatement},
        types::Results,
    },
};

use super::Backend;

/// Cloneable handle serializing access to a backend behind one lock
///
/// The wrapped backend stays unsynchronized; every operation takes the lock
/// for its whole duration.
pub struct SharedBackend<B: Backend> {
    inner: Arc<Mutex<B>>,
}

impl<B: Backend> Clone for SharedBackend<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend> SharedBackend<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backend)),
        }
    }

    /// Runs a closure with exclusive access to the backend
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> Result<R> {
        let mut backend = self.inner.lock()?;
        Ok(f(&mut backend))
    }
}

impl<B: Backend> Backend for SharedBackend<B> {
    fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<()> {
        self.inner.lock()?.create_table(stmt)
    }

    fn insert(&mut self, stmt: &InsertStatement) -> Result<()> {
        self.inner.lock()?.insert(stmt)
    }

    fn select(&self, stmt: &SelectStatement) -> Result<Results> {
        self.inner.lock()?.select(stmt)
    }
}
