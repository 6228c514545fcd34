use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::info;

use crate::errors::SourceError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slots, one per database path. Fetches run on
// scoped worker threads, so each worker opens its own connection.
thread_local! {
    static DB_CONNS: RefCell<HashMap<String, Connection>> = RefCell::new(HashMap::new());
}

#[derive(Clone, Debug)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Open or fetch this thread's connection and run `f(conn)`.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SourceError>
    where
        F: FnOnce(&mut Connection) -> Result<T, SourceError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut slots = cell.borrow_mut();
                if !slots.contains_key(&self.path) {
                    let conn = Connection::open(&self.path)?;
                    slots.insert(self.path.clone(), conn);
                }
                let conn = slots
                    .get_mut(&self.path)
                    .ok_or(SourceError::ConnectionUnavailable)?;
                f(conn)
            })
            .map_err(|_| SourceError::ConnectionUnavailable)?
    }

    /// Applies `sql/schema.sql`. Safe to run repeatedly.
    pub fn init_schema(&self) -> Result<(), SourceError> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA_SQL)?;
            Ok(())
        })?;

        info!(path = %self.path, "listing database schema applied");
        Ok(())
    }
}
