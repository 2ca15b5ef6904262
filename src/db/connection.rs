use rusqlite::Connection;
use std::cell::RefCell;

use crate::errors::MonitorError;

// Thread-local connection slot, keyed by path so tests with separate
// databases on the same thread don't cross wires.
thread_local! {
    static DB_CONN: RefCell<Option<(String, Connection)>> = RefCell::new(None);
}

#[derive(Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Provides a mutable connection to the closure, opening it on first use.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, MonitorError>
    where
        F: FnOnce(&mut Connection) -> Result<T, MonitorError>,
    {
        let inner_result = DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let stale = match slot.as_ref() {
                    Some((path, _)) => path != &self.path,
                    None => true,
                };
                if stale {
                    let conn = Connection::open(&self.path).map_err(|e| {
                        MonitorError::Store(format!("open {} failed: {e}", self.path))
                    })?;
                    *slot = Some((self.path.clone(), conn));
                }
                let (_, conn) = slot.as_mut().unwrap();
                f(conn)
            })
            .map_err(|_| MonitorError::Store("thread-local connection unavailable".into()))?;
        inner_result
    }
}
