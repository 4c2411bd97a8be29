pub mod repository;
pub mod schema;

// Re-export for convenience
pub use repository::*;

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{NetprobeError, Result};

const DATABASE_FILENAME: &str = "netprobe.db";

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `path`, or at the default data directory when `None`.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let db_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_database_path()?,
        };

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!("Opening database at {:?}", db_path);
        let conn = Connection::open(&db_path)?;

        // Initialize schema (creates tables if they don't exist)
        schema::init_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| NetprobeError::General(format!("Database lock poisoned: {}", e)))
    }
}

fn get_database_path() -> Result<PathBuf> {
    let proj_dirs = crate::config::project_dirs()
        .ok_or_else(|| NetprobeError::config("Failed to determine project directories"))?;

    Ok(proj_dirs.data_dir().join(DATABASE_FILENAME))
}

/// Create an in-memory database for testing
#[cfg(test)]
pub fn create_test_database() -> Database {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    schema::init_database(&conn).expect("Failed to initialize schema");

    Database {
        conn: Mutex::new(conn),
    }
}
