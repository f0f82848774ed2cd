//! Database connection pool management.
//!
//! Connection pooling for SQLite using r2d2. Every connection is opened with
//! foreign key enforcement so `ON DELETE CASCADE` constraints take effect.
//! The pool itself is an [`Executor`]: each call checks a connection out,
//! runs one statement, and returns the connection when it is dropped.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;
use crate::executor::{Execution, Executor, Row};
use crate::sql::Statement;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Initialize a database pool backed by a file on disk.
///
/// Creates the SQLite file if it does not exist and enables foreign keys and
/// WAL journal mode on every new connection.
///
/// # Example
///
/// ```no_run
/// use backpack_orm::pool::{init_pool, DEFAULT_POOL_SIZE};
///
/// let pool = init_pool("/var/lib/backpack/db.sqlite", DEFAULT_POOL_SIZE).unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: impl AsRef<Path>, max_size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path.as_ref()).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;",
        )
    });

    let pool = Pool::builder().max_size(max_size).build(manager)?;
    tracing::debug!(path = %db_path.as_ref().display(), max_size, "database pool ready");

    Ok(pool)
}

/// Initialize an in-memory database pool (useful for tests).
///
/// Each call creates a uniquely-named shared-cache in-memory database so
/// that parallel tests do not interfere with each other, while all
/// connections *within* a single pool still share state.
///
/// ```
/// use backpack_orm::pool::{get_conn, init_memory_pool};
///
/// let pool = init_memory_pool().unwrap();
/// let conn = get_conn(&pool).unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:backpack_mem_{n}?mode=memory&cache=shared");

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    let pool = Pool::builder().max_size(DEFAULT_POOL_SIZE).build(manager)?;

    Ok(pool)
}

/// Get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    Ok(pool.get()?)
}

impl Executor for DbPool {
    fn execute(&self, statement: &Statement) -> Result<Execution> {
        let conn = get_conn(self)?;
        Executor::execute(&*conn, statement)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        let conn = get_conn(self)?;
        Executor::query(&*conn, statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_init_memory_pool() {
        let pool = init_memory_pool().unwrap();
        assert_eq!(pool.max_size(), DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_get_conn_enables_foreign_keys() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_connections_share_memory_database() {
        let pool = init_memory_pool().unwrap();
        pool.execute(&Statement::new("CREATE TABLE note (id INTEGER PRIMARY KEY, body TEXT)"))
            .unwrap();

        let _held = get_conn(&pool).unwrap();
        pool.execute(&Statement::with_params(
            "INSERT INTO note (body) VALUES (?)",
            vec![Value::from("hello")],
        ))
        .unwrap();

        let rows = pool.query(&Statement::new("SELECT body FROM note")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("body"), Some(&Value::from("hello")));
    }

    #[test]
    fn test_separate_pools_are_isolated() {
        let first = init_memory_pool().unwrap();
        let second = init_memory_pool().unwrap();
        first
            .execute(&Statement::new("CREATE TABLE only_here (id INTEGER)"))
            .unwrap();
        assert!(second.query(&Statement::new("SELECT * FROM only_here")).is_err());
    }

    #[test]
    fn test_file_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backpack.db");
        let pool = init_pool(&path, 2).unwrap();
        assert_eq!(pool.max_size(), 2);
        pool.execute(&Statement::new("CREATE TABLE t (id INTEGER)")).unwrap();
        assert!(path.exists());
    }
}
