//! Database connection pool management.
//!
//! Connection pooling for SQLite using r2d2. Migrations run once, on the
//! first connection handed out by a freshly built pool.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use mediavault_common::{Error, Result};

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize a pool over the SQLite file at `db_path`, creating it if needed.
///
/// Connections enable WAL mode so readers do not block on the CLI writing.
///
/// # Example
///
/// ```no_run
/// use mediavault_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/mediavault/catalog.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;"));

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    migrate(&pool)?;
    tracing::debug!(path = db_path, "Catalog database ready");
    Ok(pool)
}

/// Initialize an in-memory pool for tests.
///
/// Every SQLite `:memory:` connection is its own database, so the pool holds
/// exactly one connection.
///
/// # Example
///
/// ```
/// use mediavault_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {}", e)))?;

    migrate(&pool)?;
    Ok(pool)
}

fn migrate(pool: &DbPool) -> Result<()> {
    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;
    Ok(())
}

/// Get a connection from the pool, converting the r2d2 error.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}
