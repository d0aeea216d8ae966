pub mod models;
pub mod schema;

mod charging;
mod rewards;
mod social;
mod stations;
mod users;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::debug;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced row does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// The row exists but is in a state that forbids the operation.
    #[error("{0}")]
    InvalidState(&'static str),

    /// A unique key already exists.
    #[error("{0}")]
    Duplicate(&'static str),

    #[error("Not enough points to claim this reward")]
    InsufficientPoints { balance: i64, required: i32 },
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_sqlite_conn(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder()
            .max_size(8)
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        let store = Store { pool };
        store
            .with_conn(|conn| {
                let applied = conn
                    .run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                debug!(count = applied.len(), "migrations applied");
                Ok(())
            })
            .await?;

        Ok(store)
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;
    use super::models::{StationFields, User};
    use voltmap_shared::domain::StationStatus;

    pub struct TestStore {
        pub store: Store,
        _dir: tempfile::TempDir,
    }

    pub async fn open() -> TestStore {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::connect_sqlite(path.to_str().unwrap())
            .await
            .expect("db");
        TestStore { store, _dir: dir }
    }

    pub async fn user(store: &Store, username: &str) -> User {
        store
            .create_user(username, &format!("{username}@example.com"), username, "x")
            .await
            .unwrap()
    }

    pub fn station_fields(status: StationStatus, power: i32, is_free: bool) -> StationFields {
        StationFields {
            name: format!("Station {power}"),
            address: "1 Main St".into(),
            city: "Lisbon".into(),
            lat: 38.72,
            lng: -9.14,
            price_per_kwh: Some(2.5),
            is_free,
            power,
            opening_hours: "24/7".into(),
            status: status.as_str().into(),
            has_wifi: false,
            has_free_parking: true,
            has_restaurant: false,
            has_waiting_area: false,
        }
    }
}
