//! SQLite store for users and SOS alerts

use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        phone TEXT,
        password_hash TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sos_alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        lat REAL NOT NULL,
        lng REAL NOT NULL,
        message TEXT,
        timestamp INTEGER NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    );
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewSosAlert {
    pub user_id: Option<i64>,
    pub lat: f64,
    pub lng: f64,
    pub message: Option<String>,
    pub timestamp: i64,
}

/// Shared connection; every statement runs on the blocking pool under the lock
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection off the async workers
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock())).await?
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
    ) -> StoreResult<i64> {
        let (name, email) = (name.to_string(), email.to_string());
        let phone = phone.map(str::to_string);
        let password_hash = password_hash.to_string();

        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (name, email, phone, password_hash) VALUES (?1, ?2, ?3, ?4)",
                params![name, email, phone, password_hash],
            );
            match inserted {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::DuplicateEmail)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            let user = conn
                .query_row(
                    "SELECT id, name, email, phone, password_hash FROM users WHERE email = ?1",
                    params![email],
                    |r| {
                        Ok(User {
                            id: r.get(0)?,
                            name: r.get(1)?,
                            email: r.get(2)?,
                            phone: r.get(3)?,
                            password_hash: r.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
        .await
    }

    /// Append an alert; returns its id
    pub async fn insert_sos(&self, alert: &NewSosAlert) -> StoreResult<i64> {
        let alert = alert.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sos_alerts (user_id, lat, lng, message, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![alert.user_id, alert.lat, alert.lng, alert.message, alert.timestamp],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn sos_count(&self) -> StoreResult<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM sos_alerts", [], |r| r.get(0))?)
        })
        .await
    }
}
