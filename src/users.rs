//! Credential store
//!
//! Single `users` table in SQLite. Passwords are kept only as argon2 PHC
//! strings; the plaintext never reaches the database or the logs.

use std::path::Path;
use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{Error, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL
    )";

#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Opens (creating if missing) the SQLite file at `path` and ensures the
    /// schema exists.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<CredentialStore> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "user store opened");
        CredentialStore::from_pool(pool).await
    }

    /// Wraps an existing pool and ensures the schema exists.
    pub async fn from_pool(pool: SqlitePool) -> Result<CredentialStore> {
        let store = CredentialStore { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Registers a new user.
    ///
    /// Returns `Ok(false)` when the username is already taken. Uniqueness is
    /// decided by the table constraint, so concurrent signups for the same name
    /// cannot both succeed.
    pub async fn create(&self, username: &str, password: &str) -> Result<bool> {
        let hash = hash_password(password)?;

        let inserted = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&hash)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {
                tracing::info!(username, "user created");
                Ok(true)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::info!(username, "signup rejected, username taken");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users and wrong passwords both give `Ok(false)`.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let stored: Option<String> = sqlx::query_scalar("SELECT password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        let Some(stored) = stored else {
            // same argon2 work as a wrong password, so timing does not reveal
            // whether the username exists
            verify_password(password, dummy_hash()?)?;
            return Ok(false);
        };

        verify_password(password, &stored)
    }

    /// Number of rows stored under exactly `username`.
    pub async fn count_by_username(&self, username: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Salted argon2 hash in PHC string form.
fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::PasswordHash { reason: e.to_string() })?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHash { reason: e.to_string() })?;

    Ok(hash.to_string())
}

/// Hash checked against when the username is unknown.
fn dummy_hash() -> Result<&'static str> {
    static DUMMY: OnceLock<String> = OnceLock::new();

    if let Some(hash) = DUMMY.get() {
        return Ok(hash);
    }
    let hash = hash_password("fixbot-unknown-user")?;
    Ok(DUMMY.get_or_init(|| hash))
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::PasswordHash { reason: e.to_string() })?;

    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
