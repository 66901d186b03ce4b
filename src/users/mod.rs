//! Dashboard user accounts.
//!
//! Users live in their own SQLite database, separate from any backup
//! catalog, with argon2 password hashes. The store is cheap to clone and
//! shared across requests.

use std::path::Path;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("user database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Clone)]
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Open (and if needed create) the user database at `path`.
    pub async fn open(path: &Path) -> Result<Self, UserStoreError> {
        let conn = Connection::open(path)
            .await
            .map_err(tokio_rusqlite::Error::from)?;
        conn.call(|c| {
            c.execute_batch(include_str!("schema.sql"))?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// Check a username/password pair. Unknown users and wrong passwords
    /// both come back as `Ok(false)`.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, UserStoreError> {
        let username = username.to_string();
        let stored: Option<String> = self
            .conn
            .call(move |c| {
                let hash = c
                    .query_row(
                        "SELECT password_hash FROM users WHERE username = ?1",
                        params![username],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(hash)
            })
            .await?;

        match stored {
            Some(hash) => verify_password(password, &hash),
            None => Ok(false),
        }
    }

    /// Create a user, or replace the password of an existing one.
    pub async fn upsert(&self, username: &str, password: &str) -> Result<(), UserStoreError> {
        let hash = hash_password(password)?;
        let username = username.to_string();
        self.conn
            .call(move |c| {
                c.execute(
                    "INSERT INTO users (username, password_hash) VALUES (?1, ?2) \
                     ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash",
                    params![username, hash],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

pub fn hash_password(password: &str) -> Result<String, UserStoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserStoreError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserStoreError> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserStoreError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserStoreError::Hash(e.to_string())),
    }
}
