use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::User;

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("invalid password hash format: {e}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("password verification failed: {e}")),
    }
}

pub struct IssuedSession {
    pub token: String,
    pub expires_at: NaiveDateTime,
}

pub fn issue_session(
    conn: &Connection,
    user_id: i64,
    ttl_hours: i64,
) -> anyhow::Result<IssuedSession> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now().naive_utc() + Duration::hours(ttl_hours);
    queries::create_session(conn, &token, user_id, &expires_at)?;
    Ok(IssuedSession { token, expires_at })
}

/// Resolves a bearer token to its user; expired or unknown tokens yield None.
pub fn resolve_session(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    queries::session_user(conn, token)
}
