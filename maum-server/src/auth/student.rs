//! Student sessions
//!
//! The cookie carries a random token; only `hash_token(token)` is stored,
//! so a leaked table cannot be replayed as cookies.

use chrono::{DateTime, Duration, Utc};
use maum_core::credentials::{generate_session_token, hash_token};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repos::{DbError, SessionRepo, StudentSession};

/// A freshly created session: the raw token goes into the cookie
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Student session required")]
    Missing,

    #[error("Invalid session")]
    Invalid,

    #[error("Session expired")]
    Expired,

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Store a new session for the student, valid for `days`.
pub async fn create(pool: &PgPool, student_id: Uuid, days: i64) -> Result<IssuedSession, DbError> {
    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::days(days);

    SessionRepo::new(pool)
        .create(student_id, &hash_token(&token), expires_at)
        .await?;

    tracing::info!(%student_id, %expires_at, "Student session created");
    Ok(IssuedSession { token, expires_at })
}

/// Resolve a cookie token to its session. An expired session is deleted
/// on the way out.
pub async fn resolve(
    pool: &PgPool,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StudentSession, SessionError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(SessionError::Missing)?;
    let repo = SessionRepo::new(pool);

    let session = repo
        .find_by_hash(&hash_token(token))
        .await?
        .ok_or(SessionError::Invalid)?;

    if session.is_expired(now) {
        repo.delete_by_id(session.session_id).await?;
        tracing::warn!(student_id = %session.student_id, "Rejected expired student session");
        return Err(SessionError::Expired);
    }

    Ok(session)
}

/// Delete the session behind a cookie token, if any.
pub async fn revoke(pool: &PgPool, token: &str) -> Result<bool, DbError> {
    SessionRepo::new(pool).delete_by_hash(&hash_token(token)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/maum_unused")
            .unwrap()
    }

    #[tokio::test]
    async fn missing_token_short_circuits() {
        let pool = lazy_pool();
        assert!(matches!(resolve(&pool, None, Utc::now()).await, Err(SessionError::Missing)));
        assert!(matches!(resolve(&pool, Some(""), Utc::now()).await, Err(SessionError::Missing)));
    }

    #[test]
    fn messages() {
        assert_eq!(SessionError::Missing.to_string(), "Student session required");
        assert_eq!(SessionError::Invalid.to_string(), "Invalid session");
        assert_eq!(SessionError::Expired.to_string(), "Session expired");
    }
}
