//! Student session store
//!
//! Rows hold only the SHA-256 of the cookie token.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

/// A session joined with the student and class it belongs to
#[derive(Debug, Clone, FromRow)]
pub struct StudentSession {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_number: i32,
    pub class_id: Uuid,
    pub class_name: String,
    pub class_code: String,
}

impl StudentSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

pub struct SessionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        student_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, DbError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO student_sessions (student_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Look a session up by token hash, expired or not.
    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<StudentSession>, DbError> {
        let session = sqlx::query_as::<_, StudentSession>(
            r#"
            SELECT
                ss.id AS session_id,
                ss.expires_at,
                s.id AS student_id,
                s.name AS student_name,
                s.student_number,
                c.id AS class_id,
                c.class_name,
                c.class_code
            FROM student_sessions ss
            JOIN students s ON s.id = ss.student_id
            JOIN classes c ON c.id = s.class_id
            WHERE ss.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    /// Returns whether a row was removed.
    pub async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM student_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), DbError> {
        sqlx::query("DELETE FROM student_sessions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Remove every session that expired before `now`. Returns the count.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM student_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
