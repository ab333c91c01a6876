//! Teacher profiles, keyed by the identity provider's user id

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

#[derive(Debug, Clone, FromRow)]
pub struct TeacherProfile {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

pub struct TeacherRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TeacherRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the profile, or rename it when the provider user already has one.
    pub async fn upsert_profile(&self, id: Uuid, name: &str) -> Result<TeacherProfile, DbError> {
        let profile = sqlx::query_as::<_, TeacherProfile>(
            r#"
            INSERT INTO teacher_profiles (id, name) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<Option<TeacherProfile>, DbError> {
        let profile = sqlx::query_as::<_, TeacherProfile>(
            "SELECT id, name, created_at FROM teacher_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }
}
