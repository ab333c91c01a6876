//! Class repository
//!
//! - create: generated join code, retried on collision via ON CONFLICT
//! - ownership checks are single-row lookups filtered by teacher

use chrono::{DateTime, Utc};
use maum_core::credentials::generate_class_code;
use maum_core::models::NewClass;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

/// Attempts at drawing an unused class code before giving up.
const CODE_ATTEMPTS: usize = 5;

const CLASS_COLUMNS: &str = "id, teacher_id, class_name, grade, section, class_code, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct Class {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub class_name: String,
    pub grade: i32,
    pub section: i32,
    pub class_code: String,
    pub created_at: DateTime<Utc>,
}

pub struct ClassRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ClassRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Classes of a teacher, newest first.
    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<Class>, DbError> {
        let classes = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE teacher_id = $1 ORDER BY created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(self.pool)
        .await?;

        Ok(classes)
    }

    /// Create a class with a fresh join code.
    ///
    /// A code collision makes the INSERT return nothing; another code is
    /// drawn up to `CODE_ATTEMPTS` times.
    pub async fn create(&self, teacher_id: Uuid, class: &NewClass) -> Result<Class, DbError> {
        for attempt in 1..=CODE_ATTEMPTS {
            let code = generate_class_code();
            let created = sqlx::query_as::<_, Class>(&format!(
                r#"
                INSERT INTO classes (teacher_id, class_name, grade, section, class_code)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (class_code) DO NOTHING
                RETURNING {CLASS_COLUMNS}
                "#
            ))
            .bind(teacher_id)
            .bind(&class.class_name)
            .bind(class.grade)
            .bind(class.section)
            .bind(&code)
            .fetch_optional(self.pool)
            .await?;

            match created {
                Some(class) => return Ok(class),
                None => tracing::debug!(attempt, code = %code, "class code collision"),
            }
        }

        Err(DbError::Conflict(format!(
            "could not allocate a unique class code after {} attempts",
            CODE_ATTEMPTS
        )))
    }

    /// The class, if it belongs to the teacher.
    pub async fn owned_by(&self, class_id: Uuid, teacher_id: Uuid) -> Result<Option<Class>, DbError> {
        let class = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1 AND teacher_id = $2"
        ))
        .bind(class_id)
        .bind(teacher_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(class)
    }

    pub async fn find_by_code(&self, class_code: &str) -> Result<Option<Class>, DbError> {
        let class = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE class_code = $1"
        ))
        .bind(class_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(class)
    }

    /// Delete a class owned by the teacher. Students, sessions, feeds and
    /// plans go with it through ON DELETE CASCADE.
    pub async fn delete(&self, class_id: Uuid, teacher_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1 AND teacher_id = $2")
            .bind(class_id)
            .bind(teacher_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "class",
                id: class_id.to_string(),
            });
        }
        Ok(())
    }
}
