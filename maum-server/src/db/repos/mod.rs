//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows the same patterns:
//! - list operations JOIN instead of looping (no N+1)
//! - uniqueness comes from constraints, surfaced as `DbError::Conflict`
//! - per-student limits are counted and checked under a row lock

pub mod checks;
pub mod classes;
pub mod feeds;
pub mod plans;
pub mod reactions;
pub mod sessions;
pub mod students;
pub mod teachers;

pub use checks::{CheckRepo, PlanCheck};
pub use classes::{Class, ClassRepo};
pub use feeds::{ClassFeed, Feed, FeedOwner, FeedReactionRow, FeedRepo};
pub use plans::{Plan, PlanRepo, TodayPlan};
pub use reactions::ReactionRepo;
pub use sessions::{SessionRepo, StudentSession};
pub use students::{Student, StudentRepo};
pub use teachers::{TeacherProfile, TeacherRepo};

use maum_core::limits::LimitReached;
use maum_core::{EmotionType, ReactionType};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("limit exceeded: at most {limit} {resource}")]
    LimitExceeded { resource: &'static str, limit: i64 },

    #[error("unexpected value in column {column}: '{value}'")]
    Decode { column: &'static str, value: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if unique {
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .unwrap_or("unique constraint")
                .to_owned();
            Self::Conflict(constraint)
        } else {
            Self::Sqlx(e)
        }
    }
}

impl From<LimitReached> for DbError {
    fn from(e: LimitReached) -> Self {
        Self::LimitExceeded {
            resource: e.resource,
            limit: e.limit,
        }
    }
}

pub(crate) fn decode_emotion(value: &str) -> Result<EmotionType, DbError> {
    value.parse().map_err(|_| DbError::Decode {
        column: "emotion_type",
        value: value.to_owned(),
    })
}

pub(crate) fn decode_reaction(value: &str) -> Result<ReactionType, DbError> {
    value.parse().map_err(|_| DbError::Decode {
        column: "reaction_type",
        value: value.to_owned(),
    })
}

/// Take a row lock on the student so concurrent limit checks serialize.
pub(crate) async fn lock_student(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    student_id: uuid::Uuid,
) -> Result<(), DbError> {
    sqlx::query("SELECT id FROM students WHERE id = $1 FOR UPDATE")
        .bind(student_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "student",
            id: student_id.to_string(),
        })?;
    Ok(())
}
