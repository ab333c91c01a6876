//! Feed reactions: one per (feed, student)

use maum_core::ReactionType;
use sqlx::PgPool;
use uuid::Uuid;

use super::DbError;

pub struct ReactionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ReactionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// React to a feed, replacing any earlier reaction by the same student.
    pub async fn upsert(
        &self,
        feed_id: Uuid,
        student_id: Uuid,
        reaction_type: ReactionType,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO feed_reactions (feed_id, student_id, reaction_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (feed_id, student_id)
            DO UPDATE SET reaction_type = EXCLUDED.reaction_type
            "#,
        )
        .bind(feed_id)
        .bind(student_id)
        .bind(reaction_type.as_str())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove the student's reaction. Returns whether one existed.
    pub async fn delete(&self, feed_id: Uuid, student_id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM feed_reactions WHERE feed_id = $1 AND student_id = $2")
            .bind(feed_id)
            .bind(student_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
