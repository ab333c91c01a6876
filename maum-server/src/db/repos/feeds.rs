//! Emotion feed repository
//!
//! - create: today's count checked against the limit under a student row lock
//! - class board: one query for feeds + authors, one for their reactions
//! - emotion counts: GROUP BY in SQL, no row cap

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use maum_core::limits::{ensure_room, FEEDS_PER_DAY};
use maum_core::models::NewFeed;
use maum_core::{EmotionType, ReactionType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{decode_emotion, decode_reaction, lock_student, DbError};

const FEED_COLUMNS: &str = "f.id, f.student_id, f.emotion_type, f.content, f.image_url, f.is_visible, f.created_at";

/// Most feeds returned for one class day.
const CLASS_DAY_LIMIT: i64 = 100;

#[derive(Debug, Clone)]
pub struct Feed {
    pub id: Uuid,
    pub student_id: Uuid,
    pub emotion_type: EmotionType,
    pub content: String,
    pub image_url: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct FeedRow {
    id: Uuid,
    student_id: Uuid,
    emotion_type: String,
    content: String,
    image_url: Option<String>,
    is_visible: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<FeedRow> for Feed {
    type Error = DbError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            emotion_type: decode_emotion(&row.emotion_type)?,
            content: row.content,
            image_url: row.image_url,
            is_visible: row.is_visible,
            created_at: row.created_at,
        })
    }
}

/// Who a feed belongs to, for permission checks
#[derive(Debug, Clone, FromRow)]
pub struct FeedOwner {
    pub feed_id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct FeedReactionRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub reaction_type: ReactionType,
}

/// A feed on the class board with its author and reactions
#[derive(Debug, Clone)]
pub struct ClassFeed {
    pub feed: Feed,
    pub author_name: String,
    pub author_number: i32,
    pub reactions: Vec<FeedReactionRow>,
}

#[derive(FromRow)]
struct ClassFeedRow {
    #[sqlx(flatten)]
    feed: FeedRow,
    author_name: String,
    author_number: i32,
}

pub struct FeedRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FeedRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a feed unless the student already posted `limit` feeds within
    /// `[day_start, day_end]`.
    pub async fn create_within_daily_limit(
        &self,
        student_id: Uuid,
        feed: &NewFeed,
        limit: i64,
        (day_start, day_end): (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<Feed, DbError> {
        let mut tx = self.pool.begin().await?;
        lock_student(&mut tx, student_id).await?;

        let (posted,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM emotion_feeds
            WHERE student_id = $1 AND created_at >= $2 AND created_at <= $3
            "#,
        )
        .bind(student_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&mut *tx)
        .await?;
        ensure_room(FEEDS_PER_DAY, posted, limit)?;

        let row = sqlx::query_as::<_, FeedRow>(
            r#"
            INSERT INTO emotion_feeds (student_id, emotion_type, content, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, student_id, emotion_type, content, image_url, is_visible, created_at
            "#,
        )
        .bind(student_id)
        .bind(feed.emotion_type.as_str())
        .bind(&feed.content)
        .bind(feed.image_url.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Feed::try_from(row)
    }

    pub async fn get_owner(&self, feed_id: Uuid) -> Result<FeedOwner, DbError> {
        sqlx::query_as::<_, FeedOwner>(
            r#"
            SELECT f.id AS feed_id, f.student_id, s.class_id, c.teacher_id
            FROM emotion_feeds f
            JOIN students s ON s.id = f.student_id
            JOIN classes c ON c.id = s.class_id
            WHERE f.id = $1
            "#,
        )
        .bind(feed_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "feed",
            id: feed_id.to_string(),
        })
    }

    /// Visible feeds of a class posted within the given instants, newest
    /// first, each with its author and reactions.
    pub async fn list_for_class_day(
        &self,
        class_id: Uuid,
        (day_start, day_end): (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<Vec<ClassFeed>, DbError> {
        let rows = sqlx::query_as::<_, ClassFeedRow>(&format!(
            r#"
            SELECT {FEED_COLUMNS}, s.name AS author_name, s.student_number AS author_number
            FROM emotion_feeds f
            JOIN students s ON s.id = f.student_id
            WHERE s.class_id = $1
              AND f.is_visible
              AND f.created_at >= $2 AND f.created_at <= $3
            ORDER BY f.created_at DESC
            LIMIT $4
            "#
        ))
        .bind(class_id)
        .bind(day_start)
        .bind(day_end)
        .bind(CLASS_DAY_LIMIT)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let feed_ids: Vec<Uuid> = rows.iter().map(|r| r.feed.id).collect();
        let reaction_rows: Vec<(Uuid, Uuid, Uuid, String)> = sqlx::query_as(
            r#"
            SELECT id, feed_id, student_id, reaction_type
            FROM feed_reactions
            WHERE feed_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(&feed_ids)
        .fetch_all(self.pool)
        .await?;

        let mut reactions: HashMap<Uuid, Vec<FeedReactionRow>> = HashMap::new();
        for (id, feed_id, student_id, reaction_type) in reaction_rows {
            reactions.entry(feed_id).or_default().push(FeedReactionRow {
                id,
                student_id,
                reaction_type: decode_reaction(&reaction_type)?,
            });
        }

        rows.into_iter()
            .map(|row| {
                let reactions = reactions.remove(&row.feed.id).unwrap_or_default();
                Ok(ClassFeed {
                    feed: Feed::try_from(row.feed)?,
                    author_name: row.author_name,
                    author_number: row.author_number,
                    reactions,
                })
            })
            .collect()
    }

    pub async fn set_visibility(&self, feed_id: Uuid, is_visible: bool) -> Result<Feed, DbError> {
        let row = sqlx::query_as::<_, FeedRow>(
            r#"
            UPDATE emotion_feeds SET is_visible = $2 WHERE id = $1
            RETURNING id, student_id, emotion_type, content, image_url, is_visible, created_at
            "#,
        )
        .bind(feed_id)
        .bind(is_visible)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "feed",
            id: feed_id.to_string(),
        })?;

        Feed::try_from(row)
    }

    /// Visible feeds per emotion for a whole class.
    pub async fn emotion_counts_for_class(
        &self,
        class_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(EmotionType, u64)>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT f.emotion_type, COUNT(*)
            FROM emotion_feeds f
            JOIN students s ON s.id = f.student_id
            WHERE s.class_id = $1
              AND f.is_visible
              AND f.created_at >= $2 AND f.created_at <= $3
            GROUP BY f.emotion_type
            "#,
        )
        .bind(class_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        decode_counts(rows)
    }

    /// Visible feeds per emotion for one student.
    pub async fn emotion_counts_for_student(
        &self,
        student_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(EmotionType, u64)>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT emotion_type, COUNT(*)
            FROM emotion_feeds
            WHERE student_id = $1
              AND is_visible
              AND created_at >= $2 AND created_at <= $3
            GROUP BY emotion_type
            "#,
        )
        .bind(student_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        decode_counts(rows)
    }
}

fn decode_counts(rows: Vec<(String, i64)>) -> Result<Vec<(EmotionType, u64)>, DbError> {
    rows.into_iter()
        .map(|(emotion, count)| Ok((decode_emotion(&emotion)?, count.max(0) as u64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_decode() {
        let counts = decode_counts(vec![("joy".into(), 3), ("tired".into(), 1)]).unwrap();
        assert_eq!(counts, vec![(EmotionType::Joy, 3), (EmotionType::Tired, 1)]);
    }

    #[test]
    fn unknown_emotion_in_counts_is_decode_error() {
        assert!(matches!(
            decode_counts(vec![("meh".into(), 1)]),
            Err(DbError::Decode { .. })
        ));
    }
}
