//! Daily plan checks: one per (plan, date)

use chrono::{DateTime, NaiveDate, Utc};
use maum_core::stats::CheckRecord;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

#[derive(Debug, Clone, FromRow)]
pub struct PlanCheck {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub check_date: NaiveDate,
    pub is_completed: Option<bool>,
    pub checked_at: Option<DateTime<Utc>>,
}

pub struct CheckRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record the check for `date`, replacing an earlier one.
    /// `checked_at` is stamped only when the plan is marked done.
    pub async fn upsert(
        &self,
        plan_id: Uuid,
        date: NaiveDate,
        is_completed: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<PlanCheck, DbError> {
        let checked_at = (is_completed == Some(true)).then_some(now);

        let check = sqlx::query_as::<_, PlanCheck>(
            r#"
            INSERT INTO plan_checks (plan_id, check_date, is_completed, checked_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (plan_id, check_date)
            DO UPDATE SET is_completed = EXCLUDED.is_completed, checked_at = EXCLUDED.checked_at
            RETURNING id, plan_id, check_date, is_completed, checked_at
            "#,
        )
        .bind(plan_id)
        .bind(date)
        .bind(is_completed)
        .bind(checked_at)
        .fetch_one(self.pool)
        .await?;

        Ok(check)
    }

    /// Completed checks of the given plans between two dates, inclusive.
    pub async fn completed_in_range(
        &self,
        plan_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CheckRecord>, DbError> {
        if plan_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, NaiveDate, Option<bool>)> = sqlx::query_as(
            r#"
            SELECT plan_id, check_date, is_completed
            FROM plan_checks
            WHERE plan_id = ANY($1)
              AND check_date >= $2 AND check_date <= $3
              AND is_completed = TRUE
            "#,
        )
        .bind(plan_ids)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(plan_id, check_date, is_completed)| CheckRecord {
                plan_id,
                check_date,
                is_completed,
            })
            .collect())
    }
}
